//! Integration tests for the health assistant HTTP server

#[cfg(feature = "server")]
mod server_tests {
    use cardio_health_assistant::activity::create_shared_log;
    use cardio_health_assistant::server::{run, ServerConfig, ServerState};
    use cardio_health_assistant::HealthSession;
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio::sync::oneshot;

    async fn start() -> (SocketAddr, oneshot::Sender<()>) {
        let state = ServerState::new(HealthSession::new()).with_activity(create_shared_log());
        let (addr, shutdown_tx) = run(ServerConfig::new(0), state)
            .await
            .expect("Failed to start server");

        // Give server time to start
        tokio::time::sleep(Duration::from_millis(100)).await;
        (addr, shutdown_tx)
    }

    async fn post_metrics(
        client: &reqwest::Client,
        addr: SocketAddr,
        body: serde_json::Value,
    ) -> reqwest::Response {
        client
            .post(format!("http://{}/metrics", addr))
            .json(&body)
            .send()
            .await
            .expect("Failed to send request")
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (addr, shutdown_tx) = start().await;

        let client = reqwest::Client::new();
        let response = client
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success());

        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["status"], "ok");
        assert!(body["version"].as_str().is_some());
        assert_eq!(body["samples"], 0);

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_record_and_query() {
        let (addr, shutdown_tx) = start().await;
        let client = reqwest::Client::new();

        let response = post_metrics(
            &client,
            addr,
            serde_json::json!({ "weight": 70.0, "height": 1.75, "heart_rate": 72 }),
        )
        .await;
        assert!(response.status().is_success());
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["status"], "ok");
        assert!(body.get("alert").is_none());

        let summary: serde_json::Value = client
            .get(format!("http://{}/summary", addr))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(summary["heart_rate"]["last"], 72.0);
        let bmi = summary["bmi"]["last"].as_f64().unwrap();
        assert!((bmi - 22.857).abs() < 0.001);

        let report = client
            .get(format!("http://{}/report", addr))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(report.starts_with("Comprehensive Health Metrics Report"));
        assert!(report.contains("  Last: 22.86"));

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_invalid_sample_rejected() {
        let (addr, shutdown_tx) = start().await;
        let client = reqwest::Client::new();

        for body in [
            serde_json::json!({ "blood_pressure": "abc" }),
            serde_json::json!({ "pulse": 70 }),
            serde_json::json!({ "heart_rate": true }),
            serde_json::json!({}),
        ] {
            let response = post_metrics(&client, addr, body.clone()).await;
            assert_eq!(
                response.status(),
                reqwest::StatusCode::UNPROCESSABLE_ENTITY,
                "body {body}"
            );
            let error: serde_json::Value = response.json().await.unwrap();
            assert_eq!(error["code"], "VALIDATION_ERROR");
        }

        let health: serde_json::Value = client
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["samples"], 0);

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_alert_endpoints() {
        let (addr, shutdown_tx) = start().await;
        let client = reqwest::Client::new();

        let alert: serde_json::Value = client
            .get(format!("http://{}/alert", addr))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(alert["alert"].is_null());

        let response = post_metrics(
            &client,
            addr,
            serde_json::json!({ "blood_pressure": "190/130", "heart_rate": 135 }),
        )
        .await;
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["alert"]["kind"], "hypertensive_crisis");

        let alerts: serde_json::Value = client
            .get(format!("http://{}/alerts", addr))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let alerts = alerts["alerts"].as_array().unwrap();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[1]["kind"], "tachycardia");
        assert!(alerts[1]["message"]
            .as_str()
            .unwrap()
            .contains("heart rate is unusually high"));

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_recommendations_endpoint() {
        let (addr, shutdown_tx) = start().await;
        let client = reqwest::Client::new();

        post_metrics(&client, addr, serde_json::json!({ "exercise_minutes": 30 })).await;

        let recs: serde_json::Value = client
            .get(format!("http://{}/recommendations", addr))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let messages = recs["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].as_str().unwrap().contains("150 minutes"));

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_cors_headers() {
        let (addr, shutdown_tx) = start().await;

        let client = reqwest::Client::new();
        let response = client
            .request(reqwest::Method::OPTIONS, format!("http://{}/metrics", addr))
            .header("Origin", "http://localhost")
            .header("Access-Control-Request-Method", "POST")
            .send()
            .await
            .expect("Failed to send request");

        assert!(
            response.status().is_success() || response.status() == reqwest::StatusCode::NO_CONTENT,
            "CORS preflight failed: {}",
            response.status()
        );

        let _ = shutdown_tx.send(());
    }
}
