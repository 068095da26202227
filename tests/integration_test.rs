//! Black-box test: run the real binary against a mocked sensor endpoint and
//! read the JSON surface over HTTP.

use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use anyhow::{bail, Result};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Kills the spawned service when the test ends, pass or fail.
struct ServiceGuard(Child);

impl Drop for ServiceGuard {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

fn free_port() -> Result<u16> {
    Ok(TcpListener::bind("127.0.0.1:0")?.local_addr()?.port())
}

async fn mock_upstream() -> MockServer {
    // ---
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/test_data.php"))
        .and(query_param("action", "latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "id": 42,
                "device_id": "tank-1",
                "temperature_c": "26.5",
                "turbidity_ntu": "150.2",
                "current_a": "0.5",
                "dissolved_oxygen": "7.5",
                "water_level_cm": "12",
                "water_quality": "NUOC DUC",
                "created_at": "2024-01-01 10:00:05"
            }
        })))
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/test_data.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "count": 3,
            "data": [
                { "temperature_c": "27.0", "created_at": "2024-01-01 10:00:10" },
                { "temperature_c": "25.0", "created_at": "2024-01-01 10:00:00" },
                { "temperature_c": "26.0", "created_at": "2024-01-01 10:00:05" }
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/upload_image.php"))
        .and(query_param("action", "all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "id": 1, "device_id": "cam-a", "ai_alive_count": 5, "ai_dead_count": 1 },
                { "id": 2, "device_id": "cam-b", "ai_alive_count": 3, "ai_dead_count": 0 }
            ]
        })))
        .mount(&server)
        .await;

    server
}

fn spawn_service(upstream: &MockServer, port: u16) -> Result<ServiceGuard> {
    // ---
    let child = Command::new(env!("CARGO_BIN_EXE_aquabox-monitor"))
        .env("SENSOR_API_URL", format!("{}/test_data.php", upstream.uri()))
        .env("FISH_API_URL", format!("{}/upload_image.php", upstream.uri()))
        .env("LISTEN_ADDR", format!("127.0.0.1:{port}"))
        .env("LATEST_POLL_MS", "200")
        .env("SERIES_POLL_MS", "200")
        .env("SIMULATION_ENABLED", "true")
        .env("SIMULATION_SEED", "7")
        .env("SIMULATED_POLL_MS", "200")
        .env("AQUABOX_LOG_LEVEL", "warn")
        .env_remove("RUST_LOG")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(ServiceGuard(child))
}

/// Poll `url` until `ready` accepts the JSON body.
async fn wait_for(client: &Client, url: &str, ready: impl Fn(&Value) -> bool) -> Result<Value> {
    // ---
    for _ in 0..100 {
        if let Ok(resp) = client.get(url).send().await {
            if resp.status().is_success() {
                let body: Value = resp.json().await?;
                if ready(&body) {
                    return Ok(body);
                }
            }
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    bail!("{url} never became ready")
}

#[tokio::test]
async fn service_serves_polled_views() -> Result<()> {
    // ---
    let upstream = mock_upstream().await;
    let port = free_port()?;
    let _service = spawn_service(&upstream, port)?;
    let base = format!("http://127.0.0.1:{port}");
    let client = Client::new();

    let health = wait_for(&client, &format!("{base}/health"), |_| true).await?;
    assert_eq!(health["status"], "ok");

    // 1) Latest reading: normalized, classified, alerted
    let dash = wait_for(&client, &format!("{base}/api/dashboard"), |b| {
        b["connection"]["status"] == "connected"
    })
    .await?;
    assert_eq!(dash["reading"]["temperature"], 26.5);
    assert_eq!(dash["reading"]["turbidity"], 150.2);
    assert_eq!(dash["statuses"]["turbidity"], "warning");
    assert_eq!(dash["statuses"]["temperature"], "normal");
    assert_eq!(dash["waterQuality"], "NUOC DUC");
    assert_eq!(dash["overview"]["warning"], 1);

    let titles: Vec<&str> = dash["alerts"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|a| a["title"].as_str())
        .collect();
    assert!(titles.contains(&"Nước hơi đục"), "{titles:?}");

    // 2) Charts are re-sorted by time
    let charts = wait_for(&client, &format!("{base}/api/charts"), |b| b["totalPoints"] == 3).await?;
    let temperature = &charts["series"][0]["data"];
    assert_eq!(temperature[0][1], 25.0);
    assert_eq!(temperature[1][1], 26.0);
    assert_eq!(temperature[2][1], 27.0);
    assert!(charts["lastPointAt"].is_string());

    let level: Value = client
        .get(format!("{base}/api/charts?metric=waterLevel"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(level["series"].as_array().unwrap().len(), 1);
    assert_eq!(level["series"][0]["metric"], "waterLevel");

    // 3) Sensor cards
    let sensors: Value = client.get(format!("{base}/api/sensors")).send().await?.json().await?;
    assert_eq!(sensors["sensors"].as_array().unwrap().len(), 5);
    assert_eq!(sensors["sensors"][0]["value"], "26.5");

    // 4) Simulated view runs alongside
    let sim = wait_for(&client, &format!("{base}/api/simulated"), |b| {
        b["connection"]["status"] == "connected"
    })
    .await?;
    assert_eq!(sim["waterQuality"], "TRONG");

    // 5) Fish log filtered by device
    let fish = wait_for(&client, &format!("{base}/api/fish?device_id=cam-a"), |b| {
        b["connection"]["status"] == "connected"
    })
    .await?;
    assert_eq!(fish["rows"].as_array().unwrap().len(), 1);
    assert_eq!(fish["totals"]["alive"], 5);
    assert_eq!(fish["devices"], json!(["all", "cam-a", "cam-b"]));

    Ok(())
}

#[tokio::test]
async fn device_and_alert_controls() -> Result<()> {
    // ---
    let upstream = mock_upstream().await;
    let port = free_port()?;
    let _service = spawn_service(&upstream, port)?;
    let base = format!("http://127.0.0.1:{port}");
    let client = Client::new();

    wait_for(&client, &format!("{base}/health"), |_| true).await?;

    let devices: Value = client.get(format!("{base}/api/devices")).send().await?.json().await?;
    assert_eq!(devices["devices"].as_array().unwrap().len(), 6);
    assert_eq!(devices["active"], 4);

    let toggled: Value = client
        .post(format!("{base}/api/devices/2/toggle"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(toggled["isOn"], true);

    let missing = client.post(format!("{base}/api/devices/99/toggle")).send().await?;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let fed: Value = client.post(format!("{base}/api/devices/feed")).send().await?.json().await?;
    assert_eq!(fed["changed"], 1);

    let devices: Value = client.get(format!("{base}/api/devices")).send().await?.json().await?;
    assert_eq!(devices["active"], 5);
    assert!(devices["devices"][4]["lastFeed"].is_string());

    // Alerts: dismiss out of range, then reset
    wait_for(&client, &format!("{base}/api/alerts"), |b| {
        b.as_array().is_some_and(|a| !a.is_empty())
    })
    .await?;
    let gone = client.delete(format!("{base}/api/alerts/50")).send().await?;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);

    let reset = client.delete(format!("{base}/api/alerts")).send().await?;
    assert_eq!(reset.status(), StatusCode::NO_CONTENT);

    Ok(())
}
