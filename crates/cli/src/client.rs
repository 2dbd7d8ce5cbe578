//! API client for the incubator monitor

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

/// HTTP client for the monitor API
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// GET a JSON resource
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to reach the monitor API")?;

        Self::parse(response).await
    }

    /// POST without a body and parse the JSON response
    pub async fn post<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .send()
            .await
            .context("Failed to reach the monitor API")?;

        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            let body: ErrorResponse = response.json().await.unwrap_or_else(|_| ErrorResponse {
                error: "not found".to_string(),
            });
            anyhow::bail!("{}", body.error);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        response.json().await.context("Failed to parse response")
    }
}

// API response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub alert_type: String,
    pub severity: String,
    pub title: String,
    pub message: String,
    pub value: f64,
    pub threshold: f64,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i64,
    pub acknowledged: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_time: Option<DateTime<Utc>>,
    pub status: String,
    pub elapsed_minutes: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AlertSummary {
    pub total: usize,
    pub active: usize,
    pub unacknowledged: usize,
    pub resolved: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcknowledgeResponse {
    pub id: String,
    pub outcome: String,
    pub changed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub temperature: Option<Reading>,
    pub humidity: Option<Reading>,
    pub co2: Option<Reading>,
    pub status: Option<String>,
    pub alerts: AlertSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceTelemetry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceTelemetry {
    pub battery_level: f64,
    pub wifi_strength: f64,
    pub last_rotation: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Threshold {
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    pub sustained_minutes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thresholds {
    pub temperature: Threshold,
    pub co2: Threshold,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALERT_JSON: &str = r#"{
        "id": "0b5c8a9e-1f7e-4c3a-9a55-2f1f3c0d8e11",
        "alert_type": "co2_high",
        "severity": "critical",
        "title": "HIGH CO₂ LEVEL",
        "message": "CO₂ >= 600 ppm for more than 30 minutes (optimal: 300-500 ppm)",
        "value": 650.0,
        "threshold": 600.0,
        "start_time": "2024-05-01T10:00:00Z",
        "duration_minutes": 30,
        "acknowledged": false,
        "status": "active",
        "elapsed_minutes": 42
    }"#;

    #[tokio::test]
    async fn test_get_alert() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/alerts/0b5c8a9e-1f7e-4c3a-9a55-2f1f3c0d8e11")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(ALERT_JSON)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let alert: Alert = client
            .get("api/v1/alerts/0b5c8a9e-1f7e-4c3a-9a55-2f1f3c0d8e11")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(alert.alert_type, "co2_high");
        assert_eq!(alert.threshold, 600.0);
        assert!(alert.resolved_time.is_none());
    }

    #[tokio::test]
    async fn test_acknowledge_unknown_alert_reports_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/alerts/missing/acknowledge")
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"alert missing not found"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client
            .post::<AcknowledgeResponse>("api/v1/alerts/missing/acknowledge")
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "alert missing not found");
    }

    #[tokio::test]
    async fn test_server_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/status")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client.get::<StatusSnapshot>("api/v1/status").await.unwrap_err();

        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn test_status_snapshot_device_is_optional() {
        let without: StatusSnapshot = serde_json::from_str(
            r#"{"temperature":null,"humidity":null,"co2":null,"status":null,
                "alerts":{"total":0,"active":0,"unacknowledged":0,"resolved":0}}"#,
        )
        .unwrap();
        assert!(without.device.is_none());

        let with: StatusSnapshot = serde_json::from_str(
            r#"{"temperature":null,"humidity":null,"co2":null,"status":"optimal",
                "alerts":{"total":0,"active":0,"unacknowledged":0,"resolved":0},
                "device":{"battery_level":91.0,"wifi_strength":78.5,
                          "last_rotation":"2024-05-01T09:30:00Z"}}"#,
        )
        .unwrap();
        assert_eq!(with.device.unwrap().wifi_strength, 78.5);
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(ApiClient::new("not a url").is_err());
    }
}
