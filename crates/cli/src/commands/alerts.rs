//! Alert commands

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use tabled::Tabled;

use crate::client::{AcknowledgeResponse, Alert, AlertSummary, ApiClient};
use crate::output::{
    color_alert_status, color_severity, format_minutes, format_timestamp, print_info, print_json,
    print_success, print_warning, truncate_id, OutputFormat,
};

/// Which alerts to list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum AlertState {
    #[default]
    All,
    Active,
    Unacknowledged,
    Resolved,
}

impl AlertState {
    fn as_query(&self) -> &'static str {
        match self {
            AlertState::All => "all",
            AlertState::Active => "active",
            AlertState::Unacknowledged => "unacknowledged",
            AlertState::Resolved => "resolved",
        }
    }
}

#[derive(Tabled)]
struct AlertRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Type")]
    alert_type: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Threshold")]
    threshold: String,
    #[tabled(rename = "Started")]
    start_time: String,
    #[tabled(rename = "Duration")]
    duration: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&Alert> for AlertRow {
    fn from(alert: &Alert) -> Self {
        Self {
            id: truncate_id(&alert.id),
            alert_type: alert.alert_type.clone(),
            severity: color_severity(&alert.severity),
            value: format!("{:.1}", alert.value),
            threshold: format!("{:.1}", alert.threshold),
            start_time: format_timestamp(&alert.start_time),
            duration: format_minutes(alert.elapsed_minutes),
            status: color_alert_status(&alert.status),
        }
    }
}

/// List alerts, newest first
pub async fn list_alerts(client: &ApiClient, state: AlertState, format: OutputFormat) -> Result<()> {
    let path = format!("api/v1/alerts?state={}", state.as_query());
    let alerts: Vec<Alert> = client.get(&path).await?;

    match format {
        OutputFormat::Json => print_json(&alerts)?,
        OutputFormat::Table => {
            if alerts.is_empty() {
                print_info("No alerts");
                return Ok(());
            }

            let rows: Vec<AlertRow> = alerts.iter().map(AlertRow::from).collect();
            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
            println!("\nTotal: {} alerts", alerts.len());
        }
    }

    Ok(())
}

/// Show one alert in full
pub async fn show_alert(client: &ApiClient, id: &str, format: OutputFormat) -> Result<()> {
    let alert: Alert = client.get(&format!("api/v1/alerts/{}", id)).await?;

    match format {
        OutputFormat::Json => print_json(&alert)?,
        OutputFormat::Table => {
            println!("{}", alert.title.bold());
            println!("{}", "=".repeat(60));
            println!("ID:           {}", alert.id);
            println!("Type:         {}", alert.alert_type);
            println!("Severity:     {}", color_severity(&alert.severity));
            println!("Status:       {}", color_alert_status(&alert.status));
            println!("Message:      {}", alert.message);
            println!("Value:        {:.1} (threshold {:.1})", alert.value, alert.threshold);
            println!("Started:      {}", format_timestamp(&alert.start_time));
            println!("Duration:     {}", format_minutes(alert.elapsed_minutes));
            if let Some(resolved) = &alert.resolved_time {
                println!("Resolved:     {}", format_timestamp(resolved));
            }
            println!("Acknowledged: {}", if alert.acknowledged { "yes" } else { "no" });
        }
    }

    Ok(())
}

pub async fn acknowledge_alert(client: &ApiClient, id: &str, format: OutputFormat) -> Result<()> {
    let response: AcknowledgeResponse =
        client.post(&format!("api/v1/alerts/{}/acknowledge", id)).await?;

    match format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Table => {
            if response.changed {
                print_success(&format!("Alert {} acknowledged", response.id));
            } else {
                print_warning(&format!("Alert {} was already acknowledged", response.id));
            }
        }
    }

    Ok(())
}

pub async fn show_summary(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let summary: AlertSummary = client.get("api/v1/alerts/summary").await?;

    match format {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Table => print_summary(&summary),
    }

    Ok(())
}

pub fn print_summary(summary: &AlertSummary) {
    println!("{}", "Alerts".bold());
    println!("  Total:          {}", summary.total);
    println!("  Active:         {}", count(summary.active));
    println!("  Unacknowledged: {}", count(summary.unacknowledged));
    println!("  Resolved:       {}", summary.resolved);
}

fn count(value: usize) -> String {
    if value > 0 {
        value.to_string().red().bold().to_string()
    } else {
        value.to_string().green().to_string()
    }
}
