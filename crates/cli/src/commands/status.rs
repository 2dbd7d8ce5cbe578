//! Incubator status and threshold commands

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use super::alerts::print_summary;
use crate::client::{ApiClient, Reading, StatusSnapshot, Threshold, Thresholds};
use crate::output::{color_system_status, format_timestamp, print_json, OutputFormat};

#[derive(Tabled)]
struct ReadingRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

#[derive(Tabled)]
struct ThresholdRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "High")]
    high: String,
    #[tabled(rename = "Low")]
    low: String,
    #[tabled(rename = "Sustained")]
    sustained: String,
}

fn reading_row(metric: &'static str, unit: &str, reading: Option<&Reading>) -> ReadingRow {
    match reading {
        Some(r) => ReadingRow {
            metric,
            value: format!("{:.1} {}", r.value, unit),
            updated: format_timestamp(&r.timestamp),
        },
        None => ReadingRow {
            metric,
            value: "-".to_string(),
            updated: "-".to_string(),
        },
    }
}

fn threshold_row(metric: &'static str, unit: &str, threshold: &Threshold) -> ThresholdRow {
    let bound = |b: Option<f64>| b.map(|v| format!("{} {}", v, unit)).unwrap_or_else(|| "-".to_string());
    ThresholdRow {
        metric,
        high: bound(threshold.high),
        low: bound(threshold.low),
        sustained: format!("{} min", threshold.sustained_minutes),
    }
}

/// Latest readings, overall status and alert counts
pub async fn show_status(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let snapshot: StatusSnapshot = client.get("api/v1/status").await?;

    match format {
        OutputFormat::Json => print_json(&snapshot)?,
        OutputFormat::Table => {
            println!("{}", "Incubator Status".bold());
            println!("{}", "=".repeat(40));
            println!("System: {}\n", color_system_status(snapshot.status.as_deref()));

            let rows = vec![
                reading_row("Temperature", "°C", snapshot.temperature.as_ref()),
                reading_row("Humidity", "%", snapshot.humidity.as_ref()),
                reading_row("CO₂", "ppm", snapshot.co2.as_ref()),
            ];
            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}\n", table);

            if let Some(device) = &snapshot.device {
                println!("{}", "Device".bold());
                println!("  Battery:        {:.0}%", device.battery_level);
                println!("  Wi-Fi:          {:.0}%", device.wifi_strength);
                println!("  Last rotation:  {}\n", format_timestamp(&device.last_rotation));
            }

            print_summary(&snapshot.alerts);
        }
    }

    Ok(())
}

pub async fn show_thresholds(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let thresholds: Thresholds = client.get("api/v1/thresholds").await?;

    match format {
        OutputFormat::Json => print_json(&thresholds)?,
        OutputFormat::Table => {
            let rows = vec![
                threshold_row("Temperature", "°C", &thresholds.temperature),
                threshold_row("CO₂", "ppm", &thresholds.co2),
            ];
            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
        }
    }

    Ok(())
}
