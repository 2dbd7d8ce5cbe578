//! Output formatting utilities

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Parse a format name from the config file
    pub fn from_name(name: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(name, true).ok()
    }
}

/// Pretty-print any response as JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Minutes as "2h 05m" or "45m"
pub fn format_minutes(minutes: i64) -> String {
    if minutes >= 60 {
        format!("{}h {:02}m", minutes / 60, minutes % 60)
    } else {
        format!("{}m", minutes)
    }
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Truncate a UUID for table display
pub fn truncate_id(id: &str) -> String {
    if id.chars().count() > 8 {
        format!("{}...", id.chars().take(8).collect::<String>())
    } else {
        id.to_string()
    }
}

pub fn color_severity(severity: &str) -> String {
    match severity {
        "emergency" => severity.red().bold().to_string(),
        "critical" => severity.red().to_string(),
        "warning" => severity.yellow().to_string(),
        _ => severity.to_string(),
    }
}

pub fn color_alert_status(status: &str) -> String {
    match status {
        "active" => status.red().to_string(),
        "acknowledged" => status.yellow().to_string(),
        "resolved" => status.green().to_string(),
        _ => status.to_string(),
    }
}

pub fn color_system_status(status: Option<&str>) -> String {
    match status {
        Some("optimal") => "optimal".green().to_string(),
        Some("warning") => "warning".yellow().to_string(),
        Some("critical") => "critical".red().bold().to_string(),
        Some(other) => other.to_string(),
        None => "unknown".dimmed().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(0), "0m");
        assert_eq!(format_minutes(45), "45m");
        assert_eq!(format_minutes(65), "1h 05m");
        assert_eq!(format_minutes(120), "2h 00m");
    }

    #[test]
    fn test_truncate_id() {
        assert_eq!(truncate_id("0b5c8a9e-1f7e-4c3a"), "0b5c8a9e...");
        assert_eq!(truncate_id("short"), "short");
        assert_eq!(truncate_id("ééééééééé"), "éééééééé...");
        assert_eq!(truncate_id("éééé"), "éééé");
    }

    #[test]
    fn test_format_from_name() {
        assert_eq!(OutputFormat::from_name("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_name("TABLE"), Some(OutputFormat::Table));
        assert_eq!(OutputFormat::from_name("yaml"), None);
    }
}
