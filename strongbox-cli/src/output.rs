//! Output formatting utilities

use chrono::{TimeZone, Utc};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};
use serde::Serialize;

use strongbox_core::config::UnitSettings;
use strongbox_core::{Amount, OperationResult, WithdrawalStatus};

pub fn success(msg: &str) {
    println!("{}", msg.green());
}

pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Print a successful result as an OperationResult envelope
pub fn print_json<T: Serialize>(data: T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&OperationResult::ok(data))?);
    Ok(())
}

/// Print a failed core result as an OperationResult envelope
pub fn print_json_failure(err: strongbox_core::Error) -> anyhow::Result<()> {
    let result = OperationResult::from(Err::<(), _>(err));
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// `1.5 ETH`
pub fn format_amount(amount: Amount, units: &UnitSettings) -> String {
    format!("{} {}", amount.format_units(units.decimals), units.symbol)
}

/// Unix seconds as UTC
pub fn format_time(secs: i64) -> String {
    Utc.timestamp_opt(secs, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| secs.to_string())
}

/// Unix milliseconds as UTC
pub fn format_timestamp_ms(ms: i64) -> String {
    Utc.timestamp_millis_opt(ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}

pub fn format_status(status: WithdrawalStatus) -> String {
    match status {
        WithdrawalStatus::Pending => "pending".yellow().to_string(),
        WithdrawalStatus::Cancelled => "cancelled".dimmed().to_string(),
        WithdrawalStatus::Completed => "completed".green().to_string(),
    }
}

/// Format seconds as `1d 2h 3m`
pub fn format_duration(secs: i64) -> String {
    let secs = secs.max(0);
    let (days, rem) = (secs / 86_400, secs % 86_400);
    let (hours, rem) = (rem / 3_600, rem % 3_600);
    let minutes = rem / 60;
    match (days, hours) {
        (0, 0) if minutes == 0 => format!("{}s", secs),
        (0, 0) => format!("{}m", minutes),
        (0, _) => format!("{}h {}m", hours, minutes),
        _ => format!("{}d {}h {}m", days, hours, minutes),
    }
}

/// Format bytes as human-readable size
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(42), "42s");
        assert_eq!(format_duration(90), "1m");
        assert_eq!(format_duration(3_600 + 120), "1h 2m");
        assert_eq!(format_duration(86_400 + 3_600), "1d 1h 0m");
    }

    #[test]
    fn test_format_amount() {
        let units = UnitSettings::default();
        let amount = Amount::parse_units("1.25", units.decimals).unwrap();
        assert_eq!(format_amount(amount, &units), "1.25 ETH");
    }
}
