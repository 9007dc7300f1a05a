//! Human-readable file statistics

use chrono::{DateTime, Local};

use crate::classifier::NOT_AVAILABLE;

const SIZE_UNITS: [&str; 9] = ["B", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// `1536` becomes `"1.50 KB"`. Plain bytes are shown without decimals.
pub fn format_filesize(size_bytes: Option<u64>) -> String {
    let Some(size) = size_bytes else {
        return NOT_AVAILABLE.to_string();
    };
    if size < 1024 {
        return format!("{} B", size);
    }

    let mut value = size as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, SIZE_UNITS[unit])
}

/// Local `YYYY-MM-DD HH:MM` for an epoch-seconds timestamp
pub fn format_timestamp(epoch_secs: Option<f64>) -> String {
    let Some(secs) = epoch_secs else {
        return NOT_AVAILABLE.to_string();
    };
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9) as u32;
    match DateTime::from_timestamp(whole as i64, nanos) {
        Some(utc) => utc.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
        None => {
            tracing::warn!("Could not format timestamp: {}", secs);
            "Invalid Date".to_string()
        }
    }
}
