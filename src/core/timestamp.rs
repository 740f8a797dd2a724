use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, SecondsFormat, Utc};

pub fn utc_ns_now() -> u64 {
    // Uhr vor 1970 => 0 statt Panic
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() * 1_000_000_000 + d.subsec_nanos() as u64)
        .unwrap_or(0)
}

pub fn utc_ms_now() -> u64 {
    utc_ns_now() / 1_000_000
}

/// RFC 3339 rendering with millisecond precision, e.g. `2026-10-19T08:15:02.125Z`.
pub fn format_utc_ns(utc_ns: u64) -> String {
    let secs = (utc_ns / 1_000_000_000) as i64;
    let nanos = (utc_ns % 1_000_000_000) as u32;
    match DateTime::<Utc>::from_timestamp(secs, nanos) {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => format!("{}.{:09}", secs, nanos),
    }
}
