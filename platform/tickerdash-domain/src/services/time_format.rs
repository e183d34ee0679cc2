use chrono::{DateTime, Local, Utc};

fn local(timestamp_ms: i64) -> DateTime<Local> {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .unwrap_or_default()
        .with_timezone(&Local)
}

/// `HH:MM:SS` in local time. Used for sample labels, CSV rows and message rows.
pub fn time_only(timestamp_ms: i64) -> String {
    local(timestamp_ms).format("%H:%M:%S").to_string()
}

/// `DD-MM-YYYY HH:MM` in local time. Used by chat transcript lines.
pub fn date_time(timestamp_ms: i64) -> String {
    local(timestamp_ms).format("%d-%m-%Y %H:%M").to_string()
}

/// `DD_MM_YYYY_HH_MM.csv`, the export file name for a given instant.
pub fn export_file_name(timestamp_ms: i64) -> String {
    local(timestamp_ms).format("%d_%m_%Y_%H_%M.csv").to_string()
}
