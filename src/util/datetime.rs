use chrono::Local;

/// Current local time in ISO 8601 form with microseconds,
/// e.g. "2026-08-25T14:30:00.123456". Downstream consumers read this
/// format from the raw payload, the data timestamp header and the csv
/// last update column.
pub fn now_iso8601() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Current local time packed for filenames, e.g. "20260825_143000".
pub fn filename_timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}
