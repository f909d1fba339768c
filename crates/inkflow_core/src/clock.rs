//! Wall-clock helpers shared by storage and backup code.

use chrono::{SecondsFormat, Utc};

/// Current time in Unix epoch milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Current time as an ISO-8601 UTC string with millisecond precision,
/// e.g. `2024-05-01T09:30:00.000Z`.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::{now_iso8601, now_ms};

    #[test]
    fn iso_timestamp_is_utc_with_millis() {
        let value = now_iso8601();
        assert!(value.ends_with('Z'));
        assert_eq!(value.len(), "2024-05-01T09:30:00.000Z".len());
    }

    #[test]
    fn epoch_millis_is_positive() {
        assert!(now_ms() > 0);
    }
}
