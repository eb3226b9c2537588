use chrono::{DateTime, SecondsFormat, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Timestamp format written into sheet cells (`2024-05-01T12:00:00.000Z`).
pub fn now_iso() -> String {
    to_iso(now())
}

pub fn to_iso(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn iso_timestamps_use_millis_and_z() {
        let dt = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(to_iso(dt), "2024-05-01T12:00:00.000Z");
    }
}
