use chrono::{DateTime, Duration, Utc};

pub trait Truncate {
    fn truncate_to_seconds(&self) -> Duration;
}

impl Truncate for Duration {
    fn truncate_to_seconds(&self) -> Duration {
        Duration::seconds(self.num_seconds())
    }
}

/// Human readable time between `start` and `now`, e.g. `2h 3m 7s`.
pub fn format_uptime(start: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = (now - start).truncate_to_seconds().to_std().unwrap_or_default();
    humantime::format_duration(elapsed).to_string()
}
