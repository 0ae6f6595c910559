//! Countdown to the next gift-slot replenishment.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::gifts::status::GiftSlotStatus;

/// Display density of a countdown, which also fixes its refresh tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// Hours and minutes, refreshed every minute
    #[default]
    Coarse,
    /// Hours, minutes and seconds, refreshed every second
    Fine,
}

impl Precision {
    pub const fn tick(self) -> Duration {
        match self {
            Precision::Coarse => Duration::from_secs(60),
            Precision::Fine => Duration::from_secs(1),
        }
    }
}

/// Time left until the next gift slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    /// No snapshot, or nothing to wait for
    Empty,
    AvailableNow,
    /// Gifts were used but the backend gave no next-slot time
    Fallback(Duration),
    Remaining(Duration),
}

impl Countdown {
    /// Whether the value can still change without a new snapshot
    pub const fn is_running(&self) -> bool {
        matches!(self, Countdown::Remaining(_))
    }

    pub fn render(&self, precision: Precision) -> String {
        match self {
            Countdown::Empty => String::new(),
            Countdown::AvailableNow => "available now".to_string(),
            Countdown::Fallback(placeholder) => format!("{}h", placeholder.as_secs() / 3600),
            Countdown::Remaining(left) => format_remaining(*left, precision),
        }
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(Precision::Coarse))
    }
}

/// Compute the countdown for `snapshot` as seen at `now`.
///
/// An unparseable `next_slot_available` is treated as `now`.
pub fn time_remaining(
    snapshot: Option<&GiftSlotStatus>,
    now: DateTime<Utc>,
    fallback: Duration,
) -> Countdown {
    let Some(snapshot) = snapshot else {
        return Countdown::Empty;
    };

    let Some(raw) = snapshot.next_slot_available.as_deref() else {
        if snapshot.used_gifts > 0 {
            return Countdown::Fallback(fallback);
        }
        return Countdown::Empty;
    };

    let next = match parse_timestamp(raw) {
        Some(next) => next,
        None => {
            tracing::warn!("[Cooldown] Unparseable next_slot_available {:?}, treating as now", raw);
            now
        }
    };

    match (next - now).to_std() {
        Ok(left) if !left.is_zero() => Countdown::Remaining(left),
        _ => Countdown::AvailableNow,
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    // Some backends drop the offset; read those as UTC
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Floor-format a remaining duration, dropping leading zero units
fn format_remaining(left: Duration, precision: Precision) -> String {
    let total = left.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    match precision {
        Precision::Coarse => {
            if hours > 0 {
                format!("{}h {}m", hours, minutes)
            } else if minutes > 0 {
                format!("{}m", minutes)
            } else {
                "<1m".to_string()
            }
        }
        Precision::Fine => {
            if hours > 0 {
                format!("{}h {}m {}s", hours, minutes, seconds)
            } else if minutes > 0 {
                format!("{}m {}s", minutes, seconds)
            } else {
                format!("{}s", seconds)
            }
        }
    }
}
