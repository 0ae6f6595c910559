//! Gift-slot snapshots and the display model derived from them.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::gifts::countdown::{Countdown, Precision, time_remaining};

const DEFAULT_MAX_GIFTS: u32 = 5;

/// Point-in-time gift usage of one linked account, as reported by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiftSlotStatus {
    pub remaining_gifts: u32,
    #[serde(default = "default_max_gifts")]
    pub max_gifts: u32,
    #[serde(default)]
    pub used_gifts: u32,
    #[serde(default, alias = "next_available_slot")]
    pub next_slot_available: Option<String>,
    #[serde(default)]
    pub time_until_next_slot: Option<String>,
}

fn default_max_gifts() -> u32 {
    DEFAULT_MAX_GIFTS
}

impl GiftSlotStatus {
    /// Read a snapshot out of an arbitrary JSON value, `None` when malformed
    pub fn from_value(value: Value) -> Option<Self> {
        match serde_json::from_value(value) {
            Ok(status) => Some(status),
            Err(e) => {
                tracing::warn!("[GiftSlots] Ignoring malformed gift-slot snapshot: {}", e);
                None
            }
        }
    }
}

/// Deserialize an optional snapshot, turning malformed input into `None`
pub(crate) fn lenient_snapshot<'de, D>(deserializer: D) -> Result<Option<GiftSlotStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.filter(|v| !v.is_null()).and_then(GiftSlotStatus::from_value))
}

/// True iff the account can send a gift right now
pub fn is_available(snapshot: Option<&GiftSlotStatus>) -> bool {
    snapshot.is_some_and(|s| s.remaining_gifts > 0)
}

/// Fill level for the allowance bar; not clamped, the backend owns the range
pub fn progress(snapshot: &GiftSlotStatus) -> f64 {
    if snapshot.max_gifts == 0 {
        return 0.0;
    }
    f64::from(snapshot.remaining_gifts) / f64::from(snapshot.max_gifts)
}

/// Rendered gift-slot state for one account
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftSlotView {
    /// `remaining/max`, or `-` without a snapshot
    pub summary: String,
    pub remaining_gifts: Option<u32>,
    pub max_gifts: Option<u32>,
    pub used_gifts: Option<u32>,
    pub is_available: bool,
    pub progress: f64,
    /// Countdown text, empty when there is nothing to count down
    pub countdown: String,
    /// Whether the dashboard should show the countdown row
    pub show_countdown: bool,
    /// The countdown will keep changing without a new snapshot
    pub running: bool,
}

/// Derives [`GiftSlotView`]s from snapshots
#[derive(Debug, Clone, Copy)]
pub struct CooldownTracker {
    fallback: Duration,
    precision: Precision,
}

impl CooldownTracker {
    pub const fn new(fallback: Duration, precision: Precision) -> Self {
        Self { fallback, precision }
    }

    pub const fn with_precision(self, precision: Precision) -> Self {
        Self { precision, ..self }
    }

    pub const fn precision(&self) -> Precision {
        self.precision
    }

    pub fn countdown(&self, snapshot: Option<&GiftSlotStatus>, now: DateTime<Utc>) -> Countdown {
        time_remaining(snapshot, now, self.fallback)
    }

    pub fn view(&self, snapshot: Option<&GiftSlotStatus>, now: DateTime<Utc>) -> GiftSlotView {
        let countdown = self.countdown(snapshot, now);
        let Some(status) = snapshot else {
            return GiftSlotView {
                summary: "-".to_string(),
                remaining_gifts: None,
                max_gifts: None,
                used_gifts: None,
                is_available: false,
                progress: 0.0,
                countdown: String::new(),
                show_countdown: false,
                running: false,
            };
        };

        GiftSlotView {
            summary: format!("{}/{}", status.remaining_gifts, status.max_gifts),
            remaining_gifts: Some(status.remaining_gifts),
            max_gifts: Some(status.max_gifts),
            used_gifts: Some(status.used_gifts),
            is_available: is_available(snapshot),
            progress: progress(status),
            show_countdown: status.remaining_gifts < status.max_gifts
                && countdown != Countdown::Empty,
            countdown: countdown.render(self.precision),
            running: countdown.is_running(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tracker() -> CooldownTracker {
        CooldownTracker::new(Duration::from_secs(24 * 3600), Precision::Coarse)
    }

    #[test]
    fn full_allowance_renders_no_countdown() {
        let status = GiftSlotStatus {
            remaining_gifts: 5,
            max_gifts: 5,
            used_gifts: 0,
            next_slot_available: None,
            time_until_next_slot: None,
        };
        let view = tracker().view(Some(&status), Utc::now());
        assert!(view.is_available);
        assert!(!view.show_countdown);
        assert_eq!(view.countdown, "");
        assert_eq!(view.summary, "5/5");
        assert_eq!(view.progress, 1.0);
    }

    #[test]
    fn exhausted_allowance_counts_down() {
        let now = Utc::now();
        let status = GiftSlotStatus {
            remaining_gifts: 0,
            max_gifts: 5,
            used_gifts: 5,
            next_slot_available: Some((now + chrono::Duration::seconds(3661)).to_rfc3339()),
            time_until_next_slot: None,
        };
        let view = tracker().view(Some(&status), now);
        assert!(!view.is_available);
        assert!(view.show_countdown);
        assert!(view.running);
        assert_eq!(view.countdown, "1h 1m");
        assert_eq!(view.progress, 0.0);
    }

    #[test]
    fn missing_snapshot_renders_placeholder() {
        let view = tracker().view(None, Utc::now());
        assert_eq!(view.summary, "-");
        assert!(!view.is_available);
        assert!(!view.show_countdown);
        assert!(!is_available(None));
    }

    #[test]
    fn progress_is_not_clamped() {
        let status = GiftSlotStatus {
            remaining_gifts: 6,
            max_gifts: 5,
            used_gifts: 0,
            next_slot_available: None,
            time_until_next_slot: None,
        };
        assert!(progress(&status) > 1.0);

        let zero_max = GiftSlotStatus { max_gifts: 0, ..status };
        assert_eq!(progress(&zero_max), 0.0);
    }

    #[test]
    fn accepts_single_account_endpoint_shape() {
        let status = GiftSlotStatus::from_value(json!({
            "account_id": "a1",
            "remaining_gifts": 2,
            "used_gifts": 3,
            "next_available_slot": "2030-01-01T00:00:00Z",
            "is_available": true
        }))
        .unwrap();
        assert_eq!(status.max_gifts, 5);
        assert_eq!(status.next_slot_available.as_deref(), Some("2030-01-01T00:00:00Z"));
    }

    #[test]
    fn malformed_snapshot_is_dropped() {
        assert_eq!(GiftSlotStatus::from_value(json!({ "remaining_gifts": -1 })), None);
        assert_eq!(GiftSlotStatus::from_value(json!("five")), None);
    }
}
