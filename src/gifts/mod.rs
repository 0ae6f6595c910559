//! # Gift Slots Module
//!
//! Remaining gift allowance and cooldown countdowns for linked accounts.
//! Snapshots come from the backend; everything here is derived from them
//! and the current time.

pub mod countdown;
pub mod status;
pub mod ticker;

pub use countdown::Precision;
pub use status::{CooldownTracker, GiftSlotStatus, GiftSlotView};
