//! Periodic re-evaluation of one gift-slot countdown.
//!
//! A ticker owns its interval; dropping the stream (for example when an SSE
//! client disconnects) releases the timer.

use chrono::{DateTime, Utc};
use futures::Stream;
use tokio::time::{Interval, MissedTickBehavior, interval};

use crate::gifts::status::{CooldownTracker, GiftSlotStatus, GiftSlotView};

struct TickState<C> {
    ticks: Interval,
    snapshot: Option<GiftSlotStatus>,
    tracker: CooldownTracker,
    clock: C,
    finished: bool,
}

/// Stream a fresh [`GiftSlotView`] on every tick of the tracker's precision.
///
/// The first view is produced immediately. The stream ends right after the
/// first view whose countdown can no longer change on its own.
pub fn countdown_stream<C>(
    snapshot: Option<GiftSlotStatus>,
    tracker: CooldownTracker,
    clock: C,
) -> impl Stream<Item = GiftSlotView>
where
    C: Fn() -> DateTime<Utc> + Send + 'static,
{
    let mut ticks = interval(tracker.precision().tick());
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let state = TickState {
        ticks,
        snapshot,
        tracker,
        clock,
        finished: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        if state.finished {
            return None;
        }
        state.ticks.tick().await;

        let view = state.tracker.view(state.snapshot.as_ref(), (state.clock)());
        state.finished = !view.running;
        Some((view, state))
    })
}
