//! Gift-slot routes: one-off views and live countdowns per linked account

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use chrono::Utc;
use futures::{Stream, StreamExt};
use serde::Deserialize;

use crate::auth::middleware::SessionContext;
use crate::gifts::ticker::countdown_stream;
use crate::gifts::{GiftSlotView, Precision};
use crate::routes::ApiError;
use crate::server::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CountdownQuery {
    #[serde(default)]
    pub precision: Precision,
}

/// Current gift-slot view of one account
pub async fn gift_slot(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(account_id): Path<String>,
) -> Result<Json<GiftSlotView>, ApiError> {
    let snapshot = state
        .backend
        .gift_slot_status(&session.credential, &account_id)
        .await?;
    Ok(Json(state.gifts.view(snapshot.as_ref(), Utc::now())))
}

/// Countdown for one account, re-rendered on every tick of the requested
/// precision until it reaches a terminal value.
pub async fn countdown(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(account_id): Path<String>,
    Query(query): Query<CountdownQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let snapshot = state
        .backend
        .gift_slot_status(&session.credential, &account_id)
        .await?;
    tracing::debug!(
        "[GiftSlots] Countdown for {} at {:?} precision",
        account_id,
        query.precision
    );

    let tracker = state.gifts.with_precision(query.precision);
    let events = countdown_stream(snapshot, tracker, Utc::now)
        .map(|view| Event::default().event("countdown").json_data(view));
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
