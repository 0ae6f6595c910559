//! Dashboard pages. Every handler here runs behind the page gate, which
//! has already decided the visitor may see the page.

use axum::{
    Extension, Json,
    extract::State,
    http::{StatusCode, Uri},
    response::IntoResponse,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use crate::auth::SessionContext;
use crate::backend::models::{GameAccount, OperatorUser, Transaction};
use crate::gifts::{CooldownTracker, GiftSlotView};
use crate::navigation::{NavItem, navigation};
use crate::routes::ApiError;
use crate::server::AppState;

/// Envelope shared by all dashboard pages
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub view: String,
    pub navigation: Vec<NavItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub data: T,
}

impl<T> Page<T> {
    fn new(uri: &Uri, session: &SessionContext, data: T) -> Self {
        Self {
            view: uri.path().trim_start_matches('/').to_string(),
            navigation: navigation(&session.state),
            username: session.username().map(str::to_string),
            data,
        }
    }
}

/// A linked account with its rendered gift slot
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRow {
    #[serde(flatten)]
    pub account: GameAccount,
    pub gift_slot: GiftSlotView,
}

fn account_rows(accounts: Vec<GameAccount>, tracker: &CooldownTracker) -> Vec<AccountRow> {
    let now = Utc::now();
    accounts
        .into_iter()
        .map(|account| {
            let gift_slot = tracker.view(account.gift_slot_status.as_ref(), now);
            AccountRow { account, gift_slot }
        })
        .collect()
}

/// Login view, only reached without a session
pub async fn login_view() -> Json<serde_json::Value> {
    Json(json!({ "view": "login", "navigation": [] }))
}

/// `/gifts` and `/fortniteaccounts`
pub async fn own_accounts(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    uri: Uri,
) -> Result<Json<Page<Vec<AccountRow>>>, ApiError> {
    let accounts = state.backend.own_accounts(&session.credential).await?;
    let rows = account_rows(accounts, &state.gifts);
    Ok(Json(Page::new(&uri, &session, rows)))
}

/// `/fortniteadminaccounts`
pub async fn all_accounts(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    uri: Uri,
) -> Result<Json<Page<Vec<AccountRow>>>, ApiError> {
    let accounts = state.backend.all_accounts(&session.credential).await?;
    let rows = account_rows(accounts, &state.gifts);
    Ok(Json(Page::new(&uri, &session, rows)))
}

/// `/transactionshistory` and `/transactionsadminhistory`
pub async fn transactions(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    uri: Uri,
) -> Result<Json<Page<Vec<Transaction>>>, ApiError> {
    let transactions = state.backend.transactions(&session.credential).await?;
    Ok(Json(Page::new(&uri, &session, transactions)))
}

/// `/usersadminaccounts`
pub async fn operator_users(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    uri: Uri,
) -> Result<Json<Page<Vec<OperatorUser>>>, ApiError> {
    let users = state.backend.operator_users(&session.credential).await?;
    Ok(Json(Page::new(&uri, &session, users)))
}

/// Gated fallback for paths without a page
pub async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("No page at {}", uri.path()) })),
    )
}
