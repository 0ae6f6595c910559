//! Auth routes for login, logout and session state

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{
        IntoResponse, Redirect, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use axum_extra::extract::cookie::CookieJar;
use futures::{Stream, StreamExt};
use serde::Serialize;
use serde_json::json;

use crate::auth::jwt::SessionClaims;
use crate::auth::middleware::{
    clear_session_cookie, extract_credential, resolve_request, session_cookie,
};
use crate::auth::models::{LoginRequest, SessionState};
use crate::auth::store::SessionSnapshot;
use crate::navigation::{FALLBACK_PATH, NavItem, navigation};
use crate::routes::ApiError;
use crate::server::AppState;

/// Session as rendered to the dashboard shell
#[derive(Debug, Serialize)]
pub struct SessionBody {
    pub session: SessionState,
    pub navigation: Vec<NavItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl SessionBody {
    pub fn new(state: SessionState, claims: Option<&SessionClaims>) -> Self {
        Self {
            session: state,
            navigation: navigation(&state),
            username: claims
                .filter(|_| state.is_authenticated())
                .map(|c| c.username.clone())
                .filter(|name| !name.is_empty()),
        }
    }

    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Self {
        Self::new(snapshot.state, snapshot.claims.as_ref())
    }
}

fn refused(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Exchange operator credentials for a session cookie.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let username = payload.username.trim();
    if username.is_empty() || payload.password.is_empty() {
        return Ok(refused(StatusCode::BAD_REQUEST, "Username and password are required"));
    }

    let Some(token) = state.backend.login(username, &payload.password).await? else {
        tracing::info!("[Auth] Login refused for {}", username);
        return Ok(refused(StatusCode::UNAUTHORIZED, "Invalid username or password"));
    };

    let snapshot = state.sessions.login(&token).await;
    if !snapshot.state.is_authenticated() {
        tracing::warn!("[Auth] Freshly issued token for {} was not accepted", username);
        let jar = clear_session_cookie(jar, &state.config.session);
        return Ok((jar, refused(StatusCode::UNAUTHORIZED, "Session could not be verified"))
            .into_response());
    }

    tracing::info!("[Auth] {} logged in", username);
    let jar = jar.add(session_cookie(&state.config.session, token));
    Ok((jar, Json(SessionBody::from_snapshot(&snapshot))).into_response())
}

/// Drop the request's credential, notify its subscribers and clear the cookie
fn end_session(state: &AppState, jar: CookieJar, headers: &HeaderMap) -> CookieJar {
    if let Some(token) = extract_credential(headers, &jar, &state.config.session.cookie_name) {
        state.sessions.logout(&token);
    }
    clear_session_cookie(jar, &state.config.session)
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> impl IntoResponse {
    let jar = end_session(&state, jar, &headers);
    (jar, Json(SessionBody::new(SessionState::UNAUTHENTICATED, None)))
}

/// `/logout` page: end the session and return to the login view
pub async fn logout_page(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> impl IntoResponse {
    let jar = end_session(&state, jar, &headers);
    (jar, Redirect::to(FALLBACK_PATH))
}

/// Current session with the navigation it unlocks
pub async fn session(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> impl IntoResponse {
    let (jar, _, snapshot) = resolve_request(&state, jar, &headers).await;
    (jar, Json(SessionBody::from_snapshot(&snapshot)))
}

/// Server-sent session changes for the request's credential.
///
/// The current state is sent first. The stream ends once the session is
/// gone (logout from any tab, or rejection). A rejected credential gets a
/// 401 and its cookie is cleared.
pub async fn session_events(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<(CookieJar, Sse<impl Stream<Item = Result<Event, axum::Error>>>), Response> {
    let Some(token) = extract_credential(&headers, &jar, &state.config.session.cookie_name) else {
        return Err(refused(StatusCode::UNAUTHORIZED, "Not authenticated"));
    };

    let subscription = state.sessions.subscribe(&token).await;
    if !subscription.initial().state.is_authenticated() {
        let jar = if subscription.initial().rejected {
            tracing::info!("[Auth] Clearing rejected session cookie");
            clear_session_cookie(jar, &state.config.session)
        } else {
            jar
        };
        return Err((jar, refused(StatusCode::UNAUTHORIZED, "Not authenticated")).into_response());
    }

    let events = subscription.map(|snapshot| {
        Event::default()
            .event("session")
            .json_data(SessionBody::from_snapshot(&snapshot))
    });
    Ok((jar, Sse::new(events).keep_alive(KeepAlive::default())))
}
