//! Session Gate Middleware
//!
//! Axum middleware that resolves the visitor's credential, authorizes the
//! requested route and injects a [`SessionContext`] for downstream handlers.

use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::json;

use crate::auth::jwt::SessionClaims;
use crate::auth::models::SessionState;
use crate::auth::store::SessionSnapshot;
use crate::config::SessionConfig;
use crate::navigation::{Decision, authorize};
use crate::server::AppState;

/// Session of the current request, handed to handlers explicitly
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub credential: String,
    pub claims: Option<SessionClaims>,
    pub state: SessionState,
}

impl SessionContext {
    pub fn username(&self) -> Option<&str> {
        self.claims.as_ref().map(|c| c.username.as_str())
    }
}

/// Read the credential from `Authorization: Bearer` or the session cookie
pub fn extract_credential(headers: &HeaderMap, jar: &CookieJar, cookie_name: &str) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim().to_string())
        .or_else(|| jar.get(cookie_name).map(|c| c.value().to_string()))
        .filter(|token| !token.is_empty())
}

/// Cookie carrying a freshly issued session token
pub fn session_cookie(config: &SessionConfig, token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(config.cookie_name.clone(), token);
    cookie.set_http_only(true);
    cookie.set_secure(true);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_path("/");
    cookie.set_max_age(time::Duration::days(config.cookie_max_age_days));
    cookie
}

/// Drop the session cookie from the jar
pub fn clear_session_cookie(jar: CookieJar, config: &SessionConfig) -> CookieJar {
    let mut cookie = Cookie::new(config.cookie_name.clone(), "");
    cookie.set_path("/");
    jar.remove(cookie)
}

fn into_context(credential: Option<String>, snapshot: SessionSnapshot) -> Option<SessionContext> {
    credential.map(|credential| SessionContext {
        credential,
        claims: snapshot.claims,
        state: snapshot.state,
    })
}

/// Resolve the request's credential; a rejected one is removed from the jar
pub(crate) async fn resolve_request(
    state: &AppState,
    jar: CookieJar,
    headers: &HeaderMap,
) -> (CookieJar, Option<String>, SessionSnapshot) {
    let session = &state.config.session;
    let credential = extract_credential(headers, &jar, &session.cookie_name);
    let snapshot = state.sessions.resolve(credential.as_deref()).await;

    let jar = if snapshot.rejected {
        tracing::info!("[SessionGate] Clearing rejected session cookie");
        clear_session_cookie(jar, session)
    } else {
        jar
    };
    (jar, credential, snapshot)
}

pub struct SessionGate;

impl SessionGate {
    /// Gate for dashboard views: redirects, placeholders and 403s
    pub async fn pages(
        State(state): State<AppState>,
        jar: CookieJar,
        mut req: Request,
        next: Next,
    ) -> Response {
        let (jar, credential, snapshot) = resolve_request(&state, jar, req.headers()).await;
        let path = req.uri().path().to_string();

        match authorize(&path, &snapshot.state) {
            Decision::Allow => {
                if let Some(context) = into_context(credential, snapshot) {
                    req.extensions_mut().insert(context);
                }
                (jar, next.run(req).await).into_response()
            }
            Decision::Redirect(target) => {
                tracing::debug!("[SessionGate] {} -> {}", path, target);
                (jar, Redirect::to(target)).into_response()
            }
            Decision::Placeholder => {
                (jar, Json(json!({ "status": "redirecting" }))).into_response()
            }
            Decision::Forbidden => {
                tracing::warn!("[SessionGate] Non-admin session denied {}", path);
                (
                    StatusCode::FORBIDDEN,
                    jar,
                    Json(json!({ "error": "Admin access required" })),
                )
                    .into_response()
            }
        }
    }

    /// Gate for JSON endpoints: any authenticated session, 401 otherwise
    pub async fn api(
        State(state): State<AppState>,
        jar: CookieJar,
        mut req: Request,
        next: Next,
    ) -> Response {
        let (jar, credential, snapshot) = resolve_request(&state, jar, req.headers()).await;

        if !snapshot.state.is_authenticated() {
            return (
                StatusCode::UNAUTHORIZED,
                jar,
                Json(json!({ "error": "Not authenticated" })),
            )
                .into_response();
        }

        if let Some(context) = into_context(credential, snapshot) {
            req.extensions_mut().insert(context);
        }
        (jar, next.run(req).await).into_response()
    }
}
