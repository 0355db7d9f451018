//! HTTP handlers for the flow endpoints.

use axum::{
    Form, Router,
    extract::{Path, State, rejection::FormRejection},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;
use std::time::Duration;
use time::Duration as TimeDuration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use super::{
    AppState,
    flow::{AuthenticateParams, CallbackParams},
};
use crate::error::FlowError;
use crate::template::CALLBACK_SUCCESS_PAGE;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "token_bridge_session";

/// Builds the router. Flow routes are nested under `base_path`; `/health`
/// stays at the root.
pub fn router(state: Arc<AppState>, base_path: &str) -> Router {
    let flows: Router<Arc<AppState>> = Router::new()
        .route(
            "/{provider}/authenticate",
            get(authenticate).post(authenticate),
        )
        .route("/{provider}/callback", get(callback).post(callback))
        .route("/callback_success", get(callback_success));

    let app = if base_path.is_empty() {
        flows
    } else {
        Router::new().nest(base_path, flows)
    };

    app.route("/health", get(health)).with_state(state)
}

/// Adds request tracing and a timeout answering `408 Request Timeout`.
pub fn with_middleware(app: Router, request_timeout: Duration) -> Router {
    app.layer(TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        request_timeout,
    ))
    .layer(TraceLayer::new_for_http())
}

/// Starts a flow and answers with the redirect notice page.
///
/// Parameters come from the query string on GET and the form body on POST.
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    jar: CookieJar,
    headers: HeaderMap,
    params: Result<Form<AuthenticateParams>, FormRejection>,
) -> Result<impl IntoResponse, FlowError> {
    let provider = state.provider(&provider)?;
    let Form(params) = params.map_err(invalid_request)?;
    let session = state.controller.session(session_cookie(&jar)).await?;
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let notice = state
        .controller
        .initiate(provider, &session, &params, authorization)
        .await?;

    let cookie = Cookie::build((SESSION_COOKIE, session.as_str().to_string()))
        .path("/")
        .http_only(true)
        .secure(state.session_config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::minutes(state.session_config.ttl_minutes));

    Ok((jar.add(cookie), Html(notice.page)))
}

/// Completes a flow and redirects the browser.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    jar: CookieJar,
    params: Result<Form<CallbackParams>, FormRejection>,
) -> Result<Response, FlowError> {
    let provider = state.provider(&provider)?;
    let Form(params) = params.map_err(invalid_request)?;
    // Without a live session no flow can match; a fresh one makes that a 401.
    let session = state.controller.session(session_cookie(&jar)).await?;

    let location = state.controller.finish(provider, &session, &params).await?;

    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

/// Default landing page after a completed flow.
pub async fn callback_success() -> Html<&'static str> {
    Html(CALLBACK_SUCCESS_PAGE)
}

pub async fn health() -> &'static str {
    "ok"
}

fn session_cookie(jar: &CookieJar) -> Option<&str> {
    jar.get(SESSION_COOKIE).map(|cookie| cookie.value())
}

fn invalid_request(rejection: FormRejection) -> FlowError {
    FlowError::InvalidRequest {
        details: rejection.body_text(),
    }
}
