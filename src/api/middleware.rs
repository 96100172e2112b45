//! Shared request plumbing
//!
//! Contains:
//! - `AppState`, the services handed to every handler
//! - `ApiError`, the JSON error body of the `/api/v1` surface
//! - The session loader middleware and the `Visitor` / `LoginRequired`
//!   extractors built on it
//! - Session cookie helpers

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;

use crate::config::Config;
use crate::db::repositories::{
    SqlxNewspaperRepository, SqlxRedactorRepository, SqlxSessionRepository, SqlxTopicRepository,
};
use crate::db::DynDatabasePool;
use crate::models::{Redactor, Session};
use crate::services::{
    DashboardService, DashboardServiceError, NewspaperService, NewspaperServiceError,
    RedactorService, RedactorServiceError, SessionService, TopicService,
    TopicServiceError,
};
use crate::templates::{CurrentRedactor, PageContext, TemplateEngine};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub topic_service: Arc<TopicService>,
    pub redactor_service: Arc<RedactorService>,
    pub newspaper_service: Arc<NewspaperService>,
    pub session_service: Arc<SessionService>,
    pub dashboard_service: Arc<DashboardService>,
    pub templates: Arc<TemplateEngine>,
}

impl AppState {
    /// Wire repositories, services and templates over one pool
    pub fn new(pool: DynDatabasePool, config: Config) -> anyhow::Result<Self> {
        let topic_repo = SqlxTopicRepository::boxed(pool.clone());
        let redactor_repo = SqlxRedactorRepository::boxed(pool.clone());
        let newspaper_repo = SqlxNewspaperRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool);

        Ok(Self {
            topic_service: Arc::new(TopicService::new(topic_repo.clone())),
            redactor_service: Arc::new(RedactorService::new(redactor_repo.clone())),
            newspaper_service: Arc::new(NewspaperService::new(
                newspaper_repo.clone(),
                topic_repo.clone(),
                redactor_repo.clone(),
            )),
            session_service: Arc::new(SessionService::with_expiration(
                session_repo,
                config.session.expiration_days,
            )),
            dashboard_service: Arc::new(DashboardService::new(
                topic_repo,
                redactor_repo,
                newspaper_repo,
            )),
            templates: Arc::new(TemplateEngine::new()?),
            config: Arc::new(config),
        })
    }

    pub fn per_page(&self) -> u32 {
        self.config.pagination.per_page
    }

    pub fn cookie_name(&self) -> &str {
        &self.config.session.cookie_name
    }
}

// ============================================================================
// JSON errors
// ============================================================================

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    /// Logs the cause and returns a generic message
    pub fn internal_error(cause: impl std::fmt::Display) -> Self {
        tracing::error!("API request failed: {}", cause);
        Self::new("INTERNAL_ERROR", "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "BAD_REQUEST" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<TopicServiceError> for ApiError {
    fn from(e: TopicServiceError) -> Self {
        match e {
            TopicServiceError::NotFound(id) => Self::not_found(format!("Topic {} not found", id)),
            TopicServiceError::ValidationError(errors) => Self::bad_request(errors.to_string()),
            TopicServiceError::InternalError(e) => Self::internal_error(e),
        }
    }
}

impl From<RedactorServiceError> for ApiError {
    fn from(e: RedactorServiceError) -> Self {
        match e {
            RedactorServiceError::NotFound(id) => {
                Self::not_found(format!("Redactor {} not found", id))
            }
            RedactorServiceError::ValidationError(errors) => Self::bad_request(errors.to_string()),
            RedactorServiceError::InvalidCredentials => Self::bad_request("Invalid credentials"),
            RedactorServiceError::InternalError(e) => Self::internal_error(e),
        }
    }
}

impl From<NewspaperServiceError> for ApiError {
    fn from(e: NewspaperServiceError) -> Self {
        match e {
            NewspaperServiceError::NotFound(id) => {
                Self::not_found(format!("Newspaper {} not found", id))
            }
            NewspaperServiceError::ValidationError(errors) => Self::bad_request(errors.to_string()),
            NewspaperServiceError::InternalError(e) => Self::internal_error(e),
        }
    }
}

impl From<DashboardServiceError> for ApiError {
    fn from(e: DashboardServiceError) -> Self {
        match e {
            DashboardServiceError::InternalError(e) => Self::internal_error(e),
        }
    }
}

// ============================================================================
// Sessions
// ============================================================================

/// The visitor behind a request: their session and, once logged in, their
/// redactor account. Filled in by [`load_session`].
#[derive(Debug, Clone, Default)]
pub struct Visitor {
    pub session: Option<Session>,
    pub redactor: Option<Redactor>,
    /// Path and query of the request
    pub path: String,
}

impl Visitor {
    pub fn is_authenticated(&self) -> bool {
        self.redactor.is_some()
    }

    /// Template variables for this visitor
    pub fn page(&self) -> PageContext {
        PageContext::new(self.path.clone()).with_redactor(self.redactor.as_ref().map(|r| {
            CurrentRedactor {
                id: r.id,
                username: r.username.clone(),
            }
        }))
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Visitor {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let mut visitor = parts.extensions.get::<Visitor>().cloned().unwrap_or_default();
        visitor.path = request_path(parts);
        Ok(visitor)
    }
}

/// A logged-in redactor. Anonymous requests are redirected to the login
/// screen with the current path as `next`.
#[derive(Debug, Clone)]
pub struct LoginRequired(pub Visitor);

impl<S: Send + Sync> FromRequestParts<S> for LoginRequired {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let visitor = match Visitor::from_request_parts(parts, state).await {
            Ok(visitor) => visitor,
            Err(never) => match never {},
        };
        if visitor.is_authenticated() {
            Ok(Self(visitor))
        } else {
            tracing::debug!(path = %visitor.path, "Anonymous request to protected screen");
            Err(found(&login_url(&visitor.path)))
        }
    }
}

fn request_path(parts: &Parts) -> String {
    parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string())
}

/// `/login/?next=...`, keeping slashes readable
pub fn login_url(next: &str) -> String {
    format!(
        "/login/?next={}",
        urlencoding::encode(next).replace("%2F", "/")
    )
}

/// 302 redirect
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Session loader middleware
///
/// Resolves the session cookie and the redactor it is bound to. Unknown or
/// expired tokens leave the visitor anonymous.
pub async fn load_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let mut visitor = Visitor::default();

    if let Some(token) = session_token(request.headers(), state.cookie_name()) {
        match resolve_visitor(&state, &token).await {
            Ok(resolved) => visitor = resolved,
            Err(e) => tracing::warn!("Failed to load session: {}", e),
        }
    }

    request.extensions_mut().insert(visitor);
    next.run(request).await
}

async fn resolve_visitor(state: &AppState, token: &str) -> anyhow::Result<Visitor> {
    let Some(session) = state.session_service.resolve(token).await? else {
        return Ok(Visitor::default());
    };

    let redactor = match session.redactor_id {
        Some(id) => state.redactor_service.find(id).await?,
        None => None,
    };

    Ok(Visitor {
        session: Some(session),
        redactor,
        path: String::new(),
    })
}

/// Extract the session token from the `Cookie` header
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` value binding the browser to a session
pub fn session_cookie(cookie_name: &str, session: &Session) -> Option<HeaderValue> {
    let max_age = (session.expires_at - chrono::Utc::now()).num_seconds().max(0);
    HeaderValue::from_str(&format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        cookie_name, session.id, max_age
    ))
    .ok()
}

/// `Set-Cookie` value removing the session cookie
pub fn clear_session_cookie(cookie_name: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        cookie_name
    ))
    .ok()
}

/// Attach a `Set-Cookie` header to a response
pub fn with_cookie(mut response: Response, cookie: Option<HeaderValue>) -> Response {
    if let Some(cookie) = cookie {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    response
}
