//! HTML screens
//!
//! One handler per screen. Handlers render the embedded Tera templates with
//! the visitor's page variables; mutating screens take [`LoginRequired`] so
//! anonymous requests are sent to the login page first.
//!
//! [`LoginRequired`]: crate::api::middleware::LoginRequired

pub mod auth;
pub mod dashboard;
pub mod forms;
pub mod newspapers;
pub mod redactors;
pub mod topics;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tera::Context as TeraContext;

use crate::api::middleware::{AppState, Visitor};
use crate::models::{ListParams, PagedResult};
use crate::services::{
    DashboardServiceError, NewspaperServiceError, RedactorServiceError, SessionServiceError,
    TopicServiceError,
};

/// Build the router of every HTML screen
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        // Topics
        .route("/topics/", get(topics::list))
        .route("/topics/{id}/", get(topics::detail))
        .route("/topic_form/", get(topics::create_form).post(topics::create))
        .route("/topic_update/{id}/", get(topics::update_form).post(topics::update))
        .route("/topics/{id}/delete/", get(topics::delete_confirm).post(topics::delete))
        // Newspapers
        .route("/newspaper_list/", get(newspapers::list))
        .route("/newspapers/{id}/", get(newspapers::detail))
        .route("/newspaper_form/", get(newspapers::create_form).post(newspapers::create))
        .route(
            "/newspaper_update/{id}/",
            get(newspapers::update_form).post(newspapers::update),
        )
        .route(
            "/newspapers/{id}/delete/",
            get(newspapers::delete_confirm).post(newspapers::delete),
        )
        // Redactors
        .route("/redactors/", get(redactors::list))
        .route("/redactors/{id}/", get(redactors::detail))
        .route("/redactor_form/", get(redactors::create_form).post(redactors::create))
        .route(
            "/redactor_update/{id}/",
            get(redactors::update_form).post(redactors::update),
        )
        .route(
            "/redactors/{id}/delete/",
            get(redactors::delete_confirm).post(redactors::delete),
        )
        // Auth
        .route("/login/", get(auth::login_form).post(auth::login))
        .route("/logout/", get(auth::logout_confirm).post(auth::logout))
        .route("/register/", get(auth::register_form).post(auth::register))
        .fallback(not_found)
}

async fn not_found() -> ViewError {
    ViewError::NotFound
}

// ============================================================================
// Errors
// ============================================================================

/// Error of an HTML handler
///
/// The response carries an [`ErrorPage`] marker; [`render_error_pages`] swaps
/// the plain body for the themed error page.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("Not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Marker left on error responses for [`render_error_pages`]
#[derive(Debug, Clone, Copy)]
pub struct ErrorPage {
    pub status: StatusCode,
}

impl ErrorPage {
    fn message(&self) -> &'static str {
        if self.status == StatusCode::NOT_FOUND {
            "The requested page could not be found."
        } else {
            "Something went wrong on our side."
        }
    }
}

impl IntoResponse for ViewError {
    fn into_response(self) -> Response {
        let status = match &self {
            ViewError::NotFound => StatusCode::NOT_FOUND,
            ViewError::Internal(e) => {
                tracing::error!("Request failed: {:#}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let page = ErrorPage { status };

        let mut response = (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            page.message(),
        )
            .into_response();
        response.extensions_mut().insert(page);
        response
    }
}

impl From<TopicServiceError> for ViewError {
    fn from(e: TopicServiceError) -> Self {
        match e {
            TopicServiceError::NotFound(_) => Self::NotFound,
            TopicServiceError::ValidationError(errors) => {
                Self::Internal(anyhow::anyhow!("Unhandled validation error: {}", errors))
            }
            TopicServiceError::InternalError(e) => Self::Internal(e),
        }
    }
}

impl From<NewspaperServiceError> for ViewError {
    fn from(e: NewspaperServiceError) -> Self {
        match e {
            NewspaperServiceError::NotFound(_) => Self::NotFound,
            NewspaperServiceError::ValidationError(errors) => {
                Self::Internal(anyhow::anyhow!("Unhandled validation error: {}", errors))
            }
            NewspaperServiceError::InternalError(e) => Self::Internal(e),
        }
    }
}

impl From<RedactorServiceError> for ViewError {
    fn from(e: RedactorServiceError) -> Self {
        match e {
            RedactorServiceError::NotFound(_) => Self::NotFound,
            RedactorServiceError::InternalError(e) => Self::Internal(e),
            other => Self::Internal(anyhow::anyhow!("Unhandled redactor error: {}", other)),
        }
    }
}

impl From<SessionServiceError> for ViewError {
    fn from(e: SessionServiceError) -> Self {
        match e {
            SessionServiceError::InternalError(e) => Self::Internal(e),
        }
    }
}

impl From<DashboardServiceError> for ViewError {
    fn from(e: DashboardServiceError) -> Self {
        match e {
            DashboardServiceError::InternalError(e) => Self::Internal(e),
        }
    }
}

/// Error page middleware
///
/// Renders `error.html` for responses produced from a [`ViewError`].
pub async fn render_error_pages(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let mut visitor = request
        .extensions()
        .get::<Visitor>()
        .cloned()
        .unwrap_or_default();
    visitor.path = request.uri().path().to_string();

    let response = next.run(request).await;
    let Some(page) = response.extensions().get::<ErrorPage>().copied() else {
        return response;
    };

    let mut context = TeraContext::new();
    context.insert("status", &page.status.as_u16());
    context.insert("message", page.message());
    visitor.page().insert_into(&mut context);

    let html = state.templates.render_with_fallback("error.html", &context);
    (page.status, Html(html)).into_response()
}

// ============================================================================
// Helpers
// ============================================================================

/// Render a screen for the visitor
pub fn render(
    state: &AppState,
    visitor: &Visitor,
    template: &str,
    context: &TeraContext,
) -> Result<Html<String>, ViewError> {
    state
        .templates
        .render_page(template, context, &visitor.page())
        .map(Html)
        .map_err(ViewError::Internal)
}

/// Numeric path segment. Anything else is a missing page.
pub fn parse_id(raw: &str) -> Result<i64, ViewError> {
    raw.parse().map_err(|_| ViewError::NotFound)
}

/// `?page=N` of list screens
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    /// Blank or absent means the first page; anything but a positive
    /// integer is a missing page.
    pub fn params(&self, per_page: u32) -> Result<ListParams, ViewError> {
        let page = match self.page.as_deref().map(str::trim) {
            None | Some("") => 1,
            Some(raw) => match raw.parse::<u32>() {
                Ok(page) if page >= 1 => page,
                _ => return Err(ViewError::NotFound),
            },
        };
        Ok(ListParams::new(page, per_page))
    }
}

/// Pagination state exposed to templates as `page_obj`
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct PageObj {
    pub number: u32,
    pub total_pages: u32,
    pub has_prev: bool,
    pub has_next: bool,
    pub is_paginated: bool,
}

impl PageObj {
    /// A page past the end is a missing page
    pub fn of<T>(result: &PagedResult<T>) -> Result<Self, ViewError> {
        if result.is_out_of_range() {
            return Err(ViewError::NotFound);
        }
        Ok(Self {
            number: result.page,
            total_pages: result.total_pages().max(1),
            has_prev: result.has_prev(),
            has_next: result.has_next(),
            is_paginated: result.is_paginated(),
        })
    }
}
