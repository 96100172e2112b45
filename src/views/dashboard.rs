//! Home page

use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use tera::Context as TeraContext;

use crate::api::middleware::{session_cookie, with_cookie, AppState, Visitor};
use crate::views::{render, ViewError};

/// GET / - Record counts, the visit counter and a few random newspapers
///
/// A first-time visitor gets a session here so the counter can start.
pub async fn index(State(state): State<AppState>, visitor: Visitor) -> Result<Response, ViewError> {
    let (session, cookie) = match &visitor.session {
        Some(session) => (session.clone(), None),
        None => {
            let session = state.session_service.start().await?;
            let cookie = session_cookie(state.cookie_name(), &session);
            (session, cookie)
        }
    };

    let num_visits = state.session_service.record_visit(&session.id).await?;
    let dashboard = state.dashboard_service.overview().await?;

    let mut context = TeraContext::new();
    context.insert("num_topics", &dashboard.stats.num_topics);
    context.insert("num_redactors", &dashboard.stats.num_redactors);
    context.insert("num_newspapers", &dashboard.stats.num_newspapers);
    context.insert("num_visits", &num_visits);
    context.insert("random_newspapers", &dashboard.random_newspapers);

    let html = render(&state, &visitor, "newspaper_agency/index.html", &context)?;
    Ok(with_cookie(html.into_response(), cookie))
}
