//! Login, logout and registration screens

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Form,
};
use serde::Deserialize;
use tera::Context as TeraContext;

use crate::api::middleware::{
    clear_session_cookie, found, session_cookie, with_cookie, AppState, Visitor,
};
use crate::services::validation::{self, FieldErrors};
use crate::services::RedactorServiceError;
use crate::views::forms::{safe_next, FormData, LoginForm, RedactorForm};
use crate::views::redactors::{form_page, register_redactor};
use crate::views::{render, ViewError};

const REGISTER_TEMPLATE: &str = "registration/register.html";

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    #[serde(default)]
    pub next: String,
}

fn login_page(
    state: &AppState,
    visitor: &Visitor,
    form: &LoginForm,
    errors: &FieldErrors,
) -> Result<Response, ViewError> {
    let mut context = TeraContext::new();
    context.insert("form", form);
    context.insert("errors", errors);
    context.insert("next", &form.next);
    Ok(render(state, visitor, "registration/login.html", &context)?.into_response())
}

/// GET /login/
pub async fn login_form(
    State(state): State<AppState>,
    visitor: Visitor,
    Query(query): Query<NextQuery>,
) -> Result<Response, ViewError> {
    let form = LoginForm {
        next: query.next,
        ..LoginForm::default()
    };
    login_page(&state, &visitor, &form, &FieldErrors::new())
}

/// POST /login/
///
/// Swaps the session token for a fresh one bound to the redactor, then
/// redirects to `next` when it is a local path.
pub async fn login(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, ViewError> {
    let form = LoginForm::from_data(&FormData::from(pairs));
    if let Err(errors) = form.clean() {
        return login_page(&state, &visitor, &form, &errors);
    }

    let redactor = match state
        .redactor_service
        .authenticate(&form.username, &form.password)
        .await
    {
        Ok(redactor) => redactor,
        Err(RedactorServiceError::InvalidCredentials) => {
            let errors = FieldErrors::single(FieldErrors::NON_FIELD, validation::INVALID_LOGIN);
            return login_page(&state, &visitor, &form, &errors);
        }
        Err(e) => return Err(e.into()),
    };

    let session = state
        .session_service
        .login(visitor.session.as_ref(), redactor.id)
        .await?;
    state.redactor_service.record_login(redactor.id).await?;

    let target = safe_next(&form.next).unwrap_or("/");
    Ok(with_cookie(
        found(target),
        session_cookie(state.cookie_name(), &session),
    ))
}

/// GET /logout/ - Confirmation page
pub async fn logout_confirm(
    State(state): State<AppState>,
    visitor: Visitor,
) -> Result<Response, ViewError> {
    Ok(render(&state, &visitor, "registration/logout.html", &TeraContext::new())?.into_response())
}

/// POST /logout/
pub async fn logout(
    State(state): State<AppState>,
    visitor: Visitor,
) -> Result<Response, ViewError> {
    if let Some(session) = &visitor.session {
        state.session_service.logout(&session.id).await?;
        if let Some(id) = session.redactor_id {
            tracing::info!(redactor_id = id, "Redactor logged out");
        }
    }

    // The page itself is rendered for an anonymous visitor
    let anonymous = Visitor {
        path: visitor.path.clone(),
        ..Visitor::default()
    };
    let html = render(&state, &anonymous, "registration/logged_out.html", &TeraContext::new())?;
    Ok(with_cookie(
        html.into_response(),
        clear_session_cookie(state.cookie_name()),
    ))
}

/// GET /register/
pub async fn register_form(
    State(state): State<AppState>,
    visitor: Visitor,
) -> Result<Response, ViewError> {
    form_page(
        &state,
        &visitor,
        REGISTER_TEMPLATE,
        &RedactorForm::default(),
        &FieldErrors::new(),
        None,
    )
}

/// POST /register/
pub async fn register(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, ViewError> {
    let form = RedactorForm::from_data(&FormData::from(pairs));
    match register_redactor(&state, &form).await? {
        None => Ok(found("/login/")),
        Some(errors) => form_page(&state, &visitor, REGISTER_TEMPLATE, &form, &errors, None),
    }
}
