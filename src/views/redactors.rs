//! Redactor screens

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Form,
};
use tera::Context as TeraContext;

use crate::api::middleware::{found, AppState, LoginRequired, Visitor};
use crate::services::{FieldErrors, RedactorServiceError};
use crate::views::forms::{FormData, RedactorForm};
use crate::views::{parse_id, render, PageObj, PageQuery, ViewError};

const LIST_URL: &str = "/redactors/";

/// GET /redactors/
pub async fn list(
    State(state): State<AppState>,
    visitor: Visitor,
    Query(query): Query<PageQuery>,
) -> Result<Response, ViewError> {
    let params = query.params(state.per_page())?;
    let result = state.redactor_service.list(&params).await?;
    let page_obj = PageObj::of(&result)?;

    let mut context = TeraContext::new();
    context.insert("redactors", &result.items);
    context.insert("page_obj", &page_obj);
    Ok(render(&state, &visitor, "newspaper_agency/redactor_list.html", &context)?.into_response())
}

/// GET /redactors/{id}/ - Profile and published newspapers
pub async fn detail(
    State(state): State<AppState>,
    visitor: Visitor,
    Path(id): Path<String>,
) -> Result<Response, ViewError> {
    let id = parse_id(&id)?;
    let redactor = state.redactor_service.get(id).await?;
    let newspapers = state.newspaper_service.by_publisher(id).await?;

    let mut context = TeraContext::new();
    context.insert("redactor", &redactor);
    context.insert("newspapers", &newspapers);
    Ok(render(&state, &visitor, "newspaper_agency/redactor_detail.html", &context)?.into_response())
}

pub(crate) fn form_page(
    state: &AppState,
    visitor: &Visitor,
    template: &str,
    form: &RedactorForm,
    errors: &FieldErrors,
    redactor_id: Option<i64>,
) -> Result<Response, ViewError> {
    let mut context = TeraContext::new();
    context.insert("form", form);
    context.insert("errors", errors);
    if let Some(id) = redactor_id {
        context.insert("redactor_id", &id);
    }
    Ok(render(state, visitor, template, &context)?.into_response())
}

/// Validate and store a registration. `Ok(None)` when it was stored,
/// `Ok(Some(errors))` when the form has to be shown again.
pub(crate) async fn register_redactor(
    state: &AppState,
    form: &RedactorForm,
) -> Result<Option<FieldErrors>, ViewError> {
    let (input, mut errors) = form.clean_register();
    errors.merge(state.redactor_service.check_registration(&input).await?);
    if !errors.is_empty() {
        return Ok(Some(errors));
    }

    match state.redactor_service.register(input).await {
        Ok(_) => Ok(None),
        Err(RedactorServiceError::ValidationError(errors)) => Ok(Some(errors)),
        Err(e) => Err(e.into()),
    }
}

/// GET /redactor_form/
pub async fn create_form(
    State(state): State<AppState>,
    LoginRequired(visitor): LoginRequired,
) -> Result<Response, ViewError> {
    form_page(
        &state,
        &visitor,
        "newspaper_agency/redactor_form.html",
        &RedactorForm::default(),
        &FieldErrors::new(),
        None,
    )
}

/// POST /redactor_form/
pub async fn create(
    State(state): State<AppState>,
    LoginRequired(visitor): LoginRequired,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, ViewError> {
    let form = RedactorForm::from_data(&FormData::from(pairs));
    match register_redactor(&state, &form).await? {
        None => Ok(found(LIST_URL)),
        Some(errors) => form_page(
            &state,
            &visitor,
            "newspaper_agency/redactor_form.html",
            &form,
            &errors,
            None,
        ),
    }
}

/// GET /redactor_update/{id}/
pub async fn update_form(
    State(state): State<AppState>,
    LoginRequired(visitor): LoginRequired,
    Path(id): Path<String>,
) -> Result<Response, ViewError> {
    let redactor = state.redactor_service.get(parse_id(&id)?).await?;
    form_page(
        &state,
        &visitor,
        "newspaper_agency/redactor_update.html",
        &RedactorForm::from_redactor(&redactor),
        &FieldErrors::new(),
        Some(redactor.id),
    )
}

/// POST /redactor_update/{id}/
pub async fn update(
    State(state): State<AppState>,
    LoginRequired(visitor): LoginRequired,
    Path(id): Path<String>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, ViewError> {
    let id = state.redactor_service.get(parse_id(&id)?).await?.id;
    let form = RedactorForm::from_data(&FormData::from(pairs));

    let (input, mut errors) = form.clean_update();
    errors.merge(state.redactor_service.check_update(id, &input).await?);
    let result = if errors.is_empty() {
        state.redactor_service.update(id, input).await
    } else {
        Err(RedactorServiceError::ValidationError(errors))
    };

    match result {
        Ok(_) => Ok(found(&format!("/redactors/{}/", id))),
        Err(RedactorServiceError::ValidationError(errors)) => form_page(
            &state,
            &visitor,
            "newspaper_agency/redactor_update.html",
            &form,
            &errors,
            Some(id),
        ),
        Err(e) => Err(e.into()),
    }
}

/// GET /redactors/{id}/delete/
pub async fn delete_confirm(
    State(state): State<AppState>,
    LoginRequired(visitor): LoginRequired,
    Path(id): Path<String>,
) -> Result<Response, ViewError> {
    let redactor = state.redactor_service.get(parse_id(&id)?).await?;

    let mut context = TeraContext::new();
    context.insert("redactor", &redactor);
    Ok(render(&state, &visitor, "newspaper_agency/redactor_delete.html", &context)?.into_response())
}

/// POST /redactors/{id}/delete/
pub async fn delete(
    State(state): State<AppState>,
    LoginRequired(_visitor): LoginRequired,
    Path(id): Path<String>,
) -> Result<Response, ViewError> {
    state.redactor_service.delete(parse_id(&id)?).await?;
    Ok(found(LIST_URL))
}
