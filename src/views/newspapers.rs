//! Newspaper screens

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Form,
};
use tera::Context as TeraContext;

use crate::api::middleware::{found, AppState, LoginRequired, Visitor};
use crate::services::{FieldErrors, NewspaperServiceError};
use crate::views::forms::{FormData, NewspaperForm};
use crate::views::{parse_id, render, PageObj, PageQuery, ViewError};

const LIST_URL: &str = "/newspaper_list/";

fn detail_url(id: i64) -> String {
    format!("/newspapers/{}/", id)
}

/// GET /newspaper_list/ - Newest first
pub async fn list(
    State(state): State<AppState>,
    visitor: Visitor,
    Query(query): Query<PageQuery>,
) -> Result<Response, ViewError> {
    let params = query.params(state.per_page())?;
    let result = state.newspaper_service.list(&params).await?;
    let page_obj = PageObj::of(&result)?;

    let mut context = TeraContext::new();
    context.insert("newspapers", &result.items);
    context.insert("page_obj", &page_obj);
    Ok(render(&state, &visitor, "newspaper_agency/newspaper_list.html", &context)?.into_response())
}

/// GET /newspapers/{id}/
pub async fn detail(
    State(state): State<AppState>,
    visitor: Visitor,
    Path(id): Path<String>,
) -> Result<Response, ViewError> {
    let newspaper = state.newspaper_service.get(parse_id(&id)?).await?;

    let mut context = TeraContext::new();
    context.insert("newspaper", &newspaper);
    Ok(render(&state, &visitor, "newspaper_agency/newspaper_detail.html", &context)?.into_response())
}

/// Create screen when `newspaper_id` is `None`, update screen otherwise.
/// Only the update screen lets several publishers be picked.
async fn form_page(
    state: &AppState,
    visitor: &Visitor,
    form: &NewspaperForm,
    errors: &FieldErrors,
    newspaper_id: Option<i64>,
) -> Result<Response, ViewError> {
    let all_topics = state.topic_service.list_all().await?;
    let all_redactors = state.redactor_service.list_all().await?;

    let mut context = TeraContext::new();
    context.insert("form", form);
    context.insert("errors", errors);
    context.insert("all_topics", &all_topics);
    context.insert("all_redactors", &all_redactors);
    context.insert("selected_topics", &form.selected_topics());
    context.insert("selected_publishers", &form.selected_publishers());
    context.insert("multiple_publishers", &newspaper_id.is_some());

    let template = match newspaper_id {
        Some(id) => {
            context.insert("newspaper_id", &id);
            "newspaper_agency/newspaper_update.html"
        }
        None => "newspaper_agency/newspaper_form.html",
    };
    Ok(render(state, visitor, template, &context)?.into_response())
}

/// GET /newspaper_form/
pub async fn create_form(
    State(state): State<AppState>,
    LoginRequired(visitor): LoginRequired,
) -> Result<Response, ViewError> {
    form_page(&state, &visitor, &NewspaperForm::default(), &FieldErrors::new(), None).await
}

/// POST /newspaper_form/
pub async fn create(
    State(state): State<AppState>,
    LoginRequired(visitor): LoginRequired,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, ViewError> {
    let form = NewspaperForm::from_data(&FormData::from(pairs));
    let input = match form.clean() {
        Ok(input) => input,
        Err(errors) => return form_page(&state, &visitor, &form, &errors, None).await,
    };

    match state.newspaper_service.create(input).await {
        Ok(_) => Ok(found(LIST_URL)),
        Err(NewspaperServiceError::ValidationError(errors)) => {
            form_page(&state, &visitor, &form, &errors, None).await
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /newspaper_update/{id}/
pub async fn update_form(
    State(state): State<AppState>,
    LoginRequired(visitor): LoginRequired,
    Path(id): Path<String>,
) -> Result<Response, ViewError> {
    let newspaper = state.newspaper_service.get(parse_id(&id)?).await?;
    let form = NewspaperForm::from_newspaper(&newspaper);
    form_page(&state, &visitor, &form, &FieldErrors::new(), Some(newspaper.id())).await
}

/// POST /newspaper_update/{id}/
pub async fn update(
    State(state): State<AppState>,
    LoginRequired(visitor): LoginRequired,
    Path(id): Path<String>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, ViewError> {
    let id = state.newspaper_service.get(parse_id(&id)?).await?.id();
    let form = NewspaperForm::from_data(&FormData::from(pairs));
    let input = match form.clean() {
        Ok(input) => input,
        Err(errors) => return form_page(&state, &visitor, &form, &errors, Some(id)).await,
    };

    match state.newspaper_service.update(id, input).await {
        Ok(_) => Ok(found(&detail_url(id))),
        Err(NewspaperServiceError::ValidationError(errors)) => {
            form_page(&state, &visitor, &form, &errors, Some(id)).await
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /newspapers/{id}/delete/
pub async fn delete_confirm(
    State(state): State<AppState>,
    LoginRequired(visitor): LoginRequired,
    Path(id): Path<String>,
) -> Result<Response, ViewError> {
    let newspaper = state.newspaper_service.get(parse_id(&id)?).await?;

    let mut context = TeraContext::new();
    context.insert("newspaper", &newspaper);
    Ok(render(&state, &visitor, "newspaper_agency/newspaper_delete.html", &context)?.into_response())
}

/// POST /newspapers/{id}/delete/
pub async fn delete(
    State(state): State<AppState>,
    LoginRequired(_visitor): LoginRequired,
    Path(id): Path<String>,
) -> Result<Response, ViewError> {
    state.newspaper_service.delete(parse_id(&id)?).await?;
    Ok(found(LIST_URL))
}
