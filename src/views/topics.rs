//! Topic screens

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Form,
};
use tera::Context as TeraContext;

use crate::api::middleware::{found, AppState, LoginRequired, Visitor};
use crate::models::Topic;
use crate::services::{FieldErrors, TopicServiceError};
use crate::views::forms::{FormData, TopicForm};
use crate::views::{parse_id, render, PageObj, PageQuery, ViewError};

const LIST_URL: &str = "/topics/";

/// GET /topics/
pub async fn list(
    State(state): State<AppState>,
    visitor: Visitor,
    Query(query): Query<PageQuery>,
) -> Result<Response, ViewError> {
    let params = query.params(state.per_page())?;
    let result = state.topic_service.list(&params).await?;
    let page_obj = PageObj::of(&result)?;

    let mut context = TeraContext::new();
    context.insert("topics", &result.items);
    context.insert("page_obj", &page_obj);
    Ok(render(&state, &visitor, "newspaper_agency/topic_list.html", &context)?.into_response())
}

/// GET /topics/{id}/ - Topic and the newspapers filed under it
pub async fn detail(
    State(state): State<AppState>,
    visitor: Visitor,
    Path(id): Path<String>,
) -> Result<Response, ViewError> {
    let id = parse_id(&id)?;
    let topic = state.topic_service.get(id).await?;
    let newspapers = state.newspaper_service.by_topic(id).await?;

    let mut context = TeraContext::new();
    context.insert("topic", &topic);
    context.insert("newspapers", &newspapers);
    Ok(render(&state, &visitor, "newspaper_agency/topic_detail.html", &context)?.into_response())
}

fn form_page(
    state: &AppState,
    visitor: &Visitor,
    form: &TopicForm,
    errors: &FieldErrors,
    topic: Option<&Topic>,
) -> Result<Response, ViewError> {
    let mut context = TeraContext::new();
    context.insert("form", form);
    context.insert("errors", errors);
    let template = match topic {
        Some(topic) => {
            context.insert("topic", topic);
            "newspaper_agency/topic_update.html"
        }
        None => "newspaper_agency/topic_form.html",
    };
    Ok(render(state, visitor, template, &context)?.into_response())
}

/// GET /topic_form/
pub async fn create_form(
    State(state): State<AppState>,
    LoginRequired(visitor): LoginRequired,
) -> Result<Response, ViewError> {
    form_page(&state, &visitor, &TopicForm::default(), &FieldErrors::new(), None)
}

/// POST /topic_form/
pub async fn create(
    State(state): State<AppState>,
    LoginRequired(visitor): LoginRequired,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, ViewError> {
    let form = TopicForm::from_data(&FormData::from(pairs));

    match state.topic_service.create(form.input()).await {
        Ok(_) => Ok(found(LIST_URL)),
        Err(TopicServiceError::ValidationError(errors)) => {
            form_page(&state, &visitor, &form, &errors, None)
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /topic_update/{id}/
pub async fn update_form(
    State(state): State<AppState>,
    LoginRequired(visitor): LoginRequired,
    Path(id): Path<String>,
) -> Result<Response, ViewError> {
    let topic = state.topic_service.get(parse_id(&id)?).await?;
    let form = TopicForm {
        name: topic.name.clone(),
    };
    form_page(&state, &visitor, &form, &FieldErrors::new(), Some(&topic))
}

/// POST /topic_update/{id}/
pub async fn update(
    State(state): State<AppState>,
    LoginRequired(visitor): LoginRequired,
    Path(id): Path<String>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, ViewError> {
    let topic = state.topic_service.get(parse_id(&id)?).await?;
    let form = TopicForm::from_data(&FormData::from(pairs));

    match state.topic_service.update(topic.id, form.input()).await {
        Ok(_) => Ok(found(LIST_URL)),
        Err(TopicServiceError::ValidationError(errors)) => {
            form_page(&state, &visitor, &form, &errors, Some(&topic))
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /topics/{id}/delete/
pub async fn delete_confirm(
    State(state): State<AppState>,
    LoginRequired(visitor): LoginRequired,
    Path(id): Path<String>,
) -> Result<Response, ViewError> {
    let topic = state.topic_service.get(parse_id(&id)?).await?;

    let mut context = TeraContext::new();
    context.insert("topic", &topic);
    Ok(render(&state, &visitor, "newspaper_agency/topic_delete.html", &context)?.into_response())
}

/// POST /topics/{id}/delete/
pub async fn delete(
    State(state): State<AppState>,
    LoginRequired(_visitor): LoginRequired,
    Path(id): Path<String>,
) -> Result<Response, ViewError> {
    state.topic_service.delete(parse_id(&id)?).await?;
    Ok(found(LIST_URL))
}
