//! Router-level tests of the JSON API and static assets

use axum::http::{header, StatusCode};
use chrono::NaiveDate;
use serde_json::json;

use crate::api::testing::{body_json, body_string, get, test_app};
use crate::api::AppState;
use crate::models::{Newspaper, NewspaperInput, Redactor, Topic, TopicInput};
use crate::services::RegisterInput;

async fn topic(state: &AppState, name: &str) -> Topic {
    state
        .topic_service
        .create(TopicInput {
            name: name.to_string(),
        })
        .await
        .unwrap()
}

async fn redactor(state: &AppState, username: &str) -> Redactor {
    let mut input = RegisterInput::new(username, "s3cret-pass");
    input.first_name = "Ada".to_string();
    input.last_name = "Lovelace".to_string();
    input.email = format!("{}@example.com", username);
    input.years_of_experience = 4;
    state.redactor_service.register(input).await.unwrap()
}

async fn newspaper(state: &AppState, title: &str, day: u32, topic: &Topic, publisher: &Redactor) -> Newspaper {
    state
        .newspaper_service
        .create(NewspaperInput {
            title: title.to_string(),
            content: format!("{} content", title),
            published_date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            topic_ids: vec![topic.id],
            publisher_ids: vec![publisher.id],
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_topics_are_listed_alphabetically() {
    let (app, state) = test_app().await;
    let sports = topic(&state, "Sports").await;
    let politics = topic(&state, "Politics").await;

    let response = get(&app, "/api/v1/topics", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!([
            {"id": politics.id, "name": "Politics"},
            {"id": sports.id, "name": "Sports"}
        ])
    );

    let response = get(&app, &format!("/api/v1/topics/{}", sports.id), None).await;
    assert_eq!(body_json(response).await, json!({"id": sports.id, "name": "Sports"}));
}

#[tokio::test]
async fn test_newspapers_are_paginated_newest_first() {
    let (app, state) = test_app().await;
    let politics = topic(&state, "Politics").await;
    let ada = redactor(&state, "ada").await;
    newspaper(&state, "Older", 1, &politics, &ada).await;
    let newer = newspaper(&state, "Newer", 2, &politics, &ada).await;

    let response = get(&app, "/api/v1/newspapers?page=1&page_size=1", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({
            "newspapers": [{
                "id": newer.id,
                "title": "Newer",
                "published_date": "2024-03-02",
                "topics": ["Politics"],
                "publishers": [{"id": ada.id, "name": "Ada Lovelace", "username": "ada"}]
            }],
            "total": 2,
            "page": 1,
            "page_size": 1,
            "total_pages": 2
        })
    );
}

#[tokio::test]
async fn test_newspaper_detail_includes_content() {
    let (app, state) = test_app().await;
    let politics = topic(&state, "Politics").await;
    let ada = redactor(&state, "ada").await;
    let paper = newspaper(&state, "Morning", 5, &politics, &ada).await;

    let json = body_json(get(&app, &format!("/api/v1/newspapers/{}", paper.id), None).await).await;
    assert_eq!(json["content"], "Morning content");
    assert_eq!(json["topics"], json!([{"id": politics.id, "name": "Politics"}]));
}

#[tokio::test]
async fn test_relation_endpoints() {
    let (app, state) = test_app().await;
    let politics = topic(&state, "Politics").await;
    let sports = topic(&state, "Sports").await;
    let ada = redactor(&state, "ada").await;
    let paper = newspaper(&state, "Morning", 5, &politics, &ada).await;

    let by_topic = body_json(get(&app, &format!("/api/v1/topics/{}/newspapers", politics.id), None).await).await;
    assert_eq!(by_topic.as_array().unwrap().len(), 1);
    assert_eq!(by_topic[0]["id"], paper.id);

    let empty = body_json(get(&app, &format!("/api/v1/topics/{}/newspapers", sports.id), None).await).await;
    assert_eq!(empty, json!([]));

    let by_publisher = body_json(get(&app, &format!("/api/v1/redactors/{}/newspapers", ada.id), None).await).await;
    assert_eq!(by_publisher[0]["title"], "Morning");
}

#[tokio::test]
async fn test_redactors_never_expose_credentials() {
    let (app, state) = test_app().await;
    let ada = redactor(&state, "ada").await;

    let list = body_json(get(&app, "/api/v1/redactors", None).await).await;
    assert_eq!(
        list,
        json!([{
            "id": ada.id,
            "username": "ada",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "years_of_experience": 4
        }])
    );

    let text = body_string(get(&app, &format!("/api/v1/redactors/{}", ada.id), None).await).await;
    assert!(!text.contains("password"));
    assert!(!text.contains("ada@example.com"));
}

#[tokio::test]
async fn test_stats() {
    let (app, state) = test_app().await;
    let politics = topic(&state, "Politics").await;
    topic(&state, "Sports").await;
    let ada = redactor(&state, "ada").await;
    newspaper(&state, "Morning", 5, &politics, &ada).await;

    let json = body_json(get(&app, "/api/v1/stats", None).await).await;
    assert_eq!(
        json,
        json!({"num_topics": 2, "num_redactors": 1, "num_newspapers": 1})
    );
}

#[tokio::test]
async fn test_missing_records_are_json_404() {
    let (app, _state) = test_app().await;

    for uri in [
        "/api/v1/topics/999",
        "/api/v1/topics/abc",
        "/api/v1/newspapers/999",
        "/api/v1/redactors/999/newspapers",
        "/api/v1/unknown",
    ] {
        let response = get(&app, uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "NOT_FOUND", "{uri}");
    }
}

#[tokio::test]
async fn test_static_assets() {
    let (app, _state) = test_app().await;

    let response = get(&app, "/static/css/styles.css", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css");

    let response = get(&app, "/static/js/missing.js", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
