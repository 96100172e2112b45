//! HTML form binding
//!
//! Bodies arrive as `application/x-www-form-urlencoded` pairs. Multi-selects
//! repeat their key, so the raw pairs are kept in order and each form picks
//! the values it needs. Every form serializes back into the template context
//! so a rejected submission is re-rendered with what the user typed.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{NewspaperInput, NewspaperWithRelations, Redactor, TopicInput, UpdateRedactorInput};
use crate::services::validation::{self, FieldErrors};
use crate::services::RegisterInput;

/// Date format of the `published_date` field
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Decoded form body
#[derive(Debug, Clone, Default)]
pub struct FormData(Vec<(String, String)>);

impl From<Vec<(String, String)>> for FormData {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }
}

impl FormData {
    /// First value for `key`, empty when absent
    pub fn get(&self, key: &str) -> String {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    }

    /// Every value for `key`, skipping empty ones
    pub fn get_all(&self, key: &str) -> Vec<String> {
        self.0
            .iter()
            .filter(|(k, v)| k == key && !v.trim().is_empty())
            .map(|(_, v)| v.trim().to_string())
            .collect()
    }
}

/// Parse a multi-select into ids. The first value that is not an integer is
/// reported as an invalid choice.
fn parse_ids(field: &str, raw: &[String], errors: &mut FieldErrors) -> Vec<i64> {
    if raw.is_empty() {
        errors.add(field, validation::REQUIRED);
        return Vec::new();
    }

    let mut ids = Vec::with_capacity(raw.len());
    for value in raw {
        match value.parse::<i64>() {
            Ok(id) => ids.push(id),
            Err(_) => {
                errors.add(field, validation::invalid_choice(value));
                return Vec::new();
            }
        }
    }
    ids
}

fn parse_ids_lenient(raw: &[String]) -> Vec<i64> {
    raw.iter().filter_map(|v| v.parse().ok()).collect()
}

// ============================================================================
// Topic
// ============================================================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct TopicForm {
    pub name: String,
}

impl TopicForm {
    pub fn from_data(data: &FormData) -> Self {
        Self {
            name: data.get("name"),
        }
    }

    pub fn input(&self) -> TopicInput {
        TopicInput {
            name: self.name.clone(),
        }
    }
}

// ============================================================================
// Newspaper
// ============================================================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewspaperForm {
    pub title: String,
    pub content: String,
    pub published_date: String,
    pub topics: Vec<String>,
    pub publishers: Vec<String>,
}

impl NewspaperForm {
    pub fn from_data(data: &FormData) -> Self {
        Self {
            title: data.get("title"),
            content: data.get("content"),
            published_date: data.get("published_date").trim().to_string(),
            topics: data.get_all("topics"),
            publishers: data.get_all("publishers"),
        }
    }

    /// Prefill from a stored newspaper
    pub fn from_newspaper(item: &NewspaperWithRelations) -> Self {
        Self {
            title: item.newspaper.title.clone(),
            content: item.newspaper.content.clone(),
            published_date: item.newspaper.published_date.format(DATE_FORMAT).to_string(),
            topics: item.topics.iter().map(|t| t.id.to_string()).collect(),
            publishers: item.publishers.iter().map(|r| r.id.to_string()).collect(),
        }
    }

    /// Check the submitted values and convert them
    ///
    /// Only syntax is checked here; whether the ids exist is up to the
    /// newspaper service.
    pub fn clean(&self) -> Result<NewspaperInput, FieldErrors> {
        let mut errors = FieldErrors::new();

        errors.check("title", validation::check_required(&self.title));
        errors.check("content", validation::check_required(&self.content));

        let published_date = if self.published_date.is_empty() {
            errors.add("published_date", validation::REQUIRED);
            None
        } else {
            match NaiveDate::parse_from_str(&self.published_date, DATE_FORMAT) {
                Ok(date) => Some(date),
                Err(_) => {
                    errors.add("published_date", validation::INVALID_DATE);
                    None
                }
            }
        };

        let topic_ids = parse_ids("topics", &self.topics, &mut errors);
        let publisher_ids = parse_ids("publishers", &self.publishers, &mut errors);

        match published_date {
            Some(published_date) if errors.is_empty() => Ok(NewspaperInput {
                title: self.title.clone(),
                content: self.content.clone(),
                published_date,
                topic_ids,
                publisher_ids,
            }),
            _ => Err(errors),
        }
    }

    pub fn selected_topics(&self) -> Vec<i64> {
        parse_ids_lenient(&self.topics)
    }

    pub fn selected_publishers(&self) -> Vec<i64> {
        parse_ids_lenient(&self.publishers)
    }
}

// ============================================================================
// Redactor
// ============================================================================

/// Registration and redactor create/update form
#[derive(Debug, Clone, Default, Serialize)]
pub struct RedactorForm {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Never echoed back into the page
    #[serde(skip_serializing)]
    pub password: String,
    pub years_of_experience: String,
}

impl RedactorForm {
    pub fn from_data(data: &FormData) -> Self {
        Self {
            username: data.get("username"),
            first_name: data.get("first_name"),
            last_name: data.get("last_name"),
            email: data.get("email"),
            password: data.get("password"),
            years_of_experience: data.get("years_of_experience").trim().to_string(),
        }
    }

    pub fn from_redactor(redactor: &Redactor) -> Self {
        Self {
            username: redactor.username.clone(),
            first_name: redactor.first_name.clone(),
            last_name: redactor.last_name.clone(),
            email: redactor.email.clone(),
            password: String::new(),
            years_of_experience: redactor.years_of_experience.to_string(),
        }
    }

    /// Blank means 0. A value that is not a whole number is reported and read as 0
    /// so the remaining fields still get validated.
    fn years(&self, errors: &mut FieldErrors) -> i64 {
        if self.years_of_experience.is_empty() {
            return 0;
        }
        match self.years_of_experience.parse::<i64>() {
            Ok(years) => years,
            Err(_) => {
                errors.add("years_of_experience", validation::INVALID_INTEGER);
                0
            }
        }
    }

    /// Registration input plus the errors found while reading the form
    pub fn clean_register(&self) -> (RegisterInput, FieldErrors) {
        let mut errors = FieldErrors::new();
        let input = RegisterInput {
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
            years_of_experience: self.years(&mut errors),
        };
        (input, errors)
    }

    pub fn clean_update(&self) -> (UpdateRedactorInput, FieldErrors) {
        let mut errors = FieldErrors::new();
        let input = UpdateRedactorInput {
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            years_of_experience: self.years(&mut errors),
        };
        (input, errors)
    }
}

// ============================================================================
// Login
// ============================================================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct LoginForm {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub next: String,
}

impl LoginForm {
    pub fn from_data(data: &FormData) -> Self {
        Self {
            username: data.get("username"),
            password: data.get("password"),
            next: data.get("next"),
        }
    }

    pub fn clean(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check("username", validation::check_required(&self.username));
        if self.password.is_empty() {
            errors.add("password", validation::REQUIRED);
        }
        errors.into_result(())
    }
}

/// Only local absolute paths are accepted as a post-login target
pub fn safe_next(next: &str) -> Option<&str> {
    let is_local = next.starts_with('/') && !next.starts_with("//") && !next.contains('\\');
    is_local.then_some(next)
}
