//! Field validation shared by forms and services
//!
//! Validation failures are collected per field so screens can show every
//! problem next to the input that caused it. Errors that do not belong to a
//! single field are stored under [`FieldErrors::NON_FIELD`].

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_DATE: &str = "Enter a valid date.";
pub const INVALID_INTEGER: &str = "Enter a whole number.";
pub const INVALID_EMAIL: &str = "Enter a valid email address.";
pub const INVALID_USERNAME: &str =
    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";
pub const NEGATIVE_VALUE: &str = "Ensure this value is greater than or equal to 0.";
pub const DUPLICATE_TOPIC: &str = "Topic with this Name already exists.";
pub const DUPLICATE_USERNAME: &str = "A user with that username already exists.";
pub const INVALID_LOGIN: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

/// Message for a multi-select value that is not a known choice
pub fn invalid_choice(value: impl fmt::Display) -> String {
    format!(
        "Select a valid choice. {} is not one of the available choices.",
        value
    )
}

/// Message for a value longer than `max` characters
pub fn too_long(max: usize, actual: usize) -> String {
    format!(
        "Ensure this value has at most {} characters (it has {}).",
        max, actual
    )
}

/// Validation messages keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Key for errors that are not tied to one field
    pub const NON_FIELD: &'static str = "__all__";

    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set holding one message
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Record the error of a check, if any
    pub fn check(&mut self, field: &str, result: Result<(), String>) {
        if let Err(message) = result {
            self.add(field, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Messages recorded for `field`, empty if none
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    /// `Ok(value)` when no errors were recorded
    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

pub fn check_required(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(REQUIRED.to_string())
    } else {
        Ok(())
    }
}

/// Length is counted in characters, not bytes
pub fn check_max_len(value: &str, max: usize) -> Result<(), String> {
    let len = value.chars().count();
    if len > max {
        Err(too_long(max, len))
    } else {
        Ok(())
    }
}

/// Letters, digits and `@ . + - _` only
pub fn check_username(value: &str) -> Result<(), String> {
    let valid = value
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));
    if valid {
        Ok(())
    } else {
        Err(INVALID_USERNAME.to_string())
    }
}

/// Accepts `local@domain.tld`; an empty value is valid since email is optional
pub fn check_email(value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Ok(());
    }
    let invalid = || Err(INVALID_EMAIL.to_string());

    if value.chars().any(char::is_whitespace) {
        return invalid();
    }
    let Some((local, domain)) = value.rsplit_once('@') else {
        return invalid();
    };
    if local.is_empty() || local.contains('@') {
        return invalid();
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return invalid();
    }
    let label_ok = |label: &&str| {
        !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_alphanumeric() || c == '-')
    };
    if !labels.iter().all(label_ok) {
        return invalid();
    }
    Ok(())
}

pub fn check_non_negative(value: i64) -> Result<(), String> {
    if value < 0 {
        Err(NEGATIVE_VALUE.to_string())
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_required() {
        assert!(check_required("x").is_ok());
        assert_eq!(check_required("   "), Err(REQUIRED.to_string()));
    }

    #[test]
    fn test_max_len_counts_chars() {
        assert!(check_max_len("ééé", 3).is_ok());
        assert_eq!(
            check_max_len("abcd", 3),
            Err("Ensure this value has at most 3 characters (it has 4).".to_string())
        );
    }

    #[test]
    fn test_username() {
        assert!(check_username("john.doe+news@agency_1-x").is_ok());
        assert!(check_username("john doe").is_err());
        assert!(check_username("john/doe").is_err());
    }

    #[test]
    fn test_email() {
        assert!(check_email("").is_ok());
        assert!(check_email("a@example.com").is_ok());
        assert!(check_email("first.last@sub.example.org").is_ok());
        assert!(check_email("plainaddress").is_err());
        assert!(check_email("@example.com").is_err());
        assert!(check_email("a@localhost").is_err());
        assert!(check_email("a@example..com").is_err());
        assert!(check_email("a b@example.com").is_err());
        assert!(check_email("a@-example.com").is_err());
    }

    #[test]
    fn test_invalid_choice_message() {
        assert_eq!(
            invalid_choice(42),
            "Select a valid choice. 42 is not one of the available choices."
        );
    }

    #[test]
    fn test_field_errors_collect_and_merge() {
        let mut errors = FieldErrors::new();
        assert!(errors.is_empty());

        errors.check("name", check_required(""));
        errors.check("name", Ok(()));
        assert_eq!(errors.get("name"), [REQUIRED.to_string()]);
        assert!(errors.get("other").is_empty());

        errors.merge(FieldErrors::single(FieldErrors::NON_FIELD, "Broken"));
        assert!(errors.has(FieldErrors::NON_FIELD));
        assert_eq!(
            errors.to_string(),
            "__all__: Broken; name: This field is required."
        );

        assert!(errors.into_result(()).is_err());
        assert_eq!(FieldErrors::new().into_result(5), Ok(5));
    }

    proptest! {
        #[test]
        fn prop_usernames_from_allowed_alphabet_pass(name in "[A-Za-z0-9@.+_-]{1,150}") {
            prop_assert!(check_username(&name).is_ok());
        }

        #[test]
        fn prop_usernames_with_space_fail(a in "[a-z]{1,10}", b in "[a-z]{1,10}") {
            let name = format!("{} {}", a, b);
            prop_assert!(check_username(&name).is_err());
        }

        #[test]
        fn prop_max_len_agrees_with_char_count(s in "\\PC{0,40}", max in 0usize..40) {
            prop_assert_eq!(check_max_len(&s, max).is_ok(), s.chars().count() <= max);
        }
    }
}
