//! Redactor service
//!
//! Implements business logic for staff accounts:
//! - Registration and creation with argon2id password hashing
//! - Profile updates
//! - Credential checks for login
//! - Paginated listing

use crate::db::repositories::RedactorRepository;
use crate::models::{
    CreateRedactorInput, ListParams, PagedResult, Redactor, UpdateRedactorInput, USERNAME_MAX_LEN,
};
use crate::services::password::{hash_password, verify_password};
use crate::services::validation::{self, FieldErrors};
use anyhow::Context;
use std::sync::Arc;

/// Maximum length of first and last names
pub const NAME_MAX_LEN: usize = 150;

/// Maximum length of an email address
pub const EMAIL_MAX_LEN: usize = 254;

/// Error types for redactor service operations
#[derive(Debug, thiserror::Error)]
pub enum RedactorServiceError {
    #[error("Redactor not found: {0}")]
    NotFound(i64),

    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    /// Unknown username or wrong password
    #[error("Authentication failed")]
    InvalidCredentials,

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Input for registering or creating a redactor
#[derive(Debug, Clone, Default)]
pub struct RegisterInput {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Plaintext password, hashed before it is stored
    pub password: String,
    pub years_of_experience: i64,
}

impl RegisterInput {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }
}

pub struct RedactorService {
    repo: Arc<dyn RedactorRepository>,
}

impl RedactorService {
    pub fn new(repo: Arc<dyn RedactorRepository>) -> Self {
        Self { repo }
    }

    /// One page of redactors ordered by username
    pub async fn list(
        &self,
        params: &ListParams,
    ) -> Result<PagedResult<Redactor>, RedactorServiceError> {
        let total = self
            .repo
            .count()
            .await
            .context("Failed to count redactors")?;
        let items = self
            .repo
            .list(params.offset(), params.limit())
            .await
            .context("Failed to list redactors")?;

        Ok(PagedResult::new(items, total, params))
    }

    pub async fn list_all(&self) -> Result<Vec<Redactor>, RedactorServiceError> {
        Ok(self
            .repo
            .list_all()
            .await
            .context("Failed to list redactors")?)
    }

    pub async fn get(&self, id: i64) -> Result<Redactor, RedactorServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get redactor")?
            .ok_or(RedactorServiceError::NotFound(id))
    }

    /// Lookup used by the session loader, `None` when the account is gone
    pub async fn find(&self, id: i64) -> Result<Option<Redactor>, RedactorServiceError> {
        Ok(self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get redactor")?)
    }

    pub async fn count(&self) -> Result<i64, RedactorServiceError> {
        Ok(self
            .repo
            .count()
            .await
            .context("Failed to count redactors")?)
    }

    /// Field errors a registration would be rejected with, empty when it is valid
    pub async fn check_registration(
        &self,
        input: &RegisterInput,
    ) -> Result<FieldErrors, RedactorServiceError> {
        let email = input.email.trim();

        let mut errors = self
            .validate_profile(
                input.username.trim(),
                &input.first_name,
                &input.last_name,
                input.years_of_experience,
                None,
            )
            .await?;
        errors.check("email", validation::check_max_len(email, EMAIL_MAX_LEN));
        if !errors.has("email") {
            errors.check("email", validation::check_email(email));
        }
        if input.password.is_empty() {
            errors.add("password", validation::REQUIRED);
        }
        Ok(errors)
    }

    /// Register a new redactor
    ///
    /// The password is hashed with argon2id; the plaintext is dropped here.
    ///
    /// # Errors
    /// - `ValidationError` for invalid fields or a taken username
    pub async fn register(&self, input: RegisterInput) -> Result<Redactor, RedactorServiceError> {
        let errors = self.check_registration(&input).await?;
        if !errors.is_empty() {
            return Err(RedactorServiceError::ValidationError(errors));
        }

        let username = input.username.trim().to_string();
        let email = input.email.trim().to_string();
        let password_hash = hash_password(&input.password)?;
        let redactor = self
            .repo
            .create(&CreateRedactorInput {
                username,
                first_name: input.first_name.trim().to_string(),
                last_name: input.last_name.trim().to_string(),
                email,
                password_hash,
                years_of_experience: input.years_of_experience,
            })
            .await
            .context("Failed to create redactor")?;

        tracing::info!(redactor_id = redactor.id, username = %redactor.username, "Redactor registered");
        Ok(redactor)
    }

    /// Field errors an update of redactor `id` would be rejected with
    pub async fn check_update(
        &self,
        id: i64,
        input: &UpdateRedactorInput,
    ) -> Result<FieldErrors, RedactorServiceError> {
        self.validate_profile(
            input.username.trim(),
            &input.first_name,
            &input.last_name,
            input.years_of_experience,
            Some(id),
        )
        .await
    }

    /// Update a redactor's profile fields
    pub async fn update(
        &self,
        id: i64,
        input: UpdateRedactorInput,
    ) -> Result<Redactor, RedactorServiceError> {
        self.get(id).await?;

        let errors = self.check_update(id, &input).await?;
        if !errors.is_empty() {
            return Err(RedactorServiceError::ValidationError(errors));
        }

        let username = input.username.trim().to_string();
        let redactor = self
            .repo
            .update(
                id,
                &UpdateRedactorInput {
                    username,
                    first_name: input.first_name.trim().to_string(),
                    last_name: input.last_name.trim().to_string(),
                    years_of_experience: input.years_of_experience,
                },
            )
            .await
            .context("Failed to update redactor")?;

        tracing::info!(redactor_id = id, "Redactor updated");
        Ok(redactor)
    }

    /// Delete a redactor. Their sessions and publisher links go with them.
    pub async fn delete(&self, id: i64) -> Result<(), RedactorServiceError> {
        let deleted = self
            .repo
            .delete(id)
            .await
            .context("Failed to delete redactor")?;

        if !deleted {
            return Err(RedactorServiceError::NotFound(id));
        }

        tracing::info!(redactor_id = id, "Redactor deleted");
        Ok(())
    }

    /// Check a username and password pair
    ///
    /// Usernames are matched exactly, so both fields are case-sensitive.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Redactor, RedactorServiceError> {
        let redactor = self
            .repo
            .get_by_username(username)
            .await
            .context("Failed to get redactor by username")?
            .ok_or(RedactorServiceError::InvalidCredentials)?;

        let valid = verify_password(password, &redactor.password_hash)
            .context("Failed to verify password")?;
        if !valid {
            tracing::debug!(username = %username, "Rejected login with wrong password");
            return Err(RedactorServiceError::InvalidCredentials);
        }

        Ok(redactor)
    }

    pub async fn record_login(&self, id: i64) -> Result<(), RedactorServiceError> {
        self.repo
            .update_last_login(id)
            .await
            .context("Failed to update last login")?;
        Ok(())
    }

    async fn validate_profile(
        &self,
        username: &str,
        first_name: &str,
        last_name: &str,
        years_of_experience: i64,
        exclude_id: Option<i64>,
    ) -> Result<FieldErrors, RedactorServiceError> {
        let mut errors = FieldErrors::new();

        errors.check("username", validation::check_required(username));
        if !errors.has("username") {
            errors.check(
                "username",
                validation::check_max_len(username, USERNAME_MAX_LEN),
            );
            errors.check("username", validation::check_username(username));
        }
        if !errors.has("username") {
            let taken = self
                .repo
                .exists_by_username_excluding(username, exclude_id)
                .await
                .context("Failed to check username")?;
            if taken {
                errors.add("username", validation::DUPLICATE_USERNAME);
            }
        }

        errors.check(
            "first_name",
            validation::check_max_len(first_name.trim(), NAME_MAX_LEN),
        );
        errors.check(
            "last_name",
            validation::check_max_len(last_name.trim(), NAME_MAX_LEN),
        );
        errors.check(
            "years_of_experience",
            validation::check_non_negative(years_of_experience),
        );

        Ok(errors)
    }
}
