//! Services layer - Business logic
//!
//! This module contains the business logic of the newspaper agency.
//! Services are responsible for:
//! - Implementing business rules
//! - Validating input and reporting per-field errors
//! - Coordinating between repositories

pub mod dashboard;
pub mod newspaper;
pub mod password;
pub mod redactor;
pub mod session;
pub mod topic;
pub mod validation;

pub use dashboard::{Dashboard, DashboardService, DashboardServiceError, Stats};
pub use newspaper::{NewspaperService, NewspaperServiceError};
pub use password::{hash_password, verify_password};
pub use redactor::{RedactorService, RedactorServiceError, RegisterInput};
pub use session::{SessionService, SessionServiceError};
pub use topic::{TopicService, TopicServiceError};
pub use validation::FieldErrors;
