//! Session state and lifecycle.
//!
//! This module provides:
//! - `SessionStore`: observable current-user state persisted to storage
//! - `SessionManager`: login/registration/refresh/logout orchestration
//! - registration payload validation

pub mod manager;
pub mod store;
pub mod validate;

pub use manager::{Navigator, NoNavigation, SessionManager};
pub use store::SessionStore;
pub use validate::{
    password_meets_policy, password_strength, validate_registration, ValidationError,
};
