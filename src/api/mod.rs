//! REST API clients for the task manager backend.
//!
//! `AuthClient` handles the credential exchange endpoints and `TaskClient`
//! the task resource. Both speak JSON and authenticate with a JWT bearer
//! token obtained through `/auth/login`.

pub mod auth;
pub mod error;
pub mod tasks;

pub use auth::{AuthClient, CredentialExchange};
pub use error::{ApiError, AuthError, AuthOperation, PASSWORD_POLICY_MESSAGE};
pub use tasks::TaskClient;
