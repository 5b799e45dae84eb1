//! Taskdeck - client core for a task manager API.
//!
//! The crate provides the pieces a front end needs to talk to the backend:
//! a credential exchange client for `/auth/*`, an observable session store
//! persisted to local storage, a lifecycle manager that ties the two
//! together, and a thin CRUD client for `/tasks`.
//!
//! Wiring is explicit: construct a [`storage::LocalStore`], give it to a
//! [`auth::SessionStore`], and hand that plus an [`api::AuthClient`] to a
//! [`auth::SessionManager`].

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod storage;
pub mod theme;

pub use api::{ApiError, AuthClient, AuthError, CredentialExchange, TaskClient};
pub use auth::{Navigator, NoNavigation, SessionManager, SessionStore};
pub use config::Config;
pub use models::{
    AuthResponse, LoginCredentials, NewTask, RegisterRequest, Session, StatusFilter, Task,
    TaskPatch, TaskStatus, User,
};
pub use storage::LocalStore;
pub use theme::{ThemeMode, ThemePreference};
