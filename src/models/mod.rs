//! Data models for the task manager API.
//!
//! - `User`: identity record returned by the auth endpoints
//! - `Session`, `AuthResponse`: credential bundle and its wire form
//! - `LoginCredentials`, `RegisterRequest`: transient request payloads
//! - `Task` and friends: the task resource and its create/update payloads

pub mod session;
pub mod task;
pub mod user;

pub use session::{AuthResponse, LoginCredentials, RegisterRequest, Session};
pub use task::{filter_tasks, NewTask, StatusFilter, Task, TaskPatch, TaskStatus};
pub use user::User;
