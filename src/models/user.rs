use serde::{Deserialize, Serialize};

/// Identity record returned by the API. Replaced wholesale on every
/// successful credential exchange; the client never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
}
