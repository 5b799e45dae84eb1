use serde::Deserialize;
use thiserror::Error;

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Canonical text substituted when the server rejects a password for policy
/// reasons. Matches the identity API's validation rule.
pub const PASSWORD_POLICY_MESSAGE: &str = "Password must be at least 8 characters long and \
     contain at least one digit, one uppercase letter, one lowercase letter, \
     and one special character.";

/// Marker the server's password-policy rejection message starts with.
const PASSWORD_POLICY_MARKER: &str = "Password must be at least 8 characters";

#[derive(Error, Debug)]
pub enum ApiError {
    /// Any non-2xx response. `message` is the JSON `message` field when the
    /// body carried one; `body` is the (truncated) raw body for logging.
    #[error("server returned {status}: {body}")]
    Server {
        status: u16,
        message: Option<String>,
        body: String,
    },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data. The cut
    /// backs up to a char boundary so multi-byte bodies never split.
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut cut = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!(
            "{}... (truncated, {} total bytes)",
            &body[..cut],
            body.len()
        )
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        #[derive(Deserialize)]
        struct ErrorBody {
            message: Option<String>,
        }

        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message);

        ApiError::Server {
            status: status.as_u16(),
            message,
            body: Self::truncate_body(body),
        }
    }

    /// The server-supplied `message` field, when the error carries one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Server { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Server { status: 401, .. })
    }
}

/// Which auth endpoint an exchange failure came from. Selects the fallback
/// message when the server supplied none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOperation {
    Register,
    Login,
    Refresh,
}

impl AuthOperation {
    fn fallback_message(&self) -> &'static str {
        match self {
            AuthOperation::Register => "Registration failed. Please try again.",
            AuthOperation::Login => "Login failed. Please check your credentials.",
            AuthOperation::Refresh => "Session refresh failed. Please log in again.",
        }
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    /// Local precondition failure: refresh was requested with no refresh
    /// token on hand. No network call is made.
    #[error("no refresh token available")]
    MissingRefreshToken,

    /// A classified exchange failure. `message` is normalized for display;
    /// the original error is preserved as the source.
    #[error("{message}")]
    Exchange {
        message: String,
        #[source]
        source: ApiError,
    },
}

impl AuthError {
    /// Classify an exchange failure into a human-readable message without
    /// losing the original error. Password-policy rejections get the
    /// canonical text, other server messages pass through, and anything else
    /// falls back to the per-operation default.
    pub fn classify(operation: AuthOperation, source: ApiError) -> Self {
        let message = match source.server_message() {
            Some(m) if m.contains(PASSWORD_POLICY_MARKER) => PASSWORD_POLICY_MESSAGE.to_string(),
            Some(m) => m.to_string(),
            None => operation.fallback_message().to_string(),
        };
        AuthError::Exchange { message, source }
    }

    /// The normalized display message.
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn is_unauthorized(&self) -> bool {
        match self {
            AuthError::Exchange { source, .. } => source.is_unauthorized(),
            AuthError::MissingRefreshToken => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn from_status_extracts_message_field() {
        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"message":"Username already exists"}"#,
        );
        assert_eq!(err.server_message(), Some("Username already exists"));
    }

    #[test]
    fn from_status_without_message_field() {
        let err = ApiError::from_status(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert_eq!(err.server_message(), None);
    }

    #[test]
    fn truncates_oversized_bodies() {
        let body = "x".repeat(2000);
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, &body);
        match err {
            ApiError::Server { body, .. } => {
                assert!(body.len() < 600);
                assert!(body.contains("truncated"));
            }
            _ => panic!("expected server error"),
        }
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // 'é' is two bytes and straddles the truncation offset.
        let body = format!("{}é{}", "x".repeat(499), "y".repeat(40));
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, &body);
        match err {
            ApiError::Server { body, .. } => {
                assert!(body.contains("truncated"));
                assert!(body.starts_with(&"x".repeat(499)));
            }
            _ => panic!("expected server error"),
        }
    }

    #[test]
    fn password_policy_message_is_canonical() {
        let source = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"message":"Password must be at least 8 characters and match the policy"}"#,
        );
        let err = AuthError::classify(AuthOperation::Register, source);
        assert_eq!(err.message(), PASSWORD_POLICY_MESSAGE);
    }

    #[test]
    fn server_message_passes_through() {
        let source =
            ApiError::from_status(StatusCode::CONFLICT, r#"{"message":"Email already in use"}"#);
        let err = AuthError::classify(AuthOperation::Register, source);
        assert_eq!(err.message(), "Email already in use");
    }

    #[test]
    fn fallback_message_per_operation() {
        let login = AuthError::classify(
            AuthOperation::Login,
            ApiError::from_status(StatusCode::UNAUTHORIZED, ""),
        );
        assert_eq!(login.message(), "Login failed. Please check your credentials.");

        let register = AuthError::classify(
            AuthOperation::Register,
            ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "oops"),
        );
        assert_eq!(register.message(), "Registration failed. Please try again.");
    }

    #[test]
    fn classification_preserves_source() {
        let err = AuthError::classify(
            AuthOperation::Login,
            ApiError::from_status(StatusCode::UNAUTHORIZED, ""),
        );
        assert!(err.is_unauthorized());
        match err {
            AuthError::Exchange { source, .. } => {
                assert!(matches!(source, ApiError::Server { status: 401, .. }))
            }
            _ => panic!("expected exchange error"),
        }
    }
}
