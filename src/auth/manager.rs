//! Session lifecycle: login, registration, refresh and logout.
//!
//! `SessionManager` orchestrates exchange -> persistence -> notification and
//! is the only writer to the session store. Failed exchanges leave the store
//! untouched, except a failed refresh, which forces the session back to
//! anonymous before the error propagates.

use tracing::{info, warn};

use crate::api::{AuthError, CredentialExchange};
use crate::models::{LoginCredentials, RegisterRequest, Session, User};

use super::SessionStore;

/// Outbound navigation signal: a request to move to an anonymous-accessible
/// route. The routing layer owns what that means.
pub trait Navigator {
    fn to_login(&self);
}

/// Navigator for contexts without routing.
pub struct NoNavigation;

impl Navigator for NoNavigation {
    fn to_login(&self) {}
}

pub struct SessionManager<E> {
    store: SessionStore,
    exchange: E,
    navigator: Box<dyn Navigator + Send>,
}

impl<E: CredentialExchange> SessionManager<E> {
    pub fn new(store: SessionStore, exchange: E, navigator: Box<dyn Navigator + Send>) -> Self {
        Self {
            store,
            exchange,
            navigator,
        }
    }

    /// Register a new account. On success the full session is stored; on
    /// failure the store is untouched and the classified error propagates.
    pub async fn register(&mut self, payload: RegisterRequest) -> Result<User, AuthError> {
        let response = self.exchange.register(&payload).await?;
        info!(username = %response.user.username, "Registration successful");
        Ok(self.apply(response.into()))
    }

    /// Log in. On success the full session is stored (replacing any prior
    /// one); on failure the store is untouched - a failed login never
    /// invalidates an existing session.
    pub async fn login(&mut self, credentials: LoginCredentials) -> Result<User, AuthError> {
        let bearer = self.store.token();
        let response = self.exchange.login(&credentials, bearer.as_deref()).await?;
        info!(username = %response.user.username, "Login successful");
        Ok(self.apply(response.into()))
    }

    /// Exchange the stored refresh token for a new session. Fails fast with
    /// `MissingRefreshToken` when none is stored. A rejected refresh forces
    /// logout before the error propagates, so a stale session is never left
    /// behind.
    pub async fn refresh_session(&mut self) -> Result<(), AuthError> {
        let refresh_token = self
            .store
            .refresh_token()
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingRefreshToken)?;

        let bearer = self.store.token();
        match self
            .exchange
            .refresh(Some(&refresh_token), bearer.as_deref())
            .await
        {
            Ok(response) => {
                self.apply(response.into());
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Session refresh failed, logging out");
                self.logout();
                Err(e)
            }
        }
    }

    /// Clear the session and signal navigation to an anonymous route.
    /// A no-op apart from the signal when already anonymous.
    pub fn logout(&mut self) {
        self.store.clear();
        self.navigator.to_login();
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.current().is_some()
    }

    /// The stored access token, for wiring into resource clients.
    pub fn access_token(&self) -> Option<String> {
        self.store.token()
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SessionStore {
        &mut self.store
    }

    fn apply(&mut self, session: Session) -> User {
        let user = session.user.clone();
        self.store.set(session);
        user
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use reqwest::StatusCode;

    use crate::api::{ApiError, AuthOperation};
    use crate::models::AuthResponse;
    use crate::storage::LocalStore;

    use super::*;

    fn response(username: &str, token: &str) -> AuthResponse {
        AuthResponse {
            token: token.to_string(),
            refresh_token: format!("{}-refresh", token),
            user: User {
                id: 1,
                username: username.to_string(),
                email: format!("{}@x.com", username),
            },
        }
    }

    /// Scripted exchange: each operation either succeeds with a canned
    /// response or fails with a 401. Counts network-facing calls.
    struct ScriptedExchange {
        register_ok: Option<(String, String)>,
        login_ok: Option<(String, String)>,
        refresh_ok: Option<(String, String)>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedExchange {
        fn new() -> Self {
            Self {
                register_ok: None,
                login_ok: None,
                refresh_ok: None,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn rejected(op: AuthOperation) -> AuthError {
            AuthError::classify(
                op,
                ApiError::from_status(
                    StatusCode::UNAUTHORIZED,
                    r#"{"message":"Invalid credentials"}"#,
                ),
            )
        }

        fn outcome(
            &self,
            op: AuthOperation,
            script: &Option<(String, String)>,
        ) -> Result<AuthResponse, AuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match script {
                Some((username, token)) => Ok(response(username, token)),
                None => Err(Self::rejected(op)),
            }
        }
    }

    #[async_trait]
    impl CredentialExchange for ScriptedExchange {
        async fn register(&self, _: &RegisterRequest) -> Result<AuthResponse, AuthError> {
            self.outcome(AuthOperation::Register, &self.register_ok)
        }

        async fn login(
            &self,
            _: &LoginCredentials,
            _: Option<&str>,
        ) -> Result<AuthResponse, AuthError> {
            self.outcome(AuthOperation::Login, &self.login_ok)
        }

        async fn refresh(
            &self,
            refresh_token: Option<&str>,
            _: Option<&str>,
        ) -> Result<AuthResponse, AuthError> {
            if refresh_token.is_none() {
                return Err(AuthError::MissingRefreshToken);
            }
            self.outcome(AuthOperation::Refresh, &self.refresh_ok)
        }
    }

    struct FlagNavigator(Arc<AtomicUsize>);

    impl Navigator for FlagNavigator {
        fn to_login(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn manager(exchange: ScriptedExchange) -> SessionManager<ScriptedExchange> {
        SessionManager::new(
            SessionStore::new(LocalStore::in_memory()),
            exchange,
            Box::new(NoNavigation),
        )
    }

    fn creds() -> LoginCredentials {
        LoginCredentials {
            username: "alice".to_string(),
            password: "Abcdef1@".to_string(),
        }
    }

    #[tokio::test]
    async fn register_success_stores_full_session() {
        let mut exchange = ScriptedExchange::new();
        exchange.register_ok = Some(("alice".to_string(), "tok-1".to_string()));
        let mut mgr = manager(exchange);

        let user = mgr
            .register(RegisterRequest {
                username: "alice".to_string(),
                email: "a@x.com".to_string(),
                password: "Abcdef1@".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(user.username, "alice");
        assert!(mgr.is_authenticated());
        assert_eq!(mgr.store().token().as_deref(), Some("tok-1"));
        assert_eq!(mgr.store().refresh_token().as_deref(), Some("tok-1-refresh"));
    }

    #[tokio::test]
    async fn login_failure_leaves_previous_session() {
        let mut exchange = ScriptedExchange::new();
        exchange.register_ok = Some(("alice".to_string(), "tok-1".to_string()));
        // login_ok stays None: the server rejects the login.
        let mut mgr = manager(exchange);

        mgr.register(RegisterRequest {
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            password: "Abcdef1@".to_string(),
        })
        .await
        .unwrap();

        let err = mgr.login(creds()).await.unwrap_err();
        assert_eq!(err.message(), "Invalid credentials");

        // The earlier session is still intact.
        assert_eq!(
            mgr.store().current().map(|u| u.username.as_str()),
            Some("alice")
        );
        assert_eq!(mgr.store().token().as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn login_success_replaces_session() {
        let mut exchange = ScriptedExchange::new();
        exchange.login_ok = Some(("bob".to_string(), "tok-2".to_string()));
        let mut mgr = manager(exchange);

        mgr.login(creds()).await.unwrap();
        assert_eq!(
            mgr.store().current().map(|u| u.username.as_str()),
            Some("bob")
        );
    }

    #[tokio::test]
    async fn refresh_without_token_fails_locally() {
        let exchange = ScriptedExchange::new();
        let calls = Arc::clone(&exchange.calls);
        let mut mgr = manager(exchange);

        let err = mgr.refresh_session().await.unwrap_err();
        assert!(matches!(err, AuthError::MissingRefreshToken));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_refresh_clears_session_and_signals_navigation() {
        let mut exchange = ScriptedExchange::new();
        exchange.login_ok = Some(("alice".to_string(), "tok-1".to_string()));
        // refresh_ok stays None: the server rejects the refresh.

        let nav_count = Arc::new(AtomicUsize::new(0));
        let mut mgr = SessionManager::new(
            SessionStore::new(LocalStore::in_memory()),
            exchange,
            Box::new(FlagNavigator(Arc::clone(&nav_count))),
        );

        mgr.login(creds()).await.unwrap();
        assert!(mgr.is_authenticated());

        let err = mgr.refresh_session().await.unwrap_err();
        assert!(matches!(err, AuthError::Exchange { .. }));

        // Never half-applied: the session is gone and navigation requested.
        assert!(!mgr.is_authenticated());
        assert!(mgr.store().token().is_none());
        assert!(mgr.store().refresh_token().is_none());
        assert_eq!(nav_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn successful_refresh_replaces_session() {
        let mut exchange = ScriptedExchange::new();
        exchange.login_ok = Some(("alice".to_string(), "tok-1".to_string()));
        exchange.refresh_ok = Some(("alice".to_string(), "tok-2".to_string()));
        let mut mgr = manager(exchange);

        mgr.login(creds()).await.unwrap();
        mgr.refresh_session().await.unwrap();
        assert_eq!(mgr.store().token().as_deref(), Some("tok-2"));
        assert!(mgr.is_authenticated());
    }

    #[tokio::test]
    async fn logout_on_anonymous_session_is_a_no_op() {
        let mut mgr = manager(ScriptedExchange::new());
        assert!(!mgr.is_authenticated());
        mgr.logout();
        mgr.logout();
        assert!(!mgr.is_authenticated());
    }
}
