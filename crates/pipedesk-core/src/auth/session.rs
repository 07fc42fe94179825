//! Session lifecycle management.
//!
//! The `SessionManager` owns the access token and everything about its
//! lifetime: the expiry countdown, the single scheduled refresh, startup
//! verification, and the logout paths. Collaborators never reach into
//! ambient state; they hold a manager clone and either query it or
//! subscribe to [`AuthState`] transitions.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::{ApiError, TokenResponse};
use crate::auth::TokenStore;
use crate::models::{Role, User};

/// Seconds before token expiry at which the refresh fires.
const REFRESH_LEAD_SECS: i64 = 60;

/// Port for the authentication endpoints the session manager drives.
/// `ApiClient` is the production implementation.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn request_token(&self, username: &str, password: &str) -> Result<TokenResponse>;
    async fn refresh_token(&self, token: &str) -> Result<TokenResponse>;
    async fn verify_token(&self, token: &str) -> Result<()>;
    async fn current_user(&self, token: &str) -> Result<User>;
    async fn delete_current_user(&self, token: &str) -> Result<()>;
}

/// Snapshot of the current session.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub access_token: String,
    /// Absolute expiry of the current token. Absent on a session resumed
    /// from storage, where the stored token carries no declared lifetime.
    pub expires_at: Option<DateTime<Utc>>,
    pub user_id: Option<i64>,
    pub role: Option<Role>,
}

/// Externally visible authentication state, broadcast to collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    LoggedOut,
    LoggedIn {
        user_id: Option<i64>,
        role: Option<Role>,
    },
}

impl AuthState {
    pub fn is_logged_in(&self) -> bool {
        matches!(self, AuthState::LoggedIn { .. })
    }
}

struct SessionState {
    session: Option<Session>,
    /// Handle for the one pending scheduled refresh. Scheduling a new
    /// refresh or clearing the session aborts it; the handle covers only
    /// the pending timer, never a request already sent.
    refresh_task: Option<JoinHandle<()>>,
}

struct ManagerShared {
    api: Arc<dyn AuthApi>,
    store: TokenStore,
    state: Mutex<SessionState>,
    auth_tx: watch::Sender<AuthState>,
}

/// Owns the session. Clone is cheap; clones share the same session.
#[derive(Clone)]
pub struct SessionManager {
    shared: Arc<ManagerShared>,
}

impl SessionManager {
    pub fn new(api: Arc<dyn AuthApi>, store: TokenStore) -> Self {
        let (auth_tx, _) = watch::channel(AuthState::LoggedOut);
        Self {
            shared: Arc::new(ManagerShared {
                api,
                store,
                state: Mutex::new(SessionState {
                    session: None,
                    refresh_task: None,
                }),
                auth_tx,
            }),
        }
    }

    // =========================================================================
    // State queries
    // =========================================================================

    /// Current externally visible state. LoggedIn only after a complete
    /// login (token plus identity) or a successful resume.
    pub fn auth_state(&self) -> AuthState {
        self.shared.auth_tx.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_state().is_logged_in()
    }

    pub fn current_user_id(&self) -> Option<i64> {
        self.snapshot().and_then(|session| session.user_id)
    }

    pub fn current_role(&self) -> Option<Role> {
        self.snapshot().and_then(|session| session.role)
    }

    /// Bearer token for outbound requests, if one is held
    pub fn access_token(&self) -> Option<String> {
        self.snapshot().map(|session| session.access_token)
    }

    /// Subscribe to login/logout transitions
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.shared.auth_tx.subscribe()
    }

    fn snapshot(&self) -> Option<Session> {
        self.shared.state.lock().unwrap().session.clone()
    }

    fn notify(&self, state: AuthState) {
        self.shared.auth_tx.send_replace(state);
    }

    // =========================================================================
    // Lifecycle operations
    // =========================================================================

    /// Exchange credentials for a token and establish the session.
    ///
    /// On success the token and expiry are stored, the principal's identity
    /// is fetched with the new token, and the refresh is scheduled. If the
    /// identity lookup fails the token remains stored but the session stays
    /// logged out with no identity fields; recovery is left to the next
    /// login or verify.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        if username.is_empty() || password.is_empty() {
            return Err(
                ApiError::Authentication("Username and password are required".to_string()).into(),
            );
        }

        let grant = self.shared.api.request_token(username, password).await?;
        let expires_at = Utc::now() + chrono::Duration::seconds(grant.expires_in);

        {
            let mut state = self.shared.state.lock().unwrap();
            state.session = Some(Session {
                access_token: grant.access_token.clone(),
                expires_at: Some(expires_at),
                user_id: None,
                role: None,
            });
        }
        self.shared.store.set_token(&grant.access_token)?;

        let user = match self.shared.api.current_user(&grant.access_token).await {
            Ok(user) => user,
            Err(error) => {
                warn!(%error, "Identity lookup failed after login; token stored without identity");
                return Err(
                    ApiError::Authentication("Failed to fetch user details".to_string()).into(),
                );
            }
        };

        self.shared.store.set_user_id(user.id)?;

        let session = {
            let mut state = self.shared.state.lock().unwrap();
            let session = state.session.get_or_insert_with(|| Session {
                access_token: grant.access_token.clone(),
                expires_at: Some(expires_at),
                user_id: None,
                role: None,
            });
            session.user_id = Some(user.id);
            session.role = Some(user.role);
            session.clone()
        };

        self.notify(AuthState::LoggedIn {
            user_id: session.user_id,
            role: session.role,
        });
        self.schedule_refresh(grant.expires_in);

        info!(user_id = user.id, "Login successful");
        Ok(session)
    }

    /// Arrange for a single refresh sixty seconds before the token's stated
    /// expiry, never in the past. Any previously scheduled refresh is
    /// cancelled first; the chain continues for as long as each refresh
    /// succeeds.
    pub fn schedule_refresh(&self, expires_in_seconds: i64) {
        let delay = Duration::from_secs((expires_in_seconds - REFRESH_LEAD_SECS).max(0) as u64);

        let mut state = self.shared.state.lock().unwrap();
        if let Some(previous) = state.refresh_task.take() {
            // The previous handle may belong to the task running this very
            // path (a refresh re-arming itself); abort only lands at an
            // await point, so that task still runs to completion.
            previous.abort();
        }

        let manager = self.clone();
        state.refresh_task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(error) = manager.refresh().await {
                warn!(%error, "Scheduled token refresh failed");
            }
        }));
        debug!(seconds_until_refresh = delay.as_secs(), "Token refresh scheduled");
    }

    /// Exchange the current token for a fresh one and re-arm the refresh.
    ///
    /// Any failure is terminal for the session: a token that cannot be
    /// renewed is assumed unusable, so the session is cleared and the
    /// logged-out state broadcast before the error surfaces. No retry.
    pub async fn refresh(&self) -> Result<Session> {
        let token = match self.access_token() {
            Some(token) => token,
            None => return Err(ApiError::SessionExpired.into()),
        };

        let grant = match self.shared.api.refresh_token(&token).await {
            Ok(grant) => grant,
            Err(error) => {
                self.clear_session();
                return Err(error);
            }
        };

        let expires_at = Utc::now() + chrono::Duration::seconds(grant.expires_in);
        let session = {
            let mut state = self.shared.state.lock().unwrap();
            match state.session.as_mut() {
                Some(session) => {
                    session.access_token = grant.access_token.clone();
                    session.expires_at = Some(expires_at);
                    session.clone()
                }
                // A logout raced this refresh; the completion still lands.
                None => {
                    let session = Session {
                        access_token: grant.access_token.clone(),
                        expires_at: Some(expires_at),
                        user_id: None,
                        role: None,
                    };
                    state.session = Some(session.clone());
                    session
                }
            }
        };

        self.shared.store.set_token(&grant.access_token)?;
        self.schedule_refresh(grant.expires_in);

        debug!("Token refreshed");
        Ok(session)
    }

    /// Advisory probe of the current token, run unconditionally at startup.
    ///
    /// Never mutates the session on failure: a stale stored token is left in
    /// place and only the caller's logged-in decision is affected. On
    /// success the identity lookup re-syncs role and id, so affordances
    /// gated on role follow server-side changes made elsewhere.
    pub async fn verify(&self) -> bool {
        let token = match self.access_token() {
            Some(token) => token,
            None => return false,
        };

        match self.shared.api.verify_token(&token).await {
            Ok(()) => {
                // Best effort: a failed identity refresh does not fail the probe
                match self.shared.api.current_user(&token).await {
                    Ok(user) => {
                        let mut state = self.shared.state.lock().unwrap();
                        if let Some(session) = state.session.as_mut() {
                            session.user_id = Some(user.id);
                            session.role = Some(user.role);
                        }
                    }
                    Err(error) => {
                        debug!(%error, "Identity refresh after verify failed");
                    }
                }
                true
            }
            Err(error) => {
                debug!(%error, "Token verification failed");
                false
            }
        }
    }

    /// Load the persisted session keys and verify them with the server.
    /// Intended to run once at startup before anything needs the token.
    ///
    /// A resumed session has no known expiry and schedules no refresh: the
    /// expiry is only ever derived from a token issuance. On a failed
    /// verify the stored keys stay put; only the in-memory session is
    /// dropped.
    pub async fn resume(&self) -> Result<bool> {
        let token = match self.shared.store.token()? {
            Some(token) => token,
            None => return Ok(false),
        };
        let user_id = self.shared.store.user_id()?;

        {
            let mut state = self.shared.state.lock().unwrap();
            state.session = Some(Session {
                access_token: token,
                expires_at: None,
                user_id,
                role: None,
            });
        }

        if self.verify().await {
            let (user_id, role) = match self.snapshot() {
                Some(session) => (session.user_id, session.role),
                None => (None, None),
            };
            self.notify(AuthState::LoggedIn { user_id, role });
            debug!("Session resumed from storage");
            Ok(true)
        } else {
            let mut state = self.shared.state.lock().unwrap();
            state.session = None;
            Ok(false)
        }
    }

    /// Drop the session: cancel the pending refresh, clear the stored keys,
    /// and broadcast the logged-out state. Calling it while already logged
    /// out is a no-op.
    pub fn logout(&self) {
        self.clear_session();
        info!("Logged out");
    }

    /// Delete the authenticated principal's own account. On success the
    /// session ends exactly as in [`Self::logout`]; on rejection the
    /// session is left unchanged.
    pub async fn delete_account(&self) -> Result<()> {
        let token = match self.access_token() {
            Some(token) => token,
            None => return Err(ApiError::Authentication("Not signed in".to_string()).into()),
        };

        self.shared.api.delete_current_user(&token).await?;
        self.clear_session();
        info!("Account deleted");
        Ok(())
    }

    fn clear_session(&self) {
        {
            let mut state = self.shared.state.lock().unwrap();
            if let Some(task) = state.refresh_task.take() {
                task.abort();
            }
            state.session = None;
        }
        if let Err(error) = self.shared.store.clear() {
            warn!(%error, "Failed to clear stored session keys");
        }
        self.notify(AuthState::LoggedOut);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn grant(token: &str, expires_in: i64) -> TokenResponse {
        TokenResponse {
            access_token: token.to_string(),
            token_type: Some("bearer".to_string()),
            expires_in,
        }
    }

    fn sample_user(id: i64, role: Role) -> User {
        User {
            id,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            phone: "555-0100".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Liddell".to_string(),
            role,
            disabled: false,
            created_at: "2024-01-01T00:00:00".to_string(),
            updated_at: "2024-01-01T00:00:00".to_string(),
        }
    }

    /// AuthApi fed from scripted response queues; a call with an empty
    /// queue panics, so tests also catch unexpected network traffic.
    #[derive(Default)]
    struct ScriptedApi {
        tokens: Mutex<VecDeque<Result<TokenResponse>>>,
        refreshes: Mutex<VecDeque<Result<TokenResponse>>>,
        verifies: Mutex<VecDeque<Result<()>>>,
        users: Mutex<VecDeque<Result<User>>>,
        deletions: Mutex<VecDeque<Result<()>>>,
        refresh_calls: AtomicUsize,
        verify_calls: AtomicUsize,
    }

    impl ScriptedApi {
        fn pop<T>(queue: &Mutex<VecDeque<Result<T>>>, operation: &str) -> Result<T> {
            queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| panic!("unexpected {} call", operation))
        }
    }

    #[async_trait]
    impl AuthApi for ScriptedApi {
        async fn request_token(&self, _username: &str, _password: &str) -> Result<TokenResponse> {
            Self::pop(&self.tokens, "request_token")
        }

        async fn refresh_token(&self, _token: &str) -> Result<TokenResponse> {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            Self::pop(&self.refreshes, "refresh_token")
        }

        async fn verify_token(&self, _token: &str) -> Result<()> {
            self.verify_calls.fetch_add(1, Ordering::SeqCst);
            Self::pop(&self.verifies, "verify_token")
        }

        async fn current_user(&self, _token: &str) -> Result<User> {
            Self::pop(&self.users, "current_user")
        }

        async fn delete_current_user(&self, _token: &str) -> Result<()> {
            Self::pop(&self.deletions, "delete_current_user")
        }
    }

    fn temp_store(name: &str) -> TokenStore {
        let dir = std::env::temp_dir().join(format!(
            "pipedesk-session-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        TokenStore::new(dir)
    }

    fn manager_with(api: ScriptedApi, name: &str) -> (SessionManager, Arc<ScriptedApi>) {
        let api = Arc::new(api);
        let manager = SessionManager::new(api.clone(), temp_store(name));
        (manager, api)
    }

    /// Let spawned timer tasks run and register their sleeps
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn login_stores_token_identity_and_schedules_refresh() {
        let api = ScriptedApi::default();
        api.tokens.lock().unwrap().push_back(Ok(grant("tok1", 3600)));
        api.users
            .lock()
            .unwrap()
            .push_back(Ok(sample_user(7, Role::User)));
        let (manager, api) = manager_with(api, "login-ok");

        let session = manager.login("alice", "secret").await.unwrap();
        assert_eq!(session.access_token, "tok1");
        assert_eq!(session.user_id, Some(7));
        assert_eq!(session.role, Some(Role::User));
        assert!(manager.is_authenticated());
        assert_eq!(manager.current_user_id(), Some(7));
        assert_eq!(manager.shared.store.token().unwrap().as_deref(), Some("tok1"));
        assert_eq!(manager.shared.store.user_id().unwrap(), Some(7));
        settle().await;

        // The refresh fires at T+3540, not before
        tokio::time::advance(Duration::from_secs(3539)).await;
        settle().await;
        assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 0);

        api.refreshes
            .lock()
            .unwrap()
            .push_back(Ok(grant("tok2", 1800)));
        tokio::time::advance(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 1);
        assert_eq!(manager.access_token().as_deref(), Some("tok2"));
        assert!(manager.is_authenticated());

        // The chain continues from the new lifetime: next fire at +1740
        api.refreshes
            .lock()
            .unwrap()
            .push_back(Ok(grant("tok3", 1800)));
        tokio::time::advance(Duration::from_secs(1739)).await;
        settle().await;
        assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 1);
        tokio::time::advance(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 2);
        assert_eq!(manager.access_token().as_deref(), Some("tok3"));
    }

    #[tokio::test]
    async fn login_rejection_is_an_authentication_error() {
        let api = ScriptedApi::default();
        api.tokens.lock().unwrap().push_back(Err(ApiError::Authentication(
            "Incorrect username or password".to_string(),
        )
        .into()));
        let (manager, _api) = manager_with(api, "login-rejected");

        let error = manager.login("alice", "wrong").await.unwrap_err();
        assert!(matches!(
            error.downcast_ref::<ApiError>(),
            Some(ApiError::Authentication(_))
        ));
        assert!(!manager.is_authenticated());
        assert!(manager.access_token().is_none());
        assert!(manager.shared.state.lock().unwrap().refresh_task.is_none());
    }

    #[tokio::test]
    async fn login_requires_non_empty_credentials() {
        // Nothing is scripted: reaching the API would panic
        let (manager, _api) = manager_with(ScriptedApi::default(), "login-empty");
        assert!(manager.login("", "secret").await.is_err());
        assert!(manager.login("alice", "").await.is_err());
        assert!(!manager.is_authenticated());
    }

    #[tokio::test]
    async fn login_with_failed_identity_lookup_keeps_token_but_stays_logged_out() {
        let api = ScriptedApi::default();
        api.tokens.lock().unwrap().push_back(Ok(grant("tok1", 3600)));
        api.users
            .lock()
            .unwrap()
            .push_back(Err(ApiError::ServerError("boom".to_string()).into()));
        let (manager, api) = manager_with(api, "login-identity-fail");

        let error = manager.login("alice", "secret").await.unwrap_err();
        assert!(matches!(
            error.downcast_ref::<ApiError>(),
            Some(ApiError::Authentication(_))
        ));
        assert!(!manager.is_authenticated());

        // The inconsistency window: token stored, identity absent, no timer
        assert_eq!(manager.access_token().as_deref(), Some("tok1"));
        assert_eq!(manager.shared.store.token().unwrap().as_deref(), Some("tok1"));
        assert_eq!(manager.current_user_id(), None);
        assert_eq!(manager.shared.store.user_id().unwrap(), None);
        assert!(manager.shared.state.lock().unwrap().refresh_task.is_none());
        assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_cancels_the_previous_timer() {
        let api = ScriptedApi::default();
        api.tokens.lock().unwrap().push_back(Ok(grant("tok1", 300)));
        api.tokens.lock().unwrap().push_back(Ok(grant("tok2", 3600)));
        api.users
            .lock()
            .unwrap()
            .push_back(Ok(sample_user(7, Role::User)));
        api.users
            .lock()
            .unwrap()
            .push_back(Ok(sample_user(7, Role::User)));
        let (manager, api) = manager_with(api, "reschedule");

        manager.login("alice", "secret").await.unwrap(); // refresh due at T+240
        settle().await;
        manager.login("alice", "secret").await.unwrap(); // replaces it, due at T+3540
        settle().await;

        tokio::time::advance(Duration::from_secs(300)).await;
        settle().await;
        assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 0);

        api.refreshes
            .lock()
            .unwrap()
            .push_back(Ok(grant("tok3", 3600)));
        tokio::time::advance(Duration::from_secs(3241)).await;
        settle().await;
        assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn short_lived_token_refreshes_immediately() {
        let api = ScriptedApi::default();
        api.tokens.lock().unwrap().push_back(Ok(grant("tok1", 30)));
        api.users
            .lock()
            .unwrap()
            .push_back(Ok(sample_user(7, Role::User)));
        api.refreshes
            .lock()
            .unwrap()
            .push_back(Ok(grant("tok2", 3600)));
        let (manager, api) = manager_with(api, "short-lived");

        // expires_in - 60 clamps to zero: the refresh runs right away
        manager.login("alice", "secret").await.unwrap();
        settle().await;
        assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 1);
        assert_eq!(manager.access_token().as_deref(), Some("tok2"));
    }

    #[tokio::test(start_paused = true)]
    async fn logout_clears_state_storage_and_pending_refresh() {
        let api = ScriptedApi::default();
        api.tokens.lock().unwrap().push_back(Ok(grant("tok1", 3600)));
        api.users
            .lock()
            .unwrap()
            .push_back(Ok(sample_user(7, Role::User)));
        let (manager, api) = manager_with(api, "logout");

        manager.login("alice", "secret").await.unwrap();
        settle().await;

        manager.logout();
        assert!(!manager.is_authenticated());
        assert!(manager.access_token().is_none());
        assert_eq!(manager.current_user_id(), None);
        assert_eq!(manager.shared.store.token().unwrap(), None);
        assert_eq!(manager.shared.store.user_id().unwrap(), None);

        // The cancelled timer never fires, even past its deadline
        tokio::time::advance(Duration::from_secs(4000)).await;
        settle().await;
        assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn logout_twice_matches_logout_once() {
        let api = ScriptedApi::default();
        api.tokens.lock().unwrap().push_back(Ok(grant("tok1", 3600)));
        api.users
            .lock()
            .unwrap()
            .push_back(Ok(sample_user(7, Role::User)));
        let (manager, _api) = manager_with(api, "logout-twice");

        manager.login("alice", "secret").await.unwrap();
        settle().await;

        manager.logout();
        manager.logout();
        assert!(!manager.is_authenticated());
        assert!(manager.access_token().is_none());
        assert_eq!(manager.shared.store.token().unwrap(), None);
        assert_eq!(*manager.subscribe().borrow(), AuthState::LoggedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_rejection_forces_logout() {
        let api = ScriptedApi::default();
        api.tokens.lock().unwrap().push_back(Ok(grant("tok1", 3600)));
        api.users
            .lock()
            .unwrap()
            .push_back(Ok(sample_user(7, Role::User)));
        api.refreshes
            .lock()
            .unwrap()
            .push_back(Err(ApiError::SessionExpired.into()));
        let (manager, api) = manager_with(api, "refresh-fail");

        manager.login("alice", "secret").await.unwrap();
        settle().await;

        let mut rx = manager.subscribe();
        assert!(rx.borrow_and_update().is_logged_in());

        tokio::time::advance(Duration::from_secs(3541)).await;
        settle().await;
        assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 1);

        // The session cleared to logged out and the transition was broadcast
        assert!(!manager.is_authenticated());
        assert!(manager.access_token().is_none());
        assert_eq!(manager.shared.store.token().unwrap(), None);
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), AuthState::LoggedOut);

        // And the chain is dead: nothing further is scheduled
        tokio::time::advance(Duration::from_secs(10_000)).await;
        settle().await;
        assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn refresh_without_token_fails_without_network() {
        let (manager, api) = manager_with(ScriptedApi::default(), "refresh-none");
        let error = manager.refresh().await.unwrap_err();
        assert!(matches!(
            error.downcast_ref::<ApiError>(),
            Some(ApiError::SessionExpired)
        ));
        assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn verify_without_token_is_false_without_network() {
        let (manager, api) = manager_with(ScriptedApi::default(), "verify-none");
        assert!(!manager.verify().await);
        assert_eq!(api.verify_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn verify_resyncs_role_from_server() {
        let api = ScriptedApi::default();
        api.tokens.lock().unwrap().push_back(Ok(grant("tok1", 3600)));
        api.users
            .lock()
            .unwrap()
            .push_back(Ok(sample_user(7, Role::User)));
        // promoted to admin in another session
        api.verifies.lock().unwrap().push_back(Ok(()));
        api.users
            .lock()
            .unwrap()
            .push_back(Ok(sample_user(7, Role::Admin)));
        let (manager, _api) = manager_with(api, "verify-resync");

        manager.login("alice", "secret").await.unwrap();
        settle().await;
        assert_eq!(manager.current_role(), Some(Role::User));

        assert!(manager.verify().await);
        assert_eq!(manager.current_role(), Some(Role::Admin));
        assert!(manager.is_authenticated());
    }

    #[tokio::test]
    async fn resume_restores_identity_and_goes_logged_in() {
        let api = ScriptedApi::default();
        api.verifies.lock().unwrap().push_back(Ok(()));
        api.users
            .lock()
            .unwrap()
            .push_back(Ok(sample_user(7, Role::Admin)));
        let (manager, _api) = manager_with(api, "resume-ok");
        manager.shared.store.set_token("stored-tok").unwrap();
        manager.shared.store.set_user_id(7).unwrap();

        assert!(manager.resume().await.unwrap());
        assert!(manager.is_authenticated());
        assert_eq!(manager.access_token().as_deref(), Some("stored-tok"));
        assert_eq!(manager.current_user_id(), Some(7));
        assert_eq!(manager.current_role(), Some(Role::Admin));

        // A resumed token has no declared lifetime, so nothing is scheduled
        assert!(manager.shared.state.lock().unwrap().refresh_task.is_none());
    }

    #[tokio::test]
    async fn failed_resume_leaves_stored_token_in_place() {
        let api = ScriptedApi::default();
        api.verifies
            .lock()
            .unwrap()
            .push_back(Err(ApiError::SessionExpired.into()));
        let (manager, _api) = manager_with(api, "resume-fail");
        manager.shared.store.set_token("stale").unwrap();
        manager.shared.store.set_user_id(7).unwrap();

        assert!(!manager.resume().await.unwrap());
        assert!(!manager.is_authenticated());
        assert!(manager.access_token().is_none());

        // The stale token deliberately stays in storage
        assert_eq!(manager.shared.store.token().unwrap().as_deref(), Some("stale"));
        assert_eq!(manager.shared.store.user_id().unwrap(), Some(7));
    }

    #[tokio::test]
    async fn resume_with_nothing_stored_is_false() {
        let (manager, api) = manager_with(ScriptedApi::default(), "resume-empty");
        assert!(!manager.resume().await.unwrap());
        assert_eq!(api.verify_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn delete_account_ends_the_session() {
        let api = ScriptedApi::default();
        api.tokens.lock().unwrap().push_back(Ok(grant("tok1", 3600)));
        api.users
            .lock()
            .unwrap()
            .push_back(Ok(sample_user(7, Role::User)));
        api.deletions.lock().unwrap().push_back(Ok(()));
        let (manager, api) = manager_with(api, "delete-ok");

        manager.login("alice", "secret").await.unwrap();
        settle().await;

        manager.delete_account().await.unwrap();
        assert!(!manager.is_authenticated());
        assert_eq!(manager.shared.store.token().unwrap(), None);

        tokio::time::advance(Duration::from_secs(4000)).await;
        settle().await;
        assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn delete_account_rejection_leaves_session_intact() {
        let api = ScriptedApi::default();
        api.tokens.lock().unwrap().push_back(Ok(grant("tok1", 3600)));
        api.users
            .lock()
            .unwrap()
            .push_back(Ok(sample_user(7, Role::User)));
        api.deletions.lock().unwrap().push_back(Err(ApiError::Authentication(
            "Failed to delete account".to_string(),
        )
        .into()));
        let (manager, _api) = manager_with(api, "delete-rejected");

        manager.login("alice", "secret").await.unwrap();
        settle().await;

        let error = manager.delete_account().await.unwrap_err();
        assert!(matches!(
            error.downcast_ref::<ApiError>(),
            Some(ApiError::Authentication(_))
        ));
        assert!(manager.is_authenticated());
        assert_eq!(manager.access_token().as_deref(), Some("tok1"));
        assert_eq!(manager.shared.store.token().unwrap().as_deref(), Some("tok1"));
    }
}
