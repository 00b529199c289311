//! Scripted collaborators for tests and demos.

use crate::environment::{AuthApi, AuthApiFuture};
use crate::session::{Session, SessionStore, SessionStoreError};
use ghumly_api::{ApiError, AuthResponse, UserProfile, VerifyOtpRequest};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// In-memory session store.
///
/// Shares its slot across clones, so the store handed to an environment
/// and the one a test asserts on are the same session.
#[derive(Clone, Debug, Default)]
pub struct MockSessionStore {
    session: std::sync::Arc<Mutex<Option<Session>>>,
}

impl MockSessionStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with a session, as after an earlier login.
    #[must_use]
    pub fn with_session(session: Session) -> Self {
        let store = Self::new();
        *store.slot() = Some(session);
        store
    }

    /// The currently stored session.
    #[must_use]
    pub fn stored(&self) -> Option<Session> {
        self.slot().clone()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStore for MockSessionStore {
    async fn save(&self, session: &Session) -> Result<(), SessionStoreError> {
        *self.slot() = Some(session.clone());
        Ok(())
    }

    async fn load(&self) -> Option<Session> {
        self.stored()
    }

    async fn clear(&self) -> Result<(), SessionStoreError> {
        *self.slot() = None;
        Ok(())
    }
}

/// Scripted [`AuthApi`].
///
/// Responses are queued per result shape with the `with_*` builders and
/// consumed in order; an exhausted queue answers with a business error
/// naming the method. Every invocation is recorded, so a test can assert
/// that local validation stopped a command before the network:
///
/// ```ignore
/// let api = Arc::new(MockAuthApi::new().with_session(sample_auth_response()));
/// let env = AuthEnvironment::new(api.clone(), sessions, clock);
/// // ... drive the reducer ...
/// assert_eq!(api.call_count(), 0);
/// ```
#[derive(Debug, Default)]
pub struct MockAuthApi {
    sessions: Mutex<VecDeque<Result<AuthResponse, String>>>,
    acks: Mutex<VecDeque<Result<(), String>>>,
    profiles: Mutex<VecDeque<Result<UserProfile, String>>>,
    calls: Mutex<Vec<String>>,
}

impl MockAuthApi {
    /// Mock with empty scripts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful login/verify-otp response.
    #[must_use]
    pub fn with_session(self, response: AuthResponse) -> Self {
        lock(&self.sessions).push_back(Ok(response));
        self
    }

    /// Queue a rejected login/verify-otp.
    #[must_use]
    pub fn with_session_error(self, message: impl Into<String>) -> Self {
        lock(&self.sessions).push_back(Err(message.into()));
        self
    }

    /// Queue a successful acknowledgement (send-otp, forgot, reset).
    #[must_use]
    pub fn with_ack(self) -> Self {
        lock(&self.acks).push_back(Ok(()));
        self
    }

    /// Queue a failed acknowledgement.
    #[must_use]
    pub fn with_ack_error(self, message: impl Into<String>) -> Self {
        lock(&self.acks).push_back(Err(message.into()));
        self
    }

    /// Queue a successful profile update.
    #[must_use]
    pub fn with_profile(self, user: UserProfile) -> Self {
        lock(&self.profiles).push_back(Ok(user));
        self
    }

    /// Queue a rejected profile update.
    #[must_use]
    pub fn with_profile_error(self, message: impl Into<String>) -> Self {
        lock(&self.profiles).push_back(Err(message.into()));
        self
    }

    /// Names of the methods invoked so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    /// How many API methods were invoked.
    #[must_use]
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    fn record(&self, method: &str) {
        lock(&self.calls).push(method.to_string());
    }

    fn next_session(&self, method: &str) -> Result<AuthResponse, ApiError> {
        self.record(method);
        take_scripted(&self.sessions, method)
    }

    fn next_ack(&self, method: &str) -> Result<(), ApiError> {
        self.record(method);
        take_scripted(&self.acks, method)
    }

    fn next_profile(&self, method: &str) -> Result<UserProfile, ApiError> {
        self.record(method);
        take_scripted(&self.profiles, method)
    }
}

impl AuthApi for MockAuthApi {
    fn login(&self, _email: String, _password: String) -> AuthApiFuture<AuthResponse> {
        let result = self.next_session("login");
        Box::pin(async move { result })
    }

    fn send_otp(&self, _email: String, _name: String) -> AuthApiFuture<()> {
        let result = self.next_ack("send_otp");
        Box::pin(async move { result })
    }

    fn verify_otp(&self, _request: VerifyOtpRequest) -> AuthApiFuture<AuthResponse> {
        let result = self.next_session("verify_otp");
        Box::pin(async move { result })
    }

    fn forgot_password(&self, _email: String) -> AuthApiFuture<()> {
        let result = self.next_ack("forgot_password");
        Box::pin(async move { result })
    }

    fn reset_password(&self, _token: String, _password: String) -> AuthApiFuture<()> {
        let result = self.next_ack("reset_password");
        Box::pin(async move { result })
    }

    fn update_profile(&self, _name: String, _phone: String) -> AuthApiFuture<UserProfile> {
        let result = self.next_profile("update_profile");
        Box::pin(async move { result })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn take_scripted<T>(queue: &Mutex<VecDeque<Result<T, String>>>, method: &str) -> Result<T, ApiError> {
    match lock(queue).pop_front() {
        Some(Ok(value)) => Ok(value),
        Some(Err(message)) => Err(ApiError::Business(message)),
        None => Err(ApiError::Business(format!(
            "MockAuthApi: no scripted response for {method}"
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use crate::session::SessionToken;
    use chrono::Utc;

    fn user() -> UserProfile {
        UserProfile {
            id: "u1".to_string(),
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            phone: None,
        }
    }

    #[tokio::test]
    async fn mock_store_round_trips_and_clears() {
        let store = MockSessionStore::new();
        assert_eq!(store.load().await, None);

        let session = Session::new(SessionToken::new("jwt"), user(), Utc::now());
        store.save(&session).await.unwrap();
        assert_eq!(store.load().await, Some(session));

        store.clear().await.unwrap();
        assert_eq!(store.load().await, None);
    }

    #[tokio::test]
    async fn mock_store_clones_share_the_slot() {
        let store = MockSessionStore::new();
        let view = store.clone();

        let session = Session::new(SessionToken::new("jwt"), user(), Utc::now());
        store.save(&session).await.unwrap();

        assert_eq!(view.stored(), Some(session));
    }

    #[tokio::test]
    async fn mock_api_replays_its_script_in_order() {
        let api = MockAuthApi::new()
            .with_session(AuthResponse {
                token: "t1".to_string(),
                user: user(),
            })
            .with_session_error("Invalid credentials");

        assert_eq!(api.login("a".into(), "b".into()).await.unwrap().token, "t1");
        assert!(matches!(
            api.login("a".into(), "b".into()).await,
            Err(ApiError::Business(m)) if m == "Invalid credentials"
        ));
        assert_eq!(api.calls(), vec!["login", "login"]);
    }

    #[tokio::test]
    async fn exhausted_script_answers_with_an_error() {
        let api = MockAuthApi::new();
        let result = api.forgot_password("a@b.c".into()).await;
        assert!(matches!(result, Err(ApiError::Business(m)) if m.contains("forgot_password")));
        assert_eq!(api.call_count(), 1);
    }
}
