//! Dependency injection for the auth reducer.

use crate::session::SessionStore;
use ghumly_api::{ApiClient, ApiError, AuthResponse, UserProfile, VerifyOtpRequest};
use ghumly_core::environment::Clock;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future returned by [`AuthApi`] methods.
pub type AuthApiFuture<T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send>>;

/// Port over the backend's auth endpoints.
///
/// Object safe so the environment can hold `Arc<dyn AuthApi>`: the real
/// client in the app, a scripted mock in tests.
pub trait AuthApi: Send + Sync {
    /// `POST /auth/login`
    fn login(&self, email: String, password: String) -> AuthApiFuture<AuthResponse>;

    /// `POST /auth/send-otp`
    fn send_otp(&self, email: String, name: String) -> AuthApiFuture<()>;

    /// `POST /auth/verify-otp`
    fn verify_otp(&self, request: VerifyOtpRequest) -> AuthApiFuture<AuthResponse>;

    /// `POST /auth/forgot-password`
    fn forgot_password(&self, email: String) -> AuthApiFuture<()>;

    /// `PUT /auth/reset-password/:token`
    fn reset_password(&self, token: String, password: String) -> AuthApiFuture<()>;

    /// `PUT /auth/profile`
    fn update_profile(&self, name: String, phone: String) -> AuthApiFuture<UserProfile>;
}

impl AuthApi for ApiClient {
    fn login(&self, email: String, password: String) -> AuthApiFuture<AuthResponse> {
        let client = self.clone();
        Box::pin(async move { client.login(&email, &password).await })
    }

    fn send_otp(&self, email: String, name: String) -> AuthApiFuture<()> {
        let client = self.clone();
        Box::pin(async move { client.send_otp(&email, &name).await })
    }

    fn verify_otp(&self, request: VerifyOtpRequest) -> AuthApiFuture<AuthResponse> {
        let client = self.clone();
        Box::pin(async move { client.verify_otp(&request).await })
    }

    fn forgot_password(&self, email: String) -> AuthApiFuture<()> {
        let client = self.clone();
        Box::pin(async move { client.forgot_password(&email).await })
    }

    fn reset_password(&self, token: String, password: String) -> AuthApiFuture<()> {
        let client = self.clone();
        Box::pin(async move { client.reset_password(&token, &password).await })
    }

    fn update_profile(&self, name: String, phone: String) -> AuthApiFuture<UserProfile> {
        let client = self.clone();
        Box::pin(async move { client.update_profile(&name, &phone).await })
    }
}

/// Everything the auth reducer needs from the outside world.
///
/// # Type Parameters
///
/// - `S`: Session store
#[derive(Clone)]
pub struct AuthEnvironment<S>
where
    S: SessionStore + Clone,
{
    /// Backend auth endpoints
    pub auth_api: Arc<dyn AuthApi>,
    /// Session persistence
    pub sessions: S,
    /// Time source (session timestamps)
    pub clock: Arc<dyn Clock>,
}

impl<S> AuthEnvironment<S>
where
    S: SessionStore + Clone,
{
    /// Assemble an environment from its collaborators.
    pub fn new(auth_api: Arc<dyn AuthApi>, sessions: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            auth_api,
            sessions,
            clock,
        }
    }
}
