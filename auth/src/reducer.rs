//! Authentication reducer.
//!
//! Drives every account flow over the command/event split in
//! [`AuthAction`]: commands validate their input locally, then describe
//! the API call as an [`Effect::Future`]; the resulting events settle
//! [`AuthState`] and, where the session changed, persist it through the
//! [`SessionStore`].
//!
//! # Flows
//!
//! 1. Startup restore: `RestoreSession` -> `SessionRestored`
//! 2. Login: `Login` -> `LoginSucceeded` | `LoginFailed`
//! 3. Registration: `BeginRegistration` -> `OtpSent`, then
//!    `CompleteRegistration` -> `LoginSucceeded` | `LoginFailed`
//! 4. Password reset: `RequestPasswordReset` -> `PasswordResetRequested`,
//!    then `ResetPassword` -> `PasswordResetCompleted`
//! 5. Profile: `UpdateProfile` -> `ProfileUpdated` (signed-in only)
//!
//! Input that fails validation never reaches the network. The reducer
//! answers with an immediate effect resolving to `ValidationFailed`, so
//! observers see the rejection on the same action feed as API outcomes.

use crate::environment::AuthEnvironment;
use crate::session::{Session, SessionStore, SessionToken};
use crate::types::{AuthAction, AuthState, AuthStatus};
use crate::validation::{is_indian_mobile, is_six_digit_otp, password_long_enough};
use ghumly_api::VerifyOtpRequest;
use ghumly_core::effect::Effect;
use ghumly_core::reducer::Reducer;
use ghumly_core::{smallvec, SmallVec};

/// Authentication reducer.
///
/// Stateless itself; generic over the session store so tests can swap
/// the file-backed store for an in-memory one.
#[derive(Debug, Clone)]
pub struct AuthReducer<S> {
    /// Phantom data to hold the store type parameter.
    _phantom: std::marker::PhantomData<S>,
}

impl<S> AuthReducer<S> {
    /// Create a new auth reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<S> Default for AuthReducer<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// The effect for input rejected before any network call.
fn rejected(message: &str) -> SmallVec<[Effect<AuthAction>; 4]> {
    let message = message.to_string();
    smallvec![Effect::Future(Box::pin(async move {
        Some(AuthAction::ValidationFailed { message })
    }))]
}

impl<S> Reducer for AuthReducer<S>
where
    S: SessionStore + Clone + 'static,
{
    type State = AuthState;
    type Action = AuthAction;
    type Environment = AuthEnvironment<S>;

    #[allow(clippy::too_many_lines)] // One arm per action keeps the flow readable
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ═══════════════════════════════════════════════════════════════
            // RestoreSession: Load the persisted session from disk
            // ═══════════════════════════════════════════════════════════════
            AuthAction::RestoreSession => {
                let sessions = env.sessions.clone();
                smallvec![Effect::Future(Box::pin(async move {
                    let session = sessions.load().await;
                    Some(AuthAction::SessionRestored { session })
                }))]
            }

            // ═══════════════════════════════════════════════════════════════
            // SessionRestored: Settle the startup answer
            // ═══════════════════════════════════════════════════════════════
            AuthAction::SessionRestored { session } => {
                state.status = match session {
                    Some(session) => {
                        tracing::info!(user = %session.user.email, "session restored");
                        AuthStatus::SignedIn(session)
                    }
                    None => AuthStatus::SignedOut,
                };
                smallvec![Effect::None]
            }

            // ═══════════════════════════════════════════════════════════════
            // Login: Validate credentials locally, then call the API
            // ═══════════════════════════════════════════════════════════════
            AuthAction::Login { email, password } => {
                if email.trim().is_empty() {
                    return rejected("Email is required");
                }
                if !password_long_enough(&password) {
                    return rejected("Password must be at least 6 characters long");
                }

                state.last_error = None;
                let api = env.auth_api.clone();
                smallvec![Effect::Future(Box::pin(async move {
                    match api.login(email, password).await {
                        Ok(response) => Some(AuthAction::LoginSucceeded {
                            token: SessionToken::from(response.token),
                            user: response.user,
                        }),
                        Err(error) => Some(AuthAction::LoginFailed {
                            message: error.to_string(),
                        }),
                    }
                }))]
            }

            // ═══════════════════════════════════════════════════════════════
            // LoginSucceeded: Sign in and persist the session
            // ═══════════════════════════════════════════════════════════════
            AuthAction::LoginSucceeded { token, user } => {
                let session = Session::new(token, user, env.clock.now());
                state.status = AuthStatus::SignedIn(session.clone());
                state.pending_registration = None;
                state.last_error = None;

                let sessions = env.sessions.clone();
                smallvec![Effect::Future(Box::pin(async move {
                    if let Err(error) = sessions.save(&session).await {
                        // Signed in either way; only persistence is lost
                        tracing::warn!(%error, "failed to persist session");
                    }
                    None
                }))]
            }

            // ═══════════════════════════════════════════════════════════════
            // LoginFailed: Surface the rejection
            // ═══════════════════════════════════════════════════════════════
            AuthAction::LoginFailed { message } => {
                tracing::warn!(%message, "login rejected");
                state.last_error = Some(message);
                smallvec![Effect::None]
            }

            // ═══════════════════════════════════════════════════════════════
            // Logout: Drop the persisted session, then sign out
            // ═══════════════════════════════════════════════════════════════
            AuthAction::Logout => {
                let sessions = env.sessions.clone();
                smallvec![Effect::Future(Box::pin(async move {
                    if let Err(error) = sessions.clear().await {
                        tracing::warn!(%error, "failed to clear persisted session");
                    }
                    Some(AuthAction::LoggedOut)
                }))]
            }

            // ═══════════════════════════════════════════════════════════════
            // LoggedOut: Reset to a clean signed-out state
            // ═══════════════════════════════════════════════════════════════
            AuthAction::LoggedOut => {
                *state = AuthState {
                    status: AuthStatus::SignedOut,
                    ..AuthState::default()
                };
                smallvec![Effect::None]
            }

            // ═══════════════════════════════════════════════════════════════
            // BeginRegistration: Request the registration OTP
            // ═══════════════════════════════════════════════════════════════
            AuthAction::BeginRegistration { name, email } => {
                if name.trim().is_empty() {
                    return rejected("Name is required");
                }
                if email.trim().is_empty() {
                    return rejected("Email is required");
                }

                state.last_error = None;
                let api = env.auth_api.clone();
                smallvec![Effect::Future(Box::pin(async move {
                    match api.send_otp(email.clone(), name).await {
                        Ok(()) => Some(AuthAction::OtpSent { email }),
                        Err(error) => Some(AuthAction::RequestFailed {
                            message: error.to_string(),
                        }),
                    }
                }))]
            }

            // ═══════════════════════════════════════════════════════════════
            // OtpSent: Remember which email is mid-registration
            // ═══════════════════════════════════════════════════════════════
            AuthAction::OtpSent { email } => {
                state.pending_registration = Some(email);
                state.last_error = None;
                smallvec![Effect::None]
            }

            // ═══════════════════════════════════════════════════════════════
            // CompleteRegistration: Verify the OTP and create the account
            // ═══════════════════════════════════════════════════════════════
            AuthAction::CompleteRegistration {
                email,
                otp,
                password,
                phone,
            } => {
                if !is_six_digit_otp(&otp) {
                    return rejected("Please enter the 6-digit code sent to your email");
                }
                if !password_long_enough(&password) {
                    return rejected("Password must be at least 6 characters long");
                }
                if !is_indian_mobile(&phone) {
                    return rejected("Please enter a valid 10-digit Indian phone number");
                }

                state.last_error = None;
                let api = env.auth_api.clone();
                smallvec![Effect::Future(Box::pin(async move {
                    let request = VerifyOtpRequest {
                        email,
                        otp,
                        password,
                        phone,
                    };
                    match api.verify_otp(request).await {
                        Ok(response) => Some(AuthAction::LoginSucceeded {
                            token: SessionToken::from(response.token),
                            user: response.user,
                        }),
                        Err(error) => Some(AuthAction::LoginFailed {
                            message: error.to_string(),
                        }),
                    }
                }))]
            }

            // ═══════════════════════════════════════════════════════════════
            // RequestPasswordReset: Ask for the reset email
            // ═══════════════════════════════════════════════════════════════
            AuthAction::RequestPasswordReset { email } => {
                if email.trim().is_empty() {
                    return rejected("Email is required");
                }

                state.last_error = None;
                let api = env.auth_api.clone();
                smallvec![Effect::Future(Box::pin(async move {
                    match api.forgot_password(email).await {
                        Ok(()) => Some(AuthAction::PasswordResetRequested),
                        Err(error) => Some(AuthAction::RequestFailed {
                            message: error.to_string(),
                        }),
                    }
                }))]
            }

            // ═══════════════════════════════════════════════════════════════
            // PasswordResetRequested: The email is on its way
            // ═══════════════════════════════════════════════════════════════
            AuthAction::PasswordResetRequested => {
                state.reset_requested = true;
                state.last_error = None;
                smallvec![Effect::None]
            }

            // ═══════════════════════════════════════════════════════════════
            // ResetPassword: Redeem the token from the reset email
            // ═══════════════════════════════════════════════════════════════
            AuthAction::ResetPassword { token, password } => {
                if !password_long_enough(&password) {
                    return rejected("Password must be at least 6 characters long");
                }

                state.last_error = None;
                let api = env.auth_api.clone();
                smallvec![Effect::Future(Box::pin(async move {
                    match api.reset_password(token, password).await {
                        Ok(()) => Some(AuthAction::PasswordResetCompleted),
                        Err(error) => Some(AuthAction::RequestFailed {
                            message: error.to_string(),
                        }),
                    }
                }))]
            }

            // ═══════════════════════════════════════════════════════════════
            // PasswordResetCompleted: Ready for a fresh login
            // ═══════════════════════════════════════════════════════════════
            AuthAction::PasswordResetCompleted => {
                state.reset_requested = false;
                state.last_error = None;
                smallvec![Effect::None]
            }

            // ═══════════════════════════════════════════════════════════════
            // UpdateProfile: Change name/phone on the signed-in account
            // ═══════════════════════════════════════════════════════════════
            AuthAction::UpdateProfile { name, phone } => {
                if !state.is_signed_in() {
                    return rejected("You must be signed in to update your profile");
                }
                if name.trim().is_empty() {
                    return rejected("Name is required");
                }
                if !is_indian_mobile(&phone) {
                    return rejected("Please enter a valid 10-digit Indian phone number");
                }

                state.last_error = None;
                let api = env.auth_api.clone();
                smallvec![Effect::Future(Box::pin(async move {
                    match api.update_profile(name, phone).await {
                        Ok(user) => Some(AuthAction::ProfileUpdated { user }),
                        Err(error) => Some(AuthAction::RequestFailed {
                            message: error.to_string(),
                        }),
                    }
                }))]
            }

            // ═══════════════════════════════════════════════════════════════
            // ProfileUpdated: Fold the new profile into the session
            // ═══════════════════════════════════════════════════════════════
            AuthAction::ProfileUpdated { user } => {
                let AuthStatus::SignedIn(session) = &mut state.status else {
                    tracing::warn!("profile update landed while signed out");
                    return smallvec![Effect::None];
                };
                session.user = user;
                state.last_error = None;

                let session = session.clone();
                let sessions = env.sessions.clone();
                smallvec![Effect::Future(Box::pin(async move {
                    if let Err(error) = sessions.save(&session).await {
                        tracing::warn!(%error, "failed to persist session");
                    }
                    None
                }))]
            }

            // ═══════════════════════════════════════════════════════════════
            // ValidationFailed: Input rejected before the network
            // ═══════════════════════════════════════════════════════════════
            AuthAction::ValidationFailed { message } => {
                tracing::debug!(%message, "input rejected locally");
                state.last_error = Some(message);
                smallvec![Effect::None]
            }

            // ═══════════════════════════════════════════════════════════════
            // RequestFailed: A non-login API call failed
            // ═══════════════════════════════════════════════════════════════
            AuthAction::RequestFailed { message } => {
                tracing::warn!(%message, "auth request failed");
                state.last_error = Some(message);
                smallvec![Effect::None]
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use crate::mocks::{MockAuthApi, MockSessionStore};
    use ghumly_api::UserProfile;
    use ghumly_core::environment::Clock;
    use ghumly_testing::mocks::test_clock;
    use ghumly_testing::reducer_test::{assertions, ReducerTest};
    use std::sync::Arc;

    fn env() -> AuthEnvironment<MockSessionStore> {
        AuthEnvironment::new(
            Arc::new(MockAuthApi::new()),
            MockSessionStore::new(),
            Arc::new(test_clock()),
        )
    }

    fn user() -> UserProfile {
        UserProfile {
            id: "u1".to_string(),
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            phone: Some("9876543210".to_string()),
        }
    }

    fn signed_in_state() -> AuthState {
        AuthState {
            status: AuthStatus::SignedIn(Session::new(
                SessionToken::new("jwt"),
                user(),
                test_clock().now(),
            )),
            ..AuthState::default()
        }
    }

    #[test]
    fn restore_session_defers_to_the_store() {
        ReducerTest::new(AuthReducer::<MockSessionStore>::new())
            .with_env(env())
            .given_state(AuthState::default())
            .when_action(AuthAction::RestoreSession)
            .then_state(|state| assert_eq!(state.status, AuthStatus::Unknown))
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn restoring_nothing_settles_on_signed_out() {
        ReducerTest::new(AuthReducer::<MockSessionStore>::new())
            .with_env(env())
            .given_state(AuthState::default())
            .when_action(AuthAction::SessionRestored { session: None })
            .then_state(|state| assert_eq!(state.status, AuthStatus::SignedOut))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn login_succeeded_signs_in_and_schedules_the_save() {
        ReducerTest::new(AuthReducer::<MockSessionStore>::new())
            .with_env(env())
            .given_state(AuthState {
                last_error: Some("Invalid credentials".to_string()),
                ..AuthState::default()
            })
            .when_action(AuthAction::LoginSucceeded {
                token: SessionToken::new("jwt"),
                user: user(),
            })
            .then_state(|state| {
                assert!(state.is_signed_in());
                assert_eq!(state.last_error, None);
                let session = state.session().unwrap();
                assert_eq!(session.user.email, "asha@example.com");
                assert_eq!(session.created_at, test_clock().now());
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn login_failure_lands_in_last_error() {
        ReducerTest::new(AuthReducer::<MockSessionStore>::new())
            .with_env(env())
            .given_state(AuthState::default())
            .when_action(AuthAction::LoginFailed {
                message: "Invalid credentials".to_string(),
            })
            .then_state(|state| {
                assert_eq!(state.last_error.as_deref(), Some("Invalid credentials"));
                assert!(!state.is_signed_in());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn invalid_login_input_answers_with_an_effect_not_a_call() {
        ReducerTest::new(AuthReducer::<MockSessionStore>::new())
            .with_env(env())
            .given_state(AuthState::default())
            .when_action(AuthAction::Login {
                email: "asha@example.com".to_string(),
                password: "abc".to_string(),
            })
            .then_state(|state| {
                // The rejection arrives as a ValidationFailed event later
                assert_eq!(state.last_error, None);
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn logged_out_resets_every_field() {
        ReducerTest::new(AuthReducer::<MockSessionStore>::new())
            .with_env(env())
            .given_state(AuthState {
                pending_registration: Some("asha@example.com".to_string()),
                reset_requested: true,
                last_error: Some("old".to_string()),
                ..signed_in_state()
            })
            .when_action(AuthAction::LoggedOut)
            .then_state(|state| {
                assert_eq!(state.status, AuthStatus::SignedOut);
                assert_eq!(state.pending_registration, None);
                assert!(!state.reset_requested);
                assert_eq!(state.last_error, None);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn otp_sent_records_the_pending_email() {
        ReducerTest::new(AuthReducer::<MockSessionStore>::new())
            .with_env(env())
            .given_state(AuthState::default())
            .when_action(AuthAction::OtpSent {
                email: "asha@example.com".to_string(),
            })
            .then_state(|state| {
                assert_eq!(
                    state.pending_registration.as_deref(),
                    Some("asha@example.com")
                );
            })
            .run();
    }

    #[test]
    fn password_reset_events_toggle_the_flag() {
        ReducerTest::new(AuthReducer::<MockSessionStore>::new())
            .with_env(env())
            .given_state(AuthState::default())
            .when_action(AuthAction::PasswordResetRequested)
            .when_action(AuthAction::PasswordResetCompleted)
            .then_state(|state| assert!(!state.reset_requested))
            .run();
    }

    #[test]
    fn profile_updated_rewrites_the_session_user() {
        let renamed = UserProfile {
            name: "Asha Verma".to_string(),
            ..user()
        };
        ReducerTest::new(AuthReducer::<MockSessionStore>::new())
            .with_env(env())
            .given_state(signed_in_state())
            .when_action(AuthAction::ProfileUpdated { user: renamed })
            .then_state(|state| {
                assert_eq!(state.user().unwrap().name, "Asha Verma");
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn profile_updated_while_signed_out_is_ignored() {
        ReducerTest::new(AuthReducer::<MockSessionStore>::new())
            .with_env(env())
            .given_state(AuthState::default())
            .when_action(AuthAction::ProfileUpdated { user: user() })
            .then_state(|state| assert!(!state.is_signed_in()))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn update_profile_while_signed_out_is_rejected() {
        ReducerTest::new(AuthReducer::<MockSessionStore>::new())
            .with_env(env())
            .given_state(AuthState::default())
            .when_action(AuthAction::UpdateProfile {
                name: "Asha".to_string(),
                phone: "9876543210".to_string(),
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn validation_failed_lands_in_last_error() {
        ReducerTest::new(AuthReducer::<MockSessionStore>::new())
            .with_env(env())
            .given_state(AuthState::default())
            .when_action(AuthAction::ValidationFailed {
                message: "Email is required".to_string(),
            })
            .then_state(|state| {
                assert_eq!(state.last_error.as_deref(), Some("Email is required"));
            })
            .run();
    }
}
