//! Auth state and actions.

use crate::session::{Session, SessionToken};
use ghumly_api::UserProfile;

/// Where the client stands with respect to authentication.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AuthStatus {
    /// Not yet determined (before session restore has run)
    #[default]
    Unknown,
    /// No session
    SignedOut,
    /// Authenticated session
    SignedIn(Session),
}

/// Auth feature state.
///
/// `status` is the authoritative signed-in/out answer; the remaining
/// fields carry sub-flow progress (an OTP waiting to be entered, a
/// password reset in flight) and the last user-facing error.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthState {
    /// Authentication status
    pub status: AuthStatus,
    /// Email awaiting its registration OTP, when a sign-up is underway
    pub pending_registration: Option<String>,
    /// Whether a password-reset email has been requested
    pub reset_requested: bool,
    /// Most recent user-facing error, cleared by the next successful step
    pub last_error: Option<String>,
}

impl AuthState {
    /// The active session, when signed in.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        match &self.status {
            AuthStatus::SignedIn(session) => Some(session),
            AuthStatus::Unknown | AuthStatus::SignedOut => None,
        }
    }

    /// The signed-in user, when signed in.
    #[must_use]
    pub const fn user(&self) -> Option<&UserProfile> {
        match self.session() {
            Some(session) => Some(&session.user),
            None => None,
        }
    }

    /// Whether an authenticated session is active.
    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        matches!(self.status, AuthStatus::SignedIn(_))
    }
}

/// All inputs to the auth reducer: a command (user intent) or an event
/// (what an effect found out). Commands validate locally before any
/// network effect; events settle state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthAction {
    // ========== Commands ==========
    /// Command: Load the persisted session, if any
    RestoreSession,

    /// Command: Sign in with credentials
    Login {
        /// Account email
        email: String,
        /// Account password
        password: String,
    },

    /// Command: Sign out and discard the persisted session
    Logout,

    /// Command: Start registration by requesting an OTP
    BeginRegistration {
        /// Display name for the new account
        name: String,
        /// Email to register
        email: String,
    },

    /// Command: Finish registration with the mailed OTP
    CompleteRegistration {
        /// Email being registered
        email: String,
        /// Six-digit code from the registration mail
        otp: String,
        /// Chosen password
        password: String,
        /// Indian mobile number
        phone: String,
    },

    /// Command: Request a password-reset email
    RequestPasswordReset {
        /// Account email
        email: String,
    },

    /// Command: Set a new password using a reset token
    ResetPassword {
        /// Reset token from the email link
        token: String,
        /// New password
        password: String,
    },

    /// Command: Change name and phone on the signed-in profile
    UpdateProfile {
        /// New display name
        name: String,
        /// New mobile number
        phone: String,
    },

    // ========== Events ==========
    /// Event: Session restore finished
    SessionRestored {
        /// The persisted session, when one decoded
        session: Option<Session>,
    },

    /// Event: The backend issued a session
    LoginSucceeded {
        /// Bearer token
        token: SessionToken,
        /// Authenticated user
        user: UserProfile,
    },

    /// Event: Credentials or OTP were rejected
    LoginFailed {
        /// User-facing message
        message: String,
    },

    /// Event: Sign-out completed locally
    LoggedOut,

    /// Event: Registration OTP was mailed
    OtpSent {
        /// Email the OTP went to
        email: String,
    },

    /// Event: Password-reset email was requested
    PasswordResetRequested,

    /// Event: Password was reset, ready for a fresh login
    PasswordResetCompleted,

    /// Event: Profile update was accepted
    ProfileUpdated {
        /// The updated user
        user: UserProfile,
    },

    /// Event: A command failed local validation, nothing was sent
    ValidationFailed {
        /// User-facing message
        message: String,
    },

    /// Event: A network call failed
    RequestFailed {
        /// User-facing message
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn signed_in_state() -> AuthState {
        AuthState {
            status: AuthStatus::SignedIn(Session::new(
                SessionToken::new("jwt"),
                UserProfile {
                    id: "u1".to_string(),
                    name: "Asha".to_string(),
                    email: "asha@example.com".to_string(),
                    phone: None,
                },
                Utc::now(),
            )),
            ..AuthState::default()
        }
    }

    #[test]
    fn default_state_is_unknown() {
        let state = AuthState::default();
        assert_eq!(state.status, AuthStatus::Unknown);
        assert!(!state.is_signed_in());
        assert!(state.session().is_none());
        assert!(state.user().is_none());
    }

    #[test]
    fn signed_in_state_exposes_session_and_user() {
        let state = signed_in_state();
        assert!(state.is_signed_in());
        assert_eq!(state.session().map(|s| s.token.as_str()), Some("jwt"));
        assert_eq!(state.user().map(|u| u.id.as_str()), Some("u1"));
    }
}
