//! # Ghumly Auth
//!
//! Session state and the authentication reducer.
//!
//! The crate owns everything between "the user typed credentials" and
//! "requests carry a bearer token": local validation, the login /
//! registration / password-reset / profile flows as an [`AuthReducer`],
//! and session persistence behind the [`SessionStore`] trait with a
//! file-backed implementation for real use and an in-memory mock for
//! tests.
//!
//! ## Flow shape
//!
//! Commands on [`AuthAction`] validate locally first; anything that
//! passes becomes one API effect, and the outcome comes back as an
//! event that settles [`AuthState`]. A host drives it through a store:
//!
//! ```ignore
//! use ghumly_auth::{AuthAction, AuthEnvironment, AuthReducer, AuthState, FileSessionStore};
//!
//! let store = Store::new(
//!     AuthState::default(),
//!     AuthReducer::new(),
//!     AuthEnvironment::new(api, FileSessionStore::from_env()?, clock),
//! );
//! store.send(AuthAction::RestoreSession).await;
//! ```

pub mod environment;
pub mod reducer;
pub mod session;
pub mod types;

pub(crate) mod validation;

#[cfg(feature = "test-utils")]
pub mod mocks;

pub use environment::{AuthApi, AuthApiFuture, AuthEnvironment};
pub use reducer::AuthReducer;
pub use session::{
    FileSessionStore, Session, SessionStore, SessionStoreError, SessionToken, SESSION_PATH_ENV,
};
pub use types::{AuthAction, AuthState, AuthStatus};
