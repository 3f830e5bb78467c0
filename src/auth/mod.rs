//! Identity: who is signed in, and how they got there.
//!
//! Screens never reach for a global "current user". They receive an
//! [`AuthContext`], which subscribes to the provider's session notifications
//! on [`AuthContext::init`] and releases that subscription on
//! [`AuthContext::teardown`].

mod local;
mod password;

pub use local::LocalIdentity;
pub use password::{hash_password, verify_password};

use thiserror::Error;
use tracing::{info, warn};

use crate::db::Subscription;
use crate::models::UserAccount;

/// A signed-in user.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: UserAccount,
}

impl Session {
    pub fn user_id(&self) -> i64 {
        self.user.id
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("email address has not been confirmed")]
    EmailUnconfirmed,
    #[error("an account with this email already exists")]
    DuplicateAccount,
    #[error("identity backend failure: {0}")]
    Backend(#[from] anyhow::Error),
}

impl AuthError {
    /// The message shown to the user. Each kind maps to its own sentence so
    /// people can tell a typo from an unconfirmed account.
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "Incorrect email or password.",
            AuthError::EmailUnconfirmed => "Please confirm your email before signing in.",
            AuthError::DuplicateAccount => "An account with this email already exists.",
            AuthError::Backend(_) => "Could not complete the request. Try again.",
        }
    }
}

/// Anything that can authenticate a user.
pub trait IdentityProvider {
    fn login(&mut self, email: &str, password: &str) -> Result<Session, AuthError>;
    fn register(
        &mut self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Session, AuthError>;
    fn logout(&mut self) -> Result<(), AuthError>;
    fn current_session(&self) -> Option<Session>;
    /// Notifications fire on every sign-in and sign-out.
    fn subscribe(&self) -> Subscription;
}

/// Process-wide holder of the current session.
pub struct AuthContext {
    provider: Box<dyn IdentityProvider>,
    session: Option<Session>,
    subscription: Option<Subscription>,
}

impl AuthContext {
    /// Subscribe to the provider and adopt whatever session it already has.
    pub fn init(provider: Box<dyn IdentityProvider>) -> Self {
        let subscription = provider.subscribe();
        let session = provider.current_session();
        Self {
            provider,
            session,
            subscription: Some(subscription),
        }
    }

    /// Drop the provider subscription. Further provider changes are ignored
    /// until the context is initialised again.
    pub fn teardown(&mut self) {
        self.subscription = None;
    }

    pub fn is_listening(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Pull pending session notifications. Returns `true` when the held
    /// session changed.
    pub fn refresh(&mut self) -> bool {
        let Some(subscription) = &self.subscription else {
            return false;
        };
        if subscription.drain().is_empty() {
            return false;
        }
        let latest = self.provider.current_session();
        let changed = latest != self.session;
        self.session = latest;
        changed
    }

    pub fn login(&mut self, email: &str, password: &str) -> Result<(), AuthError> {
        match self.provider.login(email, password) {
            Ok(session) => {
                info!(user_id = session.user_id(), "signed in");
                self.refresh();
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "sign-in failed");
                Err(err)
            }
        }
    }

    pub fn register(
        &mut self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<(), AuthError> {
        match self.provider.register(email, password, display_name) {
            Ok(session) => {
                info!(user_id = session.user_id(), "account registered");
                self.refresh();
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "registration failed");
                Err(err)
            }
        }
    }

    pub fn logout(&mut self) -> Result<(), AuthError> {
        self.provider.logout()?;
        info!("signed out");
        self.refresh();
        Ok(())
    }
}

impl Drop for AuthContext {
    fn drop(&mut self) {
        self.teardown();
    }
}
