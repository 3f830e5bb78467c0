use std::rc::Rc;

use rusqlite::Connection;
use tracing::debug;

use super::password::{hash_password, verify_password};
use super::{AuthError, IdentityProvider, Session};
use crate::db::{self, Change, ChangeFeed, ChangeKind, Scope, Subscription};

/// Identity provider backed by the `users` table of the embedded database.
pub struct LocalIdentity {
    conn: Rc<Connection>,
    feed: ChangeFeed,
    current: Option<Session>,
    require_confirmation: bool,
}

impl LocalIdentity {
    pub fn new(conn: Rc<Connection>, feed: ChangeFeed, require_confirmation: bool) -> Self {
        Self {
            conn,
            feed,
            current: None,
            require_confirmation,
        }
    }

    /// Mark an account confirmed so it can sign in when confirmation is
    /// required.
    pub fn confirm_email(&self, email: &str) -> Result<(), AuthError> {
        db::confirm_email(&self.conn, email.trim())?;
        Ok(())
    }

    fn start_session(&mut self, session: Session) -> Session {
        self.current = Some(session.clone());
        self.feed.publish(Change::new(
            Scope::Session,
            ChangeKind::Added,
            session.user_id(),
        ));
        session
    }
}

impl IdentityProvider for LocalIdentity {
    fn login(&mut self, email: &str, password: &str) -> Result<Session, AuthError> {
        let credentials =
            db::find_credentials(&self.conn, email.trim())?.ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &credentials.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }
        if self.require_confirmation && !credentials.account.email_confirmed {
            return Err(AuthError::EmailUnconfirmed);
        }

        Ok(self.start_session(Session {
            user: credentials.account,
        }))
    }

    /// Create the account and sign it in. When confirmation is required the
    /// account is stored unconfirmed and the call reports
    /// [`AuthError::EmailUnconfirmed`] instead of returning a session.
    fn register(
        &mut self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Session, AuthError> {
        let email = email.trim();
        if db::find_credentials(&self.conn, email)?.is_some() {
            return Err(AuthError::DuplicateAccount);
        }

        let account = db::create_user(
            &self.conn,
            email,
            display_name.trim(),
            &hash_password(password)?,
            !self.require_confirmation,
        )?;
        debug!(user_id = account.id, "account stored");

        if self.require_confirmation {
            return Err(AuthError::EmailUnconfirmed);
        }
        Ok(self.start_session(Session { user: account }))
    }

    fn logout(&mut self) -> Result<(), AuthError> {
        if let Some(session) = self.current.take() {
            self.feed.publish(Change::new(
                Scope::Session,
                ChangeKind::Removed,
                session.user_id(),
            ));
        }
        Ok(())
    }

    fn current_session(&self) -> Option<Session> {
        self.current.clone()
    }

    fn subscribe(&self) -> Subscription {
        self.feed.subscribe(Scope::Session)
    }
}
