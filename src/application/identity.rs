//! Thin identity adapter: session-cookie login over locally stored users.
//!
//! Account management beyond login/logout (sign-up, password reset) is an
//! external concern; users are created out-of-band via the CLI.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use uuid::Uuid;

use crate::application::repos::{RepoError, SessionsRepo, UsersRepo};
use crate::domain::entities::{SessionRecord, UserRecord};

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct IdentityService {
    users: Arc<dyn UsersRepo>,
    sessions: Arc<dyn SessionsRepo>,
}

impl IdentityService {
    pub fn new(users: Arc<dyn UsersRepo>, sessions: Arc<dyn SessionsRepo>) -> Self {
        Self { users, sessions }
    }

    /// Digest a password the way stored credentials are digested.
    pub fn digest_password(password: &str) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(password.as_bytes());
        hasher.finalize().to_vec()
    }

    /// Verify credentials and open a session.
    ///
    /// The digest comparison is constant-time; unknown usernames and wrong
    /// passwords are indistinguishable to the caller.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<SessionRecord, IdentityError> {
        let Some(user) = self.users.find_by_username(username).await? else {
            return Err(IdentityError::InvalidCredentials);
        };

        let supplied = Self::digest_password(password);
        if supplied
            .as_slice()
            .ct_eq(user.password_digest.as_slice())
            .unwrap_u8()
            != 1
        {
            return Err(IdentityError::InvalidCredentials);
        }

        Ok(self.sessions.create_session(user.id).await?)
    }

    /// Close the session; an unknown token is a no-op.
    pub async fn logout(&self, token: Uuid) -> Result<(), IdentityError> {
        self.sessions.delete_session(token).await?;
        Ok(())
    }

    /// Resolve a session token to its user, if the session is live.
    pub async fn resolve(&self, token: Uuid) -> Result<Option<UserRecord>, IdentityError> {
        let Some(session) = self.sessions.find_session(token).await? else {
            return Ok(None);
        };
        Ok(self.users.find_by_id(session.user_id).await?)
    }
}
