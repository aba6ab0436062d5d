//! Follow management: directed user-to-author subscription edges.

use std::sync::Arc;

use thiserror::Error;

use crate::application::repos::{FollowsRepo, RepoError, UsersRepo};
use crate::domain::entities::UserRecord;

#[derive(Debug, Error)]
pub enum FollowError {
    #[error("unknown author")]
    UnknownAuthor,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct FollowService {
    follows: Arc<dyn FollowsRepo>,
    users: Arc<dyn UsersRepo>,
}

impl FollowService {
    pub fn new(follows: Arc<dyn FollowsRepo>, users: Arc<dyn UsersRepo>) -> Self {
        Self { follows, users }
    }

    /// Subscribe `user` to the posts of the author named `author_username`.
    ///
    /// Following yourself is a silent no-op, as is repeating an existing
    /// subscription; no `(user, user)` edge can be created through here
    /// regardless of call sequence.
    pub async fn follow(
        &self,
        user: &UserRecord,
        author_username: &str,
    ) -> Result<(), FollowError> {
        let author = self.resolve_author(author_username).await?;
        if user.id == author.id {
            return Ok(());
        }
        self.follows.insert(user.id, author.id).await?;
        Ok(())
    }

    /// Remove the subscription if it exists; absent edges are a no-op.
    pub async fn unfollow(
        &self,
        user: &UserRecord,
        author_username: &str,
    ) -> Result<(), FollowError> {
        let author = self.resolve_author(author_username).await?;
        self.follows.delete(user.id, author.id).await?;
        Ok(())
    }

    pub async fn is_following(&self, user_id: i64, author_id: i64) -> Result<bool, FollowError> {
        Ok(self.follows.exists(user_id, author_id).await?)
    }

    async fn resolve_author(&self, username: &str) -> Result<UserRecord, FollowError> {
        self.users
            .find_by_username(username)
            .await?
            .ok_or(FollowError::UnknownAuthor)
    }
}
