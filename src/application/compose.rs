//! Authoring: post creation, author-only editing, comment submission.

use std::sync::Arc;

use thiserror::Error;

use crate::application::repos::{
    CommentsRepo, CreateCommentParams, CreatePostParams, GroupsRepo, PostsRepo, PostsWriteRepo,
    RepoError, UpdatePostParams,
};
use crate::domain::entities::{CommentRecord, GroupRecord, PostRecord, UserRecord};

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("unknown post")]
    UnknownPost,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Outcome of an edit request. Non-authors are bounced back to the detail
/// view, not errored.
#[derive(Debug)]
pub enum EditOutcome {
    Updated(PostRecord),
    NotAuthor(PostRecord),
}

/// Fields of a validated post submission.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub text: String,
    pub group_id: Option<i64>,
    /// Stored path of a freshly uploaded image, if one was attached.
    pub image: Option<String>,
}

#[derive(Clone)]
pub struct ComposeService {
    posts: Arc<dyn PostsRepo>,
    posts_write: Arc<dyn PostsWriteRepo>,
    comments: Arc<dyn CommentsRepo>,
    groups: Arc<dyn GroupsRepo>,
}

impl ComposeService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        posts_write: Arc<dyn PostsWriteRepo>,
        comments: Arc<dyn CommentsRepo>,
        groups: Arc<dyn GroupsRepo>,
    ) -> Self {
        Self {
            posts,
            posts_write,
            comments,
            groups,
        }
    }

    /// Groups offered in the post form's selector.
    pub async fn group_choices(&self) -> Result<Vec<GroupRecord>, ComposeError> {
        Ok(self.groups.list_all().await?)
    }

    pub async fn load_post(&self, id: i64) -> Result<PostRecord, ComposeError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or(ComposeError::UnknownPost)
    }

    /// Create a post authored by `author`. `draft.text` must already have
    /// passed form validation; a dangling group id surfaces as an
    /// `InvalidInput` repository error through the foreign key.
    pub async fn create_post(
        &self,
        author: &UserRecord,
        draft: PostDraft,
    ) -> Result<PostRecord, ComposeError> {
        let record = self
            .posts_write
            .create_post(CreatePostParams {
                author_id: author.id,
                text: draft.text,
                group_id: draft.group_id,
                image: draft.image,
            })
            .await?;
        Ok(record)
    }

    /// Apply an edit if `editor` authored the post; otherwise report
    /// `NotAuthor` with the unchanged record.
    ///
    /// An edit without a fresh image keeps the stored one.
    pub async fn edit_post(
        &self,
        editor: &UserRecord,
        id: i64,
        draft: PostDraft,
    ) -> Result<EditOutcome, ComposeError> {
        let post = self.load_post(id).await?;
        if post.author.id != editor.id {
            return Ok(EditOutcome::NotAuthor(post));
        }

        let image = draft.image.or(post.image);
        let updated = self
            .posts_write
            .update_post(UpdatePostParams {
                id,
                text: draft.text,
                group_id: draft.group_id,
                image,
            })
            .await?;
        Ok(EditOutcome::Updated(updated))
    }

    /// Append a comment to an existing post.
    pub async fn add_comment(
        &self,
        author: &UserRecord,
        post_id: i64,
        text: String,
    ) -> Result<CommentRecord, ComposeError> {
        let post = self.load_post(post_id).await?;
        let record = self
            .comments
            .create_comment(CreateCommentParams {
                post_id: post.id,
                author_id: author.id,
                text,
            })
            .await?;
        Ok(record)
    }
}
