//! Feed assembly: filtered, ordered, paginated post listings.

use std::sync::Arc;

use thiserror::Error;

use crate::application::pagination::{PageToken, PageWindow};
use crate::application::repos::{
    CommentsRepo, FollowsRepo, GroupsRepo, PostQuery, PostsRepo, RepoError, UsersRepo,
};
use crate::domain::entities::{CommentRecord, GroupRecord, PostRecord, UserRecord};

/// Which slice of the post corpus a listing request addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedFilter {
    All,
    /// Posts filed under the group with this slug.
    Group(String),
    /// Posts authored by the user with this username.
    Author(String),
    /// Posts authored by anyone this user follows.
    Following(i64),
}

/// One resolved page of a feed.
#[derive(Debug, Clone)]
pub struct FeedSlice {
    pub posts: Vec<PostRecord>,
    pub window: PageWindow,
    /// Set only for [`FeedFilter::Following`] when the viewer follows nobody;
    /// presentation shows a prompt instead of an empty listing.
    pub no_follows: bool,
}

/// Author feed plus the header data the profile page renders.
#[derive(Debug, Clone)]
pub struct AuthorFeed {
    pub author: UserRecord,
    pub slice: FeedSlice,
    /// Whether the current viewer follows this author.
    pub following: bool,
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("unknown group")]
    UnknownGroup,
    #[error("unknown author")]
    UnknownAuthor,
    #[error("unknown post")]
    UnknownPost,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostsRepo>,
    comments: Arc<dyn CommentsRepo>,
    groups: Arc<dyn GroupsRepo>,
    users: Arc<dyn UsersRepo>,
    follows: Arc<dyn FollowsRepo>,
    page_size: u32,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        comments: Arc<dyn CommentsRepo>,
        groups: Arc<dyn GroupsRepo>,
        users: Arc<dyn UsersRepo>,
        follows: Arc<dyn FollowsRepo>,
        page_size: u32,
    ) -> Self {
        Self {
            posts,
            comments,
            groups,
            users,
            follows,
            page_size,
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Resolve `filter` and return the requested page.
    ///
    /// Listing is a pure read. Out-of-range pages clamp to the last valid
    /// page and an empty corpus yields a single empty page, so pagination
    /// itself never fails; the only errors are unknown filter referents and
    /// repository failures.
    pub async fn list(&self, filter: &FeedFilter, page: PageToken) -> Result<FeedSlice, FeedError> {
        let query = match filter {
            FeedFilter::All => PostQuery::default(),
            FeedFilter::Group(slug) => {
                let group = self
                    .groups
                    .find_by_slug(slug)
                    .await?
                    .ok_or(FeedError::UnknownGroup)?;
                PostQuery {
                    group: Some(group.id),
                    ..PostQuery::default()
                }
            }
            FeedFilter::Author(username) => {
                let author = self
                    .users
                    .find_by_username(username)
                    .await?
                    .ok_or(FeedError::UnknownAuthor)?;
                PostQuery {
                    author: Some(author.id),
                    ..PostQuery::default()
                }
            }
            FeedFilter::Following(user_id) => {
                let authors = self.follows.followed_authors(*user_id).await?;
                if authors.is_empty() {
                    return Ok(FeedSlice {
                        posts: Vec::new(),
                        window: PageWindow::resolve(0, self.page_size, page),
                        no_follows: true,
                    });
                }
                PostQuery {
                    authors: Some(authors),
                    ..PostQuery::default()
                }
            }
        };

        self.page(&query, page).await
    }

    /// Group feed plus the group itself for the page header.
    pub async fn group_feed(
        &self,
        slug: &str,
        page: PageToken,
    ) -> Result<(GroupRecord, FeedSlice), FeedError> {
        let group = self
            .groups
            .find_by_slug(slug)
            .await?
            .ok_or(FeedError::UnknownGroup)?;
        let slice = self
            .page(
                &PostQuery {
                    group: Some(group.id),
                    ..PostQuery::default()
                },
                page,
            )
            .await?;
        Ok((group, slice))
    }

    /// Author feed plus the viewer's follow state.
    ///
    /// The slice's `total_items` doubles as the author's post count shown on
    /// the profile header.
    pub async fn author_feed(
        &self,
        username: &str,
        viewer: Option<i64>,
        page: PageToken,
    ) -> Result<AuthorFeed, FeedError> {
        let author = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(FeedError::UnknownAuthor)?;
        let slice = self
            .page(
                &PostQuery {
                    author: Some(author.id),
                    ..PostQuery::default()
                },
                page,
            )
            .await?;
        let following = match viewer {
            Some(user_id) => self.follows.exists(user_id, author.id).await?,
            None => false,
        };

        Ok(AuthorFeed {
            author,
            slice,
            following,
        })
    }

    /// A single post with its comments in display order.
    pub async fn post_detail(
        &self,
        id: i64,
    ) -> Result<(PostRecord, Vec<CommentRecord>), FeedError> {
        let post = self
            .posts
            .find_by_id(id)
            .await?
            .ok_or(FeedError::UnknownPost)?;
        let comments = self.comments.list_for_post(post.id).await?;
        Ok((post, comments))
    }

    async fn page(&self, query: &PostQuery, page: PageToken) -> Result<FeedSlice, FeedError> {
        let total = self.posts.count_posts(query).await?;
        let window = PageWindow::resolve(total, self.page_size, page);
        let posts = self
            .posts
            .list_posts(query, window.limit, window.offset)
            .await?;

        Ok(FeedSlice {
            posts,
            window,
            no_follows: false,
        })
    }
}
