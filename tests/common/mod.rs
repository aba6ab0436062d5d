//! In-memory repository implementations backing the integration suites.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use brusio::application::identity::IdentityService;
use brusio::application::repos::{
    CommentsRepo, CreateCommentParams, CreateGroupParams, CreatePostParams, CreateUserParams,
    FollowsRepo, GroupsRepo, PostQuery, PostsRepo, PostsWriteRepo, RepoError, SessionsRepo,
    UpdatePostParams, UsersRepo,
};
use brusio::domain::entities::{
    AuthorRef, CommentRecord, FollowRecord, GroupRecord, GroupRef, PostRecord, SessionRecord,
    UserRecord,
};

#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<UserRecord>>,
    groups: Mutex<Vec<GroupRecord>>,
    posts: Mutex<Vec<PostRecord>>,
    comments: Mutex<Vec<CommentRecord>>,
    follows: Mutex<Vec<FollowRecord>>,
    sessions: Mutex<Vec<SessionRecord>>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicI64::new(1),
            ..Self::default()
        })
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    pub async fn seed_user(&self, username: &str, password: &str) -> UserRecord {
        let user = UserRecord {
            id: self.next_id(),
            username: username.to_string(),
            password_digest: IdentityService::digest_password(password),
            created: OffsetDateTime::now_utc(),
        };
        self.users.lock().await.push(user.clone());
        user
    }

    pub async fn seed_group(&self, slug: &str, title: &str) -> GroupRecord {
        let group = GroupRecord {
            id: self.next_id(),
            title: title.to_string(),
            slug: slug.to_string(),
            description: format!("Posts about {title}"),
        };
        self.groups.lock().await.push(group.clone());
        group
    }

    pub async fn seed_post_at(
        &self,
        author: &UserRecord,
        group: Option<&GroupRecord>,
        text: &str,
        created: OffsetDateTime,
    ) -> PostRecord {
        let post = PostRecord {
            id: self.next_id(),
            text: text.to_string(),
            author: AuthorRef {
                id: author.id,
                username: author.username.clone(),
            },
            group: group.map(|group| GroupRef {
                id: group.id,
                title: group.title.clone(),
                slug: group.slug.clone(),
            }),
            image: None,
            created,
        };
        self.posts.lock().await.push(post.clone());
        post
    }

    pub async fn seed_session(&self, user: &UserRecord) -> SessionRecord {
        let session = SessionRecord {
            token: Uuid::new_v4(),
            user_id: user.id,
            created: OffsetDateTime::now_utc(),
        };
        self.sessions.lock().await.push(session.clone());
        session
    }

    pub async fn user_by_name(&self, username: &str) -> UserRecord {
        self.users
            .lock()
            .await
            .iter()
            .find(|user| user.username == username)
            .cloned()
            .expect("seeded user")
    }

    pub async fn post_count(&self) -> usize {
        self.posts.lock().await.len()
    }

    pub async fn comment_count(&self) -> usize {
        self.comments.lock().await.len()
    }

    pub async fn post_by_id(&self, id: i64) -> Option<PostRecord> {
        self.posts.lock().await.iter().find(|p| p.id == id).cloned()
    }

    pub async fn follow_edges(&self) -> Vec<(i64, i64)> {
        self.follows
            .lock()
            .await
            .iter()
            .map(|edge| (edge.user_id, edge.author_id))
            .collect()
    }
}

fn matches(query: &PostQuery, post: &PostRecord) -> bool {
    if let Some(group) = query.group
        && post.group.as_ref().map(|g| g.id) != Some(group)
    {
        return false;
    }
    if let Some(author) = query.author
        && post.author.id != author
    {
        return false;
    }
    if let Some(authors) = query.authors.as_ref()
        && !authors.contains(&post.author.id)
    {
        return false;
    }
    true
}

#[async_trait]
impl PostsRepo for MemoryStore {
    async fn list_posts(
        &self,
        query: &PostQuery,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let mut posts: Vec<PostRecord> = self
            .posts
            .lock()
            .await
            .iter()
            .filter(|post| matches(query, post))
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created.cmp(&a.created).then(b.id.cmp(&a.id)));

        Ok(posts
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(limit as usize)
            .collect())
    }

    async fn count_posts(&self, query: &PostQuery) -> Result<u64, RepoError> {
        let count = self
            .posts
            .lock()
            .await
            .iter()
            .filter(|post| matches(query, post))
            .count();
        Ok(count as u64)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        Ok(self.posts.lock().await.iter().find(|p| p.id == id).cloned())
    }
}

#[async_trait]
impl PostsWriteRepo for MemoryStore {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let author = self
            .users
            .lock()
            .await
            .iter()
            .find(|user| user.id == params.author_id)
            .cloned()
            .ok_or_else(|| RepoError::InvalidInput {
                message: "unknown author".to_string(),
            })?;

        let group = match params.group_id {
            Some(group_id) => Some(
                self.groups
                    .lock()
                    .await
                    .iter()
                    .find(|group| group.id == group_id)
                    .cloned()
                    .ok_or_else(|| RepoError::InvalidInput {
                        message: "unknown group".to_string(),
                    })?,
            ),
            None => None,
        };

        let post = PostRecord {
            id: self.next_id(),
            text: params.text,
            author: AuthorRef {
                id: author.id,
                username: author.username,
            },
            group: group.map(|group| GroupRef {
                id: group.id,
                title: group.title,
                slug: group.slug,
            }),
            image: params.image,
            created: OffsetDateTime::now_utc(),
        };
        self.posts.lock().await.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let group = match params.group_id {
            Some(group_id) => Some(
                self.groups
                    .lock()
                    .await
                    .iter()
                    .find(|group| group.id == group_id)
                    .cloned()
                    .ok_or_else(|| RepoError::InvalidInput {
                        message: "unknown group".to_string(),
                    })?,
            ),
            None => None,
        };

        let mut posts = self.posts.lock().await;
        let post = posts
            .iter_mut()
            .find(|post| post.id == params.id)
            .ok_or(RepoError::NotFound)?;
        post.text = params.text;
        post.group = group.map(|group| GroupRef {
            id: group.id,
            title: group.title,
            slug: group.slug,
        });
        post.image = params.image;
        Ok(post.clone())
    }
}

#[async_trait]
impl CommentsRepo for MemoryStore {
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentRecord>, RepoError> {
        let mut comments: Vec<CommentRecord> = self
            .comments
            .lock()
            .await
            .iter()
            .filter(|comment| comment.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created.cmp(&b.created).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let author = self
            .users
            .lock()
            .await
            .iter()
            .find(|user| user.id == params.author_id)
            .cloned()
            .ok_or_else(|| RepoError::InvalidInput {
                message: "unknown author".to_string(),
            })?;

        let comment = CommentRecord {
            id: self.next_id(),
            post_id: params.post_id,
            author: AuthorRef {
                id: author.id,
                username: author.username,
            },
            text: params.text,
            created: OffsetDateTime::now_utc(),
        };
        self.comments.lock().await.push(comment.clone());
        Ok(comment)
    }
}

#[async_trait]
impl GroupsRepo for MemoryStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError> {
        Ok(self
            .groups
            .lock()
            .await
            .iter()
            .find(|group| group.slug == slug)
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<GroupRecord>, RepoError> {
        let mut groups = self.groups.lock().await.clone();
        groups.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(groups)
    }

    async fn create_group(&self, params: CreateGroupParams) -> Result<GroupRecord, RepoError> {
        let mut groups = self.groups.lock().await;
        if groups.iter().any(|group| group.slug == params.slug) {
            return Err(RepoError::Duplicate {
                constraint: "groups_slug_key".to_string(),
            });
        }

        let group = GroupRecord {
            id: self.next_id(),
            title: params.title,
            slug: params.slug,
            description: params.description,
        };
        groups.push(group.clone());
        Ok(group)
    }
}

#[async_trait]
impl UsersRepo for MemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError> {
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, RepoError> {
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|user| user.id == id)
            .cloned())
    }

    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError> {
        let mut users = self.users.lock().await;
        if users.iter().any(|user| user.username == params.username) {
            return Err(RepoError::Duplicate {
                constraint: "users_username_key".to_string(),
            });
        }

        let user = UserRecord {
            id: self.next_id(),
            username: params.username,
            password_digest: params.password_digest,
            created: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl FollowsRepo for MemoryStore {
    async fn insert(&self, user_id: i64, author_id: i64) -> Result<(), RepoError> {
        if user_id == author_id {
            // Mirrors the schema CHECK constraint.
            return Err(RepoError::Integrity {
                message: "self-follow violates follows_check".to_string(),
            });
        }

        let mut follows = self.follows.lock().await;
        if !follows
            .iter()
            .any(|edge| edge.user_id == user_id && edge.author_id == author_id)
        {
            follows.push(FollowRecord { user_id, author_id });
        }
        Ok(())
    }

    async fn delete(&self, user_id: i64, author_id: i64) -> Result<(), RepoError> {
        self.follows
            .lock()
            .await
            .retain(|edge| !(edge.user_id == user_id && edge.author_id == author_id));
        Ok(())
    }

    async fn exists(&self, user_id: i64, author_id: i64) -> Result<bool, RepoError> {
        Ok(self
            .follows
            .lock()
            .await
            .iter()
            .any(|edge| edge.user_id == user_id && edge.author_id == author_id))
    }

    async fn followed_authors(&self, user_id: i64) -> Result<Vec<i64>, RepoError> {
        Ok(self
            .follows
            .lock()
            .await
            .iter()
            .filter(|edge| edge.user_id == user_id)
            .map(|edge| edge.author_id)
            .collect())
    }
}

#[async_trait]
impl SessionsRepo for MemoryStore {
    async fn create_session(&self, user_id: i64) -> Result<SessionRecord, RepoError> {
        let session = SessionRecord {
            token: Uuid::new_v4(),
            user_id,
            created: OffsetDateTime::now_utc(),
        };
        self.sessions.lock().await.push(session.clone());
        Ok(session)
    }

    async fn find_session(&self, token: Uuid) -> Result<Option<SessionRecord>, RepoError> {
        Ok(self
            .sessions
            .lock()
            .await
            .iter()
            .find(|session| session.token == token)
            .cloned())
    }

    async fn delete_session(&self, token: Uuid) -> Result<(), RepoError> {
        self.sessions
            .lock()
            .await
            .retain(|session| session.token != token);
        Ok(())
    }
}
