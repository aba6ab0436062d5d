use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{
        HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE},
    },
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use bytes::Bytes;
use serde::Deserialize;
use tracing::error;

use crate::{
    application::{
        compose::ComposeService,
        error::HttpError,
        feed::{FeedError, FeedFilter, FeedService},
        follows::FollowService,
        identity::IdentityService,
        pagination::PageToken,
    },
    cache::{CacheState, page_cache_layer},
    infra::uploads::{UploadStorage, UploadStorageError},
    presentation::views::{
        GroupTemplate, IndexTemplate, PageObjView, PostDetailTemplate, ProfileTemplate,
        comment_view, post_card, render_not_found_response, render_template_response,
    },
};

use super::{
    auth::{self, CurrentUser},
    compose, follows,
    middleware::{log_responses, set_request_context},
};

#[derive(Clone)]
pub struct HttpState {
    pub feed: Arc<FeedService>,
    pub compose: Arc<ComposeService>,
    pub follows: Arc<FollowService>,
    pub identity: Arc<IdentityService>,
    pub uploads: Arc<UploadStorage>,
    pub cache: Option<CacheState>,
}

pub fn build_router(state: HttpState, upload_body_limit: usize) -> Router {
    // The global feed is the only cached route; everything else renders per
    // request.
    let cached_routes = Router::new().route("/", get(index));
    let cached_routes = if let Some(cache_state) = state.cache.clone() {
        cached_routes.layer(middleware::from_fn_with_state(
            cache_state,
            page_cache_layer,
        ))
    } else {
        cached_routes
    };

    let routes = Router::new()
        .route("/group/{slug}/", get(group_posts))
        .route("/profile/{username}/", get(profile))
        .route("/posts/{id}/", get(post_detail))
        .route(
            "/create/",
            get(compose::post_create_form).post(compose::post_create),
        )
        .route(
            "/posts/{id}/edit/",
            get(compose::post_edit_form).post(compose::post_edit),
        )
        .route("/posts/{id}/comment/", post(compose::add_comment))
        .route("/follow/", get(follows::follow_index))
        .route("/profile/{username}/follow/", get(follows::profile_follow))
        .route(
            "/profile/{username}/unfollow/",
            get(follows::profile_unfollow),
        )
        .route("/auth/login/", get(auth::login_form).post(auth::login))
        .route("/auth/logout/", get(auth::logout))
        .route("/uploads/{*path}", get(serve_upload))
        .fallback(not_found);

    cached_routes
        .merge(routes)
        .with_state(state)
        .layer(DefaultBodyLimit::max(upload_body_limit))
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct FeedQuery {
    pub page: Option<String>,
}

impl FeedQuery {
    pub(super) fn token(&self) -> PageToken {
        PageToken::parse(self.page.as_deref())
    }
}

async fn index(State(state): State<HttpState>, Query(query): Query<FeedQuery>) -> Response {
    match state.feed.list(&FeedFilter::All, query.token()).await {
        Ok(slice) => render_template_response(
            IndexTemplate {
                description: "Latest updates on the site".to_string(),
                message: None,
                page: PageObjView::from_slice(&slice),
            },
            StatusCode::OK,
        ),
        Err(err) => feed_error_to_response(err),
    }
}

async fn group_posts(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
    Query(query): Query<FeedQuery>,
) -> Response {
    match state.feed.group_feed(&slug, query.token()).await {
        Ok((group, slice)) => render_template_response(
            GroupTemplate {
                group,
                page: PageObjView::from_slice(&slice),
            },
            StatusCode::OK,
        ),
        Err(err) => feed_error_to_response(err),
    }
}

async fn profile(
    State(state): State<HttpState>,
    Path(username): Path<String>,
    CurrentUser(viewer): CurrentUser,
    Query(query): Query<FeedQuery>,
) -> Response {
    let viewer_id = viewer.as_ref().map(|user| user.id);
    match state
        .feed
        .author_feed(&username, viewer_id, query.token())
        .await
    {
        Ok(feed) => render_template_response(
            ProfileTemplate {
                posts_num: feed.slice.window.total_items,
                following: feed.following,
                is_self: viewer_id == Some(feed.author.id),
                signed_in: viewer.is_some(),
                page: PageObjView::from_slice(&feed.slice),
                author_username: feed.author.username,
            },
            StatusCode::OK,
        ),
        Err(err) => feed_error_to_response(err),
    }
}

async fn post_detail(State(state): State<HttpState>, Path(id): Path<String>) -> Response {
    let Ok(id) = id.parse::<i64>() else {
        return render_not_found_response();
    };

    match state.feed.post_detail(id).await {
        Ok((post, comments)) => render_template_response(
            PostDetailTemplate {
                post: post_card(&post),
                comments: comments.iter().map(comment_view).collect(),
                comment_error: None,
            },
            StatusCode::OK,
        ),
        Err(err) => feed_error_to_response(err),
    }
}

async fn serve_upload(State(state): State<HttpState>, Path(path): Path<String>) -> Response {
    const SOURCE: &str = "infra::http::public::serve_upload";

    match state.uploads.read(&path).await {
        Ok(bytes) => build_upload_response(&path, bytes),
        Err(UploadStorageError::InvalidPath) => HttpError::new(
            SOURCE,
            StatusCode::NOT_FOUND,
            "Upload not found",
            "The requested upload is not available",
        )
        .into_response(),
        Err(UploadStorageError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            HttpError::new(
                SOURCE,
                StatusCode::NOT_FOUND,
                "Upload not found",
                "The requested upload is not available",
            )
            .into_response()
        }
        Err(err) => {
            error!(
                target = SOURCE,
                path = %path,
                error = %err,
                "failed to read stored upload"
            );
            HttpError::new(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read uploaded file",
                err.to_string(),
            )
            .into_response()
        }
    }
}

async fn not_found() -> Response {
    render_not_found_response()
}

pub(super) fn feed_error_to_response(err: FeedError) -> Response {
    match err {
        FeedError::UnknownGroup | FeedError::UnknownAuthor | FeedError::UnknownPost => {
            render_not_found_response()
        }
        FeedError::Repo(err) => {
            super::repo_error_to_http("infra::http::public::feed", err).into_response()
        }
    }
}

fn build_upload_response(path: &str, bytes: Bytes) -> Response {
    let mut response = Response::new(Body::from(bytes.clone()));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&bytes.len().to_string()) {
        headers.insert(CONTENT_LENGTH, value);
    }
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=31536000, immutable"),
    );

    response
}
