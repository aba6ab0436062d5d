//! Followed-feed and follow/unfollow handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

use crate::application::feed::FeedFilter;
use crate::application::follows::FollowError;
use crate::presentation::views::{
    IndexTemplate, PageObjView, render_not_found_response, render_template_response,
};

use super::auth::RequireUser;
use super::public::{FeedQuery, HttpState, feed_error_to_response};

const NO_FOLLOWS_PROMPT: &str = "Follow someone to keep up with their updates";

pub(super) async fn follow_index(
    State(state): State<HttpState>,
    RequireUser(user): RequireUser,
    Query(query): Query<FeedQuery>,
) -> Response {
    match state
        .feed
        .list(&FeedFilter::Following(user.id), query.token())
        .await
    {
        Ok(slice) => render_template_response(
            IndexTemplate {
                description: "Latest updates from authors you follow".to_string(),
                message: slice.no_follows.then(|| NO_FOLLOWS_PROMPT.to_string()),
                page: PageObjView::from_slice(&slice),
            },
            StatusCode::OK,
        ),
        Err(err) => feed_error_to_response(err),
    }
}

fn follow_error_to_response(err: FollowError) -> Response {
    match err {
        FollowError::UnknownAuthor => render_not_found_response(),
        FollowError::Repo(err) => {
            super::repo_error_to_http("infra::http::follows", err).into_response()
        }
    }
}

pub(super) async fn profile_follow(
    State(state): State<HttpState>,
    RequireUser(user): RequireUser,
    Path(username): Path<String>,
) -> Response {
    match state.follows.follow(&user, &username).await {
        Ok(()) => Redirect::to(&format!("/profile/{username}/")).into_response(),
        Err(err) => follow_error_to_response(err),
    }
}

pub(super) async fn profile_unfollow(
    State(state): State<HttpState>,
    RequireUser(user): RequireUser,
    Path(username): Path<String>,
) -> Response {
    match state.follows.unfollow(&user, &username).await {
        Ok(()) => Redirect::to(&format!("/profile/{username}/")).into_response(),
        Err(err) => follow_error_to_response(err),
    }
}
