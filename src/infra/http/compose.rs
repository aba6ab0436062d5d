//! Authoring handlers: create/edit posts and submit comments.

use axum::{
    Form,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use bytes::Bytes;
use serde::Deserialize;
use tracing::error;

use crate::application::compose::{ComposeError, EditOutcome, PostDraft};
use crate::application::error::HttpError;
use crate::domain::forms::{FormError, clean_text};
use crate::presentation::views::{
    GroupChoice, PostDetailTemplate, PostFormTemplate, comment_view, post_card,
    render_not_found_response, render_template_response,
};

use super::auth::RequireUser;
use super::public::HttpState;

/// Raw fields of a submitted post form before validation.
#[derive(Debug, Default)]
struct PostSubmission {
    text: String,
    group_id: Option<i64>,
    image: Option<(String, Bytes)>,
}

async fn read_post_submission(mut multipart: Multipart) -> Result<PostSubmission, HttpError> {
    const SOURCE: &str = "infra::http::compose::read_post_submission";

    let mut submission = PostSubmission::default();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                return Err(HttpError::new(
                    SOURCE,
                    StatusCode::BAD_REQUEST,
                    "Malformed form submission",
                    err.to_string(),
                ));
            }
        };

        match field.name().unwrap_or_default() {
            "text" => {
                submission.text = field.text().await.map_err(|err| {
                    HttpError::new(
                        SOURCE,
                        StatusCode::BAD_REQUEST,
                        "Malformed form submission",
                        err.to_string(),
                    )
                })?;
            }
            "group" => {
                let value = field.text().await.unwrap_or_default();
                submission.group_id = value.trim().parse::<i64>().ok();
            }
            "image" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let data = field.bytes().await.map_err(|err| {
                    HttpError::new(
                        SOURCE,
                        StatusCode::BAD_REQUEST,
                        "Malformed form submission",
                        err.to_string(),
                    )
                })?;
                if !data.is_empty() {
                    submission.image = Some((filename, data));
                }
            }
            _ => {}
        }
    }

    Ok(submission)
}

async fn group_choices(
    state: &HttpState,
    selected: Option<i64>,
) -> Result<Vec<GroupChoice>, ComposeError> {
    let groups = state.compose.group_choices().await?;
    Ok(groups
        .into_iter()
        .map(|group| GroupChoice {
            selected: selected == Some(group.id),
            id: group.id,
            title: group.title,
        })
        .collect())
}

fn post_form_response(
    is_edit: bool,
    post_id: Option<i64>,
    text: String,
    groups: Vec<GroupChoice>,
    error: Option<&FormError>,
) -> Response {
    render_template_response(
        PostFormTemplate {
            is_edit,
            post_id,
            text,
            groups,
            error: error.map(|err| err.field_message().to_string()),
        },
        StatusCode::OK,
    )
}

fn compose_error_to_response(err: ComposeError) -> Response {
    match err {
        ComposeError::UnknownPost => render_not_found_response(),
        ComposeError::Repo(err) => {
            super::repo_error_to_http("infra::http::compose", err).into_response()
        }
    }
}

/// Store the attached image, degrading to no image if storage fails.
async fn store_image(state: &HttpState, image: Option<(String, Bytes)>) -> Option<String> {
    let (filename, data) = image?;
    match state.uploads.store(&filename, data).await {
        Ok(stored) => Some(stored.stored_path),
        Err(err) => {
            error!(
                target = "brusio::http::compose",
                error = %err,
                "failed to store uploaded image; post saved without it"
            );
            None
        }
    }
}

pub(super) async fn post_create_form(
    State(state): State<HttpState>,
    RequireUser(_user): RequireUser,
) -> Response {
    match group_choices(&state, None).await {
        Ok(groups) => post_form_response(false, None, String::new(), groups, None),
        Err(err) => compose_error_to_response(err),
    }
}

pub(super) async fn post_create(
    State(state): State<HttpState>,
    RequireUser(user): RequireUser,
    multipart: Multipart,
) -> Response {
    let submission = match read_post_submission(multipart).await {
        Ok(submission) => submission,
        Err(err) => return err.into_response(),
    };

    let text = match clean_text(&submission.text) {
        Ok(text) => text,
        Err(form_err) => {
            return match group_choices(&state, submission.group_id).await {
                Ok(groups) => post_form_response(
                    false,
                    None,
                    submission.text,
                    groups,
                    Some(&form_err),
                ),
                Err(err) => compose_error_to_response(err),
            };
        }
    };

    let image = store_image(&state, submission.image).await;
    let draft = PostDraft {
        text,
        group_id: submission.group_id,
        image,
    };

    match state.compose.create_post(&user, draft).await {
        Ok(_) => Redirect::to(&format!("/profile/{}/", user.username)).into_response(),
        Err(err) => compose_error_to_response(err),
    }
}

pub(super) async fn post_edit_form(
    State(state): State<HttpState>,
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
) -> Response {
    let Ok(id) = id.parse::<i64>() else {
        return render_not_found_response();
    };

    let post = match state.compose.load_post(id).await {
        Ok(post) => post,
        Err(err) => return compose_error_to_response(err),
    };

    if post.author.id != user.id {
        return Redirect::to(&format!("/posts/{id}/")).into_response();
    }

    let selected = post.group.as_ref().map(|group| group.id);
    match group_choices(&state, selected).await {
        Ok(groups) => post_form_response(true, Some(post.id), post.text, groups, None),
        Err(err) => compose_error_to_response(err),
    }
}

pub(super) async fn post_edit(
    State(state): State<HttpState>,
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Response {
    let Ok(id) = id.parse::<i64>() else {
        return render_not_found_response();
    };

    // Non-authors are bounced before their submission is even validated.
    match state.compose.load_post(id).await {
        Ok(post) if post.author.id != user.id => {
            return Redirect::to(&format!("/posts/{id}/")).into_response();
        }
        Ok(_) => {}
        Err(err) => return compose_error_to_response(err),
    }

    let submission = match read_post_submission(multipart).await {
        Ok(submission) => submission,
        Err(err) => return err.into_response(),
    };

    let text = match clean_text(&submission.text) {
        Ok(text) => text,
        Err(form_err) => {
            return match group_choices(&state, submission.group_id).await {
                Ok(groups) => post_form_response(
                    true,
                    Some(id),
                    submission.text,
                    groups,
                    Some(&form_err),
                ),
                Err(err) => compose_error_to_response(err),
            };
        }
    };

    let image = store_image(&state, submission.image).await;
    let draft = PostDraft {
        text,
        group_id: submission.group_id,
        image,
    };

    match state.compose.edit_post(&user, id, draft).await {
        Ok(EditOutcome::Updated(post)) => {
            Redirect::to(&format!("/posts/{}/", post.id)).into_response()
        }
        Ok(EditOutcome::NotAuthor(post)) => {
            Redirect::to(&format!("/posts/{}/", post.id)).into_response()
        }
        Err(err) => compose_error_to_response(err),
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct CommentForm {
    text: String,
}

pub(super) async fn add_comment(
    State(state): State<HttpState>,
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
    Form(form): Form<CommentForm>,
) -> Response {
    let Ok(id) = id.parse::<i64>() else {
        return render_not_found_response();
    };

    let text = match clean_text(&form.text) {
        Ok(text) => text,
        Err(form_err) => {
            // Invalid comments re-render the detail page with the field
            // error; nothing is stored.
            return match state.feed.post_detail(id).await {
                Ok((post, comments)) => render_template_response(
                    PostDetailTemplate {
                        post: post_card(&post),
                        comments: comments.iter().map(comment_view).collect(),
                        comment_error: Some(form_err.field_message().to_string()),
                    },
                    StatusCode::OK,
                ),
                Err(err) => super::public::feed_error_to_response(err),
            };
        }
    };

    match state.compose.add_comment(&user, id, text).await {
        Ok(_) => Redirect::to(&format!("/posts/{id}/")).into_response(),
        Err(err) => compose_error_to_response(err),
    }
}
