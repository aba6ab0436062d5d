use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use time::OffsetDateTime;
use time::macros::format_description;

use crate::application::error::{ErrorReport, HttpError};
use crate::application::feed::FeedSlice;
use crate::domain::entities::{CommentRecord, GroupRecord, PostRecord};

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response() -> Response {
    let template = ErrorTemplate {
        title: "Page Not Found".to_string(),
        message: "The page you requested does not exist. Try returning to the feed to continue reading.".to_string(),
    };
    let mut response = render_template_response(template, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

/// One post as shown in feed listings and on the detail page.
#[derive(Clone)]
pub struct PostCard {
    pub id: i64,
    pub text: String,
    pub author_username: String,
    pub group: Option<GroupBadge>,
    pub image: Option<String>,
    pub published: String,
}

#[derive(Clone)]
pub struct GroupBadge {
    pub title: String,
    pub slug: String,
}

#[derive(Clone)]
pub struct CommentView {
    pub author_username: String,
    pub text: String,
    pub published: String,
}

/// Mirror of the paginator state templates iterate over.
#[derive(Clone)]
pub struct PageObjView {
    pub items: Vec<PostCard>,
    pub number: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageObjView {
    pub fn from_slice(slice: &FeedSlice) -> Self {
        Self {
            items: slice.posts.iter().map(post_card).collect(),
            number: slice.window.number,
            total_pages: slice.window.total_pages,
            has_next: slice.window.has_next(),
            has_prev: slice.window.has_prev(),
        }
    }
}

pub fn post_card(record: &PostRecord) -> PostCard {
    PostCard {
        id: record.id,
        text: record.text.clone(),
        author_username: record.author.username.clone(),
        group: record.group.as_ref().map(|group| GroupBadge {
            title: group.title.clone(),
            slug: group.slug.clone(),
        }),
        image: record.image.clone(),
        published: format_published(record.created),
    }
}

pub fn comment_view(record: &CommentRecord) -> CommentView {
    CommentView {
        author_username: record.author.username.clone(),
        text: record.text.clone(),
        published: format_published(record.created),
    }
}

fn format_published(when: OffsetDateTime) -> String {
    let format = format_description!("[day] [month repr:short] [year] [hour]:[minute]");
    when.format(&format).unwrap_or_default()
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub description: String,
    pub message: Option<String>,
    pub page: PageObjView,
}

#[derive(Template)]
#[template(path = "group.html")]
pub struct GroupTemplate {
    pub group: GroupRecord,
    pub page: PageObjView,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub author_username: String,
    pub posts_num: u64,
    pub following: bool,
    /// The viewer is looking at their own profile; hides the follow button.
    pub is_self: bool,
    pub signed_in: bool,
    pub page: PageObjView,
}

#[derive(Template)]
#[template(path = "post_detail.html")]
pub struct PostDetailTemplate {
    pub post: PostCard,
    pub comments: Vec<CommentView>,
    pub comment_error: Option<String>,
}

#[derive(Clone)]
pub struct GroupChoice {
    pub id: i64,
    pub title: String,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "post_form.html")]
pub struct PostFormTemplate {
    pub is_edit: bool,
    pub post_id: Option<i64>,
    pub text: String,
    pub groups: Vec<GroupChoice>,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub next: String,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub title: String,
    pub message: String,
}
