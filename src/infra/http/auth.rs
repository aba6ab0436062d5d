//! Session-cookie identity: extractors plus login/logout handlers.

use axum::{
    Form,
    extract::{FromRequestParts, Query, State},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use tracing::warn;
use url::form_urlencoded;
use uuid::Uuid;

use crate::application::identity::IdentityError;
use crate::presentation::views::{LoginTemplate, render_template_response};

use super::public::HttpState;

pub const SESSION_COOKIE: &str = "brusio_session";

/// The viewer resolved from the session cookie, if any.
///
/// Resolution failures degrade to anonymous: a broken cookie or an
/// unavailable session store must never take down a public page.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<crate::domain::entities::UserRecord>);

impl FromRequestParts<HttpState> for CurrentUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &HttpState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(resolve_viewer(parts, state).await))
    }
}

/// The authenticated viewer; anonymous requests are redirected to the login
/// form with the original path preserved in `next`.
#[derive(Debug, Clone)]
pub struct RequireUser(pub crate::domain::entities::UserRecord);

impl FromRequestParts<HttpState> for RequireUser {
    type Rejection = LoginRedirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &HttpState,
    ) -> Result<Self, Self::Rejection> {
        match resolve_viewer(parts, state).await {
            Some(user) => Ok(Self(user)),
            None => Err(LoginRedirect {
                next: parts.uri.path().to_string(),
            }),
        }
    }
}

#[derive(Debug)]
pub struct LoginRedirect {
    next: String,
}

impl IntoResponse for LoginRedirect {
    fn into_response(self) -> Response {
        let query: String = form_urlencoded::Serializer::new(String::new())
            .append_pair("next", &self.next)
            .finish();
        Redirect::to(&format!("/auth/login/?{query}")).into_response()
    }
}

async fn resolve_viewer(
    parts: &Parts,
    state: &HttpState,
) -> Option<crate::domain::entities::UserRecord> {
    let jar = CookieJar::from_headers(&parts.headers);
    let cookie = jar.get(SESSION_COOKIE)?;
    let token = Uuid::parse_str(cookie.value()).ok()?;

    match state.identity.resolve(token).await {
        Ok(user) => user,
        Err(IdentityError::Repo(err)) => {
            warn!(
                target = "brusio::http::auth",
                error = %err,
                "session lookup failed; treating request as anonymous"
            );
            None
        }
        Err(_) => None,
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NextQuery {
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    username: String,
    password: String,
    #[serde(default)]
    next: Option<String>,
}

/// Restrict the post-login redirect to site-local paths.
fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path.to_string(),
        _ => "/".to_string(),
    }
}

pub(super) async fn login_form(Query(query): Query<NextQuery>) -> Response {
    render_template_response(
        LoginTemplate {
            next: safe_next(query.next.as_deref()),
            error: None,
        },
        StatusCode::OK,
    )
}

pub(super) async fn login(
    State(state): State<HttpState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    match state.identity.login(&form.username, &form.password).await {
        Ok(session) => {
            let cookie = Cookie::build((SESSION_COOKIE, session.token.to_string()))
                .path("/")
                .http_only(true)
                .build();
            let destination = safe_next(form.next.as_deref());
            (jar.add(cookie), Redirect::to(&destination)).into_response()
        }
        Err(IdentityError::InvalidCredentials) => render_template_response(
            LoginTemplate {
                next: safe_next(form.next.as_deref()),
                error: Some("Unknown username or wrong password".to_string()),
            },
            StatusCode::OK,
        ),
        Err(IdentityError::Repo(err)) => {
            super::repo_error_to_http("infra::http::auth::login", err).into_response()
        }
    }
}

pub(super) async fn logout(State(state): State<HttpState>, jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE)
        && let Ok(token) = Uuid::parse_str(cookie.value())
        && let Err(err) = state.identity.logout(token).await
    {
        warn!(
            target = "brusio::http::auth",
            error = %err,
            "failed to delete session on logout"
        );
    }

    let jar = jar.remove(Cookie::from(SESSION_COOKIE));
    (jar, Redirect::to("/")).into_response()
}
