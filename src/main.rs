use std::{process, sync::Arc};

use brusio::{
    application::{
        compose::ComposeService,
        error::AppError,
        feed::FeedService,
        follows::FollowService,
        identity::IdentityService,
        repos::{
            CommentsRepo, CreateGroupParams, CreateUserParams, FollowsRepo, GroupsRepo, PostsRepo,
            PostsWriteRepo, SessionsRepo, UsersRepo,
        },
    },
    cache::{CacheState, PageCache},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, HttpState},
        telemetry,
        uploads::UploadStorage,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::UserAdd(args) => run_useradd(settings, args).await,
        config::Command::GroupAdd(args) => run_groupadd(settings, args).await,
    }
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool =
        PostgresRepositories::connect(database_url, settings.database.max_connections.get())
            .await
            .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_http_state(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> Result<HttpState, AppError> {
    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let posts_write_repo: Arc<dyn PostsWriteRepo> = repositories.clone();
    let comments_repo: Arc<dyn CommentsRepo> = repositories.clone();
    let groups_repo: Arc<dyn GroupsRepo> = repositories.clone();
    let users_repo: Arc<dyn UsersRepo> = repositories.clone();
    let follows_repo: Arc<dyn FollowsRepo> = repositories.clone();
    let sessions_repo: Arc<dyn SessionsRepo> = repositories.clone();

    let feed = Arc::new(FeedService::new(
        posts_repo.clone(),
        comments_repo.clone(),
        groups_repo.clone(),
        users_repo.clone(),
        follows_repo.clone(),
        settings.feed.page_size.get(),
    ));
    let compose = Arc::new(ComposeService::new(
        posts_repo,
        posts_write_repo,
        comments_repo,
        groups_repo,
    ));
    let follows = Arc::new(FollowService::new(follows_repo, users_repo.clone()));
    let identity = Arc::new(IdentityService::new(users_repo, sessions_repo));

    let uploads = Arc::new(
        UploadStorage::new(settings.uploads.directory.clone())
            .map_err(|err| AppError::from(InfraError::Io(err)))?,
    );

    let cache = settings.cache.enabled.then(|| CacheState {
        cache: PageCache::new(),
        ttl: settings.cache.ttl,
    });

    Ok(HttpState {
        feed,
        compose,
        follows,
        identity,
        uploads,
        cache,
    })
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let state = build_http_state(repositories, &settings)?;
    let upload_body_limit =
        usize::try_from(settings.uploads.max_request_bytes.get()).unwrap_or(usize::MAX);
    let router = http::build_router(state, upload_body_limit);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "brusio::serve",
        addr = %settings.server.addr,
        "listening"
    );

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn run_useradd(settings: config::Settings, args: config::UserAddArgs) -> Result<(), AppError> {
    let mut settings = settings;
    if let Some(url) = args.database.database_url {
        settings.database.url = Some(url);
    }

    if args.username.trim().is_empty() {
        return Err(AppError::validation("username must not be empty"));
    }
    if args.password.is_empty() {
        return Err(AppError::validation("password must not be empty"));
    }

    let repositories = init_repositories(&settings).await?;
    let user = repositories
        .create_user(CreateUserParams {
            username: args.username.trim().to_string(),
            password_digest: IdentityService::digest_password(&args.password),
        })
        .await
        .map_err(|err| AppError::unexpected(format!("failed to create user: {err}")))?;

    info!(
        target = "brusio::useradd",
        username = %user.username,
        id = user.id,
        "user created"
    );
    Ok(())
}

async fn run_groupadd(
    settings: config::Settings,
    args: config::GroupAddArgs,
) -> Result<(), AppError> {
    let mut settings = settings;
    if let Some(url) = args.database.database_url {
        settings.database.url = Some(url);
    }

    let slug = slug::slugify(&args.slug);
    if slug.is_empty() {
        return Err(AppError::validation("slug must not be empty"));
    }
    if args.title.trim().is_empty() {
        return Err(AppError::validation("title must not be empty"));
    }

    let repositories = init_repositories(&settings).await?;
    let group = repositories
        .create_group(CreateGroupParams {
            title: args.title.trim().to_string(),
            slug,
            description: args.description.trim().to_string(),
        })
        .await
        .map_err(|err| AppError::unexpected(format!("failed to create group: {err}")))?;

    info!(
        target = "brusio::groupadd",
        slug = %group.slug,
        id = group.id,
        "group created"
    );
    Ok(())
}
