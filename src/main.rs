//! Triptych - A trilingual CMS backend

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use triptych::{
    access::PolicyTable,
    api::{self, AppState},
    config::Config,
    db::{
        self,
        repositories::{
            SqlxCategoryRepository, SqlxMenuRepository, SqlxPageRepository, SqlxPostRepository,
            SqlxSessionRepository, SqlxUserRepository,
        },
    },
    schema::cms_registry,
    services::{CategoryService, FileStore, MenuService, PageService, PostService, UserService},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "triptych=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Triptych CMS backend...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Schema registry and access policies are fixed at startup. Validate
    // them before touching the database so a bad build dies immediately.
    let registry = cms_registry();
    registry.validate()?;
    let policies = PolicyTable::cms();
    policies.verify_covers(&registry)?;
    tracing::info!(entities = registry.entities().len(), "Schema registry validated");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {}", config.database.url);

    // Run migrations
    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // First start on an empty database seeds the admin account and the
    // default category
    if db::seed::run(&pool, &config.seed).await? {
        tracing::info!("Seeded initial admin user and default category");
    }

    // Uploaded thumbnails live on the local filesystem
    let files = Arc::new(FileStore::new(config.upload.clone()));
    files.ensure_dir().await?;

    // Create repositories
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let session_repo = SqlxSessionRepository::boxed(pool.clone());
    let category_repo = SqlxCategoryRepository::boxed(pool.clone());
    let post_repo = SqlxPostRepository::boxed(pool.clone());
    let page_repo = SqlxPageRepository::boxed(pool.clone());
    let menu_repo = SqlxMenuRepository::boxed(pool.clone());

    // Initialize services
    let user_service = Arc::new(UserService::new(
        user_repo.clone(),
        session_repo,
        config.session.ttl_days,
    ));
    let post_service = Arc::new(PostService::new(
        post_repo,
        category_repo.clone(),
        user_repo.clone(),
        files.clone(),
    ));
    let category_service = Arc::new(CategoryService::new(category_repo));
    let page_service = Arc::new(PageService::new(page_repo, user_repo));
    let menu_service = Arc::new(MenuService::new(menu_repo));

    // Build application state
    let state = AppState {
        registry: Arc::new(registry),
        policies: Arc::new(policies),
        user_service,
        post_service,
        category_service,
        page_service,
        menu_service,
        files,
        session_ttl_days: config.session.ttl_days,
    };

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
