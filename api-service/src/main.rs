use std::net::SocketAddr;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use api_service::{build_router, AppState};
use shared::application::plugins::EngineDeps;
use shared::application::services::{NodePropagator, PreWorkflowService, WorkflowService};
use shared::config::Settings;
use shared::domain::repositories::{
    FormRepository, GoodsCodeRepository, NodeStore, PrincipalContextRepository,
};
use shared::infrastructure::database::{create_pool_with_options, DatabaseService};
use shared::infrastructure::repositories::{
    FormRepositoryImpl, GoodsCodeRepositoryImpl, InstanceRepositoryImpl, NodeStoreImpl,
    PreWorkflowRepositoryImpl, PrincipalContextRepositoryImpl, TemplateRepositoryImpl,
};

/// Exit codes: 0 success, 1 configuration error, 2 database unreachable.
const EXIT_CONFIGURATION: i32 = 1;
const EXIT_DATABASE: i32 = 2;

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv::dotenv().ok();

    // Load configuration
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            process::exit(EXIT_CONFIGURATION);
        }
    };

    // Initialize tracing
    shared::infrastructure::logging::init_from_settings(&settings.logging);
    info!(
        "Starting api-service on {}:{}",
        settings.server.host, settings.server.port
    );

    // Initialize database connection
    info!("Connecting to database...");
    let pool = match create_pool_with_options(
        &settings.database.url,
        settings.database.max_connections,
        settings.database.min_connections,
    )
    .await
    {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            process::exit(EXIT_DATABASE);
        }
    };

    let database_service = Arc::new(DatabaseService::new(pool.clone()));
    if let Err(e) = database_service.health_check().await {
        error!("Database health check failed: {}", e);
        process::exit(EXIT_DATABASE);
    }
    info!("Database health check passed");

    // Run migrations using sqlx's built-in migrator
    info!("Running database migrations...");
    let migrations_path = std::path::Path::new("./migrations");
    let migrator = match sqlx::migrate::Migrator::new(migrations_path).await {
        Ok(migrator) => migrator,
        Err(e) => {
            error!("Failed to initialize migrator: {}", e);
            process::exit(EXIT_CONFIGURATION);
        }
    };
    if let Err(e) = migrator.run(&pool).await {
        error!("Failed to run migrations: {}", e);
        process::exit(EXIT_DATABASE);
    }
    info!("Database migrations completed");

    // Shared HTTP client for inline form submissions
    let http = match reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.engine.submission_timeout_secs))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            process::exit(EXIT_CONFIGURATION);
        }
    };

    // Engine collaborators
    let store: Arc<dyn NodeStore> = Arc::new(NodeStoreImpl::new(database_service.clone()));
    let goods_codes: Arc<dyn GoodsCodeRepository> =
        Arc::new(GoodsCodeRepositoryImpl::new(database_service.clone()));
    let forms: Arc<dyn FormRepository> = Arc::new(FormRepositoryImpl::new(database_service.clone()));
    let principal_contexts: Arc<dyn PrincipalContextRepository> =
        Arc::new(PrincipalContextRepositoryImpl::new(database_service.clone()));

    let deps = EngineDeps {
        db: database_service.clone(),
        store: store.clone(),
        propagator: Arc::new(NodePropagator::new(store.clone())),
        instances: Arc::new(InstanceRepositoryImpl::new(database_service.clone())),
        pre_workflows: Arc::new(PreWorkflowRepositoryImpl::new(database_service.clone())),
        principal_contexts: principal_contexts.clone(),
        templates: Arc::new(TemplateRepositoryImpl::new(database_service.clone())),
        forms: forms.clone(),
        http,
        public_url: settings.server.public_url.clone(),
    };

    let app_state = Arc::new(AppState {
        database_service: database_service.clone(),
        workflow_service: Arc::new(WorkflowService::new(deps.clone())),
        pre_workflow_service: Arc::new(PreWorkflowService::new(deps.clone())),
        node_store: store,
        goods_codes,
        forms,
        principal_contexts,
    });

    let app = build_router(app_state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], settings.server.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            process::exit(EXIT_CONFIGURATION);
        }
    };

    info!("Server listening on {}", addr);
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        process::exit(EXIT_CONFIGURATION);
    }
}
