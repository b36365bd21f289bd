use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

mod error;
mod middleware;
mod models;
mod repositories;
mod routes;
mod session;
mod state;
mod throttle;
mod validation;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use common::clock::{Clock, SystemClock};
use common::database::{DatabaseConfig, init_pool};
use tokio::net::TcpListener;

use crate::repositories::{
    ActivityLogRepository, AttendanceRepository, EnrollmentRepository, InquiryRepository,
    NewsletterRepository, UserRepository,
};
use crate::session::{SessionConfig, SessionManager};
use crate::state::AppState;
use crate::throttle::Throttle;

/// How often expired throttle entries are swept
const THROTTLE_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting portal service");

    // A missing session secret is a deployment mistake; fail before serving.
    let session_config = SessionConfig::from_env()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let sessions = SessionManager::new(session_config, clock.clone());
    let throttle = Throttle::new(clock);
    throttle.spawn_sweeper(THROTTLE_SWEEP_INTERVAL);

    let app_state = AppState {
        sessions,
        throttle,
        user_repository: UserRepository::new(pool.clone()),
        inquiry_repository: InquiryRepository::new(pool.clone()),
        enrollment_repository: EnrollmentRepository::new(pool.clone()),
        attendance_repository: AttendanceRepository::new(pool.clone()),
        activity_repository: ActivityLogRepository::new(pool.clone()),
        newsletter_repository: NewsletterRepository::new(pool),
    };

    info!("Portal service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let listener = TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    info!("Portal service listening on 0.0.0.0:{}", port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
