//! Application state wiring all services together.
//!
//! The engine is generic over repository/session/transport traits; AppState
//! pins it to the concrete infra implementations.

use std::path::PathBuf;
use std::sync::Arc;

use tandem_core::engine::Engine;
use tandem_infra::config::{load_global_config, resolve_data_dir};
use tandem_infra::sqlite::booking::SqliteBookingRepository;
use tandem_infra::sqlite::chat::SqliteChatRepository;
use tandem_infra::sqlite::notification::SqliteNotificationRepository;
use tandem_infra::sqlite::pool::DatabasePool;
use tandem_infra::sqlite::session::SqliteSessionStore;
use tandem_infra::sqlite::user::SqliteUserRepository;
use tandem_infra::transport::HttpTransport;

/// Concrete type alias for the engine generics pinned to infra implementations.
pub type ConcreteEngine = Engine<
    SqliteSessionStore,
    SqliteChatRepository,
    SqliteNotificationRepository,
    SqliteBookingRepository,
    SqliteUserRepository,
    HttpTransport,
>;

/// Shared application state used by both CLI commands and the webhook server.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ConcreteEngine>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: connect to DB, wire the engine.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        // Initialize database
        let db_url = format!("sqlite://{}?mode=rwc", data_dir.join("tandem.db").display());
        let db_pool = DatabasePool::new(&db_url).await?;

        let config = load_global_config(&data_dir).await;
        let transport = Arc::new(HttpTransport::new(&config.transport));

        let engine = Engine::new(
            SqliteSessionStore::new(db_pool.clone()),
            SqliteChatRepository::new(db_pool.clone()),
            SqliteNotificationRepository::new(db_pool.clone()),
            SqliteBookingRepository::new(db_pool.clone()),
            SqliteUserRepository::new(db_pool.clone()),
            transport,
        );

        Ok(Self {
            engine: Arc::new(engine),
            data_dir,
            db_pool,
        })
    }
}
