//! SQLite persistence for join-request rules: per-group accept keywords
//! and the applicant blacklist.

mod join_rules;

use join_rules::JoinRuleRepository;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Path value selecting a throwaway in-memory database.
pub const IN_MEMORY: &str = ":memory:";

static MEMDB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Database handle with connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Open (or create) the join-rule store at `path` and bring its schema
    /// up to date.
    ///
    /// [`IN_MEMORY`] gives a store private to this handle. A file store runs
    /// in WAL mode; its parent directory must already exist.
    pub async fn new(path: &str) -> Result<Self, DbError> {
        let (options, max_connections) = if path == IN_MEMORY {
            (Self::memory_options(), 1)
        } else {
            let options = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal);
            (options, 2)
        };

        // The single in-memory connection must never be reaped; the data
        // lives only as long as it does.
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Self::ACQUIRE_TIMEOUT)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        info!(path = %path, "Join-rule store ready");

        Ok(Self { pool })
    }

    /// A uniquely named shared-cache database, so parallel tests never see
    /// each other's rows.
    fn memory_options() -> SqliteConnectOptions {
        let id = MEMDB_COUNTER.fetch_add(1, Ordering::Relaxed);
        SqliteConnectOptions::new()
            .filename(format!(
                "file:groupwarden-memdb-{}-{id}?mode=memory&cache=shared",
                std::process::id()
            ))
            .shared_cache(true)
            .create_if_missing(true)
    }

    pub fn join_rules(&self) -> JoinRuleRepository<'_> {
        JoinRuleRepository::new(&self.pool)
    }
}
