//! Per-process server state.

use zeroize::Zeroizing;

use quire_store::{ContentStore, SqliteTable, Table};

use crate::challenge::ChallengeIssuer;
use crate::config::{self, ServerConfig};
use crate::error::{Result, ServerError};

/// Largest accepted `POST /update` body, in bytes.
pub const DEFAULT_UPDATE_LIMIT: usize = 16 * 1024 * 1024;

/// Everything a request handler needs: the shared secret, the challenge
/// issuer, and the content store. Shared behind an `Arc`.
pub struct ServerContext<T: Table = SqliteTable> {
    secret: Zeroizing<Vec<u8>>,
    issuer: ChallengeIssuer,
    store: ContentStore<T>,
    update_limit: usize,
}

impl<T: Table> ServerContext<T> {
    /// Build a context. The secret must be non-empty.
    pub fn new(secret: impl Into<Vec<u8>>, store: ContentStore<T>) -> Result<Self> {
        let secret = Zeroizing::new(secret.into());
        if secret.is_empty() {
            return Err(ServerError::Config("update secret is empty".into()));
        }
        Ok(Self {
            secret,
            issuer: ChallengeIssuer::new(),
            store,
            update_limit: DEFAULT_UPDATE_LIMIT,
        })
    }

    /// Replace the update body size limit.
    pub fn with_update_limit(mut self, limit: usize) -> Self {
        self.update_limit = limit;
        self
    }

    /// Largest accepted update body, in bytes.
    pub fn update_limit(&self) -> usize {
        self.update_limit
    }

    /// The shared update secret.
    pub fn secret(&self) -> &[u8] {
        &self.secret
    }

    pub fn issuer(&self) -> &ChallengeIssuer {
        &self.issuer
    }

    pub fn store(&self) -> &ContentStore<T> {
        &self.store
    }
}

impl ServerContext<SqliteTable> {
    /// Load the secret and open the SQLite-backed store named by `config`.
    pub fn open(config: &ServerConfig) -> Result<Self> {
        let secret = config::load_secret(&config.passfile)?;
        let table = SqliteTable::open(&config.db)?;
        let store = ContentStore::open(table, config.order)?;

        tracing::info!(
            db = %config.db.display(),
            records = store.len()?,
            order = ?config.order,
            "content store ready"
        );

        Ok(Self::new(secret.to_vec(), store)?.with_update_limit(config.max_update_bytes))
    }
}
