//! Per-request session handles.
//!
//! A session is acquired once per request and released exactly once when it
//! is dropped or committed. Write sessions hold the exclusive side of the
//! write gate for their whole lifetime, so mutations never interleave; read
//! sessions share the gate with each other.
//!
//! Acquisition order is always gate first, then connection.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};
use tracing::debug;

use crate::users::repo::{SqliteUserStore, UserStore};

#[derive(Clone)]
pub struct SessionProvider {
    pool: SqlitePool,
    write_gate: Arc<RwLock<()>>,
    open: Arc<AtomicUsize>,
}

impl SessionProvider {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_gate: Arc::new(RwLock::new(())),
            open: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of sessions currently alive.
    pub fn open_sessions(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    /// Acquires a read-only handle. Runs concurrently with other readers.
    pub async fn read(&self) -> Result<ReadSession, sqlx::Error> {
        let gate = self.write_gate.clone().read_owned().await;
        let conn = self.pool.acquire().await?;
        Ok(ReadSession {
            conn,
            _gate: gate,
            _lease: Lease::new(&self.open, SessionKind::Read),
        })
    }

    /// Acquires an exclusive handle with an open transaction.
    ///
    /// Nothing is persisted unless [`WriteSession::commit`] succeeds.
    pub async fn write(&self) -> Result<WriteSession, sqlx::Error> {
        let gate = self.write_gate.clone().write_owned().await;
        let tx = self.pool.begin().await?;
        Ok(WriteSession {
            tx,
            _gate: gate,
            lease: Lease::new(&self.open, SessionKind::Write),
        })
    }
}

pub struct ReadSession {
    conn: PoolConnection<Sqlite>,
    _gate: OwnedRwLockReadGuard<()>,
    _lease: Lease,
}

impl ReadSession {
    pub fn users(&mut self) -> impl UserStore + '_ {
        SqliteUserStore::new(&mut self.conn)
    }
}

pub struct WriteSession {
    tx: Transaction<'static, Sqlite>,
    _gate: OwnedRwLockWriteGuard<()>,
    lease: Lease,
}

impl WriteSession {
    pub fn users(&mut self) -> impl UserStore + '_ {
        SqliteUserStore::new(&mut self.tx)
    }

    /// Commits the transaction and releases the session.
    pub async fn commit(self) -> Result<(), sqlx::Error> {
        let WriteSession { tx, _gate, mut lease } = self;
        tx.commit().await?;
        lease.committed = true;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum SessionKind {
    Read,
    Write,
}

/// Tracks one live session; decrements the counter on drop.
struct Lease {
    open: Arc<AtomicUsize>,
    kind: SessionKind,
    committed: bool,
}

impl Lease {
    fn new(open: &Arc<AtomicUsize>, kind: SessionKind) -> Self {
        let now_open = open.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(kind = ?kind, open = now_open, "session acquired");
        Self {
            open: Arc::clone(open),
            kind,
            committed: false,
        }
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        let now_open = self.open.fetch_sub(1, Ordering::SeqCst) - 1;
        match self.kind {
            SessionKind::Write if !self.committed => {
                debug!(kind = ?self.kind, open = now_open, "session released, rolled back")
            }
            _ => debug!(kind = ?self.kind, open = now_open, "session released"),
        }
    }
}
