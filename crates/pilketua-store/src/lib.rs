//! Document-store capability used by the election service.
//!
//! The service never talks to a backend directly; it is handed something
//! implementing [`DocumentStore`], which models the primitives the hosted
//! provider offers: anonymous sign-in, point reads, full-collection reads,
//! real-time subscriptions, optimistic-concurrency transactions, and bounded
//! batch writes. [`memory::MemoryStore`] is the in-process implementation and
//! doubles as the substitutable fake for tests.

use std::future::Future;

use tokio::sync::watch;
use uuid::Uuid;

pub mod memory;

/// A stored document. Field names are the wire names (camelCase).
pub type Document = serde_json::Value;

/// Identity returned by anonymous sign-in.
#[derive(Debug, Clone)]
pub struct Identity {
    pub uid: Uuid,
}

/// Maximum number of operations a single [`DocumentStore::batch_write`] may
/// carry. Callers with more work must chunk.
pub const MAX_BATCH_OPS: usize = 500;

/// Store error variants.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Another transaction touched a document this one read. The caller's
    /// read-modify-write closure is re-runnable; retry from the top.
    #[error("transaction conflict")]
    Conflict,
    /// A read or write was attempted before [`DocumentStore::sign_in_anonymously`].
    #[error("not signed in")]
    Unauthenticated,
    /// Anonymous sign-in is not enabled on the backend. A setup error, not a
    /// transient one.
    #[error("anonymous sign-in is not configured")]
    ConfigMissing,
    #[error("batch of {0} ops exceeds the 500-op limit")]
    BatchTooLarge(usize),
    /// An update or increment targeted a document that does not exist.
    #[error("document {collection}/{key} not found")]
    DocumentNotFound { collection: String, key: String },
    #[error("backend error")]
    Backend(#[from] anyhow::Error),
}

/// A single operation inside a [`DocumentStore::batch_write`].
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Create or fully replace a document.
    Set {
        collection: String,
        key: String,
        doc: Document,
    },
    /// Merge fields into an existing document.
    Update {
        collection: String,
        key: String,
        fields: Document,
    },
    /// Remove a document. Deleting a missing document is a no-op.
    Delete { collection: String, key: String },
}

/// Point-in-time contents of one collection, delivered to subscribers on
/// every change. `docs` is ordered by key.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Store revision at which this snapshot was taken.
    pub revision: u64,
    pub docs: Vec<(String, Document)>,
}

/// An in-flight optimistic transaction.
///
/// Reads see committed state and record the version they observed (including
/// "observed absent"). Writes are staged locally. `commit` verifies every
/// recorded version and applies the staged writes atomically, failing with
/// [`StoreError::Conflict`] if any read document changed in between. Issue
/// all reads before the first write.
///
/// Methods return `Send` futures so callers generic over the store (the
/// usecases and the HTTP state) stay spawnable.
pub trait StoreTransaction: Send {
    fn get(
        &mut self,
        collection: &str,
        key: &str,
    ) -> impl Future<Output = Result<Option<Document>, StoreError>> + Send;

    fn set(&mut self, collection: &str, key: &str, doc: Document);

    /// Stage a field merge. Fails at commit if the document is missing.
    fn update(&mut self, collection: &str, key: &str, fields: Document);

    /// Stage an atomic numeric increment. Applied against the committed
    /// value at commit time, never a caller-cached one, so concurrent
    /// increments through different transactions are never lost. A missing
    /// field counts as zero; a missing document fails the commit.
    fn increment(&mut self, collection: &str, key: &str, field: &str, delta: i64);

    fn commit(self) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// The persistence/identity capability.
pub trait DocumentStore: Clone + Send + Sync + 'static {
    type Txn: StoreTransaction;

    /// Must succeed before any read or write is attempted.
    fn sign_in_anonymously(&self) -> impl Future<Output = Result<Identity, StoreError>> + Send;

    fn get(
        &self,
        collection: &str,
        key: &str,
    ) -> impl Future<Output = Result<Option<Document>, StoreError>> + Send;

    /// Full contents of a collection, ordered by key.
    fn list(
        &self,
        collection: &str,
    ) -> impl Future<Output = Result<Vec<(String, Document)>, StoreError>> + Send;

    /// Subscribe to a collection. The receiver holds the current snapshot
    /// and is woken on every change; dropping it unsubscribes.
    fn subscribe(&self, collection: &str) -> watch::Receiver<Snapshot>;

    fn begin(&self) -> impl Future<Output = Result<Self::Txn, StoreError>> + Send;

    fn set(
        &self,
        collection: &str,
        key: &str,
        doc: Document,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn update(
        &self,
        collection: &str,
        key: &str,
        fields: Document,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn delete(
        &self,
        collection: &str,
        key: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Apply up to [`MAX_BATCH_OPS`] writes atomically. Batch writes are
    /// last-writer-wins; they do not conflict-check against transactions.
    fn batch_write(&self, ops: Vec<WriteOp>)
    -> impl Future<Output = Result<(), StoreError>> + Send;
}
