//! In-process [`DocumentStore`] with real optimistic-concurrency semantics.
//!
//! Every committed change bumps a global revision; each document remembers
//! the revision that last wrote it. Transactions record the version of every
//! document they read (or read as absent) and verify those versions under
//! the store lock at commit, so two transactions racing on the same document
//! cannot both win.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::anyhow;
use tokio::sync::watch;
use uuid::Uuid;

use crate::{
    Document, DocumentStore, Identity, MAX_BATCH_OPS, Snapshot, StoreError, StoreTransaction,
    WriteOp,
};

#[derive(Debug)]
struct Versioned {
    version: u64,
    doc: Document,
}

struct State {
    anonymous_auth: bool,
    identity: Option<Identity>,
    revision: u64,
    collections: HashMap<String, BTreeMap<String, Versioned>>,
    watchers: HashMap<String, watch::Sender<Snapshot>>,
}

#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_auth(true)
    }

    /// A store whose anonymous sign-in always fails with
    /// [`StoreError::ConfigMissing`], mirroring a backend where the identity
    /// provider was never enabled.
    pub fn without_anonymous_auth() -> Self {
        Self::with_auth(false)
    }

    fn with_auth(anonymous_auth: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(State {
                anonymous_auth,
                identity: None,
                revision: 0,
                collections: HashMap::new(),
                watchers: HashMap::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner.lock().expect("store lock poisoned")
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn require_signed_in(state: &State) -> Result<(), StoreError> {
    if state.identity.is_some() {
        Ok(())
    } else {
        Err(StoreError::Unauthenticated)
    }
}

fn snapshot_of(state: &State, collection: &str) -> Snapshot {
    let docs = state
        .collections
        .get(collection)
        .map(|map| {
            map.iter()
                .map(|(key, versioned)| (key.clone(), versioned.doc.clone()))
                .collect()
        })
        .unwrap_or_default();
    Snapshot {
        revision: state.revision,
        docs,
    }
}

fn notify(state: &mut State, touched: &HashSet<String>) {
    for collection in touched {
        if state.watchers.contains_key(collection) {
            let snapshot = snapshot_of(state, collection);
            if let Some(sender) = state.watchers.get(collection) {
                sender.send_replace(snapshot);
            }
        }
    }
}

/// Validate a batch against the current state, then apply it under one
/// revision. Nothing is written if any operation is invalid. Validation
/// replays the ops against a created/deleted view so an update after an
/// in-batch delete is rejected before anything lands.
fn apply_write_ops(state: &mut State, ops: &[WriteOp]) -> Result<HashSet<String>, StoreError> {
    let mut created: HashSet<(String, String)> = HashSet::new();
    let mut deleted: HashSet<(String, String)> = HashSet::new();
    for op in ops {
        match op {
            WriteOp::Set {
                collection, key, ..
            } => {
                created.insert((collection.clone(), key.clone()));
                deleted.remove(&(collection.clone(), key.clone()));
            }
            WriteOp::Update {
                collection,
                key,
                fields,
            } => {
                if fields.as_object().is_none() {
                    return Err(StoreError::Backend(anyhow!(
                        "update fields must be a JSON object"
                    )));
                }
                let target = (collection.clone(), key.clone());
                let exists = created.contains(&target)
                    || (!deleted.contains(&target)
                        && state
                            .collections
                            .get(collection)
                            .is_some_and(|map| map.contains_key(key)));
                if !exists {
                    return Err(StoreError::DocumentNotFound {
                        collection: collection.clone(),
                        key: key.clone(),
                    });
                }
            }
            WriteOp::Delete { collection, key } => {
                deleted.insert((collection.clone(), key.clone()));
                created.remove(&(collection.clone(), key.clone()));
            }
        }
    }

    state.revision += 1;
    let revision = state.revision;
    let mut touched = HashSet::new();
    for op in ops {
        match op {
            WriteOp::Set {
                collection,
                key,
                doc,
            } => {
                state.collections.entry(collection.clone()).or_default().insert(
                    key.clone(),
                    Versioned {
                        version: revision,
                        doc: doc.clone(),
                    },
                );
                touched.insert(collection.clone());
            }
            WriteOp::Update {
                collection,
                key,
                fields,
            } => {
                let map = state.collections.entry(collection.clone()).or_default();
                let entry = map.get_mut(key).ok_or_else(|| StoreError::DocumentNotFound {
                    collection: collection.clone(),
                    key: key.clone(),
                })?;
                merge_fields(&mut entry.doc, fields);
                entry.version = revision;
                touched.insert(collection.clone());
            }
            WriteOp::Delete { collection, key } => {
                if let Some(map) = state.collections.get_mut(collection) {
                    if map.remove(key).is_some() {
                        touched.insert(collection.clone());
                    }
                }
            }
        }
    }
    Ok(touched)
}

fn merge_fields(doc: &mut Document, fields: &Document) {
    if let (Some(target), Some(updates)) = (doc.as_object_mut(), fields.as_object()) {
        for (name, value) in updates {
            target.insert(name.clone(), value.clone());
        }
    }
}

impl DocumentStore for MemoryStore {
    type Txn = MemoryTransaction;

    async fn sign_in_anonymously(&self) -> Result<Identity, StoreError> {
        let mut state = self.lock();
        if !state.anonymous_auth {
            return Err(StoreError::ConfigMissing);
        }
        if let Some(identity) = &state.identity {
            return Ok(identity.clone());
        }
        let identity = Identity {
            uid: Uuid::new_v4(),
        };
        state.identity = Some(identity.clone());
        tracing::debug!(uid = %identity.uid, "anonymous sign-in");
        Ok(identity)
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError> {
        let state = self.lock();
        require_signed_in(&state)?;
        Ok(state
            .collections
            .get(collection)
            .and_then(|map| map.get(key))
            .map(|versioned| versioned.doc.clone()))
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Document)>, StoreError> {
        let state = self.lock();
        require_signed_in(&state)?;
        Ok(snapshot_of(&state, collection).docs)
    }

    fn subscribe(&self, collection: &str) -> watch::Receiver<Snapshot> {
        let mut state = self.lock();
        if !state.watchers.contains_key(collection) {
            let snapshot = snapshot_of(&state, collection);
            let (sender, _) = watch::channel(snapshot);
            state.watchers.insert(collection.to_owned(), sender);
        }
        state.watchers[collection].subscribe()
    }

    async fn begin(&self) -> Result<MemoryTransaction, StoreError> {
        let state = self.lock();
        require_signed_in(&state)?;
        Ok(MemoryTransaction {
            inner: Arc::clone(&self.inner),
            reads: Vec::new(),
            ops: Vec::new(),
        })
    }

    async fn set(&self, collection: &str, key: &str, doc: Document) -> Result<(), StoreError> {
        self.batch_write(vec![WriteOp::Set {
            collection: collection.to_owned(),
            key: key.to_owned(),
            doc,
        }])
        .await
    }

    async fn update(
        &self,
        collection: &str,
        key: &str,
        fields: Document,
    ) -> Result<(), StoreError> {
        self.batch_write(vec![WriteOp::Update {
            collection: collection.to_owned(),
            key: key.to_owned(),
            fields,
        }])
        .await
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError> {
        self.batch_write(vec![WriteOp::Delete {
            collection: collection.to_owned(),
            key: key.to_owned(),
        }])
        .await
    }

    async fn batch_write(&self, ops: Vec<WriteOp>) -> Result<(), StoreError> {
        if ops.len() > MAX_BATCH_OPS {
            return Err(StoreError::BatchTooLarge(ops.len()));
        }
        let mut state = self.lock();
        require_signed_in(&state)?;
        let touched = apply_write_ops(&mut state, &ops)?;
        notify(&mut state, &touched);
        Ok(())
    }
}

// ── Transaction ───────────────────────────────────────────────────────────────

enum TxnOp {
    Update {
        collection: String,
        key: String,
        fields: Document,
    },
    Set {
        collection: String,
        key: String,
        doc: Document,
    },
    Increment {
        collection: String,
        key: String,
        field: String,
        delta: i64,
    },
}

pub struct MemoryTransaction {
    inner: Arc<Mutex<State>>,
    /// (collection, key, version observed; `None` means observed absent).
    reads: Vec<(String, String, Option<u64>)>,
    ops: Vec<TxnOp>,
}

impl StoreTransaction for MemoryTransaction {
    async fn get(
        &mut self,
        collection: &str,
        key: &str,
    ) -> Result<Option<Document>, StoreError> {
        let state = self.inner.lock().expect("store lock poisoned");
        require_signed_in(&state)?;
        let entry = state.collections.get(collection).and_then(|map| map.get(key));
        self.reads.push((
            collection.to_owned(),
            key.to_owned(),
            entry.map(|versioned| versioned.version),
        ));
        Ok(entry.map(|versioned| versioned.doc.clone()))
    }

    fn set(&mut self, collection: &str, key: &str, doc: Document) {
        self.ops.push(TxnOp::Set {
            collection: collection.to_owned(),
            key: key.to_owned(),
            doc,
        });
    }

    fn update(&mut self, collection: &str, key: &str, fields: Document) {
        self.ops.push(TxnOp::Update {
            collection: collection.to_owned(),
            key: key.to_owned(),
            fields,
        });
    }

    fn increment(&mut self, collection: &str, key: &str, field: &str, delta: i64) {
        self.ops.push(TxnOp::Increment {
            collection: collection.to_owned(),
            key: key.to_owned(),
            field: field.to_owned(),
            delta,
        });
    }

    async fn commit(self) -> Result<(), StoreError> {
        let mut state = self.inner.lock().expect("store lock poisoned");
        require_signed_in(&state)?;

        // Version check: every read must still observe what it saw.
        for (collection, key, seen) in &self.reads {
            let current = state
                .collections
                .get(collection)
                .and_then(|map| map.get(key))
                .map(|versioned| versioned.version);
            if current != *seen {
                return Err(StoreError::Conflict);
            }
        }

        // Validate before mutating so a failed commit applies nothing.
        let mut created: HashSet<(String, String)> = HashSet::new();
        for op in &self.ops {
            match op {
                TxnOp::Set {
                    collection, key, ..
                } => {
                    created.insert((collection.clone(), key.clone()));
                }
                TxnOp::Update {
                    collection,
                    key,
                    fields,
                } => {
                    if fields.as_object().is_none() {
                        return Err(StoreError::Backend(anyhow!(
                            "update fields must be a JSON object"
                        )));
                    }
                    ensure_target(&state, &created, collection, key)?;
                }
                TxnOp::Increment {
                    collection,
                    key,
                    field,
                    ..
                } => {
                    ensure_target(&state, &created, collection, key)?;
                    let numeric = state
                        .collections
                        .get(collection)
                        .and_then(|map| map.get(key))
                        .and_then(|versioned| versioned.doc.get(field))
                        .is_none_or(|value| value.is_i64() || value.is_u64());
                    if !numeric {
                        return Err(StoreError::Backend(anyhow!(
                            "increment target {collection}/{key}.{field} is not an integer"
                        )));
                    }
                }
            }
        }

        state.revision += 1;
        let revision = state.revision;
        let mut touched = HashSet::new();
        for op in self.ops {
            match op {
                TxnOp::Set {
                    collection,
                    key,
                    doc,
                } => {
                    state
                        .collections
                        .entry(collection.clone())
                        .or_default()
                        .insert(key, Versioned { version: revision, doc });
                    touched.insert(collection);
                }
                TxnOp::Update {
                    collection,
                    key,
                    fields,
                } => {
                    if let Some(entry) = state
                        .collections
                        .entry(collection.clone())
                        .or_default()
                        .get_mut(&key)
                    {
                        merge_fields(&mut entry.doc, &fields);
                        entry.version = revision;
                    }
                    touched.insert(collection);
                }
                TxnOp::Increment {
                    collection,
                    key,
                    field,
                    delta,
                } => {
                    if let Some(entry) = state
                        .collections
                        .entry(collection.clone())
                        .or_default()
                        .get_mut(&key)
                    {
                        let current = entry.doc.get(&field).and_then(|v| v.as_i64()).unwrap_or(0);
                        if let Some(doc) = entry.doc.as_object_mut() {
                            doc.insert(field, serde_json::json!(current + delta));
                        }
                        entry.version = revision;
                    }
                    touched.insert(collection);
                }
            }
        }
        tracing::debug!(revision, "transaction committed");
        notify(&mut state, &touched);
        Ok(())
    }
}

fn ensure_target(
    state: &State,
    created: &HashSet<(String, String)>,
    collection: &str,
    key: &str,
) -> Result<(), StoreError> {
    let exists = created.contains(&(collection.to_owned(), key.to_owned()))
        || state
            .collections
            .get(collection)
            .is_some_and(|map| map.contains_key(key));
    if exists {
        Ok(())
    } else {
        Err(StoreError::DocumentNotFound {
            collection: collection.to_owned(),
            key: key.to_owned(),
        })
    }
}
