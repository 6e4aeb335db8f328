//! Remote document store contract.
//!
//! The store is path-addressed as `users/{uid}/{collection}/{docId}` with
//! three per-user paths: the `certifications` and `courses` collections and
//! the `profile/main` singleton. Implementations deliver live snapshots over
//! a channel; provider errors arrive as events, never as stream termination.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::Result;

/// Fixed document id of the per-user profile singleton.
pub use certihub_core::PROFILE_DOC_ID;

/// The three remote collections mirrored per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreCollection {
    Certifications,
    Courses,
    Profile,
}

impl StoreCollection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Certifications => "certifications",
            Self::Courses => "courses",
            Self::Profile => "profile",
        }
    }
}

/// A path under `users/{uid}/...`, either a whole collection or one document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StorePath {
    Collection {
        uid: String,
        collection: StoreCollection,
    },
    Document {
        uid: String,
        collection: StoreCollection,
        doc_id: String,
    },
}

impl StorePath {
    pub fn collection(uid: &str, collection: StoreCollection) -> Self {
        Self::Collection {
            uid: uid.to_string(),
            collection,
        }
    }

    pub fn document(uid: &str, collection: StoreCollection, doc_id: &str) -> Self {
        Self::Document {
            uid: uid.to_string(),
            collection,
            doc_id: doc_id.to_string(),
        }
    }

    pub fn certifications(uid: &str) -> Self {
        Self::collection(uid, StoreCollection::Certifications)
    }

    pub fn courses(uid: &str) -> Self {
        Self::collection(uid, StoreCollection::Courses)
    }

    /// The `users/{uid}/profile/main` singleton document.
    pub fn profile(uid: &str) -> Self {
        Self::document(uid, StoreCollection::Profile, PROFILE_DOC_ID)
    }

    pub fn uid(&self) -> &str {
        match self {
            Self::Collection { uid, .. } | Self::Document { uid, .. } => uid,
        }
    }

    pub fn store_collection(&self) -> StoreCollection {
        match self {
            Self::Collection { collection, .. } | Self::Document { collection, .. } => *collection,
        }
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collection { uid, collection } => {
                write!(f, "users/{}/{}", uid, collection.as_str())
            }
            Self::Document {
                uid,
                collection,
                doc_id,
            } => write!(f, "users/{}/{}/{}", uid, collection.as_str(), doc_id),
        }
    }
}

/// One document of a collection snapshot: gateway-assigned id plus fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub id: String,
    pub fields: Value,
}

/// A fault reported by the store on a live subscription. Non-fatal: the
/// subscription stays open and the mirror keeps its last good value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayFault {
    pub code: String,
    pub message: String,
}

/// A complete point-in-time view of one remote path, delivered on every
/// change.
#[derive(Debug, Clone)]
pub enum SnapshotEvent {
    /// Whole contents of a collection path.
    Collection(Vec<DocumentRecord>),
    /// Current fields of a document path; `None` when it does not exist yet.
    Document(Option<Value>),
    /// A provider fault; the stream continues.
    Error(GatewayFault),
}

/// Live subscription handle. Dropping it detaches the remote listener.
pub struct Subscription {
    events: mpsc::Receiver<SnapshotEvent>,
    _guard: SubscriptionGuard,
}

struct SubscriptionGuard {
    task: Option<JoinHandle<()>>,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Subscription {
    /// Wrap a snapshot channel; `task` (if any) is the driving loop, aborted
    /// on drop.
    pub fn new(events: mpsc::Receiver<SnapshotEvent>, task: Option<JoinHandle<()>>) -> Self {
        Self {
            events,
            _guard: SubscriptionGuard { task },
        }
    }

    /// Next snapshot event; `None` once the gateway side closes the stream.
    pub async fn next_event(&mut self) -> Option<SnapshotEvent> {
        self.events.recv().await
    }
}

/// Remote document store operations consumed by the sync core.
///
/// `merge_upsert` is an explicit contract: it creates the target document
/// when absent and shallow-merges fields into it when present, leaving
/// unspecified fields untouched.
#[async_trait]
pub trait DocumentGateway: Send + Sync {
    /// Open a live snapshot stream for a path.
    async fn subscribe(&self, path: StorePath) -> Result<Subscription>;

    /// Create a document in a collection; returns the new document id.
    async fn create(&self, path: StorePath, fields: Value) -> Result<String>;

    /// Create-or-shallow-merge a document's fields.
    async fn merge_upsert(&self, path: StorePath, fields: Value) -> Result<()>;

    /// Delete a document.
    async fn delete(&self, path: StorePath) -> Result<()>;
}
