//! In-memory gateway and identity doubles shared by the unit tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, Mutex};

use certihub_core::UserIdentity;

use crate::error::{Result, SyncError};
use crate::gateway::{DocumentGateway, SnapshotEvent, StorePath, Subscription};
use crate::identity::IdentityProvider;

pub(crate) fn identity(uid: &str) -> UserIdentity {
    UserIdentity {
        uid: uid.to_string(),
        display_name: Some(format!("User {}", uid)),
        email: None,
        photo_url: None,
    }
}

#[derive(Default)]
struct FakeGatewayState {
    merge_upserts: Vec<(StorePath, Value)>,
    creates: Vec<(StorePath, Value)>,
    deletes: Vec<StorePath>,
    merge_error: Option<String>,
    create_error: Option<String>,
    subscribers: HashMap<StorePath, Vec<mpsc::Sender<SnapshotEvent>>>,
    next_id: u64,
}

/// Scriptable [`DocumentGateway`] that records every mutation and lets tests
/// push snapshot events to open subscriptions.
pub(crate) struct FakeGateway {
    state: Mutex<FakeGatewayState>,
}

impl FakeGateway {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(FakeGatewayState::default()),
        }
    }

    pub(crate) async fn merge_upserts(&self) -> Vec<(StorePath, Value)> {
        self.state.lock().await.merge_upserts.clone()
    }

    pub(crate) async fn creates(&self) -> Vec<(StorePath, Value)> {
        self.state.lock().await.creates.clone()
    }

    pub(crate) async fn deletes(&self) -> Vec<StorePath> {
        self.state.lock().await.deletes.clone()
    }

    pub(crate) async fn fail_merge_upserts(&self, message: &str) {
        self.state.lock().await.merge_error = Some(message.to_string());
    }

    pub(crate) async fn fail_creates(&self, message: &str) {
        self.state.lock().await.create_error = Some(message.to_string());
    }

    /// Deliver a snapshot to every open subscription on `path`.
    pub(crate) async fn push_snapshot(&self, path: &StorePath, event: SnapshotEvent) {
        let senders = {
            let state = self.state.lock().await;
            state.subscribers.get(path).cloned().unwrap_or_default()
        };
        for sender in senders {
            let _ = sender.send(event.clone()).await;
        }
    }

    pub(crate) async fn subscriber_count(&self, path: &StorePath) -> usize {
        let mut state = self.state.lock().await;
        let Some(senders) = state.subscribers.get_mut(path) else {
            return 0;
        };
        senders.retain(|sender| !sender.is_closed());
        senders.len()
    }
}

#[async_trait]
impl DocumentGateway for FakeGateway {
    async fn subscribe(&self, path: StorePath) -> Result<Subscription> {
        let (tx, rx) = mpsc::channel(16);
        let mut state = self.state.lock().await;
        state.subscribers.entry(path).or_default().push(tx);
        Ok(Subscription::new(rx, None))
    }

    async fn create(&self, path: StorePath, fields: Value) -> Result<String> {
        let mut state = self.state.lock().await;
        if let Some(message) = &state.create_error {
            return Err(SyncError::gateway("unavailable", message.clone()));
        }
        state.next_id += 1;
        let id = format!("doc-{}", state.next_id);
        state.creates.push((path, fields));
        Ok(id)
    }

    async fn merge_upsert(&self, path: StorePath, fields: Value) -> Result<()> {
        let mut state = self.state.lock().await;
        if let Some(message) = &state.merge_error {
            return Err(SyncError::gateway("unavailable", message.clone()));
        }
        state.merge_upserts.push((path, fields));
        Ok(())
    }

    async fn delete(&self, path: StorePath) -> Result<()> {
        let mut state = self.state.lock().await;
        state.deletes.push(path);
        Ok(())
    }
}

#[derive(Default)]
struct FakeIdentityState {
    current: Option<UserIdentity>,
    subscribers: Vec<mpsc::Sender<Option<UserIdentity>>>,
    sign_outs: u32,
}

/// Scriptable [`IdentityProvider`] driven by `set_identity`.
pub(crate) struct FakeIdentityProvider {
    state: Arc<Mutex<FakeIdentityState>>,
}

impl FakeIdentityProvider {
    pub(crate) fn new(current: Option<UserIdentity>) -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeIdentityState {
                current,
                ..FakeIdentityState::default()
            })),
        }
    }

    /// Change the signed-in user and notify every subscriber.
    pub(crate) async fn set_identity(&self, identity: Option<UserIdentity>) {
        let senders = {
            let mut state = self.state.lock().await;
            state.current = identity.clone();
            state.subscribers.clone()
        };
        for sender in senders {
            let _ = sender.send(identity.clone()).await;
        }
    }

    pub(crate) async fn sign_out_count(&self) -> u32 {
        self.state.lock().await.sign_outs
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn current_identity(&self) -> Option<UserIdentity> {
        self.state.lock().await.current.clone()
    }

    async fn subscribe_identity(&self) -> mpsc::Receiver<Option<UserIdentity>> {
        let (tx, rx) = mpsc::channel(8);
        self.state.lock().await.subscribers.push(tx);
        rx
    }

    async fn sign_out(&self) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            state.sign_outs += 1;
        }
        self.set_identity(None).await;
        Ok(())
    }
}
