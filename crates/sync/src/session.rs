//! Session lifecycle: reacts to identity changes by tearing down and
//! rebuilding the live mirrors.
//!
//! On every identity transition the controller cancels unsent debounced
//! edits, aborts the previous user's listener tasks, advances the mirror
//! epoch, and (when a user is signed in) opens fresh subscriptions on the
//! three per-user paths. Listener writes are stamped with the epoch they were
//! opened under, so even a callback that races the teardown cannot cross
//! identities.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use log::{debug, error, warn};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use certihub_core::UserIdentity;

use crate::error::Result;
use crate::gateway::{DocumentGateway, SnapshotEvent, StorePath, Subscription};
use crate::identity::IdentityProvider;
use crate::mirror::MirrorSet;
use crate::notice::NoticeSender;
use crate::queue::DebouncedMutationQueue;

const READY_CERTIFICATIONS: u8 = 0b001;
const READY_COURSES: u8 = 0b010;
const READY_PROFILE: u8 = 0b100;
const READY_ALL: u8 = 0b111;

/// Tracks which mirrors have resolved their first snapshot this epoch.
struct Readiness {
    seen: AtomicU8,
}

impl Readiness {
    fn new() -> Self {
        Self {
            seen: AtomicU8::new(0),
        }
    }

    fn mark(&self, bit: u8) {
        self.seen.fetch_or(bit, Ordering::SeqCst);
    }

    fn complete(&self) -> bool {
        self.seen.load(Ordering::SeqCst) == READY_ALL
    }
}

pub struct SessionController {
    identity: Arc<dyn IdentityProvider>,
    gateway: Arc<dyn DocumentGateway>,
    mirrors: Arc<MirrorSet>,
    queue: DebouncedMutationQueue,
    notices: NoticeSender,
    current: Mutex<Option<UserIdentity>>,
    listeners: Mutex<Vec<JoinHandle<()>>>,
    readiness: Mutex<Option<Arc<Readiness>>>,
    resolved: AtomicBool,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl SessionController {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        gateway: Arc<dyn DocumentGateway>,
        notices: NoticeSender,
    ) -> Self {
        let queue = DebouncedMutationQueue::new(gateway.clone(), notices.clone());
        Self {
            identity,
            gateway,
            mirrors: Arc::new(MirrorSet::new()),
            queue,
            notices,
            current: Mutex::new(None),
            listeners: Mutex::new(Vec::new()),
            readiness: Mutex::new(None),
            resolved: AtomicBool::new(false),
            driver: Mutex::new(None),
        }
    }

    pub fn mirrors(&self) -> &Arc<MirrorSet> {
        &self.mirrors
    }

    pub fn gateway(&self) -> &Arc<dyn DocumentGateway> {
        &self.gateway
    }

    pub fn queue(&self) -> &DebouncedMutationQueue {
        &self.queue
    }

    pub fn notices(&self) -> &NoticeSender {
        &self.notices
    }

    pub async fn current_user(&self) -> Option<UserIdentity> {
        self.current.lock().await.clone()
    }

    /// True once the identity provider has answered for the first time,
    /// whether with a user or with signed-out. Never flips back.
    pub fn is_ready(&self) -> bool {
        self.resolved.load(Ordering::SeqCst)
    }

    /// True once every mirror of the signed-in user has resolved its first
    /// snapshot. Trivially true while signed out.
    pub async fn is_loaded(&self) -> bool {
        match self.readiness.lock().await.as_ref() {
            Some(readiness) => readiness.complete(),
            None => true,
        }
    }

    /// Apply the provider's current identity, then keep following identity
    /// transitions until `stop` is called. Idempotent.
    pub async fn start(self: &Arc<Self>) {
        let mut driver = self.driver.lock().await;
        if driver.is_some() {
            return;
        }

        let initial = self.identity.current_identity().await;
        self.apply_identity(initial).await;

        let controller = self.clone();
        let mut events = self.identity.subscribe_identity().await;
        *driver = Some(tokio::spawn(async move {
            while let Some(identity) = events.recv().await {
                controller.apply_identity(identity).await;
            }
            debug!("identity stream closed; session driver exiting");
        }));
    }

    /// Stop following identity changes and detach all listeners. The mirrors
    /// keep their last data until the next `start`.
    pub async fn stop(&self) {
        if let Some(task) = self.driver.lock().await.take() {
            task.abort();
        }
        let mut listeners = self.listeners.lock().await;
        for task in listeners.drain(..) {
            task.abort();
        }
    }

    /// Flush unsent edits, then end the session at the provider. The mirror
    /// teardown itself happens when the signed-out transition arrives.
    pub async fn sign_out(&self) -> Result<()> {
        if let Err(err) = self.queue.flush_all().await {
            warn!("pending edits lost on sign-out: {}", err);
        }
        self.identity.sign_out().await
    }

    /// Swap the session to `next`. A transition to the same uid is a no-op;
    /// anything else tears the old session down before the new one starts.
    async fn apply_identity(self: &Arc<Self>, next: Option<UserIdentity>) {
        let mut current = self.current.lock().await;
        let same_uid = match (current.as_ref(), next.as_ref()) {
            (Some(a), Some(b)) => a.uid == b.uid,
            (None, None) => true,
            _ => false,
        };
        if same_uid {
            *current = next;
            self.resolved.store(true, Ordering::SeqCst);
            return;
        }

        self.queue.cancel_all().await;
        {
            let mut listeners = self.listeners.lock().await;
            for task in listeners.drain(..) {
                task.abort();
            }
        }
        let generation = self.mirrors.begin_epoch().await;

        match &next {
            Some(user) => {
                debug!("session switching to user {}", user.uid);
                let readiness = Arc::new(Readiness::new());
                *self.readiness.lock().await = Some(readiness.clone());
                self.open_listeners(&user.uid, generation, readiness).await;
            }
            None => {
                debug!("session signed out");
                *self.readiness.lock().await = None;
            }
        }
        *current = next;
        self.resolved.store(true, Ordering::SeqCst);
    }

    async fn open_listeners(self: &Arc<Self>, uid: &str, generation: u64, readiness: Arc<Readiness>) {
        let plans = [
            (StorePath::certifications(uid), READY_CERTIFICATIONS),
            (StorePath::courses(uid), READY_COURSES),
            (StorePath::profile(uid), READY_PROFILE),
        ];
        let mut listeners = self.listeners.lock().await;
        for (path, ready_bit) in plans {
            match self.gateway.subscribe(path.clone()).await {
                Ok(subscription) => {
                    listeners.push(tokio::spawn(run_listener(
                        subscription,
                        path,
                        ready_bit,
                        generation,
                        self.mirrors.clone(),
                        self.notices.clone(),
                        readiness.clone(),
                    )));
                }
                Err(err) => {
                    error!("failed to subscribe to {}: {}", path, err);
                    self.notices
                        .alert(format!("Failed to load your data: {}", err));
                    // Nothing will ever arrive for this mirror; do not hold
                    // readiness hostage on it.
                    readiness.mark(ready_bit);
                }
            }
        }
    }
}

async fn run_listener(
    mut subscription: Subscription,
    path: StorePath,
    ready_bit: u8,
    generation: u64,
    mirrors: Arc<MirrorSet>,
    notices: NoticeSender,
    readiness: Arc<Readiness>,
) {
    while let Some(event) = subscription.next_event().await {
        readiness.mark(ready_bit);
        match event {
            SnapshotEvent::Collection(records) => {
                let applied = match path.store_collection() {
                    crate::gateway::StoreCollection::Certifications => {
                        mirrors.apply_certifications(generation, records).await
                    }
                    crate::gateway::StoreCollection::Courses => {
                        mirrors.apply_courses(generation, records).await
                    }
                    crate::gateway::StoreCollection::Profile => {
                        warn!("collection snapshot on document path {}", path);
                        continue;
                    }
                };
                if !applied {
                    // The epoch moved on; this listener is about to be aborted.
                    return;
                }
            }
            SnapshotEvent::Document(fields) => {
                if !mirrors.apply_profile(generation, fields).await {
                    return;
                }
            }
            SnapshotEvent::Error(fault) => {
                error!("snapshot error on {}: {} ({})", path, fault.message, fault.code);
                notices.alert(format!("Live sync error: {}", fault.message));
            }
        }
    }
    debug!("snapshot stream for {} ended", path);
}
