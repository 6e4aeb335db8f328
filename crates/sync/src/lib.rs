//! Live-sync state reconciliation for the Certihub achievement tracker.
//!
//! The remote document store and the identity provider are external
//! collaborators reached through the [`DocumentGateway`] and
//! [`IdentityProvider`] contracts. This crate owns everything between those
//! contracts and the UI: session lifecycle, per-path live mirrors kept
//! current by whole-snapshot overwrite, a debounced mutation queue for
//! autosaved edits, and the entry creation/deletion flow.

pub mod entries;
pub mod error;
pub mod gateway;
pub mod identity;
pub mod mirror;
pub mod notice;
pub mod queue;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use entries::{
    AchievementKind, AchievementService, ConfirmedDeletion, DeletionPrompt, EntryFormState,
    FormPhase, ProfileEditor, ProfileField,
};
pub use error::{Result, SyncError};
pub use gateway::{
    DocumentGateway, DocumentRecord, GatewayFault, SnapshotEvent, StoreCollection, StorePath,
    Subscription,
};
pub use identity::IdentityProvider;
pub use mirror::MirrorSet;
pub use notice::{notice_channel, NoticeKind, NoticeSender, UserNotice};
pub use queue::{DebouncedMutationQueue, PROFILE_FIELD_DEBOUNCE, SEMESTER_TABLE_DEBOUNCE};
pub use session::SessionController;
