//! Authentication state source.

use async_trait::async_trait;
use tokio::sync::mpsc;

use certihub_core::UserIdentity;

use crate::error::Result;

/// Source of the signed-in user, both its current value and a stream of
/// changes. `None` means signed out.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The identity at the moment of the call.
    async fn current_identity(&self) -> Option<UserIdentity>;

    /// Stream of identity transitions. Each item is the full new state, so a
    /// consumer never has to diff against what it previously saw.
    async fn subscribe_identity(&self) -> mpsc::Receiver<Option<UserIdentity>>;

    /// End the current session at the provider.
    async fn sign_out(&self) -> Result<()>;
}
