//! Authenticated user identity supplied by the external identity provider.

use serde::{Deserialize, Serialize};

/// Provider-issued identity. The `uid` scopes every remote document path;
/// the remaining fields are display-only and may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub photo_url: Option<String>,
}

impl UserIdentity {
    /// Best-effort display label: display name, then email, then the uid.
    pub fn display_label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.uid)
    }

    /// Single-character avatar fallback when no photo is available.
    pub fn initial(&self) -> char {
        self.display_label()
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('U')
    }
}
