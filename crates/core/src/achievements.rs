//! Certification and course records plus the drafts submitted from entry forms.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::errors::{CoreError, Result};

/// Minimum accepted title length for a new entry.
pub const MIN_TITLE_LEN: usize = 3;
/// Minimum accepted issuer/platform length for a new entry.
pub const MIN_ISSUER_LEN: usize = 2;
/// Client-side cap on raw image bytes before base64 encoding.
pub const MAX_IMAGE_BYTES: usize = 800 * 1024;

/// Completion month, serialized as the English month name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::January => "January",
            Self::February => "February",
            Self::March => "March",
            Self::April => "April",
            Self::May => "May",
            Self::June => "June",
            Self::July => "July",
            Self::August => "August",
            Self::September => "September",
            Self::October => "October",
            Self::November => "November",
            Self::December => "December",
        }
    }
}

/// Stored certification document. Entries are create/delete only; edits are
/// not supported, so every field other than the gateway-assigned `id` is
/// written once at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificationEntry {
    pub id: String,
    pub title: String,
    pub issuer: String,
    pub month: Month,
    pub year: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

/// Stored course document. Same lifecycle as [`CertificationEntry`], with a
/// free-text `duration` as the completion marker instead of month/year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseEntry {
    pub id: String,
    pub title: String,
    pub platform: String,
    pub duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

impl CertificationEntry {
    /// Comma-separated skills split into trimmed, non-empty tags.
    pub fn skill_tags(&self) -> Vec<&str> {
        split_skills(self.skills.as_deref())
    }
}

impl CourseEntry {
    pub fn skill_tags(&self) -> Vec<&str> {
        split_skills(self.skills.as_deref())
    }
}

fn split_skills(skills: Option<&str>) -> Vec<&str> {
    skills
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Unvouched certification form payload. `validate` gates submission before
/// any remote call is attempted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificationDraft {
    pub title: String,
    pub issuer: String,
    pub month: Month,
    pub year: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<String>,
}

/// Unvouched course form payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDraft {
    pub title: String,
    pub platform: String,
    pub duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<String>,
}

impl CertificationDraft {
    pub fn validate(&self) -> Result<()> {
        validate_title(&self.title)?;
        validate_source("issuer", &self.issuer)?;
        validate_year(&self.year)
    }
}

impl CourseDraft {
    pub fn validate(&self) -> Result<()> {
        validate_title(&self.title)?;
        validate_source("platform", &self.platform)
    }
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().chars().count() < MIN_TITLE_LEN {
        return Err(CoreError::validation(
            "title",
            format!("must be at least {} characters", MIN_TITLE_LEN),
        ));
    }
    Ok(())
}

fn validate_source(field: &'static str, value: &str) -> Result<()> {
    if value.trim().chars().count() < MIN_ISSUER_LEN {
        return Err(CoreError::validation(
            field,
            format!("must be at least {} characters", MIN_ISSUER_LEN),
        ));
    }
    Ok(())
}

fn validate_year(year: &str) -> Result<()> {
    let trimmed = year.trim();
    if trimmed.len() != 4 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoreError::validation("year", "must be a 4-digit year"));
    }
    Ok(())
}

/// Encode raw image bytes into a `data:` URI, rejecting oversized files
/// before any encoding or write is attempted.
pub fn encode_image_data_uri(mime: &str, bytes: &[u8]) -> Result<String> {
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(CoreError::ImageTooLarge {
            size_bytes: bytes.len(),
            max_bytes: MAX_IMAGE_BYTES,
        });
    }
    Ok(format!("data:{};base64,{}", mime, BASE64.encode(bytes)))
}
