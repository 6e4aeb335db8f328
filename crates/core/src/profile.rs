//! The per-user profile document and its embedded semester records.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Fixed document id of the profile singleton under `users/{uid}/profile`.
pub const PROFILE_DOC_ID: &str = "main";

/// One semester row inside `ProfileDocument::semesters`.
///
/// Identity is the client-generated `id`; order is insertion order. The
/// stored `number` is display-only and is recomputed from the array index,
/// never trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemesterRecord {
    pub id: String,
    pub number: u32,
    #[serde(default)]
    pub sgpa: String,
    #[serde(default)]
    pub credits: String,
}

/// Profile singleton, created implicitly by the first merge-upsert. All
/// fields default so a partial remote document still deserializes; absent
/// fields are preserved by merge writes, never nulled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileDocument {
    pub full_name: String,
    pub college: String,
    pub major: String,
    pub degree: String,
    pub grad_year: String,
    pub bio: String,
    pub github: String,
    pub linkedin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub gpa: String,
    pub semesters: Vec<SemesterRecord>,
}

static TOKEN_SERIAL: AtomicU64 = AtomicU64::new(0);

/// Unique token for a new semester row: the millisecond clock the stored
/// documents already use, disambiguated by a process-wide serial so two rows
/// added in the same millisecond never collide.
pub fn new_semester_token() -> String {
    let serial = TOKEN_SERIAL.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}", Utc::now().timestamp_millis(), serial)
}

impl ProfileDocument {
    /// Append an empty semester row; the display ordinal is len + 1.
    pub fn push_semester(&mut self) -> SemesterRecord {
        let record = SemesterRecord {
            id: new_semester_token(),
            number: self.semesters.len() as u32 + 1,
            sgpa: String::new(),
            credits: String::new(),
        };
        self.semesters.push(record.clone());
        record
    }

    /// Remove the semester with the given id, if present.
    pub fn remove_semester(&mut self, id: &str) -> bool {
        let before = self.semesters.len();
        self.semesters.retain(|s| s.id != id);
        self.semesters.len() != before
    }

    /// Update one row's SGPA by id.
    pub fn set_semester_sgpa(&mut self, id: &str, sgpa: impl Into<String>) -> bool {
        match self.semesters.iter_mut().find(|s| s.id == id) {
            Some(row) => {
                row.sgpa = sgpa.into();
                true
            }
            None => false,
        }
    }

    /// Update one row's credits by id.
    pub fn set_semester_credits(&mut self, id: &str, credits: impl Into<String>) -> bool {
        match self.semesters.iter_mut().find(|s| s.id == id) {
            Some(row) => {
                row.credits = credits.into();
                true
            }
            None => false,
        }
    }
}
