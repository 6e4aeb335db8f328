//! Entry submission, two-step deletion, and the autosaved profile editor.

use std::sync::Arc;

use chrono::Utc;
use log::debug;
use serde_json::{json, Value};

use certihub_core::{
    cumulative_gpa, encode_image_data_uri, CertificationDraft, CourseDraft, Month, SemesterRecord,
};

use crate::error::{Result, SyncError};
use crate::gateway::{StoreCollection, StorePath};
use crate::queue::{PROFILE_FIELD_DEBOUNCE, SEMESTER_TABLE_DEBOUNCE};
use crate::session::SessionController;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AchievementKind {
    Certification,
    Course,
}

impl AchievementKind {
    fn collection(&self) -> StoreCollection {
        match self {
            Self::Certification => StoreCollection::Certifications,
            Self::Course => StoreCollection::Courses,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Certification => "certification",
            Self::Course => "course",
        }
    }
}

/// First step of the delete flow. Holding a prompt changes nothing; the
/// remote write only happens after [`DeletionPrompt::confirm`] produces a
/// token and the token is handed to [`AchievementService::delete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionPrompt {
    kind: AchievementKind,
    doc_id: String,
}

impl DeletionPrompt {
    pub fn kind(&self) -> AchievementKind {
        self.kind
    }

    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    pub fn confirm(self) -> ConfirmedDeletion {
        ConfirmedDeletion {
            kind: self.kind,
            doc_id: self.doc_id,
        }
    }

    pub fn dismiss(self) {}
}

/// Proof that the user confirmed a deletion. Only obtainable through
/// [`DeletionPrompt::confirm`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedDeletion {
    kind: AchievementKind,
    doc_id: String,
}

/// Where an entry form is in its lifecycle. A failed submit returns the form
/// to `Open` with its fields intact; only a successful one closes it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormPhase {
    #[default]
    Closed,
    Open,
    Submitting,
}

/// In-progress entry form. Collects raw field input and produces a validated
/// draft on submit; optional fields submit as absent when left blank.
#[derive(Debug, Clone, Default)]
pub struct EntryFormState {
    pub title: String,
    pub issuer: String,
    pub platform: String,
    pub month: Option<Month>,
    pub year: String,
    pub duration: String,
    pub link: String,
    pub skills: String,
    certificate_image: Option<String>,
    phase: FormPhase,
}

impl EntryFormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    /// Open a fresh form, discarding anything a previous use left behind.
    pub fn open(&mut self) {
        *self = Self {
            phase: FormPhase::Open,
            ..Self::default()
        };
    }

    /// Attach an uploaded image, enforcing the size cap before any encoding.
    pub fn attach_image(&mut self, mime: &str, bytes: &[u8]) -> Result<()> {
        self.certificate_image = Some(encode_image_data_uri(mime, bytes)?);
        Ok(())
    }

    pub fn clear_image(&mut self) {
        self.certificate_image = None;
    }

    pub fn has_image(&self) -> bool {
        self.certificate_image.is_some()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn certification_draft(&self) -> Result<CertificationDraft> {
        let Some(month) = self.month else {
            return Err(certihub_core::CoreError::validation("month", "is required").into());
        };
        let draft = CertificationDraft {
            title: self.title.clone(),
            issuer: self.issuer.clone(),
            month,
            year: self.year.clone(),
            link: optional(&self.link),
            certificate_image: self.certificate_image.clone(),
            skills: optional(&self.skills),
        };
        draft.validate()?;
        Ok(draft)
    }

    pub fn course_draft(&self) -> Result<CourseDraft> {
        let draft = CourseDraft {
            title: self.title.clone(),
            platform: self.platform.clone(),
            duration: self.duration.clone(),
            link: optional(&self.link),
            certificate_image: self.certificate_image.clone(),
            skills: optional(&self.skills),
        };
        draft.validate()?;
        Ok(draft)
    }
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Create/delete operations on the two achievement collections. There are no
/// optimistic local inserts: the mirror picks the new row up from the next
/// snapshot, so the service only talks to the gateway.
pub struct AchievementService {
    session: Arc<SessionController>,
}

impl AchievementService {
    pub fn new(session: Arc<SessionController>) -> Self {
        Self { session }
    }

    async fn uid(&self) -> Result<String> {
        self.session
            .current_user()
            .await
            .map(|user| user.uid)
            .ok_or(SyncError::NotAuthenticated)
    }

    pub async fn add_certification(&self, draft: &CertificationDraft) -> Result<String> {
        draft.validate()?;
        let uid = self.uid().await?;
        let fields = stamped(serde_json::to_value(draft)?)?;
        let id = self
            .session
            .gateway()
            .create(StorePath::certifications(&uid), fields)
            .await?;
        debug!("created certification {} for {}", id, uid);
        self.session.notices().success("Certification added!");
        Ok(id)
    }

    pub async fn add_course(&self, draft: &CourseDraft) -> Result<String> {
        draft.validate()?;
        let uid = self.uid().await?;
        let fields = stamped(serde_json::to_value(draft)?)?;
        let id = self
            .session
            .gateway()
            .create(StorePath::courses(&uid), fields)
            .await?;
        debug!("created course {} for {}", id, uid);
        self.session.notices().success("Course added!");
        Ok(id)
    }

    /// Submit an open certification form. A draft that fails validation
    /// leaves the form open and untouched; a gateway failure reopens it with
    /// its fields intact and raises a notice; success closes it.
    pub async fn submit_certification(&self, form: &mut EntryFormState) -> Result<String> {
        let draft = form.certification_draft()?;
        form.phase = FormPhase::Submitting;
        match self.add_certification(&draft).await {
            Ok(id) => {
                form.reset();
                Ok(id)
            }
            Err(err) => {
                form.phase = FormPhase::Open;
                self.session
                    .notices()
                    .alert(format!("Failed to add certification: {}", err));
                Err(err)
            }
        }
    }

    /// Course counterpart of [`submit_certification`](Self::submit_certification).
    pub async fn submit_course(&self, form: &mut EntryFormState) -> Result<String> {
        let draft = form.course_draft()?;
        form.phase = FormPhase::Submitting;
        match self.add_course(&draft).await {
            Ok(id) => {
                form.reset();
                Ok(id)
            }
            Err(err) => {
                form.phase = FormPhase::Open;
                self.session
                    .notices()
                    .alert(format!("Failed to add course: {}", err));
                Err(err)
            }
        }
    }

    /// Start the delete flow for an entry. No remote effect until confirmed.
    pub fn request_deletion(&self, kind: AchievementKind, doc_id: &str) -> DeletionPrompt {
        DeletionPrompt {
            kind,
            doc_id: doc_id.to_string(),
        }
    }

    pub async fn delete(&self, confirmed: ConfirmedDeletion) -> Result<()> {
        let uid = self.uid().await?;
        let path = StorePath::document(&uid, confirmed.kind.collection(), &confirmed.doc_id);
        self.session.gateway().delete(path).await?;
        self.session
            .notices()
            .success(format!("{} deleted", capitalize(confirmed.kind.label())));
        Ok(())
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Add the server-visible creation timestamp to a draft's fields.
fn stamped(fields: Value) -> Result<Value> {
    let Value::Object(mut map) = fields else {
        return Err(SyncError::gateway("internal", "draft did not serialize to an object"));
    };
    map.insert("createdAt".to_string(), json!(Utc::now().to_rfc3339()));
    Ok(Value::Object(map))
}

/// Profile fields that autosave through the debounce queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    FullName,
    College,
    Major,
    Degree,
    GradYear,
    Bio,
    Github,
    Linkedin,
}

impl ProfileField {
    fn key(&self) -> &'static str {
        match self {
            Self::FullName => "fullName",
            Self::College => "college",
            Self::Major => "major",
            Self::Degree => "degree",
            Self::GradYear => "gradYear",
            Self::Bio => "bio",
            Self::Github => "github",
            Self::Linkedin => "linkedin",
        }
    }
}

/// Autosaving profile editor. Field edits and semester-table edits go
/// through the debounce queue; the avatar is written through immediately
/// because uploads are one-shot, not keystroke bursts.
pub struct ProfileEditor {
    session: Arc<SessionController>,
}

impl ProfileEditor {
    pub fn new(session: Arc<SessionController>) -> Self {
        Self { session }
    }

    async fn profile_path(&self) -> Result<StorePath> {
        let user = self
            .session
            .current_user()
            .await
            .ok_or(SyncError::NotAuthenticated)?;
        Ok(StorePath::profile(&user.uid))
    }

    /// Schedule a single-field update; a newer edit to any profile field
    /// within the window replaces this one.
    pub async fn set_field(&self, field: ProfileField, value: impl Into<String>) -> Result<()> {
        let path = self.profile_path().await?;
        let mut fields = self.pending_profile_fields(&path).await;
        fields.insert(field.key().to_string(), json!(value.into()));
        self.session
            .queue()
            .schedule(path, Value::Object(fields), PROFILE_FIELD_DEBOUNCE)
            .await;
        Ok(())
    }

    /// Replace the whole semester table after the longer debounce window.
    /// The stored `gpa` field is the credit-weighted mean of the rows and is
    /// recomputed on every save so it never drifts from the table.
    pub async fn set_semesters(&self, semesters: &[SemesterRecord]) -> Result<()> {
        let path = self.profile_path().await?;
        let mut fields = self.pending_profile_fields(&path).await;
        fields.insert("semesters".to_string(), serde_json::to_value(semesters)?);
        fields.insert("gpa".to_string(), json!(cumulative_gpa(semesters)));
        self.session
            .queue()
            .schedule(path, Value::Object(fields), SEMESTER_TABLE_DEBOUNCE)
            .await;
        Ok(())
    }

    /// Upload a new avatar, size-gated and written through immediately.
    pub async fn set_avatar(&self, mime: &str, bytes: &[u8]) -> Result<()> {
        let uri = encode_image_data_uri(mime, bytes)?;
        let path = self.profile_path().await?;
        self.session
            .gateway()
            .merge_upsert(path, json!({ "avatar": uri }))
            .await?;
        self.session.notices().success("Profile photo updated!");
        Ok(())
    }

    /// Write any pending edit now instead of waiting out its window. Called
    /// when the edit surface is dismissed.
    pub async fn flush(&self) -> Result<()> {
        let path = self.profile_path().await?;
        self.session.queue().flush_now(&path).await
    }

    // Cancel-and-replace is keyed by path, so a field edit landing while a
    // different field's write is still pending must carry the earlier
    // field too or the merge would lose it.
    async fn pending_profile_fields(&self, path: &StorePath) -> serde_json::Map<String, Value> {
        match self.session.queue().pending_fields(path).await {
            Some(Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }
}
