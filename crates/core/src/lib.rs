//! Domain models and pure computations for the Certihub achievement tracker.
//!
//! This crate is storage-agnostic: everything here is either a serde model
//! mirroring a remote document or a pure function over those models. The
//! live-sync machinery lives in `certihub-sync`.

pub mod achievements;
pub mod errors;
pub mod identity;
pub mod insights;
pub mod platforms;
pub mod profile;
pub mod templates;

pub use achievements::{
    encode_image_data_uri, CertificationDraft, CertificationEntry, CourseDraft, CourseEntry,
    Month, MAX_IMAGE_BYTES,
};
pub use errors::{CoreError, Result};
pub use identity::UserIdentity;
pub use insights::{cumulative_gpa, graded_semester_count, skill_distribution, SkillShare};
pub use platforms::{platform_badge, PlatformBadge, DEFAULT_BADGE, PLATFORM_BADGES};
pub use profile::{new_semester_token, ProfileDocument, SemesterRecord, PROFILE_DOC_ID};
