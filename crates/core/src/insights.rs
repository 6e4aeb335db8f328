//! Pure derived views over the mirrored collections.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::achievements::{CertificationEntry, CourseEntry};
use crate::profile::SemesterRecord;

/// Maximum number of groups reported by [`skill_distribution`].
pub const SKILL_DISTRIBUTION_LIMIT: usize = 5;

/// One issuer/platform group in the skill distribution view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillShare {
    pub label: String,
    pub count: usize,
    /// Rounded share of all entries, in whole percent.
    pub percent: u32,
}

fn graded(semester: &SemesterRecord) -> Option<(Decimal, Decimal)> {
    let sgpa = Decimal::from_str(semester.sgpa.trim()).ok()?;
    let credits = Decimal::from_str(semester.credits.trim()).ok()?;
    Some((sgpa, credits))
}

/// Credit-weighted cumulative GPA, formatted to two decimal places.
///
/// Rows missing either field, or with non-numeric values, are excluded from
/// both numerator and denominator. An empty or fully-excluded list yields
/// "0.00".
pub fn cumulative_gpa(semesters: &[SemesterRecord]) -> String {
    let mut total_points = Decimal::ZERO;
    let mut total_credits = Decimal::ZERO;
    for semester in semesters {
        let Some((sgpa, credits)) = graded(semester) else {
            continue;
        };
        total_points += sgpa * credits;
        total_credits += credits;
    }
    if total_credits.is_zero() {
        return "0.00".to_string();
    }
    format!("{:.2}", total_points / total_credits)
}

/// Number of semesters that contribute to the GPA.
pub fn graded_semester_count(semesters: &[SemesterRecord]) -> usize {
    semesters.iter().filter(|s| graded(s).is_some()).count()
}

/// Groups certifications and courses by issuer/platform label ("Other" when
/// absent), sorted descending by count with first-encountered tie order,
/// truncated to the top five.
pub fn skill_distribution(
    certs: &[CertificationEntry],
    courses: &[CourseEntry],
) -> Vec<SkillShare> {
    let mut groups: Vec<(String, usize)> = Vec::new();
    let labels = certs
        .iter()
        .map(|c| c.issuer.as_str())
        .chain(courses.iter().map(|c| c.platform.as_str()));

    let mut total = 0_usize;
    for label in labels {
        total += 1;
        let label = if label.trim().is_empty() { "Other" } else { label };
        match groups.iter_mut().find(|(name, _)| name == label) {
            Some((_, count)) => *count += 1,
            None => groups.push((label.to_string(), 1)),
        }
    }
    if total == 0 {
        return Vec::new();
    }

    // Stable sort keeps first-encountered order for equal counts.
    groups.sort_by(|a, b| b.1.cmp(&a.1));
    groups.truncate(SKILL_DISTRIBUTION_LIMIT);

    groups
        .into_iter()
        .map(|(label, count)| SkillShare {
            percent: ((count as f64 / total as f64) * 100.0).round() as u32,
            label,
            count,
        })
        .collect()
}
