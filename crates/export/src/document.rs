//! Portfolio document builder.
//!
//! Produces a renderer-agnostic page model. Layout units are millimetres on
//! an A4 page; a block is placed on the current page unless its reserved
//! height would cross the bottom margin, in which case a new page starts.

use chrono::NaiveDate;
use log::debug;
use serde::Serialize;

use certihub_core::{cumulative_gpa, CertificationEntry, CourseEntry, ProfileDocument, UserIdentity};

const BANNER_TITLE: &str = "CERTIHUB PORTFOLIO";
const BANNER_SUBTITLE: &str = "Growth & Validation Profile";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLayout {
    pub page_height: u32,
    pub margin: u32,
}

impl Default for PageLayout {
    fn default() -> Self {
        // A4 in millimetres.
        Self {
            page_height: 297,
            margin: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Block {
    /// Full-width page header, first page only.
    Banner { title: String, subtitle: String },
    SectionHeading(String),
    /// Two-column label/value table.
    FieldTable(Vec<(String, String)>),
    Paragraph(String),
    Link { label: String, url: String },
    Table {
        header: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// One achievement, optionally with an inline image reference.
    Entry {
        title: String,
        lines: Vec<String>,
        link: Option<(String, String)>,
        image: Option<String>,
    },
}

impl Block {
    /// Reserved vertical space in layout units.
    fn height(&self) -> u32 {
        match self {
            Self::Banner { .. } => 50,
            Self::SectionHeading(_) => 10,
            Self::FieldTable(rows) => rows.len() as u32 * 12 + 15,
            Self::Paragraph(text) => (text.len() as u32 / 90 + 1) * 5 + 10,
            Self::Link { .. } => 6,
            Self::Table { rows, .. } => rows.len() as u32 * 8 + 8 + 15,
            Self::Entry { image, .. } => {
                if image.is_some() {
                    50
                } else {
                    40
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioDocument {
    pub layout: PageLayout,
    pub pages: Vec<Page>,
}

impl PortfolioDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Per-page footer text.
    pub fn footer_line(&self, page_index: usize) -> String {
        format!(
            "Generated from Certihub - Page {} of {}",
            page_index + 1,
            self.page_count()
        )
    }
}

/// Suggested file name for a rendered portfolio.
pub fn export_file_name(profile: &ProfileDocument, date: NaiveDate) -> String {
    let owner = if profile.full_name.trim().is_empty() {
        "Portfolio"
    } else {
        profile.full_name.trim()
    };
    format!("{}_Certihub_{}.pdf", owner, date.format("%Y-%m-%d"))
}

struct Paginator {
    layout: PageLayout,
    pages: Vec<Page>,
    current: Vec<Block>,
    y: u32,
}

impl Paginator {
    fn new(layout: PageLayout) -> Self {
        Self {
            layout,
            pages: Vec::new(),
            current: Vec::new(),
            y: layout.margin,
        }
    }

    /// Start a new page if `required` space would cross the bottom margin.
    fn ensure(&mut self, required: u32) {
        if self.y + required > self.layout.page_height - self.layout.margin && !self.current.is_empty()
        {
            let blocks = std::mem::take(&mut self.current);
            self.pages.push(Page { blocks });
            self.y = self.layout.margin;
        }
    }

    fn push(&mut self, block: Block) {
        self.ensure(block.height());
        self.y += block.height();
        self.current.push(block);
    }

    fn finish(mut self) -> PortfolioDocument {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.pages.push(Page {
                blocks: self.current,
            });
        }
        PortfolioDocument {
            layout: self.layout,
            pages: self.pages,
        }
    }
}

fn or_na(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        "N/A".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Overall GPA shown in the profile table: computed from the semester rows
/// when any exist, otherwise whatever the profile stores.
fn display_gpa(profile: &ProfileDocument) -> String {
    if profile.semesters.is_empty() {
        or_na(&profile.gpa)
    } else {
        cumulative_gpa(&profile.semesters)
    }
}

/// Assemble the paginated portfolio for one user.
pub fn build_portfolio(
    identity: &UserIdentity,
    profile: &ProfileDocument,
    certifications: &[CertificationEntry],
    courses: &[CourseEntry],
    layout: PageLayout,
) -> PortfolioDocument {
    let mut pages = Paginator::new(layout);

    pages.push(Block::Banner {
        title: BANNER_TITLE.to_string(),
        subtitle: BANNER_SUBTITLE.to_string(),
    });

    pages.push(Block::SectionHeading("PROFESSIONAL PROFILE".to_string()));
    let full_name = if profile.full_name.trim().is_empty() {
        identity.display_label().to_string()
    } else {
        profile.full_name.trim().to_string()
    };
    pages.push(Block::FieldTable(vec![
        ("Full Name".to_string(), or_na(&full_name)),
        (
            "Email".to_string(),
            or_na(identity.email.as_deref().unwrap_or_default()),
        ),
        ("Institution".to_string(), or_na(&profile.college)),
        ("Major".to_string(), or_na(&profile.major)),
        ("Degree".to_string(), or_na(&profile.degree)),
        ("Graduation Year".to_string(), or_na(&profile.grad_year)),
        ("CGPA".to_string(), display_gpa(profile)),
    ]));

    if !profile.bio.trim().is_empty() {
        pages.ensure(30);
        pages.push(Block::SectionHeading("ABOUT ME".to_string()));
        pages.push(Block::Paragraph(profile.bio.trim().to_string()));
    }

    if !profile.github.trim().is_empty() || !profile.linkedin.trim().is_empty() {
        pages.ensure(20);
        pages.push(Block::SectionHeading("SOCIAL LINKS".to_string()));
        if !profile.github.trim().is_empty() {
            pages.push(Block::Link {
                label: format!("GitHub: {}", profile.github.trim()),
                url: profile.github.trim().to_string(),
            });
        }
        if !profile.linkedin.trim().is_empty() {
            pages.push(Block::Link {
                label: format!("LinkedIn: {}", profile.linkedin.trim()),
                url: profile.linkedin.trim().to_string(),
            });
        }
    }

    if !profile.semesters.is_empty() {
        pages.ensure(40);
        pages.push(Block::SectionHeading("ACADEMIC RECORDS".to_string()));
        // Display ordinals come from the row position, not the stored number.
        let rows = profile
            .semesters
            .iter()
            .enumerate()
            .map(|(index, semester)| {
                vec![
                    format!("Semester {}", index + 1),
                    or_na(&semester.sgpa),
                    or_na(&semester.credits),
                ]
            })
            .collect();
        pages.push(Block::Table {
            header: vec![
                "Semester".to_string(),
                "SGPA".to_string(),
                "Credits".to_string(),
            ],
            rows,
        });
    }

    if !certifications.is_empty() {
        pages.ensure(40);
        pages.push(Block::SectionHeading("CERTIFICATIONS".to_string()));
        for cert in certifications {
            let mut lines = vec![
                format!("Issuer: {}", or_na(&cert.issuer)),
                format!("Date: {} {}", cert.month.as_str(), cert.year),
            ];
            if let Some(skills) = cert.skills.as_deref().filter(|s| !s.trim().is_empty()) {
                lines.push(format!("Skills: {}", skills));
            }
            pages.push(Block::Entry {
                title: or_untitled(&cert.title),
                lines,
                link: cert
                    .link
                    .as_deref()
                    .map(|url| ("Verify Certificate".to_string(), url.to_string())),
                image: cert.certificate_image.clone(),
            });
        }
    }

    if !courses.is_empty() {
        pages.ensure(40);
        pages.push(Block::SectionHeading("SKILL COURSES".to_string()));
        for course in courses {
            let mut lines = vec![
                format!("Platform: {}", or_na(&course.platform)),
                format!("Duration: {}", or_na(&course.duration)),
            ];
            if let Some(skills) = course.skills.as_deref().filter(|s| !s.trim().is_empty()) {
                lines.push(format!("Skills: {}", skills));
            }
            pages.push(Block::Entry {
                title: or_untitled(&course.title),
                lines,
                link: course
                    .link
                    .as_deref()
                    .map(|url| ("View Course".to_string(), url.to_string())),
                image: course.certificate_image.clone(),
            });
        }
    }

    let document = pages.finish();
    debug!(
        "built portfolio document: {} pages, {} certifications, {} courses",
        document.page_count(),
        certifications.len(),
        courses.len()
    );
    document
}

fn or_untitled(title: &str) -> String {
    if title.trim().is_empty() {
        "Untitled".to_string()
    } else {
        title.trim().to_string()
    }
}
