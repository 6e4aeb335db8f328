//! Static bio templates and motivational quotes shown on the overview page.

use chrono::{Datelike, NaiveDate};

/// A named bio starting point with `[Placeholder]` slots the user fills in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BioTemplate {
    pub name: &'static str,
    pub template: &'static str,
}

pub const BIO_TEMPLATES: [BioTemplate; 3] = [
    BioTemplate {
        name: "The Student Researcher",
        template: "Passionate [Major] student at [University] with a keen interest in [Field]. \
                   Currently exploring [Research Area] and building expertise in [Skills]. Eager \
                   to contribute to innovative projects and collaborate with like-minded \
                   professionals.",
    },
    BioTemplate {
        name: "The Tech Enthusiast",
        template: "Technology enthusiast pursuing [Degree] in [Major] at [University]. \
                   Specialized in [Tech Stack] with hands-on experience in [Projects]. Always \
                   learning, always building. Expected graduation: [Year].",
    },
    BioTemplate {
        name: "The Creative Professional",
        template: "[Degree] candidate at [University] combining creativity with technical \
                   skills. Experienced in [Skills] and passionate about [Interest]. Looking to \
                   leverage my background in [Field] to create impactful solutions.",
    },
];

pub const MOTIVATIONAL_QUOTES: [&str; 10] = [
    "The only way to do great work is to love what you do.",
    "Believe you can and you're halfway there.",
    "Your education is a dress rehearsal for a life that is yours to lead.",
    "Success is not final, failure is not fatal: it is the courage to continue that counts.",
    "Push yourself, because no one else is going to do it for you.",
    "Small steps every day lead to big results.",
    "Don't stop when you're tired. Stop when you're done.",
    "Hard work beats talent when talent doesn't work hard.",
    "You are capable of more than you know.",
    "Turn your obstacles into opportunities.",
];

/// Deterministic quote pick for a given date.
pub fn quote_of_day(date: NaiveDate) -> &'static str {
    MOTIVATIONAL_QUOTES[date.ordinal() as usize % MOTIVATIONAL_QUOTES.len()]
}
