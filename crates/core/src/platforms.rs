//! Fixed table of known learning platforms and their display badges.

/// Display metadata for a known platform: brand emoji, accent color, and
/// background tint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformBadge {
    pub name: &'static str,
    pub emoji: &'static str,
    pub color: &'static str,
    pub bg: &'static str,
}

/// Known platforms in declaration order. Lookup is a case-insensitive
/// substring match and the first declared key wins, so a name containing
/// several brand substrings resolves deterministically.
pub const PLATFORM_BADGES: [PlatformBadge; 15] = [
    PlatformBadge { name: "AWS", emoji: "☁️", color: "#FF9900", bg: "#FFF3E0" },
    PlatformBadge { name: "Google", emoji: "🔍", color: "#4285F4", bg: "#E3F2FD" },
    PlatformBadge { name: "Microsoft", emoji: "🪟", color: "#00A4EF", bg: "#E1F5FE" },
    PlatformBadge { name: "Coursera", emoji: "📘", color: "#0056D2", bg: "#E3F2FD" },
    PlatformBadge { name: "Udemy", emoji: "🎓", color: "#A435F0", bg: "#F3E5F5" },
    PlatformBadge { name: "edX", emoji: "📚", color: "#02262B", bg: "#E0F2F1" },
    PlatformBadge { name: "LinkedIn", emoji: "💼", color: "#0A66C2", bg: "#E3F2FD" },
    PlatformBadge { name: "Meta", emoji: "👥", color: "#0668E1", bg: "#E3F2FD" },
    PlatformBadge { name: "IBM", emoji: "💻", color: "#0F62FE", bg: "#E3F2FD" },
    PlatformBadge { name: "Oracle", emoji: "🔴", color: "#F80000", bg: "#FFEBEE" },
    PlatformBadge { name: "Cisco", emoji: "🌐", color: "#049FD9", bg: "#E1F5FE" },
    PlatformBadge { name: "CompTIA", emoji: "🔒", color: "#C8102E", bg: "#FFEBEE" },
    PlatformBadge { name: "NPTEL", emoji: "🇮🇳", color: "#FF6B35", bg: "#FFF3E0" },
    PlatformBadge { name: "Udacity", emoji: "🚀", color: "#02B3E4", bg: "#E1F5FE" },
    PlatformBadge { name: "Pluralsight", emoji: "📊", color: "#F15B2A", bg: "#FFF3E0" },
];

/// Fallback badge for unknown or absent platform names.
pub const DEFAULT_BADGE: PlatformBadge = PlatformBadge {
    name: "Default",
    emoji: "🏆",
    color: "#2563eb",
    bg: "#dbeafe",
};

/// Resolve a platform name to its badge; falls back to [`DEFAULT_BADGE`].
pub fn platform_badge(name: Option<&str>) -> &'static PlatformBadge {
    let Some(name) = name else {
        return &DEFAULT_BADGE;
    };
    let lowered = name.to_lowercase();
    PLATFORM_BADGES
        .iter()
        .find(|badge| lowered.contains(&badge.name.to_lowercase()))
        .unwrap_or(&DEFAULT_BADGE)
}
