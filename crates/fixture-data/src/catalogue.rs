//! Fixed vocabularies the generator draws from.
//!
//! The board template catalogue is seeded verbatim; the remaining tables feed
//! the stages with plausible names, colours, and file shapes.

use crate::records::FileKind;

/// A column in a catalogue layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Column title.
    pub name: &'static str,
    /// Hex colour.
    pub color: &'static str,
}

/// A catalogue board template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateSpec {
    /// Template name.
    pub name: &'static str,
    /// Short description.
    pub description: &'static str,
    /// Catalogue category.
    pub category: &'static str,
    /// Column layout, left to right.
    pub columns: &'static [ColumnSpec],
}

const fn col(name: &'static str, color: &'static str) -> ColumnSpec {
    ColumnSpec { name, color }
}

/// Columns created for a board that has none yet.
pub const DEFAULT_COLUMNS: &[ColumnSpec] = &[
    col("To Do", "#94a3b8"),
    col("In Progress", "#3b82f6"),
    col("Review", "#f59e0b"),
    col("Done", "#22c55e"),
];

/// Board templates published by the template stage.
pub const BOARD_TEMPLATES: &[TemplateSpec] = &[
    TemplateSpec {
        name: "Basic Kanban",
        description: "Three-column board for simple task tracking",
        category: "general",
        columns: &[
            col("To Do", "#94a3b8"),
            col("Doing", "#3b82f6"),
            col("Done", "#22c55e"),
        ],
    },
    TemplateSpec {
        name: "Software Sprint",
        description: "Sprint board with review and QA stages",
        category: "engineering",
        columns: &[
            col("Backlog", "#64748b"),
            col("Sprint", "#6366f1"),
            col("In Progress", "#3b82f6"),
            col("Code Review", "#f59e0b"),
            col("QA", "#ec4899"),
            col("Done", "#22c55e"),
        ],
    },
    TemplateSpec {
        name: "Bug Triage",
        description: "Route incoming defects from report to fix",
        category: "engineering",
        columns: &[
            col("Reported", "#ef4444"),
            col("Confirmed", "#f97316"),
            col("Fixing", "#3b82f6"),
            col("Verified", "#22c55e"),
        ],
    },
    TemplateSpec {
        name: "Content Calendar",
        description: "Plan, draft, and publish content",
        category: "marketing",
        columns: &[
            col("Ideas", "#a855f7"),
            col("Drafting", "#3b82f6"),
            col("Editing", "#f59e0b"),
            col("Scheduled", "#06b6d4"),
            col("Published", "#22c55e"),
        ],
    },
    TemplateSpec {
        name: "Hiring Pipeline",
        description: "Track candidates through interview stages",
        category: "people",
        columns: &[
            col("Applied", "#64748b"),
            col("Screening", "#3b82f6"),
            col("Interview", "#f59e0b"),
            col("Offer", "#a855f7"),
            col("Hired", "#22c55e"),
        ],
    },
    TemplateSpec {
        name: "Product Roadmap",
        description: "Quarterly roadmap from discovery to launch",
        category: "product",
        columns: &[
            col("Discovery", "#06b6d4"),
            col("Planned", "#6366f1"),
            col("Building", "#3b82f6"),
            col("Launched", "#22c55e"),
        ],
    },
    TemplateSpec {
        name: "Customer Support",
        description: "Queue for incoming support requests",
        category: "support",
        columns: &[
            col("New", "#ef4444"),
            col("Assigned", "#f97316"),
            col("Waiting", "#eab308"),
            col("Resolved", "#22c55e"),
        ],
    },
    TemplateSpec {
        name: "Personal Goals",
        description: "Lightweight board for personal objectives",
        category: "personal",
        columns: &[
            col("Someday", "#94a3b8"),
            col("This Week", "#3b82f6"),
            col("Today", "#f59e0b"),
            col("Achieved", "#22c55e"),
        ],
    },
];

/// Tag labels; the generator appends a suffix once the list is exhausted.
pub const TAG_NAMES: &[&str] = &[
    "bug",
    "feature",
    "urgent",
    "design",
    "backend",
    "frontend",
    "docs",
    "research",
    "blocked",
    "quick-win",
    "security",
    "performance",
    "ux",
    "infra",
    "testing",
];

/// Colours applied to tags in order.
pub const TAG_PALETTE: &[&str] = &[
    "#ef4444", "#f97316", "#eab308", "#22c55e", "#06b6d4", "#3b82f6", "#6366f1", "#a855f7",
    "#ec4899", "#64748b",
];

/// BCP 47 language tags for user preferences.
pub const LANGUAGES: &[&str] = &["en", "en-GB", "fr", "de", "es", "pt-BR", "ja"];

/// IANA time zones for user preferences.
pub const TIMEZONES: &[&str] = &[
    "UTC",
    "Europe/London",
    "Europe/Berlin",
    "America/New_York",
    "America/Los_Angeles",
    "Asia/Tokyo",
    "Australia/Sydney",
];

/// Device descriptions for remembered sessions.
pub const DEVICES: &[&str] = &[
    "Chrome on macOS",
    "Firefox on Linux",
    "Safari on iOS",
    "Edge on Windows",
    "Chrome on Android",
];

/// Space name stems.
pub const SPACE_NAMES: &[&str] = &[
    "Engineering",
    "Marketing",
    "Design",
    "Operations",
    "Sales",
    "Research",
    "Support",
    "Finance",
];

/// A file shape the file stage can generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSpec {
    /// Broad category.
    pub kind: FileKind,
    /// MIME type.
    pub mime_type: &'static str,
    /// File extension without the dot.
    pub extension: &'static str,
}

const fn file(kind: FileKind, mime_type: &'static str, extension: &'static str) -> FileSpec {
    FileSpec {
        kind,
        mime_type,
        extension,
    }
}

/// File shapes drawn by the file stage.
pub const FILE_TYPES: &[FileSpec] = &[
    file(FileKind::Image, "image/png", "png"),
    file(FileKind::Image, "image/jpeg", "jpg"),
    file(FileKind::Video, "video/mp4", "mp4"),
    file(FileKind::Audio, "audio/mpeg", "mp3"),
    file(FileKind::Document, "application/pdf", "pdf"),
    file(FileKind::Document, "text/plain", "txt"),
    file(FileKind::Archive, "application/zip", "zip"),
];
