//! The fixed category table.
//!
//! Categories are a closed set; each carries a display label and a
//! foreground/background color pair used by the grid and the filter bar.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DatebookError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Work,
    Personal,
    Family,
    Health,
    /// Also the landing spot for missing or unrecognised values in old data.
    #[default]
    #[serde(other)]
    Other,
}

/// Presentation metadata for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryInfo {
    pub label: &'static str,
    pub color: &'static str,
    pub bg_color: &'static str,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Work,
        Category::Personal,
        Category::Family,
        Category::Health,
        Category::Other,
    ];

    pub fn info(self) -> CategoryInfo {
        match self {
            Category::Work => CategoryInfo {
                label: "Work",
                color: "#3949ab",
                bg_color: "#e8eaf6",
            },
            Category::Personal => CategoryInfo {
                label: "Personal",
                color: "#00897b",
                bg_color: "#e0f2f1",
            },
            Category::Family => CategoryInfo {
                label: "Family",
                color: "#7b1fa2",
                bg_color: "#f3e5f5",
            },
            Category::Health => CategoryInfo {
                label: "Health",
                color: "#d81b60",
                bg_color: "#fce4ec",
            },
            Category::Other => CategoryInfo {
                label: "Other",
                color: "#5d4037",
                bg_color: "#efebe9",
            },
        }
    }

    /// The key used in the persisted layout and on the command line.
    pub fn key(self) -> &'static str {
        match self {
            Category::Work => "work",
            Category::Personal => "personal",
            Category::Family => "family",
            Category::Health => "health",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.info().label)
    }
}

impl FromStr for Category {
    type Err = DatebookError;

    /// Strict parse for user input. Stored data goes through serde, which is
    /// lenient and maps unknown keys to `Other`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                DatebookError::InvalidEvent(format!(
                    "unknown category '{}' (expected one of: work, personal, family, health, other)",
                    s
                ))
            })
    }
}
