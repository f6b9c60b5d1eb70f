//! Database models

use serde::{Deserialize, Serialize};

/// Login credentials for a remote playlist provider
///
/// Immutable once supplied; every remote request URL for a session is
/// built from these three fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    /// Server base URL, e.g. `http://provider.example:8080`
    pub server: String,
}

/// Content classification of a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Live,
    Series,
    Movie,
    Unknown,
}

impl CategoryKind {
    /// Value stored in the `type` column
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Live => "live",
            CategoryKind::Series => "series",
            CategoryKind::Movie => "movie",
            CategoryKind::Unknown => "unknown",
        }
    }

    /// Decode a stored `type` value; unrecognized values degrade to
    /// `Unknown` rather than failing the read.
    pub fn from_db(value: &str) -> Self {
        match value {
            "live" => CategoryKind::Live,
            "series" => CategoryKind::Series,
            "movie" => CategoryKind::Movie,
            _ => CategoryKind::Unknown,
        }
    }
}

/// A single playable entry belonging to exactly one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Storage-assigned identifier; `None` until persisted
    pub id: Option<i64>,
    pub name: String,
    pub logo: Option<String>,
    pub url: String,
}

/// A named group of items sharing one content kind
///
/// The kind is fixed when the category is created from its first entry
/// and never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Storage-assigned identifier; `None` until persisted
    pub id: Option<i64>,
    pub name: String,
    pub kind: CategoryKind,
    pub items: Vec<Item>,
}
