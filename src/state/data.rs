/// Shared data structures for the catalog
///
/// These structs represent the data model that flows between the
/// database layer and the admin surface.
use serde::{Deserialize, Serialize};

/// What a subject is: one of the two parents, or a puppy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Dam,
    Sire,
    Puppy,
}

impl SubjectKind {
    /// Column value stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectKind::Dam => "dam",
            SubjectKind::Sire => "sire",
            SubjectKind::Puppy => "puppy",
        }
    }

    /// Decode a `kind` column value.
    pub fn from_str(s: &str) -> Option<SubjectKind> {
        match s {
            "dam" => Some(SubjectKind::Dam),
            "sire" => Some(SubjectKind::Sire),
            "puppy" => Some(SubjectKind::Puppy),
            _ => None,
        }
    }

    /// Folder names `dam` and `sire` are reserved for the parents.
    pub fn from_folder(folder: &str) -> SubjectKind {
        match folder {
            "dam" => SubjectKind::Dam,
            "sire" => SubjectKind::Sire,
            _ => SubjectKind::Puppy,
        }
    }

    /// The parents carry fixed display names; puppies derive theirs
    /// from the folder name.
    pub fn fixed_display_name(&self) -> Option<&'static str> {
        match self {
            SubjectKind::Dam => Some("Queenie"),
            SubjectKind::Sire => Some("King"),
            SubjectKind::Puppy => None,
        }
    }
}

/// A single catalog subject: a parent dog or a puppy, with its photos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    /// Unique database ID
    pub id: i64,
    /// Display name (e.g. "Queenie", "Gray")
    pub name: String,
    pub kind: SubjectKind,
    /// Ordered photo paths (e.g. "/dogs/gray/image1.jpg"), no duplicates
    pub images: Vec<String>,
    /// Puppies only; never touched by sync
    pub is_sold: bool,
    /// Unix epoch seconds, set at insertion
    pub created_at: i64,
}

/// Aggregated page-view numbers for the admin page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitStats {
    pub total_visits: i64,
    /// Distinct IP addresses seen
    pub unique_visitors: i64,
    /// (page, visit count), most visited first
    pub by_page: Vec<(String, i64)>,
}

/// Encode an image list for the TEXT column (JSON array of strings).
pub fn images_to_json(images: &[String]) -> Result<String, serde_json::Error> {
    serde_json::to_string(images)
}

/// Decode the TEXT column back into a typed list. Every read goes
/// through this immediately; nothing operates on the raw JSON form.
pub fn images_from_json(json: &str) -> Result<Vec<String>, serde_json::Error> {
    serde_json::from_str(json)
}
