//! Database record types

use rusqlite::Row;

/// Installed mod database record.
///
/// `files` holds the install manifest as JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModRecord {
    pub name: String,
    pub mod_type: String,
    pub track_type: Option<String>,
    pub installed_at: String,
    pub files: String,
}

impl ModRecord {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            name: row.get(0)?,
            mod_type: row.get(1)?,
            track_type: row.get(2)?,
            installed_at: row.get(3)?,
            files: row.get(4)?,
        })
    }
}
