//! Display models of the admin panel: file selection and the document table.

use crate::api::SelectedFile;
use crate::api::client::DOWNLOAD_PATH;

/// Placeholder shown when no file is selected.
pub const NO_SELECTION_LABEL: &str = "No file selected";
/// Row shown when the backend holds no documents.
pub const NO_DOCUMENTS_LABEL: &str = "No PDFs uploaded";
/// Text of each download link.
pub const DOWNLOAD_LABEL: &str = "Download";
/// Heading above the tags of documents used for the index.
pub const USED_DOCUMENTS_HEADING: &str = "PDFs used for vector DB:";

/// One entry of the selected-files list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectionEntry {
    /// Nothing selected.
    Placeholder,
    /// A selected file name.
    File(String),
}

impl SelectionEntry {
    /// Text of the entry.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Placeholder => NO_SELECTION_LABEL,
            Self::File(name) => name,
        }
    }
}

/// Entries for a selection: one per file in the given order, or the single placeholder.
#[must_use]
pub fn selection_entries(files: &[SelectedFile]) -> Vec<SelectionEntry> {
    if files.is_empty() {
        return vec![SelectionEntry::Placeholder];
    }
    files
        .iter()
        .map(|f| SelectionEntry::File(f.name.clone()))
        .collect()
}

/// One row of the document table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentRow {
    /// Document name.
    pub name: String,
    /// Relative download link carrying the name as a query parameter.
    pub download_url: String,
}

impl DocumentRow {
    /// Row for document `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let download_url = download_link(&name);
        Self { name, download_url }
    }
}

/// The two-column document table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DocumentTable {
    /// Single "no documents" row.
    Empty,
    /// One row per document, in server order.
    Rows(Vec<DocumentRow>),
}

impl DocumentTable {
    /// Build the table from the names returned by the backend.
    #[must_use]
    pub fn from_names(names: &[String]) -> Self {
        if names.is_empty() {
            return Self::Empty;
        }
        Self::Rows(names.iter().map(DocumentRow::new).collect())
    }

    /// Rows of the table (empty for [`Self::Empty`]).
    #[must_use]
    pub fn rows(&self) -> &[DocumentRow] {
        match self {
            Self::Empty => &[],
            Self::Rows(rows) => rows,
        }
    }
}

/// Relative download link of a document.
#[must_use]
pub fn download_link(name: &str) -> String {
    format!("{DOWNLOAD_PATH}?filename={}", urlencoding::encode(name))
}
