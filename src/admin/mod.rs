//! Admin panel: document selection, upload, index generation and the document table.

pub mod listing;
pub mod panel;

pub use listing::{DocumentRow, DocumentTable, SelectionEntry, download_link, selection_entries};
pub use panel::{AdminView, ProgressState, ProgressTarget, UploadPanel};
