//! Upload panel controller.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::{error, info, warn};

use super::listing::{DocumentTable, SelectionEntry, selection_entries};
use crate::api::{AdminApi, ClientError, ErrorKind, IndexReport, ProgressFn, SelectedFile};

/// Alert shown when uploading with nothing selected.
pub const NO_SELECTION_ALERT: &str = "Please select a file to upload.";
/// Alert shown when the backend rejects an upload.
pub const UPLOAD_FAILED_ALERT: &str = "Failed to upload PDF.";
/// Alert shown when an upload cannot reach the backend.
pub const UPLOAD_NETWORK_ALERT: &str = "Upload failed due to network error.";
/// Alert shown when index generation fails.
pub const INDEX_FAILED_ALERT: &str = "Failed to generate vector database.";
/// Alert shown when the document list cannot be loaded.
pub const LISTING_FAILED_ALERT: &str = "Failed to load uploaded PDFs.";

/// Progress area of the panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgressTarget {
    /// Upload progress bar.
    Upload,
    /// Index generation spinner.
    Index,
}

/// What a progress area currently shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProgressState {
    /// Spinner without a known fraction.
    Indeterminate {
        /// Text next to the spinner.
        label: &'static str,
    },
    /// Known completion percentage.
    Percent {
        /// Text before the percentage.
        label: &'static str,
        /// Rounded percentage.
        percent: u8,
    },
}

impl ProgressState {
    /// Text displayed for this state.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::Indeterminate { label } => (*label).to_string(),
            Self::Percent { label, percent } => format!("{label} ({percent}%)"),
        }
    }
}

const UPLOADING_LABEL: &str = "Uploading...";
const GENERATING_LABEL: &str = "Generating vector DB...";

/// Rendering surface of the admin panel.
pub trait AdminView: Send + Sync {
    /// Show the selected files (or the placeholder).
    fn render_selection(&self, entries: &[SelectionEntry]);
    /// Show or update a progress area.
    fn show_progress(&self, target: ProgressTarget, state: &ProgressState);
    /// Hide a progress area.
    fn hide_progress(&self, target: ProgressTarget);
    /// Blocking notice to the operator.
    fn alert(&self, message: &str);
    /// Show one tag per document used for the index.
    fn render_used_documents(&self, names: &[String]);
    /// Remove the used-document tags.
    fn clear_used_documents(&self);
    /// Show the document table.
    fn render_table(&self, table: &DocumentTable);
}

/// Marks one action as running; a second start is refused until the guard drops.
#[derive(Debug, Default)]
struct InFlight(AtomicBool);

impl InFlight {
    fn try_begin(&self) -> Option<InFlightGuard<'_>> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(&self.0))
    }
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives file selection, upload, index generation and the document listing.
pub struct UploadPanel<A, V> {
    api: Arc<A>,
    view: Arc<V>,
    selection: Mutex<Vec<SelectedFile>>,
    uploading: InFlight,
    indexing: InFlight,
}

impl<A, V> UploadPanel<A, V>
where
    A: AdminApi,
    V: AdminView + 'static,
{
    /// Create a panel with an empty selection.
    #[must_use]
    pub fn new(api: Arc<A>, view: Arc<V>) -> Self {
        Self {
            api,
            view,
            selection: Mutex::new(Vec::new()),
            uploading: InFlight::default(),
            indexing: InFlight::default(),
        }
    }

    /// Render the empty selection and load the document listing.
    pub async fn initialize(&self) {
        self.view.render_selection(&selection_entries(&[]));
        // Failures are already reported to the operator.
        let _ = self.refresh_listing().await;
    }

    /// Replace the selection and render its entries.
    pub fn select_files(&self, files: Vec<SelectedFile>) {
        self.view.render_selection(&selection_entries(&files));
        *self.selection.lock() = files;
    }

    /// Names of the selected files.
    #[must_use]
    pub fn selected_names(&self) -> Vec<String> {
        self.selection.lock().iter().map(|f| f.name.clone()).collect()
    }

    /// Upload the selection in one request.
    ///
    /// # Errors
    /// Returns the validation, guard, server or transport error that stopped the upload.
    pub async fn upload(&self) -> Result<String, ClientError> {
        let files = self.selection.lock().clone();
        if files.is_empty() {
            self.view.alert(NO_SELECTION_ALERT);
            return Err(ClientError::Validation("no file selected".to_string()));
        }

        let Some(_guard) = self.uploading.try_begin() else {
            warn!("Upload requested while another upload is running");
            let err = ClientError::Busy("upload");
            self.view.alert(&err.to_string());
            return Err(err);
        };

        self.view.show_progress(
            ProgressTarget::Upload,
            &ProgressState::Indeterminate {
                label: UPLOADING_LABEL,
            },
        );

        let view = Arc::clone(&self.view);
        let progress: ProgressFn = Arc::new(move |p| {
            if let Some(percent) = p.percent() {
                view.show_progress(
                    ProgressTarget::Upload,
                    &ProgressState::Percent {
                        label: UPLOADING_LABEL,
                        percent,
                    },
                );
            }
        });

        let result = self.api.upload(&files, progress).await;
        self.view.hide_progress(ProgressTarget::Upload);

        match result {
            Ok(response) => {
                info!("Uploaded {} file(s)", files.len());
                self.view.alert(&response.message);
                self.select_files(Vec::new());
                let _ = self.refresh_listing().await;
                Ok(response.message)
            }
            Err(e) => {
                warn!("Upload failed: {e}");
                let alert = if e.kind() == ErrorKind::Transport {
                    UPLOAD_NETWORK_ALERT
                } else {
                    UPLOAD_FAILED_ALERT
                };
                self.view.alert(alert);
                Err(e)
            }
        }
    }

    /// Ask the backend to (re)build its search index, then refresh the listing.
    ///
    /// # Errors
    /// Returns the guard, server or transport error that stopped the generation.
    pub async fn trigger_index_generation(&self) -> Result<IndexReport, ClientError> {
        let Some(_guard) = self.indexing.try_begin() else {
            warn!("Index generation requested while one is running");
            let err = ClientError::Busy("index generation");
            self.view.alert(&err.to_string());
            return Err(err);
        };

        self.view.show_progress(
            ProgressTarget::Index,
            &ProgressState::Indeterminate {
                label: GENERATING_LABEL,
            },
        );
        self.view.clear_used_documents();

        let result = self.api.generate_index().await;
        self.view.hide_progress(ProgressTarget::Index);

        match result {
            Ok(report) => {
                info!("Index generated: {}", report.message);
                self.view.alert(&report.message);
                if let Some(used) = report.pdfs_used.as_deref().filter(|u| !u.is_empty()) {
                    self.view.render_used_documents(used);
                }
                let _ = self.refresh_listing().await;
                Ok(report)
            }
            Err(e) => {
                warn!("Index generation failed: {e}");
                self.view.alert(INDEX_FAILED_ALERT);
                let _ = self.refresh_listing().await;
                Err(e)
            }
        }
    }

    /// Fetch the document names and render the table.
    ///
    /// # Errors
    /// Returns the error that prevented loading the listing.
    pub async fn refresh_listing(&self) -> Result<DocumentTable, ClientError> {
        match self.api.list_documents().await {
            Ok(names) => {
                let table = DocumentTable::from_names(&names);
                self.view.render_table(&table);
                Ok(table)
            }
            Err(e) => {
                error!("Failed to load document list: {e}");
                self.view.alert(LISTING_FAILED_ALERT);
                Err(e)
            }
        }
    }

    /// Download document `name` into `dest_dir`, returning the written path.
    ///
    /// # Errors
    /// Returns an error if the name is not a plain file name, the request fails or the file
    /// cannot be written.
    pub async fn download(&self, name: &str, dest_dir: &Path) -> Result<PathBuf, ClientError> {
        let file_name = Path::new(name)
            .file_name()
            .filter(|f| f.to_string_lossy() == name)
            .ok_or_else(|| ClientError::Validation(format!("invalid document name: {name}")))?;

        let bytes = self.api.download(name).await?;
        let path = dest_dir.join(file_name);
        tokio::fs::write(&path, &bytes).await?;
        info!("Downloaded {name} ({} bytes) to {}", bytes.len(), path.display());
        Ok(path)
    }
}
