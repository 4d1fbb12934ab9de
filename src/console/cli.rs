//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Terminal client for a document question-answering backend.
#[derive(Debug, Parser)]
#[command(name = "ragdesk", version)]
#[command(about = "Upload documents, build the knowledge base and chat with it", long_about = None)]
pub struct Cli {
    /// Backend base URL (overrides RAGDESK_BASE_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Action to run
    #[command(subcommand)]
    pub command: Command,
}

/// Sub-commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive chat over stdin
    Chat,
    /// Upload one or more PDF files in a single request
    Upload {
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Generate the vector database from the uploaded documents
    Index,
    /// List uploaded documents
    List,
    /// Download an uploaded document
    Download {
        /// Document name as listed
        name: String,
        /// Destination directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_upload_with_global_url() {
        let cli = Cli::try_parse_from([
            "ragdesk",
            "upload",
            "a.pdf",
            "b.pdf",
            "--base-url",
            "http://kb:8002",
        ])
        .unwrap();
        assert_eq!(cli.base_url.as_deref(), Some("http://kb:8002"));
        match cli.command {
            Command::Upload { files } => assert_eq!(files.len(), 2),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_upload_requires_files() {
        assert!(Cli::try_parse_from(["ragdesk", "upload"]).is_err());
    }

    #[test]
    fn test_download_defaults_to_current_dir() {
        let cli = Cli::try_parse_from(["ragdesk", "download", "a.pdf"]).unwrap();
        match cli.command {
            Command::Download { name, out } => {
                assert_eq!(name, "a.pdf");
                assert_eq!(out, PathBuf::from("."));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
