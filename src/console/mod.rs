//! Terminal front end: wires the controllers to stdout and runs one sub-command.

pub mod cli;
pub mod render;
pub mod repl;

pub use cli::{Cli, Command};
pub use render::TerminalView;

use std::io;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::BufReader;
use tracing::info;

use crate::admin::UploadPanel;
use crate::api::{BackendClient, SelectedFile};
use crate::chat::ChatSession;
use crate::config::ClientConfig;
use crate::ui::clipboard::Osc52Clipboard;

/// Run the sub-command selected on the command line.
///
/// # Errors
/// Returns an error if the client cannot be built or the command fails.
pub async fn dispatch(cli: Cli, config: ClientConfig) -> anyhow::Result<()> {
    info!("Backend: {}", config.base_url);
    let client = Arc::new(BackendClient::new(config.clone()).context("invalid backend configuration")?);
    let view = Arc::new(TerminalView::new(io::stdout())?);

    match cli.command {
        Command::Chat => {
            let clipboard = Arc::new(Osc52Clipboard::new(io::stdout()));
            let session = ChatSession::new(client, view, clipboard, &config)?;
            session.check_knowledge_base().await;
            session.show_notice(repl::HELP);
            repl::run(&session, BufReader::new(tokio::io::stdin())).await?;
        }
        Command::Upload { files } => {
            let panel = UploadPanel::new(client, view);
            let mut selected = Vec::with_capacity(files.len());
            for path in &files {
                let file = SelectedFile::from_path(path)
                    .await
                    .with_context(|| format!("cannot read {}", path.display()))?;
                selected.push(file);
            }
            panel.select_files(selected);
            panel.upload().await?;
        }
        Command::Index => {
            UploadPanel::new(client, view).trigger_index_generation().await?;
        }
        Command::List => {
            UploadPanel::new(client, view).refresh_listing().await?;
        }
        Command::Download { name, out } => {
            let path = UploadPanel::new(client, view).download(&name, &out).await?;
            info!("Saved {}", path.display());
        }
    }

    Ok(())
}
