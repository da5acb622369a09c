//! The `collect` command.

use clap::Args;
use tracing::{info, warn};

use crate::cli::args::{parse_name_override, CidInput, OutputArgs};
use crate::cli::Result;
use crate::config::Config;
use crate::model::DirectoryEntry;
use crate::report::{ErrorLog, FailureCode};
use crate::store::DagStore;

/// Build a parent directory referencing the input CIDs as subdirectories.
///
/// Nothing is listed or traversed; the inputs are linked as-is, so this
/// works even when their subtrees are enormous or partially unavailable.
#[derive(Args, Debug, Default)]
pub struct CollectCommand {
    #[command(flatten)]
    pub input: CidInput,

    /// Entry name for a CID, as cid=name. Repeatable; unnamed CIDs use the
    /// CID itself as the entry name.
    #[arg(long = "name", value_name = "CID=NAME", value_parser = parse_name_override)]
    pub names: Vec<(String, String)>,

    #[command(flatten)]
    pub output: OutputArgs,
}

impl CollectCommand {
    pub async fn run(&self, store: &dyn DagStore, config: &Config) -> Result<()> {
        let cids = self.input.resolve().await?;
        let log = ErrorLog::new(&config.error_log);

        let mut entries: Vec<DirectoryEntry> = Vec::with_capacity(cids.len());
        for cid in cids {
            let name = self
                .names
                .iter()
                .find(|(c, _)| *c == cid)
                .map(|(_, n)| n.clone())
                .unwrap_or_else(|| cid.clone());

            if entries.iter().any(|e| e.name == name) {
                warn!(name = %name, cid = %cid, "duplicate entry name, skipping");
                log.record(&cid, &name, FailureCode::DataError, "duplicate entry name")
                    .await?;
                continue;
            }
            entries.push(DirectoryEntry::directory(name, cid));
        }

        let root = store.put_directory(&entries).await?;
        // The inputs already live on the store, so the archive carries just
        // the new parent block.
        let bytes = store.export_archive(&root, std::slice::from_ref(&root)).await?;
        let path = self
            .output
            .write_archive(&format!("collect_{}.car", root), &bytes)
            .await?;
        info!(path = %path.display(), entries = entries.len(), "wrote collect archive");

        println!("{}", root);
        Ok(())
    }
}
