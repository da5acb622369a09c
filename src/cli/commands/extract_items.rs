//! The `extract-items` command.

use clap::Args;
use tracing::{info, warn};

use crate::cli::args::{CidInput, OutputArgs};
use crate::cli::Result;
use crate::config::Config;
use crate::export::export_shallow;
use crate::extract::{extract_items, ExtractError};
use crate::model::ContentId;
use crate::report::{ErrorLog, FailureCode};
use crate::store::DagStore;

/// Synthesize per-item directories from files manifests under each root.
#[derive(Args, Debug, Default)]
pub struct ExtractItemsCommand {
    #[command(flatten)]
    pub input: CidInput,

    /// Confirm every entry kind against the store instead of trusting
    /// filename extensions.
    #[arg(long = "check-dirs")]
    pub check_dirs: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

impl ExtractItemsCommand {
    /// Process every input root, printing one CSV row per synthesized item.
    ///
    /// A root that fails outright is logged and skipped; a batch keeps going.
    pub async fn run(&self, store: &dyn DagStore, config: &Config) -> Result<()> {
        let roots = self.input.resolve().await?;
        let log = ErrorLog::new(&config.error_log);

        println!("identifier,cid");
        for root in &roots {
            if let Err(e) = self.process_root(store, config, &log, root).await {
                warn!(root = %root, error = %e, "root skipped");
                let code = match &e {
                    ExtractError::InvalidRoot { .. }
                    | ExtractError::NoManifests { .. }
                    | ExtractError::Manifest(_) => FailureCode::DataError,
                    ExtractError::UnresolvableRoot { .. } | ExtractError::Store(_) => {
                        FailureCode::StoreError
                    }
                };
                log.record(root, "", code, &e.to_string()).await?;
            }
        }
        Ok(())
    }

    async fn process_root(
        &self,
        store: &dyn DagStore,
        config: &Config,
        log: &ErrorLog,
        root: &ContentId,
    ) -> std::result::Result<(), ExtractError> {
        let outcome = extract_items(store, root).await?;

        for failure in &outcome.failures {
            log.record(
                root,
                &failure.identifier,
                FailureCode::DataError,
                &failure.reason,
            )
            .await
            .map_err(ExtractError::Store)?;
        }

        for item in &outcome.items {
            for path in &item.missing {
                log.record(root, path, FailureCode::DataError, "listed item not found")
                    .await
                    .map_err(ExtractError::Store)?;
            }

            let prior = std::slice::from_ref(root);
            let bytes = export_shallow(store, &item.root, prior, self.check_dirs, config.worker_limit)
                .await
                .map_err(|e| match e {
                    crate::export::ExportError::InvalidRoot { cid } => {
                        ExtractError::InvalidRoot { cid }
                    }
                    crate::export::ExportError::Store(source) => ExtractError::Store(source),
                })?;
            let path = self
                .output
                .write_archive(&format!("extract_items_{}.car", item.root), &bytes)
                .await
                .map_err(|e| match e {
                    crate::cli::args::ArgsError::Io(io) => ExtractError::Store(io.into()),
                    other => ExtractError::Store(crate::store::StoreError::Unavailable(
                        other.to_string(),
                    )),
                })?;
            info!(identifier = %item.identifier, path = %path.display(), "wrote item archive");

            println!("{},{}", item.identifier, item.root);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DirectoryEntry;
    use crate::store::MemoryDagStore;

    #[tokio::test]
    async fn test_extract_items_writes_per_item_archives() {
        let store = MemoryDagStore::new();
        let leaf = store.add_file(b"scan");
        let item = store
            .put_directory(&[DirectoryEntry::file("page.jp2", leaf)])
            .await
            .unwrap();
        let manifest = store.add_file(
            br#"<files><file name="itemA/page.jp2" source="original"/></files>"#,
        );
        let meta = store.add_file(b"<metadata/>");
        let root = store
            .put_directory(&[
                DirectoryEntry::file("coll_files.xml", manifest),
                DirectoryEntry::file("coll_meta.xml", meta),
                DirectoryEntry::directory("itemA", item),
            ])
            .await
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            api_url: String::new(),
            worker_limit: 4,
            error_log: dir
                .path()
                .join("errors.log")
                .to_string_lossy()
                .into_owned(),
        };
        let command = ExtractItemsCommand {
            input: CidInput {
                cids: vec![root],
                file: None,
            },
            check_dirs: false,
            output: OutputArgs {
                output_dir: dir.path().to_path_buf(),
            },
        };

        command.run(&store, &config).await.unwrap();

        let mut archives = 0;
        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with("extract_items_") && name.ends_with(".car") {
                archives += 1;
            }
        }
        assert_eq!(archives, 1);
    }

    #[tokio::test]
    async fn test_failing_root_is_logged_not_fatal() {
        let store = MemoryDagStore::new();
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            api_url: String::new(),
            worker_limit: 4,
            error_log: dir
                .path()
                .join("errors.log")
                .to_string_lossy()
                .into_owned(),
        };
        let command = ExtractItemsCommand {
            input: CidInput {
                cids: vec!["absent".to_string()],
                file: None,
            },
            check_dirs: false,
            output: OutputArgs {
                output_dir: dir.path().to_path_buf(),
            },
        };

        command.run(&store, &config).await.unwrap();

        let log = tokio::fs::read_to_string(dir.path().join("errors.log"))
            .await
            .unwrap();
        assert!(log.contains("absent"));
        assert!(log.contains("STORE_ERROR"));
    }
}
