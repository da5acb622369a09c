//! The `merge-roots` command.

use clap::Args;
use tracing::info;

use crate::cli::args::{CidInput, OutputArgs};
use crate::cli::Result;
use crate::config::Config;
use crate::export::export_shallow;
use crate::merge::merge;
use crate::model::MergeRequest;
use crate::report::{ErrorLog, FailureCode};
use crate::store::DagStore;

/// Merge the children of several directory roots into one new directory.
#[derive(Args, Debug, Default)]
pub struct MergeRootsCommand {
    #[command(flatten)]
    pub input: CidInput,

    /// Confirm every entry kind against the store instead of trusting
    /// filename extensions.
    #[arg(long = "check-dirs")]
    pub check_dirs: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

impl MergeRootsCommand {
    pub async fn run(&self, store: &dyn DagStore, config: &Config) -> Result<()> {
        let roots = self.input.resolve().await?;
        let request = MergeRequest::new(roots.clone(), self.check_dirs);
        let outcome = merge(store, &request, config.worker_limit).await?;

        let log = ErrorLog::new(&config.error_log);
        for exclusion in &outcome.excluded {
            log.record(
                &exclusion.cids.join(" "),
                &exclusion.name,
                FailureCode::DataError,
                "conflicting candidates, name excluded from merge",
            )
            .await?;
        }

        let bytes = export_shallow(
            store,
            &outcome.root,
            &roots,
            self.check_dirs,
            config.worker_limit,
        )
        .await?;
        let path = self
            .output
            .write_archive(&format!("merged_root_{}.car", outcome.root), &bytes)
            .await?;
        info!(path = %path.display(), "wrote merge archive");

        println!("{}", outcome.root);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DirectoryEntry;
    use crate::store::MemoryDagStore;

    #[tokio::test]
    async fn test_merge_roots_writes_archive_and_logs_conflicts() {
        let store = MemoryDagStore::new();
        let shared = store.add_file(b"same");
        let a = store
            .put_directory(&[
                DirectoryEntry::file("keep.txt", shared.clone()),
                DirectoryEntry::file("clash.txt", store.add_file(b"one")),
            ])
            .await
            .unwrap();
        let b = store
            .put_directory(&[DirectoryEntry::file("clash.txt", store.add_file(b"two"))])
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
        let command = MergeRootsCommand {
            input: CidInput {
                cids: vec![a, b],
                file: None,
            },
            check_dirs: false,
            output: OutputArgs {
                output_dir: dir.path().to_path_buf(),
            },
        };

        command.run(&store, &config).await.unwrap();

        let mut archives = Vec::new();
        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".car") {
                archives.push(name);
            }
        }
        assert_eq!(archives.len(), 1);
        assert!(archives[0].starts_with("merged_root_"));

        let log = tokio::fs::read_to_string(dir.path().join("errors.log"))
            .await
            .unwrap();
        assert!(log.contains("clash.txt"));
        assert!(log.contains("DATA_ERROR"));
    }
}
