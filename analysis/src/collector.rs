use globset::{Glob, GlobMatcher};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Glob was invalid")]
    InvalidGlob(#[from] globset::Error),
}

/// glob pattern for the result files of a policy, i.e., `<prefix>*.csv`
pub fn csv_pattern(prefix: &str) -> String {
    format!("{}*.csv", globset::escape(prefix))
}

pub fn csv_matcher(prefix: &str) -> Result<GlobMatcher, DiscoveryError> {
    Ok(Glob::new(&csv_pattern(prefix))?.compile_matcher())
}

/// Find the most recently modified `<prefix>*.csv` file directly inside `directory`.
///
/// Equal modification times fall back to the greater path. `None` is returned (with a warning)
/// if nothing matches, a missing directory counts as nothing matching.
pub fn latest_csv(prefix: &str, directory: &Path) -> Result<Option<PathBuf>, DiscoveryError> {
    let matcher = csv_matcher(prefix)?;
    let mut builder = WalkBuilder::new(directory);

    // plain listing, result directories are frequently git-ignored
    builder
        .standard_filters(false)
        .follow_links(true)
        .max_depth(Some(1));

    let latest = builder
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(error) => {
                warn!(directory = ?directory, "Failed to list result files: {error}");
                None
            }
        })
        .filter(|entry| entry.depth() == 1)
        .filter(|entry| entry.file_type().map_or(false, |kind| kind.is_file()))
        .filter(|entry| matcher.is_match(entry.file_name()))
        .filter_map(|entry| {
            let modified = entry
                .metadata()
                .map_err(|error| error.to_string())
                .and_then(|metadata| metadata.modified().map_err(|error| error.to_string()));

            match modified {
                Ok(modified) => Some((modified, entry.into_path())),
                Err(error) => {
                    warn!(path = ?entry.path(), "Failed to read modification time: {error}");
                    None
                }
            }
        })
        .max();

    match latest {
        Some((_, path)) => {
            debug!(path = ?path, prefix = prefix, "Selected latest result file");

            Ok(Some(path))
        }
        None => {
            warn!(
                "no CSV files found that match {}",
                directory.join(csv_pattern(prefix)).display()
            );

            Ok(None)
        }
    }
}
