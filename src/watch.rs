//! Hot reload of corpus files

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::error::{Result, SearchError};
use crate::search::engine::SearchEngine;

/// Watch both corpus files and reload `engine` when either changes.
///
/// The returned watcher must be kept alive for as long as reloading is wanted.
/// A failed reload is logged and the previous indexes keep serving.
pub fn watch_corpora(engine: Arc<SearchEngine>, config: Config) -> Result<RecommendedWatcher> {
    let targets: Vec<PathBuf> = [&config.quran_path, &config.hadith_path]
        .into_iter()
        .map(|p| canonical_target(p))
        .collect();
    let watched = targets.clone();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) if is_corpus_change(&event, &watched) => match engine.reload(&config) {
            Ok(stats) => tracing::info!(?stats, "reloaded corpora after file change"),
            Err(e) => tracing::warn!(error = %e, "corpus reload failed, keeping previous index"),
        },
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "file watch error"),
    })
    .map_err(watch_error)?;

    // Watch parent directories so editors that replace files are still seen
    for dir in watched_dirs(&targets) {
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(watch_error)?;
        tracing::info!(dir = %dir.display(), "watching corpus directory");
    }

    Ok(watcher)
}

/// `path` with its directory canonicalized, so `..` and symlinked directories
/// compare equal to the paths notify reports. The file itself may not exist
/// between an editor's delete and rename.
fn canonical_target(path: &Path) -> PathBuf {
    let (Some(dir), Some(name)) = (path.parent(), path.file_name()) else {
        return path.to_path_buf();
    };
    match dir.canonicalize() {
        Ok(dir) => dir.join(name),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot canonicalize corpus directory");
            path.to_path_buf()
        }
    }
}

fn is_corpus_change(event: &Event, targets: &[PathBuf]) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event.paths.iter().any(|p| targets.contains(p))
}

fn watched_dirs(targets: &[PathBuf]) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = targets
        .iter()
        .filter_map(|t| t.parent().map(Path::to_path_buf))
        .collect();
    dirs.sort();
    dirs.dedup();
    dirs
}

fn watch_error(e: notify::Error) -> SearchError {
    SearchError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
}
