use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::loader::{LoadError, load_file};
use super::model::RawTable;

// ---------------------------------------------------------------------------
// Memoized raw load, invalidated only by an explicit reload
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct CacheEntry {
    path: PathBuf,
    generation: u64,
    outcome: Result<Arc<RawTable>, LoadError>,
}

/// Holds the most recent load outcome keyed by (path, generation).
///
/// `reload` bumps the generation so the next `get_or_load` re-reads the file.
#[derive(Debug, Default)]
pub struct LoadCache {
    generation: u64,
    entry: Option<CacheEntry>,
}

impl LoadCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation; increases by one per reload.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Invalidate whatever is cached.
    pub fn reload(&mut self) {
        self.generation += 1;
        self.entry = None;
        log::info!("Load cache invalidated (generation {})", self.generation);
    }

    /// Return the cached outcome for `path` at the current generation, loading
    /// the file on a miss.
    pub fn get_or_load(&mut self, path: &Path) -> Result<Arc<RawTable>, LoadError> {
        self.get_or_load_with(path, load_file)
    }

    fn get_or_load_with(
        &mut self,
        path: &Path,
        load: impl FnOnce(&Path) -> Result<RawTable, LoadError>,
    ) -> Result<Arc<RawTable>, LoadError> {
        if let Some(entry) = &self.entry {
            if entry.path == path && entry.generation == self.generation {
                return entry.outcome.clone();
            }
        }

        log::debug!(
            "Load cache miss for {} (generation {})",
            path.display(),
            self.generation
        );
        let outcome = load(path).map(Arc::new);
        match &outcome {
            Ok(table) => log::info!(
                "Loaded {} rows with columns {:?} from {}",
                table.len(),
                table.columns,
                path.display()
            ),
            Err(e) => log::error!("Failed to load {}: {e}", path.display()),
        }

        self.entry = Some(CacheEntry {
            path: path.to_path_buf(),
            generation: self.generation,
            outcome: outcome.clone(),
        });
        outcome
    }
}
