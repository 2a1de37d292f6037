use crate::app_dirs::AppDirs;
use crate::stats::CumulativeStats;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// The single authoritative local copy of the user's cumulative stats.
/// Writes are synchronous and whole-value (last write wins); two clients
/// on the same slot race with last-write-wins semantics, which is
/// accepted.
pub trait StatsStore {
    /// The persisted stats, or the zeroed instance if nothing is stored
    /// or the stored value cannot be read. Corruption is "absent", never
    /// an error.
    fn load(&self) -> CumulativeStats;

    /// Overwrite the slot with `stats`.
    fn save(&self, stats: &CumulativeStats) -> io::Result<()>;

    /// Put the slot back to all zeroes.
    fn reset(&self) -> io::Result<()> {
        self.save(&CumulativeStats::default())
    }
}

/// JSON file slot under the application state directory.
#[derive(Debug, Clone)]
pub struct FileStatsStore {
    path: PathBuf,
}

impl FileStatsStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::stats_path().unwrap_or_else(|| PathBuf::from("sweepbench_stats.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileStatsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsStore for FileStatsStore {
    fn load(&self) -> CumulativeStats {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(stats) = serde_json::from_slice::<CumulativeStats>(&bytes) {
                // A value whose totals disagree with its matrix is as
                // useless as unparsable JSON; start fresh.
                if stats.is_consistent() {
                    return stats;
                }
            }
        }
        CumulativeStats::default()
    }

    fn save(&self, stats: &CumulativeStats) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(stats).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
