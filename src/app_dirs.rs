use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// State directory under `$HOME/.local/state/sweepbench`, falling
    /// back to the platform-specific local data directory.
    fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("sweepbench"),
            )
        } else {
            ProjectDirs::from("", "", "sweepbench")
                .map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    /// The persisted cumulative-stats slot.
    pub fn stats_path() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("stats.json"))
    }

    /// Per-answer history database.
    pub fn answers_db_path() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("answers.db"))
    }

    /// Shared leaderboard database (override with `--leaderboard-db`).
    pub fn leaderboard_db_path() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("leaderboard.db"))
    }

    /// Session results log.
    pub fn results_log_path() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("results.csv"))
    }
}
