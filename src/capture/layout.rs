use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

/// On-disk home of one measurement run: `<root>/<YYYY-MM-DD>/<app>/<HHMMSS>/`.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionLayout {
    session_dir: PathBuf,
}

impl SessionLayout {
    pub fn new(root: &Path, app_name: &str, at: DateTime<Local>) -> Self {
        let session_dir = root
            .join(at.format("%Y-%m-%d").to_string())
            .join(app_name)
            .join(at.format("%H%M%S").to_string());
        Self { session_dir }
    }

    /// Creates the session and frame directories.
    pub fn create(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.frames_dir())
    }

    pub fn session_dir(&self) -> &Path {
        &self.session_dir
    }

    pub fn video_path(&self) -> PathBuf {
        self.session_dir.join("rec.mp4")
    }

    pub fn frames_dir(&self) -> PathBuf {
        self.session_dir.join("pngs")
    }
}
