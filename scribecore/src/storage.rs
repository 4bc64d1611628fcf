//! File browser model for open/save dialogs
//!
//! A plain directory listing the app renders itself; no platform dialogs.
//! Entries are sorted directories-first, hidden files skipped, with an
//! optional extension filter for files.

use std::path::{Path, PathBuf};

/// One row in the file list.
#[derive(Clone, Debug)]
pub struct FileEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_directory: bool,
}

pub struct FileBrowser {
    pub current_dir: PathBuf,
    pub entries: Vec<FileEntry>,
    pub selected_index: Option<usize>,
    /// Lowercase extensions shown; empty = show all files.
    filter: Vec<String>,
}

impl FileBrowser {
    pub fn new(dir: PathBuf) -> Self {
        let mut browser = Self {
            current_dir: dir,
            entries: Vec::new(),
            selected_index: None,
            filter: Vec::new(),
        };
        browser.refresh();
        browser
    }

    /// Restrict listed files to the given extensions (lowercase, no dot).
    pub fn with_filter(mut self, extensions: Vec<String>) -> Self {
        self.filter = extensions;
        self.refresh();
        self
    }

    /// Re-read the current directory.
    pub fn refresh(&mut self) {
        self.entries.clear();
        self.selected_index = None;

        if let Some(parent) = self.current_dir.parent() {
            self.entries.push(FileEntry {
                name: "..".into(),
                path: parent.to_path_buf(),
                is_directory: true,
            });
        }

        let mut dirs = Vec::new();
        let mut files = Vec::new();
        if let Ok(read) = std::fs::read_dir(&self.current_dir) {
            for entry in read.flatten() {
                let path = entry.path();
                let name = entry.file_name().to_string_lossy().to_string();
                if name.starts_with('.') {
                    continue;
                }
                if path.is_dir() {
                    dirs.push(FileEntry {
                        name,
                        path,
                        is_directory: true,
                    });
                } else if self.matches_filter(&path) {
                    files.push(FileEntry {
                        name,
                        path,
                        is_directory: false,
                    });
                }
            }
        }
        dirs.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        files.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        self.entries.extend(dirs);
        self.entries.extend(files);
    }

    fn matches_filter(&self, path: &Path) -> bool {
        if self.filter.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.filter.iter().any(|f| f.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }

    pub fn navigate_to(&mut self, dir: PathBuf) {
        self.current_dir = dir;
        self.refresh();
    }

    pub fn selected_entry(&self) -> Option<&FileEntry> {
        self.selected_index.and_then(|i| self.entries.get(i))
    }

    /// Directory a save dialog should write into.
    pub fn save_directory(&self) -> PathBuf {
        self.current_dir.clone()
    }
}

/// Default location for browsing recordings (~/Music, falling back to home).
pub fn default_audio_dir() -> PathBuf {
    if let Some(music) = dirs::audio_dir() {
        if music.is_dir() {
            return music;
        }
    }
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}
