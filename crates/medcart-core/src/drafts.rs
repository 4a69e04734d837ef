// ── Form drafts ──
//
// Multi-step forms (addresses, pharmacy onboarding) keep their in-progress
// values on disk so an interrupted session can pick up where it left off.
// One JSON file per draft name.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::error::CoreError;
use crate::form::FormValues;

#[derive(Debug, Clone)]
pub struct DraftStore {
    dir: PathBuf,
}

impl DraftStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load a saved draft. `Ok(None)` if nothing was saved.
    pub fn load(&self, name: &str) -> Result<Option<FormValues>, CoreError> {
        let path = self.path(name);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| CoreError::Decode {
                what: format!("draft {name}"),
                message: e.to_string(),
            })
    }

    pub fn save(&self, name: &str, values: &FormValues) -> Result<(), CoreError> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(values).map_err(|e| CoreError::Decode {
            what: format!("draft {name}"),
            message: e.to_string(),
        })?;
        let path = self.path(name);
        fs::write(&path, json)?;
        trace!(path = %path.display(), "saved form draft");
        Ok(())
    }

    pub fn clear(&self, name: &str) -> Result<(), CoreError> {
        match fs::remove_file(self.path(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Draft names are reduced to `[A-Za-z0-9_-]` so they cannot escape `dir`.
    fn path(&self, name: &str) -> PathBuf {
        let file: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}
