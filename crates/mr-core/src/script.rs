//! Script files read from a group folder

use crate::error::{CoreError, CoreResult};
use std::path::Path;

/// A migration script: its file name and full text, immutable once read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptFile {
    name: String,
    content: String,
}

impl ScriptFile {
    /// Create a script from already-loaded text
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Read `name` from `folder`
    pub fn load(folder: &Path, name: &str) -> CoreResult<Self> {
        let path = folder.join(name);
        let content = std::fs::read_to_string(&path).map_err(|e| CoreError::ScriptRead {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(Self::new(name, content))
    }

    /// File name within the group folder
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full script text
    pub fn content(&self) -> &str {
        &self.content
    }

    /// True when the script holds nothing but whitespace
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}
