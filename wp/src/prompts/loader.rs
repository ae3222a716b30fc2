//! Prompt Loader
//!
//! Loads prompt templates from an override directory or falls back to the
//! embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use tracing::{debug, info};

use super::embedded;

/// Resolves template source text by name
#[derive(Debug, Clone, Default)]
pub struct PromptLoader {
    override_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader that checks `dir` before the embedded templates
    ///
    /// A directory that does not exist is ignored.
    pub fn new(dir: Option<&Path>) -> Self {
        debug!(?dir, "PromptLoader::new: called");
        let override_dir = dir.filter(|d| d.is_dir()).map(Path::to_path_buf);
        if dir.is_some() && override_dir.is_none() {
            debug!("PromptLoader::new: override directory missing, using embedded prompts");
        }
        Self { override_dir }
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self { override_dir: None }
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. Override: `{dir}/{name}.pmt`
    /// 2. Embedded fallback
    pub fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        if let Some(ref dir) = self.override_dir {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                info!("Using prompt override {}", path.display());
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt override {}: {}", path.display(), e));
            }
            debug!(?path, "PromptLoader::load_template: not found in override directory");
        }

        if let Some(content) = embedded::get_embedded(name) {
            debug!(%name, "PromptLoader::load_template: found in embedded");
            return Ok(content.to_string());
        }

        Err(eyre!("Prompt template not found: {}", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_embedded_fallback() {
        let loader = PromptLoader::embedded_only();
        let system = loader.load_template("system").unwrap();
        assert_eq!(system, embedded::SYSTEM);
    }

    #[test]
    fn test_override_takes_precedence() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("user.pmt"), "Goal: {{fitness_goal}}").unwrap();

        let loader = PromptLoader::new(Some(dir.path()));
        assert_eq!(loader.load_template("user").unwrap(), "Goal: {{fitness_goal}}");
        // Not overridden, still embedded
        assert_eq!(loader.load_template("system").unwrap(), embedded::SYSTEM);
    }

    #[test]
    fn test_missing_override_dir_is_ignored() {
        let loader = PromptLoader::new(Some(Path::new("/definitely/not/a/prompt/dir")));
        assert!(loader.load_template("user").is_ok());
    }

    #[test]
    fn test_unknown_template() {
        let loader = PromptLoader::embedded_only();
        assert!(loader.load_template("nonexistent-template").is_err());
    }
}
