//! Ignore policy for notification names
//!
//! Combines several sources, any of which ignores a name:
//! 1. Hidden names (any component starting with `.`, enabled by default)
//! 2. Backup names (final component ending in `~`, enabled by default)
//! 3. Config-based gitignore-style glob patterns
//! 4. An arbitrary caller-supplied predicate
//!
//! Names are matched relative to the watched root, e.g. `src/.main.rs.swp`.

use crate::error::{ObserveError, Result};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path};
use std::sync::Arc;

type Predicate = Arc<dyn Fn(&Path) -> bool + Send + Sync>;

/// Ignore rule set applied before any metadata lookup
#[derive(Clone)]
pub struct IgnorePolicy {
    /// Configuration
    config: IgnoreConfig,

    /// Compiled config patterns (None when no patterns are configured)
    patterns: Option<Gitignore>,

    /// Caller predicate
    predicate: Option<Predicate>,
}

impl IgnorePolicy {
    /// Build a policy from configuration, compiling its glob patterns
    pub fn load(config: IgnoreConfig) -> Result<Self> {
        let patterns = if config.patterns.is_empty() {
            None
        } else {
            let mut builder = GitignoreBuilder::new("");
            for pattern in &config.patterns {
                builder
                    .add_line(None, pattern)
                    .map_err(|source| ObserveError::Pattern {
                        pattern: pattern.clone(),
                        source,
                    })?;
            }
            let compiled = builder.build().map_err(|source| ObserveError::Pattern {
                pattern: config.patterns.join(", "),
                source,
            })?;
            Some(compiled)
        };

        Ok(Self {
            config,
            patterns,
            predicate: None,
        })
    }

    /// Additionally ignore every name for which `predicate` returns true
    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Path) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    /// Check if a root-relative name should be ignored
    pub fn should_ignore(&self, name: &Path) -> bool {
        if self.config.hidden && is_hidden(name) {
            return true;
        }

        if self.config.backup && is_backup(name) {
            return true;
        }

        if let Some(ref patterns) = self.patterns {
            if patterns.matched_path_or_any_parents(name, false).is_ignore() {
                return true;
            }
        }

        if let Some(ref predicate) = self.predicate {
            if predicate(name) {
                return true;
            }
        }

        false
    }

    /// Get number of active ignore sources
    pub fn active_sources(&self) -> usize {
        [
            self.config.hidden,
            self.config.backup,
            self.patterns.is_some(),
            self.predicate.is_some(),
        ]
        .iter()
        .filter(|active| **active)
        .count()
    }

    pub fn config(&self) -> &IgnoreConfig {
        &self.config
    }
}

impl Default for IgnorePolicy {
    fn default() -> Self {
        Self {
            config: IgnoreConfig::default(),
            patterns: None,
            predicate: None,
        }
    }
}

impl fmt::Debug for IgnorePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IgnorePolicy")
            .field("config", &self.config)
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}

/// Editor swap files, dotfiles and anything inside dot-directories
fn is_hidden(name: &Path) -> bool {
    name.components().any(|component| match component {
        Component::Normal(part) => part.to_string_lossy().starts_with('.'),
        _ => false,
    })
}

/// Vim/Emacs backup files
fn is_backup(name: &Path) -> bool {
    name.file_name()
        .map(|file_name| file_name.to_string_lossy().ends_with('~'))
        .unwrap_or(false)
}

/// Ignore configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IgnoreConfig {
    /// Ignore dotfiles (default: true)
    #[serde(default = "default_true")]
    pub hidden: bool,

    /// Ignore `~`-suffixed backup files (default: true)
    #[serde(default = "default_true")]
    pub backup: bool,

    /// Additional gitignore-style patterns
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl Default for IgnoreConfig {
    fn default() -> Self {
        Self {
            hidden: true,
            backup: true,
            patterns: vec![],
        }
    }
}

fn default_true() -> bool {
    true
}
