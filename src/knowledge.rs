//! Read-only access to the static documentation tree.
//!
//! Layout: `<knowledge_dir>/<category>/<topic>.md`. Lookups only check that
//! entries exist; nothing is indexed or validated beyond that.

use crate::config::ToolConfig;
use crate::error::{NixkilError, Result};
use globset::Glob;
use std::path::{Path, PathBuf};

const TOPIC_EXTENSION: &str = "md";

/// Documentation tree rooted at a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeBase {
    root: PathBuf,
}

impl KnowledgeBase {
    /// Open the tree at `root`, which must be an existing directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(NixkilError::KnowledgeError(format!(
                "knowledge directory '{}' does not exist",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    /// Open the tree named by `knowledge_dir` in the configuration.
    pub fn from_config(config: &ToolConfig) -> Result<Self> {
        match &config.knowledge_dir {
            Some(dir) => Self::open(dir),
            None => Err(NixkilError::KnowledgeError(
                "no knowledge directory configured\n\
                 Fix: set `knowledge_dir` in the config file."
                    .to_string(),
            )),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Category names, sorted.
    pub fn categories(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in read_dir(&self.root)? {
            if entry.path().is_dir()
                && let Some(name) = visible_name(&entry.file_name())
            {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Topic names within `category`, sorted, without the `.md` extension.
    pub fn topics(&self, category: &str) -> Result<Vec<String>> {
        let dir = self.category_dir(category)?;
        let mut names = Vec::new();
        for entry in read_dir(&dir)? {
            let path = entry.path();
            if path.is_file()
                && path.extension().is_some_and(|ext| ext == TOPIC_EXTENSION)
                && let Some(stem) = path.file_stem().and_then(visible_name)
            {
                names.push(stem);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Contents of one topic.
    pub fn read(&self, category: &str, topic: &str) -> Result<String> {
        let dir = self.category_dir(category)?;
        check_name("topic", topic)?;
        let topic = topic.strip_suffix(".md").unwrap_or(topic);
        let path = dir.join(format!("{}.{}", topic, TOPIC_EXTENSION));
        if !path.is_file() {
            return Err(NixkilError::KnowledgeError(format!(
                "no topic '{}' in category '{}'\n\
                 Fix: run `nixkil docs list {}` to see available topics.",
                topic, category, category
            )));
        }
        std::fs::read_to_string(&path).map_err(|e| {
            NixkilError::KnowledgeError(format!("failed to read '{}': {}", path.display(), e))
        })
    }

    /// Entries (`category/topic`) whose relative path matches `pattern`.
    ///
    /// The pattern is matched against both `category/topic` and
    /// `category/topic.md`.
    pub fn find(&self, pattern: &str) -> Result<Vec<String>> {
        let matcher = Glob::new(pattern)
            .map_err(|e| {
                NixkilError::KnowledgeError(format!("invalid pattern '{}': {}", pattern, e))
            })?
            .compile_matcher();

        let mut found = Vec::new();
        for category in self.categories()? {
            for topic in self.topics(&category)? {
                let entry = format!("{}/{}", category, topic);
                let file = format!("{}.{}", entry, TOPIC_EXTENSION);
                if matcher.is_match(&entry) || matcher.is_match(&file) {
                    found.push(entry);
                }
            }
        }
        Ok(found)
    }

    fn category_dir(&self, category: &str) -> Result<PathBuf> {
        check_name("category", category)?;
        let dir = self.root.join(category);
        if !dir.is_dir() {
            return Err(NixkilError::KnowledgeError(format!(
                "no category '{}'\nFix: run `nixkil docs list` to see available categories.",
                category
            )));
        }
        Ok(dir)
    }
}

/// Reject names that could escape the tree.
fn check_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty()
        || name.starts_with('.')
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
    {
        return Err(NixkilError::KnowledgeError(format!(
            "invalid {} name '{}': must be a plain name",
            kind, name
        )));
    }
    Ok(())
}

fn read_dir(dir: &Path) -> Result<Vec<std::fs::DirEntry>> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        NixkilError::KnowledgeError(format!("failed to list '{}': {}", dir.display(), e))
    })?;
    Ok(entries.filter_map(|entry| entry.ok()).collect())
}

fn visible_name(name: &std::ffi::OsStr) -> Option<String> {
    let name = name.to_str()?;
    (!name.starts_with('.')).then(|| name.to_string())
}
