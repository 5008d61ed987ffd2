//! Template name to file path resolution.
//!
//! # Resolution
//!
//! A template name such as `"posts/show"` is resolved against a root
//! directory by trying each registered extension in priority order:
//!
//! | Priority | Extension |
//! |----------|-----------|
//! | 1 (highest) | `.html` |
//! | 2 | `.jinja` |
//! | 3 (lowest) | `.j2` |
//!
//! A name that already ends in one of the extensions is tried as-is first.
//! A candidate only counts if it is a regular file that can be opened for
//! reading. Names that try to escape the root (`..`, absolute paths) never
//! resolve.

use std::fs::File;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

/// Recognized template file extensions in priority order.
pub const TEMPLATE_EXTENSIONS: &[&str] = &[".html", ".jinja", ".j2"];

/// Maps template names to readable files.
pub trait TemplateResolver: Send + Sync {
    /// Returns the path of the template called `name`, or `None` if it does
    /// not exist or cannot be read.
    fn resolve(&self, name: &str) -> Option<PathBuf>;
}

/// Closures can act as resolvers, which keeps tests free of directories.
impl<F> TemplateResolver for F
where
    F: Fn(&str) -> Option<PathBuf> + Send + Sync,
{
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        (self)(name)
    }
}

/// Resolves templates inside a single root directory.
#[derive(Debug, Clone)]
pub struct DirectoryResolver {
    root: PathBuf,
    extensions: Vec<String>,
}

impl DirectoryResolver {
    /// Creates a resolver using [`TEMPLATE_EXTENSIONS`].
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: TEMPLATE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Replaces the extension list. Order is priority order.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Candidate paths for `name`, highest priority first.
    pub fn candidates(&self, name: &str) -> Vec<PathBuf> {
        let mut candidates = Vec::with_capacity(self.extensions.len() + 1);
        if self.extensions.iter().any(|ext| name.ends_with(ext.as_str())) {
            candidates.push(self.root.join(name));
        }
        for ext in &self.extensions {
            candidates.push(self.root.join(format!("{}{}", name, ext)));
        }
        candidates
    }
}

impl TemplateResolver for DirectoryResolver {
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        if !is_contained(name) {
            warn!(template = name, "refusing template name outside the template root");
            return None;
        }

        let found = self.candidates(name).into_iter().find(|p| is_readable(p));
        debug!(template = name, path = ?found, "resolved template");
        found
    }
}

fn is_contained(name: &str) -> bool {
    !name.is_empty()
        && Path::new(name)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

fn is_readable(path: &Path) -> bool {
    path.is_file() && File::open(path).is_ok()
}
