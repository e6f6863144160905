//! Gitignore-style path matching.
//!
//! An [`IgnoreScope`] holds the rules of one directory's ignore file. Scopes
//! are stacked while walking a project: the walker pushes a scope when it
//! enters a directory that has an ignore file and pops it on the way out.
//! Within a scope the last matching rule wins; across scopes the closest
//! scope with an opinion wins.

use std::fs;
use std::ops::{Deref, DerefMut};
use std::path::Path;

use globset::{GlobBuilder, GlobMatcher};
use tracing::{trace, warn};

use crate::core::constants;
use crate::error::ScanError;

/// One parsed ignore pattern.
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    pattern: String,
    anchored: bool,
    dir_only: bool,
    negate: bool,
    matcher: GlobMatcher,
}

impl IgnoreRule {
    /// Parse a single line of an ignore file.
    ///
    /// Returns `None` for blank lines, comments, and patterns that do not
    /// compile.
    pub fn parse(line: &str) -> Option<Self> {
        let mut pattern = line.trim_end();
        if pattern.is_empty() || pattern.starts_with('#') {
            return None;
        }

        let mut negate = false;
        if let Some(rest) = pattern.strip_prefix('!') {
            negate = true;
            pattern = rest;
        } else if let Some(rest) = pattern.strip_prefix('\\') {
            if rest.starts_with('#') || rest.starts_with('!') {
                pattern = rest;
            }
        }

        let mut dir_only = false;
        if let Some(rest) = pattern.strip_suffix('/') {
            dir_only = true;
            pattern = rest;
        }

        let mut anchored = false;
        if let Some(rest) = pattern.strip_prefix('/') {
            anchored = true;
            pattern = rest;
        } else if pattern.contains('/') {
            // A separator anywhere but the end anchors the pattern too.
            anchored = true;
        }

        if pattern.is_empty() {
            return None;
        }

        let matcher = match GlobBuilder::new(pattern)
            .literal_separator(true)
            .backslash_escape(true)
            .build()
        {
            Ok(glob) => glob.compile_matcher(),
            Err(e) => {
                warn!(pattern = %line, error = %e, "skipping invalid ignore pattern");
                return None;
            }
        };

        Some(Self {
            pattern: pattern.to_string(),
            anchored,
            dir_only,
            negate,
            matcher,
        })
    }

    /// Pattern text with markers (`!`, leading and trailing `/`) stripped.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    pub fn is_dir_only(&self) -> bool {
        self.dir_only
    }

    pub fn is_negated(&self) -> bool {
        self.negate
    }

    /// Whether the pattern matches `rel`, a `/`-separated path relative to
    /// the directory holding the ignore file.
    pub fn matches(&self, rel: &str, is_dir: bool) -> bool {
        if self.dir_only && !is_dir {
            return false;
        }
        if self.anchored {
            self.matcher.is_match(rel)
        } else {
            let name = rel.rsplit('/').next().unwrap_or(rel);
            self.matcher.is_match(name)
        }
    }
}

/// The rules of one ignore file, bound to the directory that holds it.
#[derive(Debug, Clone, Default)]
pub struct IgnoreScope {
    /// Directory of the ignore file, relative to the project root.
    /// Empty for the project root itself.
    base: String,
    rules: Vec<IgnoreRule>,
}

impl IgnoreScope {
    /// Build a scope from ignore file contents.
    pub fn parse(base: &str, contents: &str) -> Self {
        Self {
            base: base.trim_matches('/').to_string(),
            rules: contents.lines().filter_map(IgnoreRule::parse).collect(),
        }
    }

    /// Load the ignore file in `dir`, if there is one.
    ///
    /// A missing file is not an error; any other read failure is.
    pub fn load(dir: &Path, base: &str) -> Result<Option<Self>, ScanError> {
        let path = dir.join(constants::IGNORE_FILE);
        match fs::read_to_string(&path) {
            Ok(contents) => {
                let scope = Self::parse(base, &contents);
                trace!(path = %path.display(), rules = scope.rules.len(), "loaded ignore file");
                Ok(Some(scope))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ScanError::Io { path, source }),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn rules(&self) -> &[IgnoreRule] {
        &self.rules
    }

    /// Strip this scope's base from a project-relative path.
    ///
    /// Returns `None` when the path is not below the scope's directory.
    fn relative<'p>(&self, path: &'p str) -> Option<&'p str> {
        if self.base.is_empty() {
            return Some(path);
        }
        path.strip_prefix(self.base.as_str())?.strip_prefix('/')
    }

    /// Verdict of the last rule matching `rel`.
    ///
    /// `Some(true)` ignores, `Some(false)` re-includes, `None` means no rule
    /// in this scope matched.
    pub fn matches(&self, rel: &str, is_dir: bool) -> Option<bool> {
        self.rules
            .iter()
            .rev()
            .find(|rule| rule.matches(rel, is_dir))
            .map(|rule| !rule.negate)
    }
}

/// Stack of scopes mirroring the directories on the current walk path.
///
/// State belongs to a single traversal. Never share one between sibling
/// walks.
#[derive(Debug, Default)]
pub struct IgnoreStack {
    scopes: Vec<IgnoreScope>,
}

impl IgnoreStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Push `scope` (if any) for the duration of the returned guard.
    ///
    /// The scope is popped when the guard drops, including on early return
    /// through `?`.
    pub fn enter(&mut self, scope: Option<IgnoreScope>) -> ScopeGuard<'_> {
        let pushed = scope.is_some();
        if let Some(scope) = scope {
            self.scopes.push(scope);
        }
        ScopeGuard {
            stack: self,
            pushed,
        }
    }

    /// Whether a project-relative path is excluded.
    ///
    /// A path is excluded when it or any of its ancestor directories is.
    pub fn is_ignored(&self, path: &str, is_dir: bool) -> bool {
        let path = path.trim_matches('/');
        if path == constants::PROJECT_MARKER
            || path.starts_with(&format!("{}/", constants::PROJECT_MARKER))
        {
            return true;
        }

        let mut end = 0;
        while let Some(offset) = path[end..].find('/') {
            end += offset;
            if self.verdict(&path[..end], true) {
                return true;
            }
            end += 1;
        }

        self.verdict(path, is_dir)
    }

    fn verdict(&self, path: &str, is_dir: bool) -> bool {
        let mut ignored = false;
        for scope in &self.scopes {
            let Some(rel) = scope.relative(path) else {
                continue;
            };
            if let Some(verdict) = scope.matches(rel, is_dir) {
                ignored = verdict;
            }
        }
        ignored
    }
}

/// Keeps a scope on the stack while alive.
pub struct ScopeGuard<'a> {
    stack: &'a mut IgnoreStack,
    pushed: bool,
}

impl Deref for ScopeGuard<'_> {
    type Target = IgnoreStack;

    fn deref(&self) -> &IgnoreStack {
        self.stack
    }
}

impl DerefMut for ScopeGuard<'_> {
    fn deref_mut(&mut self) -> &mut IgnoreStack {
        self.stack
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        if self.pushed {
            self.stack.scopes.pop();
        }
    }
}
