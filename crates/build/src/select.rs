//! File selection with gitignore-style include/exclude rules.
//!
//! A candidate path is tested against the rules in order; the last matching
//! rule's polarity wins, unmatched paths default to included, and an
//! excluded directory prunes its whole subtree (children are never tested
//! independently).

use std::path::{Path, PathBuf};

use {
    globset::GlobBuilder,
    ignore::gitignore::{Gitignore, GitignoreBuilder},
    walkdir::WalkDir,
};

use crate::error::BuildError;

/// Name of the per-skill selection rule file.
pub const RULES_FILE: &str = ".skillignore";

/// Rules applied before the skill's own, so build output and VCS metadata
/// never end up in an artifact.
pub const DEFAULT_RULES: &[&str] = &[".git/", "dist/", ".previews/"];

/// Load selection rules for a skill root: built-in defaults followed by the
/// skill's `.skillignore`, one pattern per line, comments and blanks skipped.
pub fn load_rules(root: &Path) -> Vec<String> {
    let mut rules: Vec<String> = DEFAULT_RULES.iter().map(ToString::to_string).collect();
    if let Ok(content) = std::fs::read_to_string(root.join(RULES_FILE)) {
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            rules.push(line.to_string());
        }
    }
    rules
}

/// Select the files under `root` that belong in the package.
///
/// Deterministic: identical directory contents and rules yield an identical
/// ordered (path-sorted) list of root-relative paths.
pub fn select(root: &Path, rules: &[String]) -> Result<Vec<PathBuf>, BuildError> {
    // Compile every rule up front so a malformed pattern fails before any
    // filesystem scan starts.
    let matcher = compile_rules(root, rules)?;

    let root_owned = root.to_path_buf();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        // Returning false for a directory skips its whole subtree, which is
        // exactly the parent-prune invariant.
        .filter_entry(move |entry| {
            let Ok(rel) = entry.path().strip_prefix(&root_owned) else {
                return true;
            };
            !matcher.matched(rel, entry.file_type().is_dir()).is_ignore()
        });

    let mut selected = Vec::new();
    for entry in walker {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(rel) = entry.path().strip_prefix(root) {
            selected.push(rel.to_path_buf());
        }
    }

    selected.sort();
    Ok(selected)
}

fn compile_rules(root: &Path, rules: &[String]) -> Result<Gitignore, BuildError> {
    let mut builder = GitignoreBuilder::new(root);
    for rule in rules {
        check_pattern(rule)?;
        builder
            .add_line(None, rule)
            .map_err(|e| BuildError::InvalidPattern {
                pattern: rule.clone(),
                reason: e.to_string(),
            })?;
    }
    builder
        .build()
        .map_err(|e| BuildError::Other(anyhow::anyhow!(e)))
}

/// `GitignoreBuilder` is lenient about malformed globs (an unterminated
/// character class is matched literally), so every rule's glob body is
/// compiled strictly up front. The `!` negation prefix and the trailing
/// `/` directory marker are gitignore syntax, not part of the glob.
fn check_pattern(rule: &str) -> Result<(), BuildError> {
    let glob = rule.strip_prefix('!').unwrap_or(rule);
    let glob = glob.strip_suffix('/').unwrap_or(glob);
    if glob.is_empty() {
        return Ok(());
    }
    GlobBuilder::new(glob)
        .literal_separator(true)
        .build()
        .map(|_| ())
        .map_err(|e| BuildError::InvalidPattern {
            pattern: rule.to_string(),
            reason: e.kind().to_string(),
        })
}
