//! Skill build pipeline: file selection, template rendering, packaging,
//! and scaffolding.
//!
//! [`package::package_skill`] drives the full pipeline for one skill root:
//! select the files that belong in the package, validate the manifest,
//! render declared templates, and write a reproducible versioned archive.
//! [`scaffold::init_skill`] bootstraps a new skill from the embedded
//! scaffold so the result packages cleanly with no further edits.

pub mod archive;
pub mod error;
pub mod package;
pub mod scaffold;
pub mod select;
pub mod template;
