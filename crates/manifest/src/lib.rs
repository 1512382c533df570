//! Skill manifest data model, parsing, and validation.
//!
//! A skill directory declares its identity in a `skill.yaml` (or `skill.yml`
//! / `skill.json`) manifest. Raw manifests are parsed into untyped JSON by
//! [`parse`] and only become typed [`types::SkillManifest`] values through
//! [`validate`], which aggregates every violation instead of stopping at the
//! first one.

pub mod parse;
pub mod types;
pub mod validate;
