//! Package assembly: the build pipeline for one skill root.
//!
//! Stages run strictly in order (`Scanning`, `Validating`, `Rendering`,
//! `Archiving`, `Done`) and any failure surfaces as a typed [`BuildError`]
//! without retry, since a build is a deterministic function of its input.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use skillpack_manifest::{parse, validate, validate::ValidationError};

use crate::{
    archive::{self, ArtifactMetadata},
    error::BuildError,
    scaffold::TEMPLATE_EXT,
    select, template,
};

/// Pipeline stage, used for logging progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    Scanning,
    Validating,
    Rendering,
    Archiving,
    Done,
}

impl std::fmt::Display for BuildStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Scanning => "scanning",
            Self::Validating => "validating",
            Self::Rendering => "rendering",
            Self::Archiving => "archiving",
            Self::Done => "done",
        };
        write!(f, "{name}")
    }
}

/// Options for a single build invocation.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Directory the artifact is written into.
    pub output_dir: PathBuf,
    /// Overwrite an existing artifact of the same name and version.
    pub force: bool,
}

/// The produced archive. Created fresh per build, never mutated after write.
#[derive(Debug, Clone)]
pub struct BuildArtifact {
    pub name: String,
    pub version: String,
    pub path: PathBuf,
    pub file_count: usize,
}

/// Build a skill directory into a distributable `{name}-{version}.tar.gz`.
pub fn package_skill(root: &Path, options: &BuildOptions) -> Result<BuildArtifact, BuildError> {
    tracing::info!(stage = %BuildStage::Scanning, root = %root.display(), "build stage");
    let rules = select::load_rules(root);
    let selected = select::select(root, &rules)?;

    tracing::info!(stage = %BuildStage::Validating, files = selected.len(), "build stage");
    let raw = parse::read_raw(root).map_err(|e| {
        BuildError::Validation(vec![ValidationError {
            path: String::new(),
            message: e.to_string(),
        }])
    })?;
    let manifest = validate::validate(&raw).map_err(BuildError::Validation)?;

    // The entry point must resolve to a file that exists after selection
    // (template outputs count, with their `.tmpl` suffix stripped).
    let entry_point = Path::new(&manifest.entry_point);
    if !selected.iter().any(|rel| output_name(rel) == entry_point) {
        return Err(BuildError::Validation(vec![ValidationError {
            path: "entryPoint".into(),
            message: format!(
                "'{}' does not resolve to a file in the packaged set",
                manifest.entry_point
            ),
        }]));
    }

    tracing::info!(stage = %BuildStage::Rendering, "build stage");
    let context = template::context_from_manifest(&manifest);
    let mut entries = Vec::with_capacity(selected.len());
    let mut seen_outputs = HashSet::new();
    for rel in &selected {
        let source_path = root.join(rel);
        let dest_rel = output_name(rel);
        // A rendered template must not land on the same package path as
        // another selected file.
        if !seen_outputs.insert(dest_rel.clone()) {
            return Err(BuildError::Validation(vec![ValidationError {
                path: String::new(),
                message: format!(
                    "package path '{}' is produced by more than one selected file",
                    dest_rel.display()
                ),
            }]));
        }
        let data = if is_template(rel) {
            let source = std::fs::read_to_string(&source_path)?;
            template::render(&source, &context)?.into_bytes()
        } else {
            std::fs::read(&source_path)?
        };
        entries.push((dest_rel, data));
    }

    tracing::info!(stage = %BuildStage::Archiving, "build stage");
    let artifact_name = format!("{}-{}", manifest.name, manifest.version);
    let dest = options.output_dir.join(format!("{artifact_name}.tar.gz"));
    if dest.exists() && !options.force {
        return Err(BuildError::BuildAborted { path: dest });
    }

    let metadata = ArtifactMetadata {
        name: manifest.name.clone(),
        version: manifest.version.clone(),
        built_at: chrono::Utc::now().to_rfc3339(),
    };
    archive::write_archive(&dest, &artifact_name, &entries, &metadata)?;

    tracing::info!(
        stage = %BuildStage::Done,
        artifact = %dest.display(),
        files = entries.len(),
        "build complete"
    );
    Ok(BuildArtifact {
        name: manifest.name,
        version: manifest.version,
        path: dest,
        file_count: entries.len(),
    })
}

fn is_template(rel: &Path) -> bool {
    rel.extension().is_some_and(|ext| ext == TEMPLATE_EXT)
}

/// Name a selected file takes inside the package.
fn output_name(rel: &Path) -> PathBuf {
    if is_template(rel) {
        rel.with_extension("")
    } else {
        rel.to_path_buf()
    }
}
