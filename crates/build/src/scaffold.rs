//! New-skill scaffolding.
//!
//! `init_skill` materializes the embedded scaffold template set into a
//! target directory, substituting the chosen name into the generated
//! manifest. It never overwrites existing work unless forced.

use std::path::Path;

use {
    anyhow::Context,
    include_dir::{Dir, include_dir},
};

use skillpack_manifest::validate::{ValidationError, validate_name};

use crate::{error::BuildError, template};

static SCAFFOLD: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/scaffold");

/// Version stamped into a freshly scaffolded manifest.
pub const SCAFFOLD_VERSION: &str = "0.0.0";

/// Extension marking a scaffold or package file as a template.
pub const TEMPLATE_EXT: &str = "tmpl";

/// Materialize the scaffold into `target`, substituting `name`.
///
/// Fails with [`BuildError::DirectoryNotEmpty`] if `target` contains files
/// and `force` is not set.
pub fn init_skill(target: &Path, name: &str, force: bool) -> Result<(), BuildError> {
    if !validate_name(name) {
        return Err(BuildError::Validation(vec![ValidationError {
            path: "name".into(),
            message: format!(
                "invalid skill name '{name}': must be 1-64 lowercase alphanumeric/hyphen chars"
            ),
        }]));
    }

    if target.is_dir() && !force {
        let mut entries = std::fs::read_dir(target)?;
        if entries.next().is_some() {
            return Err(BuildError::DirectoryNotEmpty {
                path: target.to_path_buf(),
            });
        }
    }
    std::fs::create_dir_all(target)?;

    let mut context = template::TemplateContext::new();
    context.insert("name".to_string(), name.to_string());
    context.insert("version".to_string(), SCAFFOLD_VERSION.to_string());

    for file in SCAFFOLD.files() {
        let rel = file.path();
        if rel.extension().is_some_and(|ext| ext == TEMPLATE_EXT) {
            let source = std::str::from_utf8(file.contents())
                .with_context(|| format!("scaffold file {} is not UTF-8", rel.display()))?;
            let rendered = template::render(source, &context)?;
            std::fs::write(target.join(rel.with_extension("")), rendered)?;
        } else {
            std::fs::write(target.join(rel), file.contents())?;
        }
    }

    tracing::info!(%name, target = %target.display(), "scaffolded new skill");
    Ok(())
}
