//! Template rendering for entry-point stubs and metadata files.
//!
//! Pure text transformation: `${VAR}` placeholders are replaced from a
//! [`TemplateContext`], and a variable missing from the context is a hard
//! error rather than a silent empty substitution, since that produces
//! subtly broken generated entry points. The caller owns all file I/O.

use std::collections::BTreeMap;

use skillpack_manifest::types::SkillManifest;

use crate::error::BuildError;

/// Variable name → manifest-derived value fed into rendering.
pub type TemplateContext = BTreeMap<String, String>;

/// Build the rendering context for a manifest: the identity fields plus the
/// manifest's own `variables` map (which may override the built-ins).
pub fn context_from_manifest(manifest: &SkillManifest) -> TemplateContext {
    let mut context = TemplateContext::new();
    context.insert("name".to_string(), manifest.name.clone());
    context.insert("version".to_string(), manifest.version.clone());
    context.insert("entry_point".to_string(), manifest.entry_point.clone());
    for (key, value) in &manifest.variables {
        context.insert(key.clone(), value.clone());
    }
    context
}

/// Render a template source against a context.
///
/// Output is UTF-8 with newlines normalized to `\n` so produced artifacts
/// are byte-identical across platforms for identical input.
pub fn render(template: &str, context: &TemplateContext) -> Result<String, BuildError> {
    let source = template.replace("\r\n", "\n");
    let mut result = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            let mut var_name = String::new();
            let mut closed = false;
            for c in chars.by_ref() {
                if c == '}' {
                    closed = true;
                    break;
                }
                var_name.push(c);
            }
            if closed && !var_name.is_empty() {
                match context.get(&var_name) {
                    Some(value) => result.push_str(value),
                    None => return Err(BuildError::MissingVariable { name: var_name }),
                }
            } else {
                // Malformed placeholder, emit literally.
                result.push_str("${");
                result.push_str(&var_name);
                if closed {
                    result.push('}');
                }
            }
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}
