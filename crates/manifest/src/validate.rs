//! Manifest validation engine.
//!
//! Checks a raw manifest value structurally (required fields, primitive
//! types) and semantically (semver, entry-point confinement, unique page
//! titles), collecting every violation so an author sees the complete list
//! in one pass.

use std::{
    collections::HashSet,
    path::{Component, Path},
};

use serde_json::Value;

use crate::types::SkillManifest;

/// A single validation violation.
///
/// `path` is the dotted/bracketed location of the offending field, e.g.
/// `pages[2].title`; an empty path refers to the manifest as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

fn err(path: impl Into<String>, message: impl Into<String>) -> ValidationError {
    ValidationError {
        path: path.into(),
        message: message.into(),
    }
}

// ── Field rules ──────────────────────────────────────────────────────────────

/// Validate a skill name: lowercase ASCII, hyphens, 1-64 chars.
pub fn validate_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !name.starts_with('-')
        && !name.ends_with('-')
        && !name.contains("--")
}

/// Parameter names become attribute-style bindings downstream, so they must
/// be plain identifiers.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {},
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// True when a file reference stays inside the skill root after
/// normalization: relative, and free of `..` / root / prefix components.
pub fn is_confined_path(reference: &str) -> bool {
    if reference.is_empty() {
        return false;
    }
    let path = Path::new(reference);
    path.is_relative()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

// ── Validation ───────────────────────────────────────────────────────────────

/// Validate a raw manifest value into a typed [`SkillManifest`].
///
/// Collects all violations rather than failing fast; no error aborts
/// validation of sibling fields.
pub fn validate(raw: &Value) -> Result<SkillManifest, Vec<ValidationError>> {
    let Some(obj) = raw.as_object() else {
        return Err(vec![err("", "manifest root must be a mapping")]);
    };

    let mut errors = Vec::new();

    match obj.get("name") {
        None => errors.push(err("name", "missing required field")),
        Some(Value::String(name)) => {
            if !validate_name(name) {
                errors.push(err(
                    "name",
                    format!("invalid skill name '{name}': must be 1-64 lowercase alphanumeric/hyphen chars"),
                ));
            }
        },
        Some(_) => errors.push(err("name", "must be a string")),
    }

    match obj.get("version") {
        None => errors.push(err("version", "missing required field")),
        Some(Value::String(version)) => {
            if let Err(e) = semver::Version::parse(version) {
                errors.push(err(
                    "version",
                    format!("'{version}' is not a valid semantic version: {e}"),
                ));
            }
        },
        Some(_) => errors.push(err("version", "must be a string")),
    }

    match obj.get("entryPoint") {
        None => errors.push(err("entryPoint", "missing required field")),
        Some(Value::String(entry)) => {
            if !is_confined_path(entry) {
                errors.push(err(
                    "entryPoint",
                    format!(
                        "path traversal: '{entry}' must be a relative path inside the skill root"
                    ),
                ));
            }
        },
        Some(_) => errors.push(err("entryPoint", "must be a string")),
    }

    if let Some(description) = obj.get("description")
        && !description.is_string()
    {
        errors.push(err("description", "must be a string"));
    }

    validate_parameters(obj.get("parameters"), &mut errors);
    validate_variables(obj.get("variables"), &mut errors);
    validate_pages(obj.get("pages"), obj.get("layout"), &mut errors);

    if !errors.is_empty() {
        return Err(errors);
    }

    // Structure has been verified field-by-field; a deserialization failure
    // here still surfaces as a validation error rather than a panic.
    serde_json::from_value::<SkillManifest>(raw.clone())
        .map_err(|e| vec![err("", format!("manifest does not conform to schema: {e}"))])
}

fn validate_parameters(parameters: Option<&Value>, errors: &mut Vec<ValidationError>) {
    let Some(parameters) = parameters else {
        return;
    };
    let Some(list) = parameters.as_array() else {
        errors.push(err("parameters", "must be a list"));
        return;
    };

    for (idx, param) in list.iter().enumerate() {
        let Some(obj) = param.as_object() else {
            errors.push(err(format!("parameters[{idx}]"), "must be a mapping"));
            continue;
        };
        match obj.get("name") {
            None => errors.push(err(format!("parameters[{idx}].name"), "missing required field")),
            Some(Value::String(name)) => {
                if !is_valid_identifier(name) {
                    errors.push(err(
                        format!("parameters[{idx}].name"),
                        format!("'{name}' is not a valid identifier"),
                    ));
                }
            },
            Some(_) => errors.push(err(format!("parameters[{idx}].name"), "must be a string")),
        }
        if let Some(is_multi) = obj.get("isMulti")
            && !is_multi.is_boolean()
        {
            errors.push(err(format!("parameters[{idx}].isMulti"), "must be a boolean"));
        }
        if let Some(values) = obj.get("constrainedValues")
            && !values
                .as_array()
                .is_some_and(|vs| vs.iter().all(Value::is_string))
        {
            errors.push(err(
                format!("parameters[{idx}].constrainedValues"),
                "must be a list of strings",
            ));
        }
        if let Some(description) = obj.get("description")
            && !description.is_string()
            && !description.is_null()
        {
            errors.push(err(
                format!("parameters[{idx}].description"),
                "must be a string",
            ));
        }
    }
}

fn validate_variables(variables: Option<&Value>, errors: &mut Vec<ValidationError>) {
    let Some(variables) = variables else {
        return;
    };
    let Some(map) = variables.as_object() else {
        errors.push(err("variables", "must be a mapping of string values"));
        return;
    };
    for (key, value) in map {
        if !value.is_string() {
            errors.push(err(format!("variables.{key}"), "must be a string"));
        }
    }
}

fn validate_pages(pages: Option<&Value>, layout: Option<&Value>, errors: &mut Vec<ValidationError>) {
    if pages.is_some() && layout.is_some() {
        errors.push(err(
            "pages",
            "manifest declares both 'pages' and legacy 'layout'; use one shape",
        ));
    }

    let Some(pages) = pages else {
        return;
    };
    let Some(list) = pages.as_array() else {
        errors.push(err("pages", "must be a list of {title, layout} entries"));
        return;
    };

    let mut seen_titles: HashSet<&str> = HashSet::new();
    for (idx, page) in list.iter().enumerate() {
        let Some(obj) = page.as_object() else {
            errors.push(err(format!("pages[{idx}]"), "must be a {title, layout} mapping"));
            continue;
        };
        match obj.get("title") {
            None => errors.push(err(format!("pages[{idx}].title"), "missing required field")),
            Some(Value::String(title)) if title.is_empty() => {
                errors.push(err(format!("pages[{idx}].title"), "must not be empty"));
            },
            Some(Value::String(title)) => {
                if !seen_titles.insert(title) {
                    errors.push(err(
                        format!("pages[{idx}].title"),
                        format!("duplicate page title '{title}'"),
                    ));
                }
            },
            Some(_) => errors.push(err(format!("pages[{idx}].title"), "must be a string")),
        }
        if !obj.contains_key("layout") {
            errors.push(err(format!("pages[{idx}].layout"), "missing required field"));
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn valid_manifest_passes() {
        let raw = json!({
            "name": "sales-report",
            "version": "1.2.3",
            "entryPoint": "main.py",
            "description": "Quarterly sales",
            "parameters": [{"name": "metrics", "isMulti": true}],
            "variables": {"region": "emea"},
            "pages": [
                {"title": "Overview", "layout": {"type": "Grid"}},
                {"title": "Detail", "layout": {"type": "Table"}}
            ]
        });
        let manifest = validate(&raw).unwrap();
        assert_eq!(manifest.name, "sales-report");
        assert_eq!(manifest.pages.len(), 2);
        assert_eq!(manifest.variables["region"], "emea");
    }

    #[test]
    fn aggregates_all_independent_defects() {
        // Three independent defects must produce exactly three errors.
        let raw = json!({
            "name": "Bad Name",
            "version": "not-a-version",
            "entryPoint": "../outside.py"
        });
        let errors = validate(&raw).unwrap_err();
        assert_eq!(errors.len(), 3);
        let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
        assert!(paths.contains(&"name"));
        assert!(paths.contains(&"version"));
        assert!(paths.contains(&"entryPoint"));
    }

    #[test]
    fn entry_point_traversal_is_flagged() {
        let raw = json!({
            "name": "demo",
            "version": "0.1.0",
            "entryPoint": "../outside.py"
        });
        let errors = validate(&raw).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "entryPoint");
        assert!(errors[0].message.contains("path traversal"));
    }

    #[test]
    fn absolute_entry_point_is_flagged() {
        let raw = json!({
            "name": "demo",
            "version": "0.1.0",
            "entryPoint": "/etc/passwd"
        });
        assert!(validate(&raw).is_err());
    }

    #[test]
    fn missing_required_fields_each_count_once() {
        let errors = validate(&json!({})).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().all(|e| e.message.contains("missing")));
    }

    #[test]
    fn duplicate_page_titles_rejected() {
        let raw = json!({
            "name": "demo",
            "version": "0.1.0",
            "entryPoint": "main.py",
            "pages": [
                {"title": "Same", "layout": {}},
                {"title": "Same", "layout": {}}
            ]
        });
        let errors = validate(&raw).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "pages[1].title");
    }

    #[test]
    fn pages_and_legacy_layout_are_mutually_exclusive() {
        let raw = json!({
            "name": "demo",
            "version": "0.1.0",
            "entryPoint": "main.py",
            "layout": {"type": "Document"},
            "pages": [{"title": "A", "layout": {}}]
        });
        let errors = validate(&raw).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("legacy"));
    }

    #[test]
    fn legacy_layout_alone_is_valid() {
        let raw = json!({
            "name": "demo",
            "version": "0.1.0",
            "entryPoint": "main.py",
            "layout": {"type": "Document"}
        });
        let manifest = validate(&raw).unwrap();
        assert!(manifest.layout.is_some());
        assert!(manifest.pages.is_empty());
    }

    #[test]
    fn non_mapping_root_rejected() {
        let errors = validate(&json!(["not", "a", "manifest"])).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].path.is_empty());
    }

    #[test]
    fn bad_parameter_names_rejected() {
        let raw = json!({
            "name": "demo",
            "version": "0.1.0",
            "entryPoint": "main.py",
            "parameters": [{"name": "has space"}, {"name": "ok_name"}]
        });
        let errors = validate(&raw).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "parameters[0].name");
    }

    #[test]
    fn sibling_errors_survive_page_defects() {
        // A broken page entry must not mask the bad version.
        let raw = json!({
            "name": "demo",
            "version": "oops",
            "entryPoint": "main.py",
            "pages": [{"layout": {}}]
        });
        let errors = validate(&raw).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("my-skill"));
        assert!(validate_name("a"));
        assert!(validate_name("skill123"));
        assert!(!validate_name(""));
        assert!(!validate_name("-bad"));
        assert!(!validate_name("bad-"));
        assert!(!validate_name("Bad"));
        assert!(!validate_name("has space"));
        assert!(!validate_name("has--double"));
        assert!(!validate_name(&"a".repeat(65)));
    }

    #[test]
    fn test_is_confined_path() {
        assert!(is_confined_path("main.py"));
        assert!(is_confined_path("src/entry.py"));
        assert!(is_confined_path("./main.py"));
        assert!(!is_confined_path(""));
        assert!(!is_confined_path("../outside.py"));
        assert!(!is_confined_path("src/../../outside.py"));
        assert!(!is_confined_path("/etc/passwd"));
    }

    #[test]
    fn test_is_valid_identifier() {
        assert!(is_valid_identifier("metrics"));
        assert!(is_valid_identifier("_private"));
        assert!(is_valid_identifier("dim2"));
        assert!(!is_valid_identifier("2dim"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("has-hyphen"));
    }
}
