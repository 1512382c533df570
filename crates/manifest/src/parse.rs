use std::path::{Path, PathBuf};

use {
    anyhow::{Context, bail},
    serde_json::Value,
};

/// Manifest file names probed at a skill root, in priority order.
pub const MANIFEST_NAMES: &[&str] = &["skill.yaml", "skill.yml", "skill.json"];

/// Locate the manifest file for a skill directory, if one exists.
pub fn manifest_path(skill_dir: &Path) -> Option<PathBuf> {
    MANIFEST_NAMES
        .iter()
        .map(|name| skill_dir.join(name))
        .find(|path| path.is_file())
}

/// Read a skill's manifest from disk into an untyped JSON value.
///
/// This is the raw side of the pipeline: the result has no schema guarantees
/// and must go through [`crate::validate::validate`] before use.
pub fn read_raw(skill_dir: &Path) -> anyhow::Result<Value> {
    let Some(path) = manifest_path(skill_dir) else {
        bail!(
            "no skill manifest (skill.yaml) found in {}",
            skill_dir.display()
        );
    };
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let json = path.extension().is_some_and(|ext| ext == "json");
    parse_raw(&content, json).with_context(|| format!("invalid manifest {}", path.display()))
}

/// Parse manifest text into an untyped JSON value.
pub fn parse_raw(content: &str, json: bool) -> anyhow::Result<Value> {
    if json {
        serde_json::from_str(content).context("manifest is not valid JSON")
    } else {
        serde_yaml::from_str(content).context("manifest is not valid YAML")
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_yaml_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("skill.yaml"),
            "name: demo\nversion: 1.0.0\nentryPoint: main.py\n",
        )
        .unwrap();

        let raw = read_raw(tmp.path()).unwrap();
        assert_eq!(raw["name"], "demo");
        assert_eq!(raw["entryPoint"], "main.py");
    }

    #[test]
    fn reads_json_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("skill.json"),
            r#"{"name":"demo","version":"1.0.0","entryPoint":"main.py"}"#,
        )
        .unwrap();

        let raw = read_raw(tmp.path()).unwrap();
        assert_eq!(raw["version"], "1.0.0");
    }

    #[test]
    fn yaml_takes_priority_over_json() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("skill.yaml"), "name: from-yaml\n").unwrap();
        std::fs::write(tmp.path().join("skill.json"), r#"{"name":"from-json"}"#).unwrap();

        let raw = read_raw(tmp.path()).unwrap();
        assert_eq!(raw["name"], "from-yaml");
    }

    #[test]
    fn missing_manifest_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(read_raw(tmp.path()).is_err());
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("skill.yaml"), "name: [unclosed\n").unwrap();
        assert!(read_raw(tmp.path()).is_err());
    }
}
