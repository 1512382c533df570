//! Reproducible tar.gz artifact writing.

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use {
    anyhow::Context,
    flate2::{Compression, write::GzEncoder},
    serde::{Deserialize, Serialize},
};

/// Name of the generated metadata record inside every artifact.
pub const METADATA_FILE: &str = "skillpack.json";

/// Generated metadata record describing the artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub name: String,
    pub version: String,
    /// RFC 3339 build timestamp.
    pub built_at: String,
}

/// Write `entries` (archive-relative path, contents) plus the metadata
/// record into a gzip'd tarball at `dest`, under a `prefix/` top directory.
///
/// Entry headers carry a fixed mode and mtime so identical input produces
/// an identical entry list regardless of the source filesystem.
pub fn write_archive(
    dest: &Path,
    prefix: &str,
    entries: &[(PathBuf, Vec<u8>)],
    metadata: &ArtifactMetadata,
) -> anyhow::Result<()> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file =
        File::create(dest).with_context(|| format!("failed to create {}", dest.display()))?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (rel, data) in entries {
        append_entry(&mut builder, &format!("{prefix}/{}", archive_path(rel)), data)?;
    }

    let meta_json = serde_json::to_vec_pretty(metadata)?;
    append_entry(&mut builder, &format!("{prefix}/{METADATA_FILE}"), &meta_json)?;

    let encoder = builder.into_inner()?;
    encoder.finish()?;
    Ok(())
}

fn append_entry(
    builder: &mut tar::Builder<GzEncoder<File>>,
    path: &str,
    data: &[u8],
) -> anyhow::Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(0);
    builder
        .append_data(&mut header, path, data)
        .with_context(|| format!("failed to append archive entry {path}"))?;
    Ok(())
}

/// Archive entries always use forward slashes.
fn archive_path(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
