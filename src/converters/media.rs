//! Media references: files embedded in a package and used by a question.

use std::fs;
use std::path::{Component, Path, PathBuf};

use serde_json::Value;
use sha2::{Digest, Sha256};

use super::text::{str_at, str_field};
use crate::core::scratch::ScratchDir;
use crate::domain::MediaRef;

/// Resolve a file node (`{path, mime}`) against the package's content dir.
///
/// Returns `None` for nodes without a path. External URLs are kept as-is
/// with no size or digest.
pub fn resolve_file(scratch: &ScratchDir, file: &Value, alt: &str) -> Option<MediaRef> {
    let path = str_field(file, "path");
    if path.is_empty() {
        return None;
    }

    let mut media = MediaRef {
        path: path.to_string(),
        mime: non_empty(str_field(file, "mime")),
        alt: non_empty(alt),
        ..Default::default()
    };

    if let Some(local) = local_path(&scratch.content_dir(), path) {
        match fs::read(&local) {
            Ok(bytes) => {
                media.size_bytes = Some(bytes.len() as u64);
                media.sha256 = Some(hex::encode(Sha256::digest(&bytes)));
            }
            Err(e) => {
                tracing::debug!("Media file {} not readable: {}", local.display(), e);
            }
        }
    }

    Some(media)
}

/// Media attached through the common `media` field.
///
/// Accepts both `media.type.params.file` and the older `media.params.file`.
pub fn resolve_media_field(scratch: &ScratchDir, params: &Value) -> Option<MediaRef> {
    let media = params.get("media")?;
    let node = media.get("type").unwrap_or(media);

    let library = str_field(node, "library");
    if !library.is_empty() && !library.starts_with("H5P.Image") {
        // Video and audio carry a list of sources
        let source = node.pointer("/params/sources/0")?;
        return resolve_file(scratch, source, "");
    }

    let file = node.pointer("/params/file")?;
    resolve_file(scratch, file, str_at(node, "/params/alt"))
}

/// Copy a present media file out of the scratch dir into `media_dir`.
///
/// The copy is named `<sha256 prefix>-<file name>` so identical files
/// from different packages collapse into one.
pub fn export_media(
    scratch: &ScratchDir,
    media: &mut MediaRef,
    media_dir: &Path,
) -> std::io::Result<()> {
    let (Some(digest), Some(local)) = (
        media.sha256.as_deref(),
        local_path(&scratch.content_dir(), &media.path),
    ) else {
        return Ok(());
    };

    let file_name = local
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "media".to_string());
    let prefix = digest.get(..16).unwrap_or(digest);
    let target = media_dir.join(format!("{}-{}", prefix, file_name));

    fs::create_dir_all(media_dir)?;
    if !target.exists() {
        fs::copy(&local, &target)?;
    }
    media.exported_path = Some(target.to_string_lossy().to_string());
    Ok(())
}

/// Join a package-relative path onto `base`, refusing URLs and escapes
fn local_path(base: &Path, relative: &str) -> Option<PathBuf> {
    if relative.contains("://") {
        return None;
    }
    let relative = Path::new(relative.split('#').next().unwrap_or_default());
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return None;
    }
    Some(base.join(relative))
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
