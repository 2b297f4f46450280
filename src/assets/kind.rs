//! Asset classification by file extension.

use std::path::Path;

use crate::errors::MirageError;
use crate::resources::texture::EnvironmentKind;

/// Closed set of loadable asset kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// glTF / GLB container with its own node tree and materials.
    Mesh,
    /// Colored PLY point cloud.
    PointCloud,
}

impl AssetKind {
    /// Classifies `path`, rejecting compressed point clouds and unknown
    /// extensions with [`MirageError::UnsupportedAsset`].
    pub fn classify(path: &str) -> Result<Self, MirageError> {
        let Some(ext) = extension(path) else {
            return Err(unsupported(path, "missing file extension"));
        };
        match ext.as_str() {
            "glb" | "gltf" => Ok(Self::Mesh),
            "ply" => Ok(Self::PointCloud),
            "drc" | "laz" => Err(unsupported(
                path,
                format!("compressed point cloud format '.{ext}' is not supported"),
            )),
            _ => Err(unsupported(path, format!("unknown extension '.{ext}'"))),
        }
    }
}

/// Environment map flavor for a background image path.
pub fn classify_environment(path: &str) -> Result<EnvironmentKind, MirageError> {
    match extension(path).as_deref() {
        Some("jpg" | "jpeg" | "png" | "webp") => Ok(EnvironmentKind::Equirectangular),
        Some("hdr" | "exr") => Ok(EnvironmentKind::HighDynamicRange),
        Some(ext) => Err(unsupported(path, format!("unknown environment extension '.{ext}'"))),
        None => Err(unsupported(path, "missing file extension")),
    }
}

/// Name an asset is registered under: the final path segment, extension included.
#[must_use]
pub fn display_name(path: &str) -> &str {
    path.rsplit(['/', '\\'])
        .find(|segment| !segment.is_empty())
        .unwrap_or(path)
}

fn extension(path: &str) -> Option<String> {
    Path::new(display_name(path))
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

fn unsupported(path: &str, reason: impl Into<String>) -> MirageError {
    MirageError::UnsupportedAsset {
        path: path.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(AssetKind::classify("models/Duck.GLB").unwrap(), AssetKind::Mesh);
        assert_eq!(AssetKind::classify("scan.Ply").unwrap(), AssetKind::PointCloud);
        assert_eq!(AssetKind::classify("a/b/scene.gltf").unwrap(), AssetKind::Mesh);
    }

    #[test]
    fn compressed_and_unknown_formats_are_rejected() {
        for path in ["city.drc", "lidar.LAZ", "notes.txt", "noext"] {
            assert!(matches!(
                AssetKind::classify(path),
                Err(MirageError::UnsupportedAsset { .. })
            ));
        }
    }

    #[test]
    fn display_name_keeps_extension() {
        assert_eq!(display_name("https://cdn.example.com/assets/bunny.ply"), "bunny.ply");
        assert_eq!(display_name("C:\\scans\\room.glb"), "room.glb");
        assert_eq!(display_name("plain.ply"), "plain.ply");
        assert_eq!(display_name("dir/trailing/"), "trailing");
    }
}
