use std::path::{Path, PathBuf};

use crate::errors::Result;

/// Byte source the built-in decoders read from.
pub trait AssetReader: Send + Sync {
    fn read_bytes(&self, uri: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
}

/// 本地文件读取器
///
/// Resolves relative URIs against a root directory; absolute paths are
/// read as-is.
#[derive(Debug, Clone)]
pub struct FileAssetReader {
    root_path: PathBuf,
}

impl FileAssetReader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let root_path = if path.is_file() {
            path.parent().unwrap_or(Path::new(".")).to_path_buf()
        } else {
            path.to_path_buf()
        };
        Self { root_path }
    }

    #[inline]
    #[must_use]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Full path `uri` resolves to.
    #[must_use]
    pub fn resolve(&self, uri: &str) -> PathBuf {
        self.root_path.join(uri)
    }
}

impl Default for FileAssetReader {
    fn default() -> Self {
        Self::new(".")
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl AssetReader for FileAssetReader {
    async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>> {
        let path = self.resolve(uri);
        log::debug!("Reading {}", path.display());
        let data = tokio::fs::read(&path).await?;
        Ok(data)
    }
}

/// Directory part of `uri`, used to resolve files referenced from inside an asset.
#[must_use]
pub fn parent_uri(uri: &str) -> &str {
    uri.rfind(['/', '\\']).map_or("", |i| &uri[..=i])
}
