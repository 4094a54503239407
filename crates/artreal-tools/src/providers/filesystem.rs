//! Real filesystem implementation using `tokio::fs`.

use std::io;
use std::path::Path;

use async_trait::async_trait;

use crate::traits::FileSystemOps;

/// Filesystem operations backed by `tokio::fs`.
pub struct RealFileSystem;

#[async_trait]
impl FileSystemOps for RealFileSystem {
    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, io::Error> {
        tokio::fs::read(path).await
    }

    async fn write_file(&self, path: &Path, content: &[u8]) -> Result<(), io::Error> {
        tokio::fs::write(path, content).await
    }

    async fn create_dir_all(&self, path: &Path) -> Result<(), io::Error> {
        tokio::fs::create_dir_all(path).await
    }

    async fn remove_file(&self, path: &Path) -> Result<(), io::Error> {
        tokio::fs::remove_file(path).await
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_read_remove() {
        let fs = RealFileSystem;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dir/test.txt");

        fs.create_dir_all(path.parent().unwrap()).await.unwrap();
        fs.write_file(&path, b"hello world").await.unwrap();
        assert!(fs.exists(&path));
        assert_eq!(fs.read_file(&path).await.unwrap(), b"hello world");

        fs.remove_file(&path).await.unwrap();
        assert!(!fs.exists(&path));
    }

    #[tokio::test]
    async fn read_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = RealFileSystem
            .read_file(&dir.path().join("missing.txt"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
