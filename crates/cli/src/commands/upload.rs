//! upload step - Put a local file into a bucket
//!
//! The whole file is read into memory and sent with one PutObject request,
//! private ACL and AES256 server-side encryption.

use std::fmt;
use std::path::Path;

use bkt_core::{CannedAcl, Error, ObjectRef, ObjectStore, PutOptions, Result};
use serde::Serialize;

/// File uploaded when none is given on the command line
pub const DEFAULT_UPLOAD_FILE: &str = "testFile1.txt";

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

#[derive(Debug, Clone, Serialize)]
pub struct UploadOutput {
    pub status: &'static str,
    pub source: String,
    pub target: ObjectRef,
    pub size_bytes: i64,
    pub size_human: String,
    pub content_type: String,
}

impl fmt::Display for UploadOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Uploaded {} -> {} ({}, {})",
            self.source, self.target, self.size_human, self.content_type
        )
    }
}

/// Object key for a local file: its file name
pub fn object_key(src: &Path) -> Result<String> {
    src.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| Error::General(format!("{} has no file name", src.display())))
}

/// Detect the content type of `data`
///
/// Magic numbers win, then UTF-8 text, then the file extension.
pub fn sniff_content_type(data: &[u8], src: &Path) -> String {
    if let Some(kind) = infer::get(data) {
        return kind.mime_type().to_string();
    }

    if !data.is_empty() && std::str::from_utf8(data).is_ok() {
        return TEXT_CONTENT_TYPE.to_string();
    }

    mime_guess::from_path(src)
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string())
}

/// Upload `src` into `bucket` under its file name
pub async fn upload_file(
    store: &dyn ObjectStore,
    src: &Path,
    bucket: &str,
) -> Result<UploadOutput> {
    let target = ObjectRef::new(bucket, object_key(src)?);
    let data = tokio::fs::read(src).await?;
    let content_type = sniff_content_type(&data, src);

    let options = PutOptions {
        content_type: Some(content_type.clone()),
        content_disposition: Some("attachment".to_string()),
        acl: CannedAcl::Private,
        encrypt: true,
    };

    tracing::debug!(source = %src.display(), target = %target, %content_type, "Uploading file");
    let info = store.put_object(&target, data, &options).await?;

    Ok(UploadOutput {
        status: "success",
        source: src.display().to_string(),
        target,
        size_bytes: info.size_bytes,
        size_human: info.size_human,
        content_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::memory::MemoryStore;
    use tempfile::TempDir;

    #[test]
    fn test_object_key_is_file_name() {
        assert_eq!(
            object_key(Path::new("./data/testFile1.txt")).unwrap(),
            "testFile1.txt"
        );
        assert!(object_key(Path::new("/")).is_err());
    }

    #[test]
    fn test_sniff_magic_numbers() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert_eq!(sniff_content_type(&png, Path::new("x.txt")), "image/png");
    }

    #[test]
    fn test_sniff_text() {
        assert_eq!(
            sniff_content_type(b"hello world", Path::new("notes.bin")),
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn test_sniff_falls_back_to_extension() {
        let binary = [0xff, 0xfe, 0x00, 0x01];
        assert_eq!(
            sniff_content_type(&binary, Path::new("page.html")),
            "text/html"
        );
        assert_eq!(
            sniff_content_type(&binary, Path::new("blob")),
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn test_upload_sets_private_encrypted_attachment() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("testFile1.txt");
        std::fs::write(&src, "payload").unwrap();
        let store = MemoryStore::new(&["first"]);

        let output = upload_file(&store, &src, "first").await.unwrap();

        assert_eq!(output.target, ObjectRef::new("first", "testFile1.txt"));
        assert_eq!(output.size_bytes, 7);
        assert_eq!(output.content_type, "text/plain; charset=utf-8");
        assert_eq!(
            store.object("first", "testFile1.txt").unwrap(),
            b"payload".to_vec()
        );

        let options = store.last_put_options().unwrap();
        assert_eq!(options.acl, CannedAcl::Private);
        assert!(options.encrypt);
        assert_eq!(options.content_disposition.as_deref(), Some("attachment"));
    }

    #[tokio::test]
    async fn test_upload_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::new(&["first"]);
        let result = upload_file(&store, &dir.path().join("absent.txt"), "first").await;
        assert!(matches!(result, Err(Error::Io(_))));
        assert_eq!(store.count("first"), 0);
    }

    #[tokio::test]
    async fn test_upload_to_missing_bucket_fails() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.txt");
        std::fs::write(&src, "a").unwrap();
        let store = MemoryStore::new(&[]);
        let result = upload_file(&store, &src, "nowhere").await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
