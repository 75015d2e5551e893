use std::path::PathBuf;

use async_trait::async_trait;
use uuid::Uuid;

use crate::collaborators::{AttachmentStorage, CollaboratorError};

/// Keeps attachments on local disk under `<root>/<employee_id>/`.
pub struct LocalAttachmentStorage {
    root: PathBuf,
    base_url: String,
}

impl LocalAttachmentStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }
}

/// Strips everything but a conservative character set from a client filename.
fn sanitize(filename: &str) -> String {
    let cleaned: String = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "attachment".to_string()
    } else {
        cleaned.to_string()
    }
}

#[async_trait]
impl AttachmentStorage for LocalAttachmentStorage {
    async fn upload(
        &self,
        employee_id: u64,
        bytes: &[u8],
        filename: &str,
    ) -> Result<String, CollaboratorError> {
        let dir = self.root.join(employee_id.to_string());
        tokio::fs::create_dir_all(&dir).await?;

        let name = format!("{}-{}", Uuid::new_v4(), sanitize(filename));
        tokio::fs::write(dir.join(&name), bytes).await?;

        Ok(format!("{employee_id}/{name}"))
    }

    fn resolve_url(&self, stored_path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), stored_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_drops_paths_and_odd_characters() {
        assert_eq!(sanitize("../../etc/passwd"), "passwd");
        assert_eq!(sanitize("C:\\scans\\sick note (1).pdf"), "sicknote1.pdf");
        assert_eq!(sanitize(".."), "attachment");
    }

    #[actix_web::test]
    async fn upload_writes_under_employee_directory() {
        let root = std::env::temp_dir().join(format!("leave-quota-{}", Uuid::new_v4()));
        let storage = LocalAttachmentStorage::new(&root, "/files/");

        let stored = storage.upload(42, b"%PDF-1.7", "medical.pdf").await.unwrap();

        assert!(stored.starts_with("42/"));
        assert!(stored.ends_with("-medical.pdf"));
        let written = tokio::fs::read(root.join(&stored)).await.unwrap();
        assert_eq!(written, b"%PDF-1.7");
        assert_eq!(storage.resolve_url(&stored), format!("/files/{stored}"));

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }
}
