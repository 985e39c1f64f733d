//! Task attachments: listing, upload and removal.

use std::path::Path;

use tracing::instrument;

use crate::api::client::{segment, RequestOptions, WorkHubClient};
use crate::api::error::Outcome;
use crate::api::transport::{Body, FilePart, Method, Transport};
use crate::api::types::{Ack, Attachment};

impl<T: Transport> WorkHubClient<T> {
    #[instrument(skip(self))]
    pub async fn list_attachments(&self, task_id: &str) -> Outcome<Vec<Attachment>> {
        self.get(&format!("/tasks/{}/attachments", segment(task_id)))
            .await
    }

    /// Upload a file from disk and attach it to a task.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn upload_attachment(&self, task_id: &str, path: &Path) -> Outcome<Attachment> {
        let part = FilePart::from_path("file", path).await?;
        self.upload_attachment_part(task_id, part).await
    }

    /// Attach an in-memory file to a task.
    #[instrument(skip(self, part), fields(file_name = %part.file_name))]
    pub async fn upload_attachment_part(&self, task_id: &str, part: FilePart) -> Outcome<Attachment> {
        self.call(
            Method::Post,
            &format!("/tasks/{}/attachments", segment(task_id)),
            Body::Multipart {
                fields: Vec::new(),
                files: vec![part],
            },
            RequestOptions::AUTHORIZED,
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn delete_attachment(&self, id: &str) -> Outcome<Ack> {
        self.delete(&format!("/attachments/{}", segment(id))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::ApiError;
    use crate::api::testing::{logged_in_client, ScriptedTransport};

    const ATTACHMENT_JSON: &str =
        r#"{"id":"a-1","fileName":"notes.txt","url":"https://cdn.test/notes.txt","size":5}"#;

    #[tokio::test]
    async fn test_upload_attachment_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();
        let client = logged_in_client(ScriptedTransport::default().reply(201, ATTACHMENT_JSON));

        let attachment = client.upload_attachment("t-1", &path).await.unwrap();
        assert_eq!(attachment.file_name, "notes.txt");
        assert_eq!(attachment.size, 5);

        let requests = client.transport().requests();
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(requests[0].url, "https://api.test/tasks/t-1/attachments");
        assert_eq!(
            requests[0].body,
            Body::Multipart {
                fields: Vec::new(),
                files: vec![FilePart {
                    field: "file".to_string(),
                    file_name: "notes.txt".to_string(),
                    mime: "text/plain".to_string(),
                    bytes: b"hello".to_vec(),
                }],
            }
        );
    }

    #[tokio::test]
    async fn test_list_and_delete_attachment() {
        let transport = ScriptedTransport::default()
            .reply(200, &format!("[{}]", ATTACHMENT_JSON))
            .reply(200, r#"{"message":"Deleted"}"#);
        let client = logged_in_client(transport);

        assert_eq!(client.list_attachments("t-1").await.unwrap().len(), 1);
        client.delete_attachment("a-1").await.unwrap();

        let requests = client.transport().requests();
        assert_eq!(requests[0].method, Method::Get);
        assert_eq!(requests[0].url, "https://api.test/tasks/t-1/attachments");
        assert_eq!(requests[1].method, Method::Delete);
        assert_eq!(requests[1].url, "https://api.test/attachments/a-1");
        assert_eq!(requests[1].body, Body::Empty);
    }

    #[tokio::test]
    async fn test_upload_network_failure_is_generic() {
        let client = logged_in_client(ScriptedTransport::default().fail("connection reset"));
        let part = FilePart {
            field: "file".to_string(),
            file_name: "notes.txt".to_string(),
            mime: "text/plain".to_string(),
            bytes: b"hello".to_vec(),
        };

        let err = client.upload_attachment_part("t-1", part).await.unwrap_err();

        assert_eq!(err, ApiError::generic("connection reset"));
        assert_eq!(client.transport().requests().len(), 1);
    }
}
