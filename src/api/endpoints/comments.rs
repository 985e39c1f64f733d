//! Task comments.

use tracing::instrument;

use crate::api::client::{segment, WorkHubClient};
use crate::api::error::Outcome;
use crate::api::transport::Transport;
use crate::api::types::{Ack, Comment, NewComment};

impl<T: Transport> WorkHubClient<T> {
    #[instrument(skip(self))]
    pub async fn list_comments(&self, task_id: &str) -> Outcome<Vec<Comment>> {
        self.get(&format!("/tasks/{}/comments", segment(task_id))).await
    }

    #[instrument(skip(self, text))]
    pub async fn add_comment(&self, task_id: &str, text: &str) -> Outcome<Comment> {
        let comment = NewComment {
            text: text.to_string(),
        };
        self.post(&format!("/tasks/{}/comments", segment(task_id)), &comment)
            .await
    }

    #[instrument(skip(self))]
    pub async fn delete_comment(&self, id: &str) -> Outcome<Ack> {
        self.delete(&format!("/comments/{}", segment(id))).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::api::testing::{logged_in_client, ScriptedTransport, USER_JSON};
    use crate::api::transport::{Body, Method};

    fn comment_json() -> String {
        format!(
            r#"{{"id":"k-1","author":{},"text":"Looks good","createdAt":"15/01/2024 10:15 AM"}}"#,
            USER_JSON
        )
    }

    #[tokio::test]
    async fn test_comment_routes() {
        let transport = ScriptedTransport::default()
            .reply(200, &format!("[{}]", comment_json()))
            .reply(201, &comment_json())
            .reply(200, r#"{"message":"Deleted"}"#);
        let client = logged_in_client(transport);

        let comments = client.list_comments("t-1").await.unwrap();
        assert_eq!(comments[0].author.name, "Ada");
        client.add_comment("t-1", "Looks good").await.unwrap();
        client.delete_comment("k-1").await.unwrap();

        let sent: Vec<_> = client
            .transport()
            .requests()
            .into_iter()
            .map(|r| (r.method, r.url, r.body))
            .collect();
        assert_eq!(
            sent,
            vec![
                (Method::Get, "https://api.test/tasks/t-1/comments".to_string(), Body::Empty),
                (
                    Method::Post,
                    "https://api.test/tasks/t-1/comments".to_string(),
                    Body::Json(json!({"text": "Looks good"}))
                ),
                (Method::Delete, "https://api.test/comments/k-1".to_string(), Body::Empty),
            ]
        );
    }

    #[tokio::test]
    async fn test_task_id_is_path_encoded() {
        let client = logged_in_client(ScriptedTransport::default().reply(200, "[]"));

        client.list_comments("t 1/x").await.unwrap();

        assert_eq!(
            client.transport().requests()[0].url,
            "https://api.test/tasks/t%201%2Fx/comments"
        );
    }
}
