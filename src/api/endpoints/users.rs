//! User directory, profile, avatar and device token.

use std::path::Path;

use tracing::instrument;

use crate::api::client::{RequestOptions, WorkHubClient};
use crate::api::error::{ApiError, Outcome};
use crate::api::transport::{Body, FilePart, Method, Transport};
use crate::api::types::{Ack, DeviceTokenUpdate, ProfileUpdate, User};

impl<T: Transport> WorkHubClient<T> {
    /// All users, for assignee and recipient pickers.
    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Outcome<Vec<User>> {
        self.get("/users").await
    }

    /// The logged-in user's profile.
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> Outcome<User> {
        self.get("/users/me").await
    }

    /// Edit the profile and mirror the change into the session.
    #[instrument(skip(self))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Outcome<User> {
        let user: User = self.put("/users/me", update).await?;
        self.session()
            .update(|s| {
                s.display_name = user.name.clone();
                s.email = user.email.clone();
                s.avatar = user.avatar.clone();
            })
            .map_err(|e| ApiError::generic(e.to_string()))?;
        Ok(user)
    }

    /// Upload a new avatar image.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn upload_avatar(&self, path: &Path) -> Outcome<User> {
        let part = FilePart::from_path("avatar", path).await?;
        let user: User = self
            .call(
                Method::Post,
                "/users/me/avatar",
                Body::Multipart {
                    fields: Vec::new(),
                    files: vec![part],
                },
                RequestOptions::AUTHORIZED,
            )
            .await?;
        self.session()
            .update(|s| s.avatar = user.avatar.clone())
            .map_err(|e| ApiError::generic(e.to_string()))?;
        Ok(user)
    }

    /// Register this device's push token with the server.
    #[instrument(skip_all)]
    pub async fn register_device_token(&self, token: &str) -> Outcome<Ack> {
        let update = DeviceTokenUpdate {
            fcm_token: token.to_string(),
        };
        self.put("/users/me/device-token", &update).await
    }
}
