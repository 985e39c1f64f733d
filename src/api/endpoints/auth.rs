//! Account endpoints: signup, login, password reset.

use tracing::{info, instrument};

use crate::api::auth::Credentials;
use crate::api::client::{json_body, RequestOptions, WorkHubClient};
use crate::api::error::{ApiError, Outcome};
use crate::api::transport::{Method, Transport};
use crate::api::types::{Ack, AuthResponse, ResetPasswordRequest, SignupRequest};
use crate::session::Session;

impl<T: Transport> WorkHubClient<T> {
    /// Log in and replace the stored session.
    ///
    /// On failure the stored session is left untouched.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Outcome<AuthResponse> {
        let credentials = Credentials::new(email, password);
        let auth = self.send_login(&credentials).await?;
        self.store_session(&auth, &credentials)?;
        info!(user_id = %auth.user.id, "Logged in");
        Ok(auth)
    }

    /// Create an account and log into it.
    #[instrument(skip(self, password))]
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Outcome<AuthResponse> {
        let credentials = Credentials::new(email, password);
        let request = SignupRequest {
            name: name.trim().to_string(),
            email: credentials.email().to_string(),
            password: credentials.password().to_string(),
            fcm_token: self.current_push_token().await,
        };
        let auth: AuthResponse = self
            .call(
                Method::Post,
                "/auth/signup",
                json_body(&request)?,
                RequestOptions::UNAUTHORIZED,
            )
            .await?;
        self.store_session(&auth, &credentials)?;
        info!(user_id = %auth.user.id, "Signed up");
        Ok(auth)
    }

    /// Ask the server to send a password reset email.
    #[instrument(skip(self))]
    pub async fn reset_password(&self, email: &str) -> Outcome<Ack> {
        let request = ResetPasswordRequest {
            email: email.trim().to_string(),
        };
        self.call(
            Method::Post,
            "/auth/reset-password",
            json_body(&request)?,
            RequestOptions::UNAUTHORIZED,
        )
        .await
    }

    /// Forget the local session.
    pub fn logout(&self) -> Outcome<()> {
        self.session()
            .clear()
            .map_err(|e| ApiError::generic(e.to_string()))?;
        info!("Logged out");
        Ok(())
    }

    fn store_session(&self, auth: &AuthResponse, credentials: &Credentials) -> Outcome<()> {
        let session = Session {
            token: auth.token.clone(),
            user_id: auth.user.id.clone(),
            display_name: auth.user.name.clone(),
            email: credentials.email().to_string(),
            password: credentials.password().to_string(),
            avatar: auth.user.avatar.clone(),
        };
        self.session()
            .replace(session)
            .map_err(|e| ApiError::generic(e.to_string()))
    }
}
