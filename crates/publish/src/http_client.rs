//! HTTP implementation of the platform client, speaking to a bridge service
//! that fronts the platform's private API. Media travels as base64 inside
//! JSON bodies; the device fingerprint rides along as headers.

use {
    async_trait::async_trait,
    base64::Engine,
    reqwest::StatusCode,
    secrecy::ExposeSecret,
    serde_json::{Value, json},
    tracing::debug,
};

use crate::platform::{
    AccountCredentials, PlatformClient, PlatformError, PlatformResult, PlatformSession,
};

pub struct HttpPlatformClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpPlatformClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    fn request(
        &self,
        path: &str,
        session: &PlatformSession,
    ) -> reqwest::RequestBuilder {
        let mut req = self
            .http
            .post(self.url(path))
            .header("x-device-id", session.device.device_id.as_str())
            .header("x-phone-id", session.device.phone_id.as_str())
            .header("x-device-uuid", session.device.uuid.as_str())
            .header("x-device-build", session.device.build.as_str());
        if let Some(token) = &session.auth_token {
            req = req.bearer_auth(token);
        }
        req
    }
}

/// Map error statuses to the platform error taxonomy. Bodies are carried
/// through so callers can match endpoint-specific signatures.
async fn check(operation: &str, response: reqwest::Response) -> PlatformResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    match status {
        StatusCode::NOT_FOUND => Err(PlatformError::NotFound {
            resource: if body.trim().is_empty() {
                operation.to_string()
            } else {
                body
            },
        }),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(PlatformError::AuthRejected {
            reason: if body.trim().is_empty() {
                status.to_string()
            } else {
                body
            },
        }),
        _ => Err(PlatformError::Status {
            operation: operation.to_string(),
            status: status.as_u16(),
            body,
        }),
    }
}

async fn into_json(operation: &str, response: reqwest::Response) -> PlatformResult<Value> {
    response
        .json()
        .await
        .map_err(|e| PlatformError::transport(operation, e))
}

#[async_trait]
impl PlatformClient for HttpPlatformClient {
    fn open_session(&self, username: &str) -> PlatformSession {
        let session = PlatformSession::for_username(username);
        debug!(username, device_id = %session.device.device_id, "opened platform session");
        session
    }

    async fn pre_login_flow(&self, session: &PlatformSession) -> PlatformResult<()> {
        let operation = "pre-login flow";
        let response = self
            .request("/session/pre-login", session)
            .json(&json!({ "device": {
                "device_id": session.device.device_id,
                "phone_id": session.device.phone_id,
                "uuid": session.device.uuid,
                "build": session.device.build,
            }}))
            .send()
            .await
            .map_err(|e| PlatformError::transport(operation, e))?;
        check(operation, response).await.map(|_| ())
    }

    async fn login(
        &self,
        session: &mut PlatformSession,
        credentials: &AccountCredentials,
    ) -> PlatformResult<Value> {
        let operation = "login";
        let response = self
            .request("/session/login", session)
            .json(&json!({
                "username": credentials.username,
                "password": credentials.password.expose_secret(),
            }))
            .send()
            .await
            .map_err(|e| PlatformError::transport(operation, e))?;
        let value = into_json(operation, check(operation, response).await?).await?;

        if let Some(token) = value["token"].as_str() {
            session.auth_token = Some(token.to_string());
        }
        Ok(value)
    }

    async fn publish_photo(
        &self,
        session: &PlatformSession,
        photo: &[u8],
        caption: &str,
    ) -> PlatformResult<Value> {
        let operation = "publish photo";
        let response = self
            .request("/media/photo", session)
            .json(&json!({
                "file": base64::engine::general_purpose::STANDARD.encode(photo),
                "caption": caption,
            }))
            .send()
            .await
            .map_err(|e| PlatformError::transport(operation, e))?;
        into_json(operation, check(operation, response).await?).await
    }

    async fn publish_video(
        &self,
        session: &PlatformSession,
        video: &[u8],
        cover: &[u8],
        caption: &str,
    ) -> PlatformResult<Value> {
        let operation = "publish video";
        let response = self
            .request("/media/video", session)
            .json(&json!({
                "video": base64::engine::general_purpose::STANDARD.encode(video),
                "cover_image": base64::engine::general_purpose::STANDARD.encode(cover),
                "caption": caption,
            }))
            .send()
            .await
            .map_err(|e| PlatformError::transport(operation, e))?;
        into_json(operation, check(operation, response).await?).await
    }

    async fn post_login_flow(&self, session: &PlatformSession) -> PlatformResult<()> {
        let operation = "post-login flow";
        let response = self
            .request("/session/post-login", session)
            .send()
            .await
            .map_err(|e| PlatformError::transport(operation, e))?;
        check(operation, response).await.map(|_| ())
    }
}
