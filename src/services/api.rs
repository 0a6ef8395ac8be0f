use crate::error::ApiError;
use crate::models::auth::{Credentials, LoginResponse, RegisterResponse};
use crate::models::config::ApiConfig;
use crate::models::files::{FileStats, UploadFile, UploadReceipt};
use crate::models::weather::WeatherReport;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// The REST operations the view controllers depend on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Backend: Send + Sync {
    async fn login(&self, login: &str, password: &str) -> Result<LoginResponse, ApiError>;

    async fn register(&self, login: &str, password: &str) -> Result<RegisterResponse, ApiError>;

    async fn upload(&self, file: &UploadFile, token: &str) -> Result<UploadReceipt, ApiError>;

    async fn file_stats(&self, token: &str) -> Result<FileStats, ApiError>;

    async fn weather(&self, city: &str) -> Result<WeatherReport, ApiError>;

    /// Joins a server-relative download path onto the file service URL.
    fn absolute_url(&self, relative: &str) -> String;
}

/// Fire-once JSON client for the file service and the weather service.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    weather_base_url: String,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("portal-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            weather_base_url: config.weather_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn files_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends the request and parses the body as JSON whatever the status.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await.map_err(|e| {
            warn!("Request failed before a response arrived: {}", e);
            ApiError::Network(e)
        })?;

        let status = response.status().as_u16();
        let url = response.url().clone();
        let bytes = response.bytes().await?;
        let body: Option<serde_json::Value> = serde_json::from_slice(&bytes).ok();

        if !(200..300).contains(&status) {
            let err = ApiError::from_response(status, body.as_ref());
            warn!("{} answered {}: {}", url.path(), status, err);
            return Err(err);
        }

        debug!("{} answered {}", url.path(), status);

        let body = body.ok_or_else(|| ApiError::InvalidResponse {
            status,
            reason: "body is not JSON".to_string(),
        })?;

        serde_json::from_value(body).map_err(|e| ApiError::InvalidResponse {
            status,
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn login(&self, login: &str, password: &str) -> Result<LoginResponse, ApiError> {
        debug!("Logging in as {}", login);
        let request = self
            .client
            .post(self.files_url("/api/login"))
            .json(&Credentials { login, password });
        self.send(request).await
    }

    async fn register(&self, login: &str, password: &str) -> Result<RegisterResponse, ApiError> {
        debug!("Registering {}", login);
        let request = self
            .client
            .post(self.files_url("/api/register"))
            .json(&Credentials { login, password });
        self.send(request).await
    }

    async fn upload(&self, file: &UploadFile, token: &str) -> Result<UploadReceipt, ApiError> {
        debug!("Uploading {} ({} bytes)", file.name, file.size());
        let part = Part::bytes(file.bytes.clone()).file_name(file.name.clone());
        let form = Form::new().part("file", part);
        let request = self
            .client
            .post(self.files_url("/api/files/upload"))
            .bearer_auth(token)
            .multipart(form);
        self.send(request).await
    }

    async fn file_stats(&self, token: &str) -> Result<FileStats, ApiError> {
        let request = self
            .client
            .get(self.files_url("/api/stats/files/"))
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/json");
        self.send(request).await
    }

    async fn weather(&self, city: &str) -> Result<WeatherReport, ApiError> {
        debug!("Fetching weather for {}", city);
        let request = self
            .client
            .get(format!("{}/weather", self.weather_base_url))
            .query(&[("city", city)])
            .header(CONTENT_TYPE, "application/json");
        self.send(request).await
    }

    fn absolute_url(&self, relative: &str) -> String {
        self.files_url(relative)
    }
}
