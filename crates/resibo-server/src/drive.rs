//! Google Drive folder access with a service-account key.
//!
//! A signed RS256 assertion is exchanged for an access token at the key's
//! `token_uri`; the token is then used against the Drive v3 files API to
//! list a folder's images and download them one by one.

use std::path::Path;

use axum::body::Bytes;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::Client as HttpClient;
use resibo_core::models::config::DriveConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::upload::ALLOWED_CONTENT_TYPES;

const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

#[derive(Error, Debug)]
pub enum DriveError {
    #[error(
        "Credentials file not found: '{0}'. Place your service account JSON key file in the project directory."
    )]
    CredentialsNotFound(String),

    #[error("invalid credentials file: {0}")]
    InvalidCredentials(String),

    #[error("failed to sign token request: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Api { status: u16, body: String },
}

/// The parts of a service-account JSON key that are needed here.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self, DriveError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DriveError::CredentialsNotFound(path.display().to_string()));
            }
            Err(e) => return Err(DriveError::InvalidCredentials(e.to_string())),
        };
        serde_json::from_str(&content).map_err(|e| DriveError::InvalidCredentials(e.to_string()))
    }

    /// Build the signed assertion for the token endpoint.
    pub fn assertion(&self, issued_at: i64) -> Result<String, DriveError> {
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: DRIVE_SCOPE,
            aud: &self.token_uri,
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())?;
        Ok(encode(&Header::new(Algorithm::RS256), &claims, &key)?)
    }
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// A file entry from a folder listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

/// Drive v3 API client.
#[derive(Debug, Clone)]
pub struct DriveClient {
    http: HttpClient,
    api_base: String,
    page_size: u32,
}

impl DriveClient {
    pub fn new(http: HttpClient, config: &DriveConfig) -> Self {
        Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            page_size: config.page_size,
        }
    }

    /// Authenticate with the key at `credentials_path`.
    pub async fn connect(&self, credentials_path: &Path) -> Result<DriveSession<'_>, DriveError> {
        let key = ServiceAccountKey::from_file(credentials_path)?;
        let assertion = key.assertion(Utc::now().timestamp())?;

        debug!("Requesting Drive access token for {}", key.client_email);
        let response = self
            .http
            .post(&key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;
        let token: TokenResponse = check_status(response).await?.json().await?;

        Ok(DriveSession {
            client: self,
            access_token: token.access_token,
        })
    }

    fn files_url(&self) -> String {
        format!("{}/drive/v3/files", self.api_base)
    }
}

/// An authenticated Drive session.
pub struct DriveSession<'a> {
    client: &'a DriveClient,
    access_token: String,
}

impl DriveSession<'_> {
    /// List every non-trashed image directly inside `folder_id`.
    pub async fn list_images(&self, folder_id: &str) -> Result<Vec<DriveFile>, DriveError> {
        let query = folder_query(folder_id);
        let page_size = self.client.page_size.to_string();
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![
                ("q", query.as_str()),
                ("fields", "nextPageToken, files(id, name, mimeType)"),
                ("pageSize", page_size.as_str()),
            ];
            if let Some(token) = page_token.as_deref() {
                params.push(("pageToken", token));
            }

            let response = self
                .client
                .http
                .get(self.client.files_url())
                .bearer_auth(&self.access_token)
                .query(&params)
                .send()
                .await?;
            let page: FileList = check_status(response).await?.json().await?;

            files.extend(page.files);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        info!("Drive folder {} has {} images", folder_id, files.len());
        Ok(files)
    }

    /// Download the content of one file.
    pub async fn download(&self, file_id: &str) -> Result<Bytes, DriveError> {
        let response = self
            .client
            .http
            .get(format!("{}/{}", self.client.files_url(), file_id))
            .bearer_auth(&self.access_token)
            .query(&[("alt", "media")])
            .send()
            .await?;
        Ok(check_status(response).await?.bytes().await?)
    }
}

/// Drive search query for the images of one folder.
pub fn folder_query(folder_id: &str) -> String {
    let mimes = ALLOWED_CONTENT_TYPES
        .iter()
        .map(|m| format!("mimeType='{}'", m))
        .collect::<Vec<_>>()
        .join(" or ");
    format!(
        "'{}' in parents and ({}) and trashed=false",
        folder_id.replace('\\', "\\\\").replace('\'', "\\'"),
        mimes
    )
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, DriveError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(DriveError::Api {
        status: status.as_u16(),
        body,
    })
}
