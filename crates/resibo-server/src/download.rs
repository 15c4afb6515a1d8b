//! Fetching receipt images by URL.

use axum::body::Bytes;
use reqwest::Client as HttpClient;
use reqwest::Url;
use tracing::{debug, info};

use crate::upload::{essence, is_allowed_content_type};

/// An image fetched from a URL.
#[derive(Debug)]
pub struct DownloadedImage {
    pub filename: String,
    pub bytes: Bytes,
}

/// Last path segment of the URL, or `image` when there is none.
pub fn filename_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "image".to_string())
}

/// Download an image and validate it like an upload.
///
/// The error is the message reported in the failed parse result.
pub async fn download_image(
    client: &HttpClient,
    url: &str,
    max_file_size: usize,
) -> Result<DownloadedImage, String> {
    info!("Downloading image from URL: {}", url);

    let parsed = Url::parse(url).map_err(|e| format!("Failed to download {}: {}", url, e))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(format!(
            "Failed to download {}: only http:// and https:// URLs are supported",
            url
        ));
    }

    let mut response = client
        .get(parsed.clone())
        .send()
        .await
        .map_err(|e| format!("Failed to download {}: {}", url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(format!("Failed to download {}: HTTP {}", url, status.as_u16()));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if !is_allowed_content_type(&content_type) {
        return Err(format!(
            "URL returned invalid content type '{}'.",
            essence(&content_type)
        ));
    }

    if let Some(length) = response
        .content_length()
        .filter(|&n| n > max_file_size as u64)
    {
        return Err(format!("Downloaded file too large ({} bytes).", length));
    }

    // Content-Length may be absent or wrong, so the cap also applies while reading
    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| format!("Failed to download {}: {}", url, e))?
    {
        body.extend_from_slice(&chunk);
        if body.len() > max_file_size {
            return Err(format!("Downloaded file too large ({} bytes).", body.len()));
        }
    }
    let bytes = Bytes::from(body);

    debug!("Downloaded {} bytes from {}", bytes.len(), url);
    Ok(DownloadedImage {
        filename: filename_from_url(&parsed),
        bytes,
    })
}
