//! Xtream-style provider client
//!
//! Talks to the two remote endpoints the pipeline needs: the account API
//! (credential validation) and the playlist download.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use aerial_common::db::models::Credentials;
use aerial_common::events::Progress;
use aerial_common::{Error, Result};

const USER_AGENT: &str = "Aerial/0.1.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// `user_info.auth` value signalling valid credentials
const AUTHENTICATED: i64 = 1;

/// Remote account snapshot returned by `player_api.php`
///
/// Read-only; never persisted. Optional fields default so partial
/// provider responses do not fail deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountInfo {
    pub user_info: UserInfo,
    pub server_info: ServerInfo,
}

/// Account-holder section of [`AccountInfo`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub username: String,
    /// 1 when the credentials are valid
    pub auth: i64,
    #[serde(default)]
    pub status: String,
    /// Expiration as a unix timestamp string
    #[serde(default)]
    pub exp_date: Option<String>,
    #[serde(default)]
    pub is_trial: Option<String>,
    #[serde(default)]
    pub active_cons: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub max_connections: Option<String>,
    #[serde(default)]
    pub allowed_output_formats: Vec<String>,
}

/// Server section of [`AccountInfo`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub port: String,
    #[serde(default)]
    pub https_port: Option<String>,
    #[serde(default)]
    pub server_protocol: Option<String>,
    #[serde(default)]
    pub rtmp_port: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub timestamp_now: Option<i64>,
    #[serde(default)]
    pub time_now: Option<String>,
}

/// HTTP client bound to one set of provider credentials
pub struct XtreamClient {
    http_client: reqwest::Client,
    credentials: Credentials,
}

impl XtreamClient {
    pub fn new(credentials: Credentials) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            credentials,
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    fn account_url(&self) -> String {
        format!(
            "{}/player_api.php?username={}&password={}",
            self.credentials.server, self.credentials.username, self.credentials.password
        )
    }

    fn playlist_url(&self) -> String {
        format!(
            "{}/get.php?username={}&password={}&type=m3u_plus&output=ts",
            self.credentials.server, self.credentials.username, self.credentials.password
        )
    }

    /// Fetch account info and check the authentication flag
    ///
    /// Network failure, a non-success status, an undecodable body and an
    /// unauthenticated account all map to [`Error::Auth`].
    pub async fn validate(&self) -> Result<AccountInfo> {
        debug!(server = %self.credentials.server, "Fetching account info");

        let response = self
            .http_client
            .get(self.account_url())
            .send()
            .await
            .map_err(|e| Error::Auth(format!("Failed to fetch account info: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Auth(format!(
                "Account endpoint returned HTTP {}",
                response.status()
            )));
        }

        let account: AccountInfo = response
            .json()
            .await
            .map_err(|e| Error::Auth(format!("Malformed account info response: {}", e)))?;

        if account.user_info.auth != AUTHENTICATED {
            return Err(Error::Auth("Invalid credentials".to_string()));
        }

        info!(
            username = %account.user_info.username,
            status = %account.user_info.status,
            "Account validated"
        );

        Ok(account)
    }

    /// Download the playlist document, streaming the body chunk by chunk
    ///
    /// Chunks are accumulated in arrival order and decoded as UTF-8.
    /// Progress carries a percentage only when the server declares a
    /// content length.
    pub async fn download_playlist(
        &self,
        mut on_progress: impl FnMut(Progress),
    ) -> Result<String> {
        on_progress(Progress::message("Fetching playlist..."));

        let mut response = self
            .http_client
            .get(self.playlist_url())
            .send()
            .await
            .map_err(|e| Error::Download(format!("Failed to fetch playlist: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Download(format!(
                "Playlist endpoint returned HTTP {}",
                response.status()
            )));
        }

        let content_length = response.content_length().filter(|len| *len > 0);
        let mut body: Vec<u8> = Vec::with_capacity(content_length.unwrap_or(0) as usize);

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Error::Download(format!("Playlist stream aborted: {}", e)))?
        {
            body.extend_from_slice(&chunk);

            if let Some(total) = content_length {
                let percent = ((body.len() as f64 / total as f64) * 100.0).round() as u8;
                on_progress(Progress::with_percent(
                    format!("Downloading playlist: {}%", percent),
                    percent,
                ));
            }
        }

        debug!(bytes = body.len(), "Playlist downloaded");

        String::from_utf8(body)
            .map_err(|e| Error::Download(format!("Playlist is not valid UTF-8: {}", e)))
    }
}
