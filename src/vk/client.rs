use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::VkConfig;
use crate::error::{FriendGraphError, Result};
use crate::graph::UserId;
use crate::vk::FriendSource;

/// Top-level friends.get reply; VK answers either `response` or `error`
#[derive(Deserialize)]
struct FriendsEnvelope {
    #[serde(default)]
    response: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<ApiError>,
}

/// Payload of a successful friends.get call (`count` is ignored)
#[derive(Deserialize)]
struct FriendsData {
    items: Vec<UserId>,
}

#[derive(Deserialize)]
struct ApiError {
    error_code: i64,
    #[serde(default)]
    error_msg: String,
}

/// VK error codes that mean "try again later" rather than "no access"
const TRANSIENT_API_ERRORS: &[i64] = &[
    6,  // Too many requests per second
    9,  // Flood control
    10, // Internal server error
];

/// VK friends.get client
pub struct VkClient {
    client: Client,
    endpoint: String,
    access_token: String,
    api_version: String,
}

impl VkClient {
    /// Create a client for the API described by `config`
    ///
    /// # Arguments
    ///
    /// * `config` - Base URL, API version and request timeout
    /// * `access_token` - VK access token sent with every request
    pub fn new(config: &VkConfig, access_token: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FriendGraphError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}friends.get", config.base_url),
            access_token,
            api_version: config.api_version.clone(),
        })
    }

    /// Fetch the friend ids of `user_id` in the order VK returns them
    pub async fn get_friends(&self, user_id: UserId) -> Result<Vec<UserId>> {
        if user_id < 0 {
            return Err(FriendGraphError::InvalidInput(format!(
                "user id must not be negative: {}",
                user_id
            )));
        }

        let start = std::time::Instant::now();

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("user_id", user_id.to_string()),
                ("access_token", self.access_token.clone()),
                ("v", self.api_version.clone()),
            ])
            .send()
            .await
            .map_err(|e| FriendGraphError::FetchFailed {
                user_id,
                status: None,
                // The request URL carries the access token
                message: format!("Network error: {}", e.without_url()),
            })?;

        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            return Err(FriendGraphError::FetchFailed {
                user_id,
                status: Some(status.as_u16()),
                message: format!("VK API error {}: {}", status, body),
            });
        }

        let body = response.text().await.map_err(|e| FriendGraphError::FetchFailed {
            user_id,
            status: Some(status.as_u16()),
            message: format!("Failed to read response: {}", e.without_url()),
        })?;

        let friends = parse_friends_body(user_id, &body)?;
        log::debug!(
            "friends.get {} -> {} friends in {:?}",
            user_id,
            friends.len(),
            start.elapsed()
        );
        Ok(friends)
    }
}

impl FriendSource for VkClient {
    async fn fetch_friends(&self, user_id: UserId) -> Result<Vec<UserId>> {
        self.get_friends(user_id).await
    }
}

/// Turn a friends.get body into friend ids.
///
/// Private, deleted or banned profiles, and bodies without a usable `response`,
/// yield an empty list so the crawl can move past them. Only transient API
/// errors (rate limiting, flood control, server trouble) become `FetchFailed`.
pub fn parse_friends_body(user_id: UserId, body: &str) -> Result<Vec<UserId>> {
    let envelope: FriendsEnvelope = match serde_json::from_str(body) {
        Ok(e) => e,
        Err(e) => {
            log::warn!("Unparsable friends.get body for {}: {}", user_id, e);
            return Ok(Vec::new());
        }
    };

    if let Some(err) = envelope.error {
        if TRANSIENT_API_ERRORS.contains(&err.error_code) {
            return Err(FriendGraphError::FetchFailed {
                user_id,
                status: None,
                message: format!("VK error {}: {}", err.error_code, err.error_msg),
            });
        }
        log::debug!(
            "No friends for {} (VK error {}: {})",
            user_id,
            err.error_code,
            err.error_msg
        );
        return Ok(Vec::new());
    }

    match envelope.response.map(serde_json::from_value::<FriendsData>) {
        Some(Ok(data)) => Ok(data.items),
        Some(Err(e)) => {
            log::warn!("Malformed friends.get response for {}: {}", user_id, e);
            Ok(Vec::new())
        }
        None => Ok(Vec::new()),
    }
}
