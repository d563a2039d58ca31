use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub const DEFAULT_USERNAME: &str = "Player";

/// Outbound authentication collaborator.
///
/// `None` means "no session": the caller decides whether to continue offline.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, username: &str, password: &str, api_url: &str) -> Option<String>;

    /// Profile id registered for `username`, if any. Informational only: a
    /// missing profile never blocks a launch.
    async fn player_id(&self, _username: &str, _profile_url: &str) -> Option<String> {
        None
    }
}

/// Mojang-style username/password login (`POST /authenticate`).
#[derive(Debug, Clone)]
pub struct YggdrasilAuthenticator {
    client: Client,
}

impl YggdrasilAuthenticator {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthenticateRequest<'a> {
    agent: Agent,
    username: &'a str,
    password: &'a str,
    request_user: bool,
}

#[derive(Debug, Serialize)]
struct Agent {
    name: &'static str,
    version: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthenticateResponse {
    #[serde(default)]
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    #[serde(default)]
    id: Option<String>,
}

fn profile_lookup_url(profile_url: &str, username: &str) -> String {
    format!("{}/{}", profile_url.trim_end_matches('/'), username.trim())
}

#[async_trait]
impl Authenticator for YggdrasilAuthenticator {
    async fn authenticate(&self, username: &str, password: &str, api_url: &str) -> Option<String> {
        let payload = AuthenticateRequest {
            agent: Agent {
                name: "Minecraft",
                version: 1,
            },
            username,
            password,
            request_user: true,
        };

        let response = match self.client.post(api_url).json(&payload).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!("Authentication request failed: {}", err);
                return None;
            }
        };

        if !response.status().is_success() {
            warn!("Authentication rejected with HTTP {}", response.status());
            return None;
        }

        match response.json::<AuthenticateResponse>().await {
            Ok(body) => {
                let token = body.access_token.filter(|t| !t.trim().is_empty());
                if token.is_some() {
                    info!("Authenticated {}", username);
                }
                token
            }
            Err(err) => {
                warn!("Unreadable authentication response: {}", err);
                None
            }
        }
    }

    async fn player_id(&self, username: &str, profile_url: &str) -> Option<String> {
        if username.trim().is_empty() {
            return None;
        }

        let url = profile_lookup_url(profile_url, username);
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!("Profile lookup for {} failed: {}", username, err);
                return None;
            }
        };

        // 204/404 both mean "no such profile".
        if response.status() != reqwest::StatusCode::OK {
            debug!("No profile for {} (HTTP {})", username, response.status());
            return None;
        }

        match response.json::<ProfileResponse>().await {
            Ok(profile) => profile.id.filter(|id| !id.trim().is_empty()),
            Err(err) => {
                warn!("Unreadable profile response: {}", err);
                None
            }
        }
    }
}

/// Identity handed to the launched game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub username: String,
    /// Absent means offline mode.
    pub access_token: Option<String>,
}

impl SessionIdentity {
    pub fn offline(username: &str) -> Self {
        Self {
            username: username.trim().to_string(),
            access_token: None,
        }
        .sanitized()
    }

    pub fn online(username: &str, access_token: String) -> Self {
        Self {
            username: username.trim().to_string(),
            access_token: Some(access_token),
        }
        .sanitized()
    }

    pub fn is_offline(&self) -> bool {
        self.access_token.is_none()
    }

    pub fn sanitized(mut self) -> Self {
        if self.username.trim().is_empty() {
            self.username = DEFAULT_USERNAME.into();
        }
        if self
            .access_token
            .as_deref()
            .is_some_and(|token| token.trim().is_empty())
        {
            self.access_token = None;
        }
        self
    }
}
