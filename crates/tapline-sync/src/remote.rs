//! # Remote Client
//!
//! The two outbound calls Tapline makes: the item listing and the login.
//!
//! ## Requests
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  fetch_items()                                                          │
//! │    GET {base_url}/v2/beers?per_page={page_size}                        │
//! │    200 [ {"name": "Punk Ipa", "tagline": "...", ...}, ... ]           │
//! │                                                                         │
//! │  submit_credential({username, password})                                │
//! │    POST {auth_url}   body: {"username": "..", "password": ".."}        │
//! │    200..=209  body: {"email", "id", "username"}                        │
//! │               header: Authorization: <token>                           │
//! │    otherwise  NetResponse::Error                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use tapline_core::Credential;

use crate::config::ApiSettings;
use crate::error::{SyncError, SyncResult};

// =============================================================================
// Wire Types
// =============================================================================

/// One entry of the item listing. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemResult {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub tagline: Option<String>,
}

impl ItemResult {
    pub fn named(name: impl Into<String>) -> Self {
        ItemResult {
            name: Some(name.into()),
            tagline: None,
        }
    }
}

/// Account details returned by a successful login. Every field is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAuthDto {
    pub email: String,
    pub id: i64,
    pub username: String,
}

/// Outcome of [`RemoteClient::submit_credential`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetResponse {
    Success { user: UserAuthDto, auth_token: String },
    Error { message: String },
}

// =============================================================================
// Remote Client Trait
// =============================================================================

/// Network collaborator of the use cases.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Fetches the item listing.
    async fn fetch_items(&self) -> SyncResult<Vec<ItemResult>>;

    /// Posts a credential. Transport failures are reported as
    /// [`NetResponse::Error`], never as a panic or `Err`.
    async fn submit_credential(&self, credential: &Credential) -> NetResponse;
}

// =============================================================================
// HTTP Implementation
// =============================================================================

/// [`RemoteClient`] over HTTPS with reqwest.
#[derive(Debug, Clone)]
pub struct HttpRemoteClient {
    client: Client,
    items_url: Url,
    auth_url: Url,
    timeout_secs: u64,
}

impl HttpRemoteClient {
    /// Builds the client and resolves both endpoint URLs.
    pub fn new(settings: &ApiSettings) -> SyncResult<Self> {
        let timeout = Duration::from_secs(settings.timeout_secs);
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::InvalidConfig(e.to_string()))?;

        let base = settings.base_url.trim_end_matches('/');
        let mut items_url = Url::parse(&format!("{}/v2/beers", base))
            .map_err(|e| SyncError::InvalidUrl(format!("{}: {}", settings.base_url, e)))?;
        items_url
            .query_pairs_mut()
            .append_pair("per_page", &settings.page_size.to_string());

        let auth_url = Url::parse(&settings.auth_url)
            .map_err(|e| SyncError::InvalidUrl(format!("{}: {}", settings.auth_url, e)))?;

        Ok(HttpRemoteClient {
            client,
            items_url,
            auth_url,
            timeout_secs: settings.timeout_secs,
        })
    }

    /// The fully resolved listing URL.
    pub fn items_url(&self) -> &Url {
        &self.items_url
    }

    fn is_auth_success(status: StatusCode) -> bool {
        (200..=209).contains(&status.as_u16())
    }
}

#[async_trait]
impl RemoteClient for HttpRemoteClient {
    async fn fetch_items(&self) -> SyncResult<Vec<ItemResult>> {
        debug!(url = %self.items_url, "Fetching items from network");

        let response = self
            .client
            .get(self.items_url.clone())
            .send()
            .await
            .map_err(|e| SyncError::from_reqwest(e, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.items_url.to_string(),
            });
        }

        let items: Vec<ItemResult> = response
            .json()
            .await
            .map_err(|e| SyncError::from_reqwest(e, self.timeout_secs))?;

        debug!(count = items.len(), "Fetched items");
        Ok(items)
    }

    async fn submit_credential(&self, credential: &Credential) -> NetResponse {
        debug!(username = %credential.username, "Submitting credential");

        let response = match self
            .client
            .post(self.auth_url.clone())
            .json(credential)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                let err = SyncError::from_reqwest(err, self.timeout_secs);
                warn!(error = %err, "Credential submission failed");
                return NetResponse::Error {
                    message: err.to_string(),
                };
            }
        };

        let status = response.status();
        if !Self::is_auth_success(status) {
            warn!(status = status.as_u16(), "Credential rejected");
            return NetResponse::Error {
                message: format!("Authentication failed with status {}", status.as_u16()),
            };
        }

        let auth_token = match response.headers().get(AUTHORIZATION).map(|v| v.to_str()) {
            Some(Ok(token)) => token.to_string(),
            Some(Err(_)) | None => {
                warn!("Authorization header missing from auth response");
                return NetResponse::Error {
                    message: "Authorization header missing from response".to_string(),
                };
            }
        };

        match response.json::<UserAuthDto>().await {
            Ok(user) => NetResponse::Success { user, auth_token },
            Err(err) => NetResponse::Error {
                message: SyncError::from_reqwest(err, self.timeout_secs).to_string(),
            },
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn settings_for(server: &MockServer) -> ApiSettings {
        ApiSettings {
            base_url: server.uri(),
            auth_url: format!("{}/api/v1/security/session", server.uri()),
            page_size: 80,
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_items_url_has_page_size() {
        let client = HttpRemoteClient::new(&ApiSettings::default()).unwrap();
        assert_eq!(
            client.items_url().as_str(),
            "https://api.punkapi.com/v2/beers?per_page=80"
        );
    }

    #[test]
    fn test_rejects_unparseable_url() {
        let settings = ApiSettings {
            auth_url: "not a url".to_string(),
            ..ApiSettings::default()
        };
        assert!(matches!(HttpRemoteClient::new(&settings), Err(SyncError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_fetch_items_decodes_leniently() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/beers"))
            .and(query_param("per_page", "80"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 1, "name": "weissbier", "tagline": "Wheat", "abv": 5.0},
                {"id": 2, "name": "Punk Ipa"},
                {"id": 3}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpRemoteClient::new(&settings_for(&server)).unwrap();
        let items = client.fetch_items().await.unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].name.as_deref(), Some("weissbier"));
        assert_eq!(items[0].tagline.as_deref(), Some("Wheat"));
        assert_eq!(items[1], ItemResult::named("Punk Ipa"));
        assert_eq!(items[2].name, None);
    }

    #[tokio::test]
    async fn test_fetch_items_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/beers"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = HttpRemoteClient::new(&settings_for(&server)).unwrap();
        let err = client.fetch_items().await.unwrap_err();

        assert!(matches!(err, SyncError::UnexpectedStatus { status: 500, .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_fetch_items_bad_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/beers"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = HttpRemoteClient::new(&settings_for(&server)).unwrap();
        let err = client.fetch_items().await.unwrap_err();
        assert!(matches!(err, SyncError::Deserialization(_)));
    }

    #[tokio::test]
    async fn test_submit_credential_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/security/session"))
            .and(body_json(serde_json::json!({"username": "kermit", "password": "hunter2"})))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("Authorization", "Bearer abc123")
                    .set_body_json(serde_json::json!({
                        "email": "kermit@example.com",
                        "id": 7,
                        "username": "kermit"
                    })),
            )
            .mount(&server)
            .await;

        let client = HttpRemoteClient::new(&settings_for(&server)).unwrap();
        let response = client
            .submit_credential(&Credential::new("kermit", "hunter2"))
            .await;

        assert_eq!(
            response,
            NetResponse::Success {
                user: UserAuthDto {
                    email: "kermit@example.com".to_string(),
                    id: 7,
                    username: "kermit".to_string(),
                },
                auth_token: "Bearer abc123".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_submit_credential_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/security/session"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = HttpRemoteClient::new(&settings_for(&server)).unwrap();
        let response = client.submit_credential(&Credential::new("kermit", "nope")).await;

        assert_eq!(
            response,
            NetResponse::Error {
                message: "Authentication failed with status 401".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_submit_credential_status_above_accepted_range() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(226)
                    .insert_header("Authorization", "Bearer abc123")
                    .set_body_json(serde_json::json!({"email": "", "id": 1, "username": "k"})),
            )
            .mount(&server)
            .await;

        let client = HttpRemoteClient::new(&settings_for(&server)).unwrap();
        let response = client.submit_credential(&Credential::new("k", "p")).await;
        assert!(matches!(response, NetResponse::Error { .. }));
    }

    #[tokio::test]
    async fn test_submit_credential_missing_identity_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/security/session"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Authorization", "Bearer abc123")
                    .set_body_json(serde_json::json!({"id": 7})),
            )
            .mount(&server)
            .await;

        let client = HttpRemoteClient::new(&settings_for(&server)).unwrap();
        let response = client.submit_credential(&Credential::new("kermit", "frog")).await;
        assert!(matches!(response, NetResponse::Error { .. }));
    }

    #[tokio::test]
    async fn test_submit_credential_unreachable() {
        let settings = ApiSettings {
            auth_url: "http://127.0.0.1:1/session".to_string(),
            timeout_secs: 2,
            ..ApiSettings::default()
        };
        let client = HttpRemoteClient::new(&settings).unwrap();

        let response = client.submit_credential(&Credential::new("k", "p")).await;
        assert!(matches!(response, NetResponse::Error { .. }));
    }
}
