//! Spotify Web API client.
//!
//! Uses the client-credentials flow. The token is fetched on first use, cached
//! until shortly before it expires, and can be renewed with `refresh`.

use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

use super::{
    AlbumObject, ArtistObject, AudioFeaturesObject, AudioFeaturesResponse, CatalogApi, Paging,
    SearchResponse, TrackObject, FEATURE_BATCH_SIZE, MAX_PAGE_LIMIT,
};
use crate::error::{ApiError, ApiResult};
use crate::models::EntityKind;

pub const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const API_BASE: &str = "https://api.spotify.com/v1";

/// Renew this long before the token's stated expiry.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub client_id: String,
    pub client_secret: String,
    pub api_base: String,
    pub token_url: String,
}

impl ClientConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            api_base: API_BASE.to_string(),
            token_url: TOKEN_URL.to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Clone, Debug)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    /// Expiry is pulled in by `TOKEN_EXPIRY_MARGIN`.
    fn from_response(body: TokenResponse, now: Instant) -> Self {
        let lifetime = Duration::from_secs(body.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        Self {
            access_token: body.access_token,
            expires_at: now + lifetime,
        }
    }

    fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Owned API handle. Pass it by reference; there is no global instance.
pub struct SpotifyClient {
    http: Client,
    config: ClientConfig,
    token: RwLock<Option<CachedToken>>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

impl SpotifyClient {
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        if config.client_id.trim().is_empty() || config.client_secret.trim().is_empty() {
            return Err(ApiError::MissingCredentials);
        }
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("tune-radar/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            config,
            token: RwLock::new(None),
        })
    }

    /// Cached token, fetching one if none is held or the held one is stale.
    pub async fn access_token(&self) -> ApiResult<String> {
        {
            let guard = self.token.read().await;
            if let Some(ref t) = *guard {
                if t.is_fresh(Instant::now()) {
                    return Ok(t.access_token.clone());
                }
            }
        }

        let mut guard = self.token.write().await;
        // Another request may have renewed it while we waited for the lock
        if let Some(ref t) = *guard {
            if t.is_fresh(Instant::now()) {
                return Ok(t.access_token.clone());
            }
        }
        let token = self.fetch_token().await?;
        let access = token.access_token.clone();
        *guard = Some(token);
        Ok(access)
    }

    /// Unconditionally fetch a new token and replace the cached one.
    pub async fn refresh(&self) -> ApiResult<String> {
        let mut guard = self.token.write().await;
        let token = self.fetch_token().await?;
        let access = token.access_token.clone();
        *guard = Some(token);
        Ok(access)
    }

    async fn fetch_token(&self) -> ApiResult<CachedToken> {
        let auth = base64::engine::general_purpose::STANDARD.encode(
            format!("{}:{}", self.config.client_id, self.config.client_secret).as_bytes(),
        );

        debug!(url = %self.config.token_url, "requesting access token");
        let res = self
            .http
            .post(&self.config.token_url)
            .header("Authorization", format!("Basic {}", auth))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = res.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: TokenResponse = serde_json::from_str(&res.text().await?)?;
        Ok(CachedToken::from_response(body, Instant::now()))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> ApiResult<T> {
        let token = self.access_token().await?;
        debug!(%url, "GET");

        let res = self.http.get(url).bearer_auth(token).send().await?;
        let status = res.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&res.text().await?)?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base, path)
    }
}

/// Build the search URL path and query string.
fn search_path(query: &str, kinds: &[EntityKind], market: Option<&str>, limit: u32) -> String {
    let types: Vec<&str> = kinds.iter().map(|k| k.as_str()).collect();
    let mut path = format!(
        "/search?q={}&type={}&limit={}",
        urlencoding::encode(query),
        types.join(","),
        limit.clamp(1, MAX_PAGE_LIMIT)
    );
    if let Some(market) = market {
        path.push_str("&market=");
        path.push_str(&urlencoding::encode(market));
    }
    path
}

#[async_trait]
impl CatalogApi for SpotifyClient {
    async fn search(
        &self,
        query: &str,
        kinds: &[EntityKind],
        market: Option<&str>,
        limit: u32,
    ) -> ApiResult<SearchResponse> {
        self.get_json(&self.url(&search_path(query, kinds, market, limit)))
            .await
    }

    async fn artist(&self, id: &str) -> ApiResult<ArtistObject> {
        self.get_json(&self.url(&format!("/artists/{}", urlencoding::encode(id))))
            .await
    }

    async fn album(&self, id: &str) -> ApiResult<AlbumObject> {
        self.get_json(&self.url(&format!("/albums/{}", urlencoding::encode(id))))
            .await
    }

    async fn artist_albums(
        &self,
        artist_id: &str,
        cursor: Option<&str>,
    ) -> ApiResult<Paging<AlbumObject>> {
        let url = match cursor {
            Some(next) => next.to_string(),
            None => self.url(&format!(
                "/artists/{}/albums?include_groups=album,single&limit={}",
                urlencoding::encode(artist_id),
                MAX_PAGE_LIMIT
            )),
        };
        self.get_json(&url).await
    }

    async fn album_tracks(
        &self,
        album_id: &str,
        cursor: Option<&str>,
    ) -> ApiResult<Paging<TrackObject>> {
        let url = match cursor {
            Some(next) => next.to_string(),
            None => self.url(&format!(
                "/albums/{}/tracks?limit={}",
                urlencoding::encode(album_id),
                MAX_PAGE_LIMIT
            )),
        };
        self.get_json(&url).await
    }

    async fn audio_features(&self, ids: &[String]) -> ApiResult<Vec<Option<AudioFeaturesObject>>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let ids = &ids[..ids.len().min(FEATURE_BATCH_SIZE)];
        let url = self.url(&format!(
            "/audio-features?ids={}",
            urlencoding::encode(&ids.join(","))
        ));
        let body: AudioFeaturesResponse = self.get_json(&url).await?;
        Ok(body.audio_features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials() {
        let result = SpotifyClient::new(ClientConfig::new("", "secret"));
        assert!(matches!(result, Err(ApiError::MissingCredentials)));
    }

    #[test]
    fn test_search_path() {
        let path = search_path(
            "sgt. pepper's",
            &[EntityKind::Artist, EntityKind::Album],
            Some("US"),
            10,
        );
        assert_eq!(
            path,
            "/search?q=sgt.%20pepper%27s&type=artist,album&limit=10&market=US"
        );
        assert_eq!(
            search_path("x", &[EntityKind::Artist], None, 500),
            "/search?q=x&type=artist&limit=50"
        );
    }

    fn token(access_token: &str, expires_in: u64, now: Instant) -> CachedToken {
        CachedToken::from_response(
            TokenResponse {
                access_token: access_token.to_string(),
                expires_in,
            },
            now,
        )
    }

    #[test]
    fn test_token_expiry_margin() {
        let now = Instant::now();
        let t = token("abc", 3600, now);
        assert_eq!(t.expires_at, now + Duration::from_secs(3540));
        assert!(t.is_fresh(now + Duration::from_secs(3539)));
        assert!(!t.is_fresh(now + Duration::from_secs(3540)));

        // Lifetimes shorter than the margin are stale straight away
        assert!(!token("short", 30, now).is_fresh(now));
    }

    #[tokio::test]
    async fn test_access_token_uses_fresh_cache() {
        // Unroutable token endpoint: any fetch attempt would fail
        let config = ClientConfig {
            token_url: "http://127.0.0.1:0/token".to_string(),
            ..ClientConfig::new("id", "secret")
        };
        let client = SpotifyClient::new(config).unwrap();
        *client.token.write().await = Some(token("cached", 3600, Instant::now()));

        assert_eq!(client.access_token().await.unwrap(), "cached");
        assert_eq!(client.access_token().await.unwrap(), "cached");
    }

    #[tokio::test]
    async fn test_stale_token_is_not_reused() {
        let config = ClientConfig {
            token_url: "http://127.0.0.1:0/token".to_string(),
            ..ClientConfig::new("id", "secret")
        };
        let client = SpotifyClient::new(config).unwrap();
        *client.token.write().await = Some(token("stale", 10, Instant::now()));

        // A stale token forces a fetch, which fails here instead of handing back "stale"
        assert!(client.access_token().await.is_err());
        // refresh() always fetches, even over a fresh token
        *client.token.write().await = Some(token("fresh", 3600, Instant::now()));
        assert!(client.refresh().await.is_err());
        assert_eq!(client.access_token().await.unwrap(), "fresh");
    }

    #[test]
    fn test_api_base_trailing_slash() {
        let config = ClientConfig::new("id", "secret").with_api_base("http://localhost:8080/v1/");
        assert_eq!(config.api_base, "http://localhost:8080/v1");
    }
}
