use base64::Engine;
use reqwest::blocking::{RequestBuilder, Response};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::SpotifyConfig;
use crate::error::ClientError;
use crate::models::CandidateResult;
use crate::sources::{CatalogSearch, PlaylistService};

const ACCOUNTS_URL: &str = "https://accounts.spotify.com";
const API_URL: &str = "https://api.spotify.com/v1";

/// Scope needed to create and fill public playlists.
pub const PLAYLIST_SCOPE: &str = "playlist-modify-public";

/// Maximum number of items Spotify accepts per append request.
const APPEND_BATCH_SIZE: usize = 100;

pub struct SpotifyClient {
    client: reqwest::blocking::Client,
    access_token: String,
    refresh_token: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
}

#[derive(Deserialize)]
struct SearchResponse {
    tracks: TracksResult,
}

#[derive(Deserialize)]
struct TracksResult {
    items: Vec<SpotifyTrack>,
}

#[derive(Deserialize)]
struct SpotifyTrack {
    id: String,
    name: String,
    artists: Vec<SpotifyArtist>,
}

#[derive(Deserialize)]
struct SpotifyArtist {
    name: String,
}

#[derive(Deserialize)]
struct UserResponse {
    id: String,
}

#[derive(Deserialize)]
struct PlaylistResponse {
    id: String,
    external_urls: Option<ExternalUrls>,
}

#[derive(Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

struct Credentials<'a> {
    client_id: &'a str,
    client_secret: &'a str,
}

impl<'a> Credentials<'a> {
    fn from_config(config: &'a SpotifyConfig) -> Result<Self, ClientError> {
        let client_id = config
            .client_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ClientError::Auth("Spotify client_id is not set".to_string()))?;
        let client_secret = config
            .client_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ClientError::Auth("Spotify client_secret is not set".to_string()))?;
        Ok(Self {
            client_id,
            client_secret,
        })
    }

    fn basic_header(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", self.client_id, self.client_secret));
        format!("Basic {}", encoded)
    }
}

impl SpotifyClient {
    /// App-only session via the client-credentials grant. Enough for search.
    pub fn new(config: &SpotifyConfig) -> Result<Self, ClientError> {
        let credentials = Credentials::from_config(config)?;
        let client = reqwest::blocking::Client::new();
        let token = Self::request_token(
            &client,
            &credentials,
            &[("grant_type", "client_credentials")],
        )?;

        Ok(Self {
            client,
            access_token: token.access_token,
            refresh_token: None,
        })
    }

    /// User session from an authorization code returned to the redirect URI.
    pub fn from_authorization_code(
        config: &SpotifyConfig,
        code: &str,
    ) -> Result<Self, ClientError> {
        let credentials = Credentials::from_config(config)?;
        let client = reqwest::blocking::Client::new();
        let token = Self::request_token(
            &client,
            &credentials,
            &[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", config.redirect_uri()),
            ],
        )?;

        Ok(Self {
            client,
            access_token: token.access_token,
            refresh_token: token.refresh_token,
        })
    }

    /// User session from a cached refresh token.
    pub fn from_refresh_token(
        config: &SpotifyConfig,
        refresh_token: &str,
    ) -> Result<Self, ClientError> {
        let credentials = Credentials::from_config(config)?;
        let client = reqwest::blocking::Client::new();
        let token = Self::request_token(
            &client,
            &credentials,
            &[("grant_type", "refresh_token"), ("refresh_token", refresh_token)],
        )?;

        Ok(Self {
            client,
            access_token: token.access_token,
            // Spotify may or may not rotate the refresh token.
            refresh_token: Some(
                token
                    .refresh_token
                    .unwrap_or_else(|| refresh_token.to_string()),
            ),
        })
    }

    /// URL the user opens to grant playlist access.
    pub fn authorize_url(config: &SpotifyConfig) -> Result<Url, ClientError> {
        let credentials = Credentials::from_config(config)?;
        Url::parse_with_params(
            &format!("{ACCOUNTS_URL}/authorize"),
            &[
                ("client_id", credentials.client_id),
                ("response_type", "code"),
                ("redirect_uri", config.redirect_uri()),
                ("scope", PLAYLIST_SCOPE),
            ],
        )
        .map_err(|e| ClientError::Auth(e.to_string()))
    }

    /// Pull the `code` parameter out of the URL the browser was redirected to.
    pub fn code_from_redirect(redirected: &str) -> Result<String, ClientError> {
        let url = Url::parse(redirected.trim())
            .map_err(|e| ClientError::Auth(format!("invalid redirect URL: {e}")))?;
        let mut code = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => code = Some(value.into_owned()),
                "error" => return Err(ClientError::Auth(value.into_owned())),
                _ => {}
            }
        }
        code.ok_or_else(|| ClientError::Auth("redirect URL has no code parameter".to_string()))
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    fn request_token(
        client: &reqwest::blocking::Client,
        credentials: &Credentials<'_>,
        form: &[(&str, &str)],
    ) -> Result<TokenResponse, ClientError> {
        let resp = client
            .post(format!("{ACCOUNTS_URL}/api/token"))
            .header("Authorization", credentials.basic_header())
            .form(form)
            .send()?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().unwrap_or_default();
            return Err(ClientError::Auth(format!(
                "token request rejected ({status}): {body}"
            )));
        }
        Ok(resp.json()?)
    }

    fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let body = self.send_raw(request)?;
        serde_json::from_str(&body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    /// Authorized request returning the body of a successful response.
    fn send_raw(&self, request: RequestBuilder) -> Result<String, ClientError> {
        let resp = request.bearer_auth(&self.access_token).send()?;
        checked_body(resp)
    }

    fn convert_track(track: SpotifyTrack) -> CandidateResult {
        CandidateResult {
            track_name: track.name,
            artists: track.artists.into_iter().map(|a| a.name).collect(),
            catalog_id: track.id,
        }
    }
}

fn checked_body(resp: Response) -> Result<String, ClientError> {
    let status = resp.status();
    let body = resp.text()?;
    if !status.is_success() {
        return Err(ClientError::Api {
            status: status.as_u16(),
            message: api_error_message(&body),
        });
    }
    Ok(body)
}

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.to_string())
}

fn parse_search_response(body: &str) -> Result<Vec<CandidateResult>, ClientError> {
    let resp: SearchResponse = serde_json::from_str(body)
        .map_err(|e| ClientError::InvalidResponse(format!("search response: {e}")))?;
    Ok(resp
        .tracks
        .items
        .into_iter()
        .map(SpotifyClient::convert_track)
        .collect())
}

fn track_uri(id: &str) -> String {
    if id.starts_with("spotify:track:") {
        id.to_string()
    } else {
        format!("spotify:track:{id}")
    }
}

impl CatalogSearch for SpotifyClient {
    fn search(&self, query: &str, limit: usize) -> Result<Vec<CandidateResult>, ClientError> {
        debug!(query, limit, "searching Spotify");
        let limit = limit.to_string();
        let body = self.send_raw(self.client.get(format!("{API_URL}/search")).query(&[
            ("q", query),
            ("type", "track"),
            ("limit", limit.as_str()),
            ("offset", "0"),
        ]))?;
        parse_search_response(&body)
    }
}

impl PlaylistService for SpotifyClient {
    fn current_user_id(&self) -> Result<String, ClientError> {
        let user: UserResponse = self.send(self.client.get(format!("{API_URL}/me")))?;
        Ok(user.id)
    }

    fn create_playlist(
        &self,
        owner_id: &str,
        title: &str,
    ) -> Result<(String, Option<String>), ClientError> {
        debug!(owner_id, title, "creating Spotify playlist");
        let playlist: PlaylistResponse = self.send(
            self.client
                .post(format!("{API_URL}/users/{owner_id}/playlists"))
                .json(&json!({ "name": title, "public": true })),
        )?;
        let url = playlist.external_urls.and_then(|u| u.spotify);
        Ok((playlist.id, url))
    }

    fn append_items(&self, playlist_id: &str, track_ids: &[String]) -> Result<(), ClientError> {
        for batch in track_ids.chunks(APPEND_BATCH_SIZE) {
            let uris: Vec<String> = batch.iter().map(|id| track_uri(id)).collect();
            debug!(playlist_id, count = uris.len(), "adding tracks to playlist");
            let _: serde_json::Value = self.send(
                self.client
                    .post(format!("{API_URL}/playlists/{playlist_id}/tracks"))
                    .json(&json!({ "uris": uris })),
            )?;
        }
        Ok(())
    }
}
