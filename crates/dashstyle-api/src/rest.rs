// Host REST client
//
// Thin wrapper over `reqwest::Client` for the two REST endpoints the CLI
// uses outside a WebSocket session: the state listing and service calls.
// Every request carries the long-lived access token as a Bearer header.

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::protocol::HostState;
use crate::transport::{TransportConfig, api_url};

const PREVIEW_LEN: usize = 200;

pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
    token: SecretString,
}

impl RestClient {
    /// Create a client from a `TransportConfig`. `base_url` is the host
    /// root, e.g. `http://homeassistant.local:8123`.
    pub fn new(base_url: Url, token: SecretString, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, token))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, token: SecretString) -> Self {
        Self {
            http,
            base_url,
            token,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// `GET /api/states`
    pub async fn states(&self) -> Result<Vec<HostState>, Error> {
        let url = api_url(&self.base_url, "states")?;
        self.get(url).await
    }

    /// `GET /api/states/{entity_id}`. A 404 means the host does not know
    /// the entity.
    pub async fn state(&self, entity_id: &str) -> Result<Option<HostState>, Error> {
        let url = api_url(&self.base_url, &format!("states/{entity_id}"))?;
        match self.get(url).await {
            Ok(state) => Ok(Some(state)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// `POST /api/services/{domain}/{service}` targeting one entity.
    ///
    /// Returns the states the host reports as changed by the call.
    pub async fn call_service(
        &self,
        domain: &str,
        service: &str,
        entity_id: &str,
    ) -> Result<Vec<HostState>, Error> {
        let url = api_url(&self.base_url, &format!("services/{domain}/{service}"))?;
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .bearer_auth(self.token.expose_secret())
            .json(&json!({ "entity_id": entity_id }))
            .send()
            .await
            .map_err(Error::Transport)?;

        parse_response(resp).await
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .bearer_auth(self.token.expose_secret())
            .send()
            .await
            .map_err(Error::Transport)?;

        parse_response(resp).await
    }
}

/// Map the status code, then decode the JSON body.
async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(Error::Authentication {
            message: "access token rejected (HTTP 401)".into(),
        });
    }

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Http {
            status: status.as_u16(),
            message: preview(&body),
        });
    }

    let body = resp.text().await.map_err(Error::Transport)?;
    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(&body)),
        body,
    })
}

fn preview(body: &str) -> String {
    body.chars().take(PREVIEW_LEN).collect()
}
