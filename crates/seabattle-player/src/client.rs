//! HTTP client for the relay and for the opponent's service.

use reqwest::{Client, Response, StatusCode};
use seabattle_core::protocol::{
    AttackEnvelope, BoardReveal, MatchStarted, RelayTranscript, SeatRequest,
};
use seabattle_core::{MatchId, Player};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{status}: {message}")]
    Rejected { status: StatusCode, message: String },
}

#[derive(Deserialize)]
struct CreatedMatch {
    match_id: MatchId,
}

#[derive(Deserialize)]
struct SeatedReply {
    started: Option<MatchStarted>,
}

/// Talks to one relay
#[derive(Clone, Debug)]
pub struct RelayClient {
    base_url: String,
    http: Client,
}

impl RelayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn create_match(&self) -> Result<MatchId, ClientError> {
        let url = format!("{}/api/match", self.base_url);
        let created: CreatedMatch = read(self.http.post(&url).send().await?).await?;
        Ok(created.match_id)
    }

    /// Take a seat with public material only. Returns the start notice when
    /// this seat completed the table.
    pub async fn join(
        &self,
        match_id: MatchId,
        request: &SeatRequest,
    ) -> Result<Option<MatchStarted>, ClientError> {
        let url = format!("{}/api/match/{}/join", self.base_url, match_id);
        let reply: SeatedReply = read(self.http.post(&url).json(request).send().await?).await?;
        Ok(reply.started)
    }

    /// Rejected attacks come back as error envelopes, not as `Err`.
    pub async fn attack(
        &self,
        match_id: MatchId,
        player: Player,
        x: i32,
        y: i32,
    ) -> Result<AttackEnvelope, ClientError> {
        let url = format!("{}/api/match/{}/attack", self.base_url, match_id);
        let body = serde_json::json!({ "player": player, "x": x, "y": y });
        let response = self.http.post(&url).json(&body).send().await?;

        if response.status() == StatusCode::BAD_REQUEST {
            let text = response.text().await?;
            return serde_json::from_str(&text).map_err(|_| ClientError::Rejected {
                status: StatusCode::BAD_REQUEST,
                message: error_message(&text),
            });
        }
        read(response).await
    }

    pub async fn transcript(&self, match_id: MatchId) -> Result<RelayTranscript, ClientError> {
        let url = format!("{}/api/match/{}/transcript", self.base_url, match_id);
        read(self.http.get(&url).send().await?).await
    }

    /// Ask a player service to open its board. It only does so once the
    /// match has concluded.
    pub async fn fetch_reveal(&self, endpoint: &str) -> Result<BoardReveal, ClientError> {
        let url = format!("{}/api/reveal", endpoint.trim_end_matches('/'));
        read(self.http.get(&url).send().await?).await
    }
}

async fn read<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }
    let text = response.text().await.unwrap_or_default();
    Err(ClientError::Rejected {
        status,
        message: error_message(&text),
    })
}

/// The `error` field of a JSON error body, or the raw body
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
