//! A defender that lives in the player's own service.
//!
//! The relay keeps only the public material a player sent when taking the
//! seat. Every query, strike and damage report is a request to the player's
//! `/api/defender` routes, so decryption never happens in the relay.

use reqwest::{Client, RequestBuilder};
use seabattle_core::board::StrikeEffect;
use seabattle_core::crypto::{BlindedQuery, BoardCommitment, EncryptedBoard};
use seabattle_core::protocol::{FleetSummary, HitAnswer, StrikeRequest};
use seabattle_core::{Coordinate, Defender, DefenderError, Player};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::fmt;
use tokio::runtime::Handle;

/// Reached over HTTP. The [`Defender`] methods block on the request, so the
/// arbiter holding this must be driven from `spawn_blocking`.
pub struct RemoteDefender {
    endpoint: String,
    http: Client,
    runtime: Handle,
    snapshot: EncryptedBoard,
    commitment: BoardCommitment,
    targeted: HashSet<Coordinate>,
}

impl RemoteDefender {
    pub fn new(
        endpoint: impl Into<String>,
        snapshot: EncryptedBoard,
        commitment: BoardCommitment,
        http: Client,
        runtime: Handle,
    ) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            http,
            runtime,
            snapshot,
            commitment,
            targeted: HashSet::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/defender/{}", self.endpoint, path)
    }

    fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, DefenderError> {
        self.runtime.block_on(async {
            let response = request.send().await.map_err(|e| self.unavailable(e))?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(DefenderError::Unavailable(format!(
                    "{} answered {}: {}",
                    self.endpoint, status, body
                )));
            }
            response.json().await.map_err(|e| self.unavailable(e))
        })
    }

    fn unavailable(&self, e: reqwest::Error) -> DefenderError {
        DefenderError::Unavailable(format!("{}: {}", self.endpoint, e))
    }
}

impl Defender for RemoteDefender {
    fn snapshot(&self) -> &EncryptedBoard {
        &self.snapshot
    }

    fn commitment(&self) -> BoardCommitment {
        self.commitment
    }

    fn was_targeted(&self, coordinate: Coordinate) -> bool {
        self.targeted.contains(&coordinate)
    }

    fn answer(&self, query: &BlindedQuery) -> Result<bool, DefenderError> {
        let request = self.http.post(self.url("answer")).json(query);
        let answer: HitAnswer = self.call(request)?;
        Ok(answer.hit)
    }

    fn record_strike(
        &mut self,
        coordinate: Coordinate,
        is_hit: bool,
    ) -> Result<StrikeEffect, DefenderError> {
        let request = self.http.post(self.url("strike")).json(&StrikeRequest {
            coordinate,
            hit: is_hit,
        });
        let effect: StrikeEffect = self.call(request)?;
        if effect.hit != is_hit || effect.repeated {
            return Err(DefenderError::InconsistentAnswer { coordinate });
        }
        self.targeted.insert(coordinate);
        Ok(effect)
    }

    fn fleet_summary(&self, player: Player) -> Result<FleetSummary, DefenderError> {
        let summary: FleetSummary = self.call(self.http.get(self.url("fleet")))?;
        if summary.player != player {
            return Err(DefenderError::Unavailable(format!(
                "{} reports for {}, seated as {}",
                self.endpoint, summary.player, player
            )));
        }
        Ok(summary)
    }
}

impl fmt::Debug for RemoteDefender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteDefender")
            .field("endpoint", &self.endpoint)
            .field("commitment", &self.commitment)
            .field("targeted", &self.targeted.len())
            .finish_non_exhaustive()
    }
}
