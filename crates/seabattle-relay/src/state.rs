//! Application state management.

use seabattle_core::protocol::{MatchStarted, MatchTranscript, RelayTranscript};
use seabattle_core::{Arbiter, Defender, GameError, MatchId, Phase, Player};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::remote::RemoteDefender;

/// A match and where to reach each seated player
pub struct MatchRoom<D> {
    arbiter: Arbiter<D>,
    endpoints: BTreeMap<Player, String>,
}

impl<D: Defender> MatchRoom<D> {
    pub fn new(arbiter: Arbiter<D>) -> Self {
        Self {
            arbiter,
            endpoints: BTreeMap::new(),
        }
    }

    pub fn arbiter(&self) -> &Arbiter<D> {
        &self.arbiter
    }

    pub fn arbiter_mut(&mut self) -> &mut Arbiter<D> {
        &mut self.arbiter
    }

    pub fn seat(
        &mut self,
        player: Player,
        endpoint: String,
        defender: D,
    ) -> Result<Option<MatchStarted>, GameError> {
        let started = self.arbiter.seat(player, defender)?;
        self.endpoints.insert(player, endpoint);
        Ok(started)
    }

    pub fn transcript(&self) -> RelayTranscript {
        let transcript: MatchTranscript = self.arbiter.transcript();
        RelayTranscript {
            transcript,
            endpoints: self.endpoints.clone(),
        }
    }
}

pub type SharedMatch<D = RemoteDefender> = Arc<Mutex<MatchRoom<D>>>;

struct Slot<D> {
    room: SharedMatch<D>,
    created: Instant,
}

/// Shared application state
pub struct AppState<D = RemoteDefender> {
    /// Held only long enough to find, add or drop a match
    matches: Arc<RwLock<HashMap<MatchId, Slot<D>>>>,
    max_matches: usize,
    match_ttl: Duration,
    min_key_bits: u64,
    http: reqwest::Client,
}

impl<D> Clone for AppState<D> {
    fn clone(&self) -> Self {
        Self {
            matches: Arc::clone(&self.matches),
            max_matches: self.max_matches,
            match_ttl: self.match_ttl,
            min_key_bits: self.min_key_bits,
            http: self.http.clone(),
        }
    }
}

impl<D: Defender> AppState<D> {
    pub fn new(config: &Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            matches: Arc::new(RwLock::new(HashMap::new())),
            max_matches: config.max_matches,
            match_ttl: config.match_ttl,
            min_key_bits: config.min_key_bits,
            http,
        }
    }

    pub fn min_key_bits(&self) -> u64 {
        self.min_key_bits
    }

    /// Client the relay uses to reach player services
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Store a new match, first dropping expired ones.
    ///
    /// When the relay is still full, concluded matches make room. Returns
    /// `None` if every remaining match is live.
    pub fn insert(&self, arbiter: Arbiter<D>) -> Option<MatchId> {
        let id = arbiter.match_id();
        let mut matches = self.matches.write().unwrap_or_else(PoisonError::into_inner);

        let before = matches.len();
        let ttl = self.match_ttl;
        matches.retain(|_, slot| slot.created.elapsed() < ttl);

        if matches.len() >= self.max_matches {
            // A room locked right now is mid-attack, so not concluded
            matches.retain(|_, slot| match slot.room.try_lock() {
                Ok(room) => room.arbiter.phase() != Phase::Concluded,
                Err(_) => true,
            });
        }
        let evicted = before - matches.len();
        if evicted > 0 {
            tracing::info!("Evicted {} match(es), {} remain", evicted, matches.len());
        }

        if matches.len() >= self.max_matches {
            tracing::warn!("Relay full with {} live matches", matches.len());
            return None;
        }
        matches.insert(
            id,
            Slot {
                room: Arc::new(Mutex::new(MatchRoom::new(arbiter))),
                created: Instant::now(),
            },
        );
        Some(id)
    }

    pub fn get(&self, id: &MatchId) -> Option<SharedMatch<D>> {
        self.matches
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .map(|slot| Arc::clone(&slot.room))
    }

    pub fn match_count(&self) -> usize {
        self.matches
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Exclusive access to one match; attacks on it are serialized here.
pub fn lock<D>(room: &SharedMatch<D>) -> MutexGuard<'_, MatchRoom<D>> {
    room.lock().unwrap_or_else(PoisonError::into_inner)
}
