//! Protocol types.

use crate::board::{Coordinate, ShipClass};
use crate::error::GameError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique match identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(Uuid);

impl MatchId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

}

impl Default for MatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for MatchId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl fmt::Debug for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MatchId({})", self.0)
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One of the two seats at the table. Alice always moves first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Player {
    Alice,
    Bob,
}

impl Player {
    pub const ALL: [Player; 2] = [Player::Alice, Player::Bob];

    pub fn opponent(&self) -> Player {
        match self {
            Player::Alice => Player::Bob,
            Player::Bob => Player::Alice,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Player::Alice => "Alice",
            Player::Bob => "Bob",
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Player {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "alice" => Ok(Player::Alice),
            "bob" => Ok(Player::Bob),
            _ => Err(GameError::InvalidPlayerIdentity(s.to_string())),
        }
    }
}

/// How an attack was classified
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Hit,
    Miss,
    /// Coordinate was already targeted; nothing changed
    Duplicate,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Hit => "hit",
            Outcome::Miss => "miss",
            Outcome::Duplicate => "duplicate",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry of the append-only match history
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackRecord {
    /// Turn counter before this attack was applied
    pub turn: u32,
    pub attacker: Player,
    pub coordinate: Coordinate,
    pub outcome: Outcome,
    pub ship_sunk: Option<ShipClass>,
}

impl AttackRecord {
    pub fn defender(&self) -> Player {
        self.attacker.opponent()
    }

    pub fn is_hit(&self) -> bool {
        self.outcome == Outcome::Hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_id_generation() {
        assert_ne!(MatchId::new(), MatchId::new());
    }

    #[test]
    fn test_match_id_parse() {
        let id = MatchId::new();
        let parsed: MatchId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<MatchId>().is_err());
    }

    #[test]
    fn test_player_opponent() {
        assert_eq!(Player::Alice.opponent(), Player::Bob);
        assert_eq!(Player::Bob.opponent(), Player::Alice);
    }

    #[test]
    fn test_player_parse() {
        assert_eq!("Alice".parse::<Player>().unwrap(), Player::Alice);
        assert_eq!(" bob ".parse::<Player>().unwrap(), Player::Bob);
        assert_eq!(
            "Carol".parse::<Player>(),
            Err(GameError::InvalidPlayerIdentity("Carol".to_string()))
        );
    }

    #[test]
    fn test_record_serialization() {
        let record = AttackRecord {
            turn: 2,
            attacker: Player::Alice,
            coordinate: Coordinate::new(8, 9).unwrap(),
            outcome: Outcome::Hit,
            ship_sunk: Some(ShipClass::PatrolBoat),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["attacker"], "Alice");
        assert_eq!(json["coordinate"], serde_json::json!([8, 9]));
        assert_eq!(record.defender(), Player::Bob);
    }
}
