//! Fleet catalog and placed ships.

use super::Coordinate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One entry of the fixed fleet catalog
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShipClass {
    Carrier,
    Battleship,
    Submarine,
    Destroyer,
    PatrolBoat,
}

impl ShipClass {
    /// Every player places exactly these ships, in this order
    pub const FLEET: [ShipClass; 5] = [
        ShipClass::Carrier,
        ShipClass::Battleship,
        ShipClass::Submarine,
        ShipClass::Destroyer,
        ShipClass::PatrolBoat,
    ];

    pub fn id(&self) -> u8 {
        match self {
            ShipClass::Carrier => 0,
            ShipClass::Battleship => 1,
            ShipClass::Submarine => 2,
            ShipClass::Destroyer => 3,
            ShipClass::PatrolBoat => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ShipClass::Carrier => "Aircraft Carrier",
            ShipClass::Battleship => "Battleship",
            ShipClass::Submarine => "Submarine",
            ShipClass::Destroyer => "Destroyer",
            ShipClass::PatrolBoat => "Patrol Boat",
        }
    }

    pub fn length(&self) -> u8 {
        match self {
            ShipClass::Carrier => 5,
            ShipClass::Battleship => 4,
            ShipClass::Submarine => 3,
            ShipClass::Destroyer | ShipClass::PatrolBoat => 2,
        }
    }

    /// Total number of ship cells in a full fleet
    pub fn fleet_cells() -> usize {
        Self::FLEET.iter().map(|c| c.length() as usize).sum()
    }
}

impl fmt::Display for ShipClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A ship on a board together with its damage counter
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacedShip {
    class: ShipClass,
    cells: Vec<Coordinate>,
    hits: u8,
}

impl PlacedShip {
    pub(crate) fn new(class: ShipClass, cells: Vec<Coordinate>) -> Self {
        Self {
            class,
            cells,
            hits: 0,
        }
    }

    pub fn class(&self) -> ShipClass {
        self.class
    }

    pub fn cells(&self) -> &[Coordinate] {
        &self.cells
    }

    pub fn hits(&self) -> u8 {
        self.hits
    }

    pub fn is_sunk(&self) -> bool {
        self.hits == self.class.length()
    }

    pub fn occupies(&self, coordinate: Coordinate) -> bool {
        self.cells.contains(&coordinate)
    }

    /// Counter saturates at the ship length.
    pub(crate) fn record_hit(&mut self) {
        if self.hits < self.class.length() {
            self.hits += 1;
        }
    }
}
