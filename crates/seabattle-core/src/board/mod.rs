//! Board model: coordinates, fleet layout and plaintext damage bookkeeping.
//!
//! A board is built exactly once (random placement, manual placement through
//! [`FleetBuilder`], or an explicit layout). After that its cells never change;
//! only the hit counters of its ships and the set of targeted coordinates do.

mod placement;
mod ship;

pub use placement::{place_random, FleetBuilder, PlacementProgress, MAX_PLACEMENT_ATTEMPTS};
pub use ship::{PlacedShip, ShipClass};

use crate::error::BoardError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Width and height of the grid
pub const BOARD_SIZE: u8 = 10;

/// Number of cells on the grid
pub const CELL_COUNT: usize = (BOARD_SIZE as usize) * (BOARD_SIZE as usize);

/// A cell on the grid, `x` is the column and `y` the row
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "(u8, u8)", try_from = "(i32, i32)")]
pub struct Coordinate {
    pub x: u8,
    pub y: u8,
}

impl Coordinate {
    /// Validate raw input against the grid bounds
    pub fn new(x: i32, y: i32) -> Result<Self, BoardError> {
        let size = BOARD_SIZE as i32;
        if !(0..size).contains(&x) || !(0..size).contains(&y) {
            return Err(BoardError::OutOfBounds { x, y });
        }
        Ok(Self {
            x: x as u8,
            y: y as u8,
        })
    }

    /// Row-major index into a flat grid
    pub fn index(&self) -> usize {
        self.y as usize * BOARD_SIZE as usize + self.x as usize
    }

    /// Every coordinate of the grid in row-major order
    pub fn all() -> impl Iterator<Item = Coordinate> {
        (0..BOARD_SIZE).flat_map(|y| (0..BOARD_SIZE).map(move |x| Coordinate { x, y }))
    }

    /// Step `delta` cells along `orientation`, `None` when that leaves the grid
    pub fn step(&self, orientation: Orientation, delta: i32) -> Option<Coordinate> {
        match orientation {
            Orientation::Horizontal => Coordinate::new(self.x as i32 + delta, self.y as i32).ok(),
            Orientation::Vertical => Coordinate::new(self.x as i32, self.y as i32 + delta).ok(),
        }
    }

    fn along(&self, orientation: Orientation) -> u8 {
        match orientation {
            Orientation::Horizontal => self.x,
            Orientation::Vertical => self.y,
        }
    }
}

impl From<Coordinate> for (u8, u8) {
    fn from(c: Coordinate) -> Self {
        (c.x, c.y)
    }
}

impl TryFrom<(i32, i32)> for Coordinate {
    type Error = BoardError;

    fn try_from((x, y): (i32, i32)) -> Result<Self, Self::Error> {
        Coordinate::new(x, y)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Direction a ship runs in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    /// Same row, consecutive columns
    Horizontal,
    /// Same column, consecutive rows
    Vertical,
}

impl Orientation {
    /// Orientation shared by two cells, if they share a row or column
    pub fn between(a: Coordinate, b: Coordinate) -> Option<Orientation> {
        if a == b {
            None
        } else if a.y == b.y {
            Some(Orientation::Horizontal)
        } else if a.x == b.x {
            Some(Orientation::Vertical)
        } else {
            None
        }
    }

    /// Whether `c` lies on the line through `origin` in this orientation
    pub fn aligned(&self, origin: Coordinate, c: Coordinate) -> bool {
        match self {
            Orientation::Horizontal => origin.y == c.y,
            Orientation::Vertical => origin.x == c.x,
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Horizontal => write!(f, "horizontal"),
            Orientation::Vertical => write!(f, "vertical"),
        }
    }
}

/// The `length` cells starting at `start`, `None` if the run leaves the grid
pub fn run(start: Coordinate, orientation: Orientation, length: u8) -> Option<Vec<Coordinate>> {
    (0..length as i32)
        .map(|i| start.step(orientation, i))
        .collect()
}

/// Check that `cells` form a gap-free straight run of exactly `class.length()`
pub fn validate_run(class: ShipClass, cells: &[Coordinate]) -> Result<Orientation, BoardError> {
    let invalid = |reason: &str| BoardError::InvalidShip {
        ship: class,
        reason: reason.to_string(),
    };

    if cells.len() != class.length() as usize {
        return Err(invalid(&format!(
            "expected {} cells, got {}",
            class.length(),
            cells.len()
        )));
    }

    let orientation =
        Orientation::between(cells[0], cells[1]).ok_or_else(|| invalid("cells not in a line"))?;
    if !cells.iter().all(|c| orientation.aligned(cells[0], *c)) {
        return Err(invalid("cells not in a line"));
    }

    let mut along: Vec<u8> = cells.iter().map(|c| c.along(orientation)).collect();
    along.sort_unstable();
    if along.windows(2).any(|w| w[1] != w[0] + 1) {
        return Err(invalid("cells not contiguous"));
    }

    Ok(orientation)
}

/// What a resolved strike did to the board
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrikeEffect {
    pub hit: bool,
    /// Ship that reached its length with this strike
    pub sunk: Option<ShipClass>,
    pub fleet_destroyed: bool,
    /// The coordinate had been struck before, nothing changed
    pub repeated: bool,
}

/// One player's grid, fleet and the coordinates attacked so far
#[derive(Clone, Debug)]
pub struct Board {
    cells: [u8; CELL_COUNT],
    ships: Vec<PlacedShip>,
    guesses: BTreeSet<Coordinate>,
}

impl Board {
    pub(crate) fn empty() -> Self {
        Self {
            cells: [0; CELL_COUNT],
            ships: Vec::new(),
            guesses: BTreeSet::new(),
        }
    }

    /// Random placement of the full fleet
    pub fn random<R: rand::Rng + ?Sized>(rng: &mut R) -> Result<Self, BoardError> {
        place_random(rng)
    }

    /// Build a board from explicit ship positions.
    ///
    /// Each class may appear at most once; a board with only part of the fleet
    /// is valid (see [`Board::is_full_fleet`]).
    pub fn from_layout<I>(layout: I) -> Result<Self, BoardError>
    where
        I: IntoIterator<Item = (ShipClass, Vec<Coordinate>)>,
    {
        let mut board = Board::empty();
        for (class, cells) in layout {
            if board.ships.iter().any(|s| s.class() == class) {
                return Err(BoardError::DuplicateShip { ship: class });
            }
            validate_run(class, &cells)?;
            if let Some(c) = cells.iter().find(|c| board.has_ship(**c)) {
                return Err(BoardError::Overlap { coordinate: *c });
            }
            board.push_ship(class, cells);
        }
        if board.ships.is_empty() {
            return Err(BoardError::EmptyFleet);
        }
        Ok(board)
    }

    /// Caller has already validated the run and checked for overlap.
    pub(crate) fn push_ship(&mut self, class: ShipClass, cells: Vec<Coordinate>) {
        for c in &cells {
            self.cells[c.index()] = 1;
        }
        self.ships.push(PlacedShip::new(class, cells));
    }

    /// 1 for ship, 0 for water
    pub fn cell(&self, coordinate: Coordinate) -> u8 {
        self.cells[coordinate.index()]
    }

    pub fn has_ship(&self, coordinate: Coordinate) -> bool {
        self.cell(coordinate) == 1
    }

    pub fn ships(&self) -> &[PlacedShip] {
        &self.ships
    }

    pub fn ship_at(&self, coordinate: Coordinate) -> Option<&PlacedShip> {
        self.ships.iter().find(|s| s.occupies(coordinate))
    }

    pub fn is_full_fleet(&self) -> bool {
        ShipClass::FLEET
            .iter()
            .all(|class| self.ships.iter().any(|s| s.class() == *class))
    }

    pub fn was_targeted(&self, coordinate: Coordinate) -> bool {
        self.guesses.contains(&coordinate)
    }

    pub fn guesses(&self) -> impl Iterator<Item = &Coordinate> {
        self.guesses.iter()
    }

    pub fn all_sunk(&self) -> bool {
        self.ships.iter().all(PlacedShip::is_sunk)
    }

    /// Record a strike at `coordinate`.
    ///
    /// A coordinate already in the guess set is reported as `repeated` and
    /// never scores a second hit.
    pub fn record_strike(&mut self, coordinate: Coordinate) -> StrikeEffect {
        let hit = self.has_ship(coordinate);
        if !self.guesses.insert(coordinate) {
            return StrikeEffect {
                hit,
                sunk: None,
                fleet_destroyed: self.all_sunk(),
                repeated: true,
            };
        }

        let mut sunk = None;
        if let Some(ship) = self.ships.iter_mut().find(|s| s.occupies(coordinate)) {
            ship.record_hit();
            if ship.is_sunk() {
                sunk = Some(ship.class());
            }
        }

        StrikeEffect {
            hit,
            sunk,
            fleet_destroyed: self.all_sunk(),
            repeated: false,
        }
    }

    /// Ship positions ordered by fleet catalog
    pub fn layout(&self) -> Vec<(ShipClass, Vec<Coordinate>)> {
        let mut layout: Vec<_> = self
            .ships
            .iter()
            .map(|s| {
                let mut cells = s.cells().to_vec();
                cells.sort();
                (s.class(), cells)
            })
            .collect();
        layout.sort_by_key(|(class, _)| *class);
        layout
    }

    /// Canonical byte encoding of the layout, used for commitments
    pub fn layout_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(ShipClass::fleet_cells() * 2 + 10);
        for (class, cells) in self.layout() {
            bytes.push(class.id());
            bytes.push(cells.len() as u8);
            for c in cells {
                bytes.push(c.x);
                bytes.push(c.y);
            }
        }
        bytes
    }

    /// Plaintext grid for the owner's eyes only
    pub fn render_plain(&self) -> String {
        let mut out = String::from("   ");
        for x in 0..BOARD_SIZE {
            out.push_str(&format!(" {}", x));
        }
        out.push('\n');
        for y in 0..BOARD_SIZE {
            out.push_str(&format!("{:2}:", y));
            for x in 0..BOARD_SIZE {
                let c = Coordinate { x, y };
                let glyph = match (self.has_ship(c), self.was_targeted(c)) {
                    (true, true) => 'X',
                    (true, false) => '#',
                    (false, true) => 'o',
                    (false, false) => '.',
                };
                out.push(' ');
                out.push(glyph);
            }
            out.push('\n');
        }
        out
    }
}
