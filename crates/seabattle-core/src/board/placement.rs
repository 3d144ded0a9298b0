//! Fleet placement: random search and the incremental manual validator.

use super::{run, Board, Coordinate, Orientation, ShipClass, BOARD_SIZE};
use crate::error::{BoardError, PlacementViolation};
use rand::Rng;

/// Candidate positions tried per ship before random placement gives up
pub const MAX_PLACEMENT_ATTEMPTS: usize = 100;

/// Place the full fleet at random, in catalog order.
///
/// Each ship gets [`MAX_PLACEMENT_ATTEMPTS`] candidates; running out is fatal
/// and no partially placed board is returned.
pub fn place_random<R: Rng + ?Sized>(rng: &mut R) -> Result<Board, BoardError> {
    let mut board = Board::empty();
    for class in ShipClass::FLEET {
        let cells = find_slot(&board, class, rng)?;
        board.push_ship(class, cells);
    }
    Ok(board)
}

fn find_slot<R: Rng + ?Sized>(
    board: &Board,
    class: ShipClass,
    rng: &mut R,
) -> Result<Vec<Coordinate>, BoardError> {
    let length = class.length();
    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        let orientation = if rng.gen_bool(0.5) {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        };
        let (x, y) = match orientation {
            Orientation::Horizontal => (
                rng.gen_range(0..=BOARD_SIZE - length),
                rng.gen_range(0..BOARD_SIZE),
            ),
            Orientation::Vertical => (
                rng.gen_range(0..BOARD_SIZE),
                rng.gen_range(0..=BOARD_SIZE - length),
            ),
        };
        let start = Coordinate { x, y };
        if let Some(cells) = run(start, orientation, length) {
            if cells.iter().all(|c| !board.has_ship(*c)) {
                return Ok(cells);
            }
        }
    }
    Err(BoardError::PlacementExhausted {
        ship: class,
        attempts: MAX_PLACEMENT_ATTEMPTS,
    })
}

/// Result of an accepted manual placement step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlacementProgress {
    /// Cell added, ship still needs `remaining` more
    CellAccepted { ship: ShipClass, remaining: u8 },
    /// Ship finished, the next ship in the catalog is up
    ShipPlaced(ShipClass),
    /// Last ship finished, call [`FleetBuilder::finish`]
    FleetPlaced,
}

/// Incremental manual placement, one coordinate at a time.
///
/// [`FleetBuilder::check`] is a pure validator; [`FleetBuilder::place`] only
/// mutates when the check passes.
#[derive(Clone, Debug)]
pub struct FleetBuilder {
    board: Board,
    next: usize,
    pending: Vec<Coordinate>,
}

impl Default for FleetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FleetBuilder {
    pub fn new() -> Self {
        Self {
            board: Board::empty(),
            next: 0,
            pending: Vec::new(),
        }
    }

    /// Ship currently being placed, `None` once the fleet is complete
    pub fn current_ship(&self) -> Option<ShipClass> {
        ShipClass::FLEET.get(self.next).copied()
    }

    /// Cells accepted so far for the current ship
    pub fn pending(&self) -> &[Coordinate] {
        &self.pending
    }

    /// Direction of the current ship, locked once it has two cells
    pub fn orientation(&self) -> Option<Orientation> {
        match self.pending.as_slice() {
            [a, b, ..] => Orientation::between(*a, *b),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.current_ship().is_none()
    }

    /// Ships finished so far
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Validate a candidate cell for the current ship without accepting it.
    ///
    /// Checks run in order: fleet complete, grid bounds, repeat within the
    /// ship, overlap with placed ships, direction lock, contiguity.
    pub fn check(&self, x: i32, y: i32) -> Result<Coordinate, PlacementViolation> {
        if self.is_complete() {
            return Err(PlacementViolation::FleetComplete);
        }

        let coordinate =
            Coordinate::new(x, y).map_err(|_| PlacementViolation::OutOfBounds { x, y })?;

        if self.pending.contains(&coordinate) {
            return Err(PlacementViolation::RepeatedCell { coordinate });
        }

        if let Some(ship) = self.board.ship_at(coordinate) {
            return Err(PlacementViolation::Occupied {
                coordinate,
                ship: ship.class(),
            });
        }

        match self.pending.as_slice() {
            [] => Ok(coordinate),
            [only] => {
                if Orientation::between(*only, coordinate).is_some() && is_adjacent(*only, coordinate)
                {
                    Ok(coordinate)
                } else {
                    Err(PlacementViolation::NotContiguous {
                        coordinate,
                        orientation: None,
                        suggestion: self.suggestion(),
                    })
                }
            }
            [first, ..] => {
                let orientation = self.orientation().unwrap_or(Orientation::Horizontal);
                if !orientation.aligned(*first, coordinate) {
                    return Err(PlacementViolation::OffAxis {
                        coordinate,
                        orientation,
                        suggestion: self.suggestion(),
                    });
                }
                let (low, high) = self.ends(orientation);
                if low.step(orientation, -1) == Some(coordinate)
                    || high.step(orientation, 1) == Some(coordinate)
                {
                    Ok(coordinate)
                } else {
                    Err(PlacementViolation::NotContiguous {
                        coordinate,
                        orientation: Some(orientation),
                        suggestion: self.suggestion(),
                    })
                }
            }
        }
    }

    /// Accept a cell for the current ship
    pub fn place(&mut self, x: i32, y: i32) -> Result<PlacementProgress, PlacementViolation> {
        let coordinate = self.check(x, y)?;
        let ship = match self.current_ship() {
            Some(ship) => ship,
            None => return Err(PlacementViolation::FleetComplete),
        };

        self.pending.push(coordinate);
        let remaining = ship.length() - self.pending.len() as u8;
        if remaining > 0 {
            return Ok(PlacementProgress::CellAccepted { ship, remaining });
        }

        let cells = std::mem::take(&mut self.pending);
        self.board.push_ship(ship, cells);
        self.next += 1;

        if self.is_complete() {
            Ok(PlacementProgress::FleetPlaced)
        } else {
            Ok(PlacementProgress::ShipPlaced(ship))
        }
    }

    /// Drop the cells of the ship in progress, e.g. when it is boxed in
    pub fn reset_ship(&mut self) {
        self.pending.clear();
    }

    /// The finished board
    pub fn finish(self) -> Result<Board, BoardError> {
        if !self.is_complete() {
            return Err(BoardError::FleetIncomplete {
                placed: self.next,
                required: ShipClass::FLEET.len(),
            });
        }
        Ok(self.board)
    }

    /// Lowest and highest pending cell along `orientation`
    fn ends(&self, orientation: Orientation) -> (Coordinate, Coordinate) {
        let mut sorted = self.pending.clone();
        sorted.sort_by_key(|c| c.along(orientation));
        (sorted[0], sorted[sorted.len() - 1])
    }

    fn is_free(&self, c: Coordinate) -> bool {
        !self.board.has_ship(c) && !self.pending.contains(&c)
    }

    /// A single legal next cell for the current ship, if one exists
    fn suggestion(&self) -> Option<Coordinate> {
        match self.pending.as_slice() {
            [] => None,
            [only] => [
                (Orientation::Horizontal, 1),
                (Orientation::Vertical, 1),
                (Orientation::Horizontal, -1),
                (Orientation::Vertical, -1),
            ]
            .iter()
            .filter_map(|(o, d)| only.step(*o, *d))
            .find(|c| self.is_free(*c)),
            _ => {
                let orientation = self.orientation()?;
                let (low, high) = self.ends(orientation);
                [high.step(orientation, 1), low.step(orientation, -1)]
                    .into_iter()
                    .flatten()
                    .find(|c| self.is_free(*c))
            }
        }
    }
}

fn is_adjacent(a: Coordinate, b: Coordinate) -> bool {
    a.x.abs_diff(b.x) + a.y.abs_diff(b.y) == 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn c(x: i32, y: i32) -> Coordinate {
        Coordinate::new(x, y).unwrap()
    }

    #[rustfmt::skip]
    fn place_all(builder: &mut FleetBuilder) {
        let cells = [
            (0, 0), (1, 0), (2, 0), (3, 0), (4, 0),
            (0, 2), (0, 3), (0, 4), (0, 5),
            (5, 5), (5, 6), (5, 7),
            (9, 0), (9, 1),
            (7, 9), (8, 9),
        ];
        for (x, y) in cells {
            builder.place(x, y).unwrap();
        }
    }

    #[test]
    fn test_random_placement_seeded() {
        let mut rng = StdRng::seed_from_u64(42);
        let board = place_random(&mut rng).unwrap();
        let classes: Vec<_> = board.ships().iter().map(|s| s.class()).collect();
        assert_eq!(classes, ShipClass::FLEET.to_vec());
    }

    #[test]
    fn test_random_placement_exhaustion() {
        // A constant source proposes the same slot forever: the carrier fits,
        // every battleship candidate collides with it.
        let mut rng = StepRng::new(0, 0);
        let err = place_random(&mut rng).unwrap_err();
        assert_eq!(
            err,
            BoardError::PlacementExhausted {
                ship: ShipClass::Battleship,
                attempts: MAX_PLACEMENT_ATTEMPTS,
            }
        );
    }

    #[test]
    fn test_manual_full_fleet() {
        let mut builder = FleetBuilder::new();
        place_all(&mut builder);
        assert!(builder.is_complete());

        let board = builder.finish().unwrap();
        assert!(board.is_full_fleet());
        assert_eq!(
            board.ship_at(c(0, 0)).map(|s| s.class()),
            Some(ShipClass::Carrier)
        );
    }

    #[test]
    fn test_manual_progress_reports() {
        let mut builder = FleetBuilder::new();
        assert_eq!(
            builder.place(0, 0),
            Ok(PlacementProgress::CellAccepted {
                ship: ShipClass::Carrier,
                remaining: 4
            })
        );
        for x in 1..4 {
            builder.place(x, 0).unwrap();
        }
        assert_eq!(
            builder.place(4, 0),
            Ok(PlacementProgress::ShipPlaced(ShipClass::Carrier))
        );
        assert_eq!(builder.current_ship(), Some(ShipClass::Battleship));
        assert!(builder.pending().is_empty());
    }

    #[test]
    fn test_manual_out_of_bounds() {
        let builder = FleetBuilder::new();
        assert_eq!(
            builder.check(10, 3),
            Err(PlacementViolation::OutOfBounds { x: 10, y: 3 })
        );
        assert_eq!(
            builder.check(-1, 0),
            Err(PlacementViolation::OutOfBounds { x: -1, y: 0 })
        );
    }

    #[test]
    fn test_manual_repeated_cell() {
        let mut builder = FleetBuilder::new();
        builder.place(3, 3).unwrap();
        assert_eq!(
            builder.place(3, 3),
            Err(PlacementViolation::RepeatedCell { coordinate: c(3, 3) })
        );
        assert_eq!(builder.pending(), &[c(3, 3)]);
    }

    #[test]
    fn test_manual_overlap() {
        let mut builder = FleetBuilder::new();
        for x in 0..5 {
            builder.place(x, 0).unwrap();
        }
        assert_eq!(
            builder.check(2, 0),
            Err(PlacementViolation::Occupied {
                coordinate: c(2, 0),
                ship: ShipClass::Carrier
            })
        );
    }

    #[test]
    fn test_manual_direction_lock() {
        let mut builder = FleetBuilder::new();
        builder.place(2, 4).unwrap();
        builder.place(3, 4).unwrap();
        assert_eq!(builder.orientation(), Some(Orientation::Horizontal));

        assert_eq!(
            builder.place(3, 5),
            Err(PlacementViolation::OffAxis {
                coordinate: c(3, 5),
                orientation: Orientation::Horizontal,
                suggestion: Some(c(4, 4)),
            })
        );
        assert_eq!(builder.pending().len(), 2);
    }

    #[test]
    fn test_manual_gap_rejected_with_suggestion() {
        let mut builder = FleetBuilder::new();
        builder.place(5, 2).unwrap();
        builder.place(5, 3).unwrap();
        assert_eq!(
            builder.check(5, 6),
            Err(PlacementViolation::NotContiguous {
                coordinate: c(5, 6),
                orientation: Some(Orientation::Vertical),
                suggestion: Some(c(5, 4)),
            })
        );
        assert!(builder.check(5, 1).is_ok());
        assert!(builder.check(5, 4).is_ok());
    }

    #[test]
    fn test_manual_second_cell_must_touch_first() {
        let mut builder = FleetBuilder::new();
        builder.place(9, 9).unwrap();

        let diagonal = builder.check(8, 8).unwrap_err();
        assert_eq!(
            diagonal,
            PlacementViolation::NotContiguous {
                coordinate: c(8, 8),
                orientation: None,
                suggestion: Some(c(8, 9)),
            }
        );
        assert!(builder.check(7, 9).is_err());
        assert!(builder.check(8, 9).is_ok());
    }

    #[test]
    fn test_manual_suggestion_extends_backwards_at_edge() {
        let mut builder = FleetBuilder::new();
        builder.place(8, 0).unwrap();
        builder.place(9, 0).unwrap();
        match builder.check(0, 0) {
            Err(PlacementViolation::NotContiguous { suggestion, .. }) => {
                assert_eq!(suggestion, Some(c(7, 0)))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_manual_reset_ship() {
        let mut builder = FleetBuilder::new();
        builder.place(0, 0).unwrap();
        builder.place(0, 1).unwrap();
        builder.reset_ship();
        assert!(builder.pending().is_empty());
        assert_eq!(builder.current_ship(), Some(ShipClass::Carrier));
        assert!(builder.check(4, 4).is_ok());
    }

    #[test]
    fn test_manual_fleet_complete_and_incomplete_finish() {
        let mut builder = FleetBuilder::new();
        place_all(&mut builder);
        assert_eq!(builder.check(5, 0), Err(PlacementViolation::FleetComplete));

        let partial = FleetBuilder::new();
        assert_eq!(
            partial.finish().unwrap_err(),
            BoardError::FleetIncomplete {
                placed: 0,
                required: 5
            }
        );
    }
}
