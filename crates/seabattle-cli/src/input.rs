//! Parsing of interactive input lines.

use seabattle_core::{Coordinate, BOARD_SIZE};
use thiserror::Error;

/// Malformed interactive input. Always answered with a reprompt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Invalid format. Please enter two numbers separated by a space.")]
    WrongArity,

    #[error("Invalid input. Please enter two integers (0-{}).", BOARD_SIZE - 1)]
    NotANumber,

    #[error("Coordinates out of bounds. Please use 0-{}.", BOARD_SIZE - 1)]
    OutOfBounds,

    #[error("Invalid choice. Please enter 1 or 2.")]
    InvalidChoice,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlacementMode {
    Random,
    Manual,
}

pub fn parse_placement_choice(line: &str) -> Result<PlacementMode, InputError> {
    match line.trim() {
        "1" => Ok(PlacementMode::Random),
        "2" => Ok(PlacementMode::Manual),
        _ => Err(InputError::InvalidChoice),
    }
}

/// Two whitespace separated integers, not checked against the grid
pub fn parse_pair(line: &str) -> Result<(i32, i32), InputError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let [x, y] = parts.as_slice() else {
        return Err(InputError::WrongArity);
    };
    let x = x.parse().map_err(|_| InputError::NotANumber)?;
    let y = y.parse().map_err(|_| InputError::NotANumber)?;
    Ok((x, y))
}

/// A guess in `x y` form, inside the grid
pub fn parse_coordinate(line: &str) -> Result<Coordinate, InputError> {
    let (x, y) = parse_pair(line)?;
    Coordinate::new(x, y).map_err(|_| InputError::OutOfBounds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinate() {
        assert_eq!(parse_coordinate("3 4"), Ok(Coordinate::new(3, 4).unwrap()));
        assert_eq!(parse_coordinate("  0\t9 \n"), Ok(Coordinate::new(0, 9).unwrap()));
    }

    #[test]
    fn test_wrong_arity() {
        assert_eq!(parse_coordinate(""), Err(InputError::WrongArity));
        assert_eq!(parse_coordinate("3"), Err(InputError::WrongArity));
        assert_eq!(parse_coordinate("1 2 3"), Err(InputError::WrongArity));
    }

    #[test]
    fn test_not_a_number() {
        assert_eq!(parse_coordinate("a b"), Err(InputError::NotANumber));
        assert_eq!(parse_coordinate("3 4.5"), Err(InputError::NotANumber));
        assert_eq!(parse_coordinate("3,4 5"), Err(InputError::NotANumber));
    }

    #[test]
    fn test_out_of_bounds() {
        assert_eq!(parse_coordinate("10 0"), Err(InputError::OutOfBounds));
        assert_eq!(parse_coordinate("-1 5"), Err(InputError::OutOfBounds));
        assert_eq!(parse_pair("-1 5"), Ok((-1, 5)));
    }

    #[test]
    fn test_placement_choice() {
        assert_eq!(parse_placement_choice("1\n"), Ok(PlacementMode::Random));
        assert_eq!(parse_placement_choice(" 2 "), Ok(PlacementMode::Manual));
        assert_eq!(parse_placement_choice("3"), Err(InputError::InvalidChoice));
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            InputError::OutOfBounds.to_string(),
            "Coordinates out of bounds. Please use 0-9."
        );
    }
}
