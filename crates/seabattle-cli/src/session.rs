//! Hot-seat session: both players share one terminal.

use crate::config::Config;
use crate::input::{parse_coordinate, parse_pair, parse_placement_choice, PlacementMode};
use rand::{CryptoRng, RngCore};
use seabattle_core::board::{PlacementProgress, BOARD_SIZE, CELL_COUNT};
use seabattle_core::crypto::KeyPair;
use seabattle_core::protocol::{AttackEnvelope, BoardReveal, StatusEnvelope};
use seabattle_core::{
    audit_reveal, Arbiter, Board, BoardError, Coordinate, Defender, FleetBuilder, GameError,
    LocalDefender, MatchTranscript, Outcome, Player,
};
use std::io::{self, BufRead, Write};
use thiserror::Error;

const RULE: &str = "============================================================";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Input closed")]
    InputClosed,

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Game(#[from] GameError),

    #[error(transparent)]
    Board(#[from] BoardError),
}

/// How a session ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Summary {
    pub winner: Option<Player>,
    pub attacks: usize,
    /// Hits scored by Alice and Bob
    pub hits: [usize; 2],
}

pub struct Session<'a, I, O> {
    input: I,
    out: O,
    config: &'a Config,
}

impl<'a, I: BufRead, O: Write> Session<'a, I, O> {
    pub fn new(input: I, out: O, config: &'a Config) -> Self {
        Self { input, out, config }
    }

    fn read_line(&mut self) -> Result<String, SessionError> {
        self.out.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(SessionError::InputClosed);
        }
        Ok(line)
    }

    /// Set up both boards and run the match to its end or the turn limit.
    pub fn play<R: RngCore + CryptoRng>(&mut self, rng: &mut R) -> Result<Summary, SessionError> {
        writeln!(self.out, "{}", RULE)?;
        writeln!(self.out, "  PRIVATE BATTLESHIP - Two Player Secure Game")?;
        writeln!(self.out, "{}\n", RULE)?;

        writeln!(
            self.out,
            "1. Generating keypairs for both players ({} bits)...",
            self.config.key_bits
        )?;
        let alice_keys = KeyPair::generate(self.config.key_bits, rng);
        let bob_keys = KeyPair::generate(self.config.key_bits, rng);
        for player in Player::ALL {
            writeln!(self.out, "   [OK] {}'s keypair generated", player)?;
        }

        writeln!(self.out, "\n2. Creating boards and placing ships...")?;
        let alice_board = self.place_board(Player::Alice, rng)?;
        let bob_board = self.place_board(Player::Bob, rng)?;

        writeln!(self.out, "\n3. Encrypting boards...")?;
        let alice = LocalDefender::new(alice_board, alice_keys, rng);
        let bob = LocalDefender::new(bob_board, bob_keys, rng);
        for (player, defender) in [(Player::Alice, &alice), (Player::Bob, &bob)] {
            writeln!(
                self.out,
                "   [OK] {}'s board encrypted ({} cells), commitment {}",
                player,
                CELL_COUNT,
                defender.commitment()
            )?;
        }
        // Kept by each player for the opponent, never given to the arbiter.
        let reveals = [alice.reveal(), bob.reveal()];

        let mut arbiter = Arbiter::new();
        arbiter.seat(Player::Alice, alice)?;
        if let Some(started) = arbiter.seat(Player::Bob, bob)? {
            writeln!(self.out, "\n4. Match {} started", started.match_id)?;
            writeln!(self.out, "   [OK] {} will go first.", started.first_turn)?;
        }

        writeln!(self.out, "\n{}", RULE)?;
        writeln!(self.out, "Game ready! Let the battle begin!")?;

        let mut turn_count = 0;
        while !arbiter.is_over() && turn_count < self.config.max_turns {
            self.print_status(&arbiter.query_status()?)?;

            let player = arbiter.current_turn();
            let target = self.read_guess(player)?;
            let envelope = arbiter.submit_attack(player, target.x as i32, target.y as i32)?;
            self.print_result(&envelope)?;

            if envelope.game_over {
                if let Some(winner) = envelope.winner {
                    writeln!(self.out, "\n{}", RULE)?;
                    writeln!(
                        self.out,
                        "GAME OVER! {} wins after {} turns!",
                        winner,
                        arbiter.state().total_turns()
                    )?;
                    writeln!(self.out, "{}", RULE)?;
                }
                break;
            }
            turn_count += 1;
        }

        if !arbiter.is_over() {
            writeln!(
                self.out,
                "Game ended due to turn limit ({} turns reached)",
                self.config.max_turns
            )?;
        }

        let summary = self.print_statistics(&arbiter)?;
        if arbiter.is_over() {
            self.print_audit(&arbiter.transcript(), &reveals)?;
        }
        Ok(summary)
    }

    fn place_board<R: RngCore>(&mut self, player: Player, rng: &mut R) -> Result<Board, SessionError> {
        loop {
            write!(
                self.out,
                "\n{}, how do you want to place your ships?\n\
                 [1] Random placement (automatic)\n\
                 [2] Manual placement (you choose coordinates)\n\
                 Enter choice (1 or 2): ",
                player
            )?;
            let line = self.read_line()?;
            match parse_placement_choice(&line) {
                Ok(PlacementMode::Random) => {
                    let board = Board::random(rng)?;
                    writeln!(
                        self.out,
                        "   [OK] {}'s board created with {} ships (random placement)",
                        player,
                        board.ships().len()
                    )?;
                    return Ok(board);
                }
                Ok(PlacementMode::Manual) => return self.place_manual(player),
                Err(e) => writeln!(self.out, "{}", e)?,
            }
        }
    }

    /// Place the fleet one cell at a time; `r` restarts the current ship.
    pub fn place_manual(&mut self, player: Player) -> Result<Board, SessionError> {
        let mut builder = FleetBuilder::new();
        while let Some(ship) = builder.current_ship() {
            if builder.pending().is_empty() {
                writeln!(self.out, "\n{}'s board:\n{}", player, builder.board().render_plain())?;
            }
            write!(
                self.out,
                "{}, place your {} ({} cells), cell {} of {} (x y, r to restart ship): ",
                player,
                ship,
                ship.length(),
                builder.pending().len() + 1,
                ship.length()
            )?;

            let line = self.read_line()?;
            if line.trim().eq_ignore_ascii_case("r") {
                builder.reset_ship();
                continue;
            }
            let (x, y) = match parse_pair(&line) {
                Ok(pair) => pair,
                Err(e) => {
                    writeln!(self.out, "{}", e)?;
                    continue;
                }
            };

            match builder.place(x, y) {
                Ok(PlacementProgress::CellAccepted { .. }) => {}
                Ok(PlacementProgress::ShipPlaced(class)) => {
                    writeln!(self.out, "   [OK] {} placed", class)?;
                }
                Ok(PlacementProgress::FleetPlaced) => {
                    writeln!(self.out, "   [OK] {}'s fleet is complete", player)?;
                }
                Err(violation) => writeln!(self.out, "   {}", violation)?,
            }
        }
        Ok(builder.finish()?)
    }

    fn read_guess(&mut self, player: Player) -> Result<Coordinate, SessionError> {
        loop {
            write!(self.out, "\n{}, enter your guess (format: x y): ", player)?;
            let line = self.read_line()?;
            match parse_coordinate(&line) {
                Ok(c) => return Ok(c),
                Err(e) => writeln!(self.out, "{}", e)?,
            }
        }
    }

    fn print_status(&mut self, status: &StatusEnvelope) -> Result<(), SessionError> {
        writeln!(self.out, "\n--- Turn {} ---", status.total_turns)?;
        writeln!(self.out, "Current Turn: {}\n", status.current_turn)?;
        for fleet in &status.players {
            writeln!(self.out, "{}'s Ships:", fleet.player)?;
            for ship in &fleet.ships {
                writeln!(
                    self.out,
                    "  - {:20}: {:2}/{:2} hits {}",
                    ship.name,
                    ship.hits,
                    ship.size,
                    if ship.sunk { "[SUNK]" } else { "" }
                )?;
            }
            writeln!(self.out)?;
        }
        Ok(())
    }

    fn print_result(&mut self, envelope: &AttackEnvelope) -> Result<(), SessionError> {
        let (x, y) = envelope.coordinate;
        let player = envelope.player;
        let opponent = player.opponent();

        if !envelope.is_success() {
            let message = envelope.message.as_deref().unwrap_or("attack rejected");
            writeln!(self.out, "Error: {}", message)?;
        } else if envelope.is_duplicate {
            writeln!(
                self.out,
                "\n[Arbiter] Duplicate guess at ({}, {}) - Already attacked this location!",
                x, y
            )?;
            writeln!(self.out, "  No damage dealt. Try a different coordinate.")?;
        } else if envelope.is_hit {
            writeln!(
                self.out,
                "\n[Arbiter] {} HITS {}'s board at ({}, {})!",
                player, opponent, x, y
            )?;
            if let Some(ship) = &envelope.ship_sunk {
                writeln!(self.out, "*** {} sunk {}'s {}! ***", player, opponent, ship)?;
            }
        } else {
            writeln!(self.out, "\n[Arbiter] {}'s guess at ({}, {}) - MISS", player, x, y)?;
        }
        Ok(())
    }

    fn print_statistics(&mut self, arbiter: &Arbiter<LocalDefender>) -> Result<Summary, SessionError> {
        let history = arbiter.history();
        let attacks = history
            .iter()
            .filter(|r| r.outcome != Outcome::Duplicate)
            .count();
        let hits = Player::ALL.map(|p| {
            history
                .iter()
                .filter(|r| r.attacker == p && r.is_hit())
                .count()
        });

        writeln!(self.out, "\nFinal Game Statistics:")?;
        writeln!(self.out, "{}", RULE)?;
        writeln!(self.out, "Total turns: {}", attacks)?;
        for (player, count) in Player::ALL.iter().zip(hits) {
            writeln!(self.out, "{}'s hits: {}", player, count)?;
        }

        Ok(Summary {
            winner: arbiter.winner(),
            attacks,
            hits,
        })
    }

    /// Each player checks the board the other one opened.
    fn print_audit(
        &mut self,
        transcript: &MatchTranscript,
        reveals: &[BoardReveal; 2],
    ) -> Result<(), SessionError> {
        writeln!(self.out, "\nBoard audit ({}x{}):", BOARD_SIZE, BOARD_SIZE)?;
        for (player, reveal) in Player::ALL.iter().zip(reveals) {
            let report = audit_reveal(transcript, *player, reveal)?;
            match &report.error {
                None => writeln!(self.out, "  {}: verified against commitment", report.player)?,
                Some(e) => writeln!(self.out, "  {}: FAILED ({})", report.player, e)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use seabattle_core::ShipClass;
    use std::io::Cursor;

    fn test_config(max_turns: u32) -> Config {
        Config {
            key_bits: 256,
            max_turns,
        }
    }

    /// Both players pick random placement, then sweep the grid row by row.
    fn sweep_script(prefix: &str) -> String {
        let mut script = String::from("1\n1\n");
        script.push_str(prefix);
        for i in 0..100 {
            let line = format!("{} {}\n", i % 10, i / 10);
            script.push_str(&line);
            script.push_str(&line);
        }
        script
    }

    fn run(script: String, config: &Config, seed: u64) -> (Result<Summary, SessionError>, String) {
        let mut out = Vec::new();
        let mut rng = StdRng::seed_from_u64(seed);
        let result = Session::new(Cursor::new(script), &mut out, config).play(&mut rng);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_full_session() {
        let config = test_config(200);
        let (result, output) = run(sweep_script(""), &config, 1);
        let summary = result.unwrap();

        let winner = summary.winner.unwrap();
        assert_eq!(summary.hits[winner as usize], ShipClass::fleet_cells());
        assert!(output.contains(&format!("GAME OVER! {} wins", winner)));
        assert!(output.contains("Final Game Statistics:"));
        assert_eq!(output.matches("verified against commitment").count(), 2);
    }

    #[test]
    fn test_malformed_guesses_reprompt() {
        let config = test_config(200);
        let (result, output) = run(sweep_script("foo bar\n1 2 3\n10 0\n"), &config, 2);

        assert!(result.unwrap().winner.is_some());
        assert!(output.contains("Invalid input. Please enter two integers (0-9)."));
        assert!(output.contains("Invalid format. Please enter two numbers separated by a space."));
        assert!(output.contains("Coordinates out of bounds. Please use 0-9."));
    }

    #[test]
    fn test_turn_limit() {
        let config = test_config(3);
        let (result, output) = run(sweep_script(""), &config, 3);

        let summary = result.unwrap();
        assert_eq!(summary.winner, None);
        assert_eq!(summary.attacks, 3);
        assert!(output.contains("Game ended due to turn limit (3 turns reached)"));
        assert!(!output.contains("Board audit"));
    }

    #[test]
    fn test_input_closed() {
        let config = test_config(200);
        let (result, _) = run("1\n".to_string(), &config, 4);
        assert!(matches!(result, Err(SessionError::InputClosed)));
    }

    #[test]
    fn test_manual_placement() {
        let script = "\
            0 0\n1 0\n1 1\n2 0\n3 0\n4 0\n\
            0 2\n0 3\nr\n0 2\n0 3\n0 4\n0 5\n\
            5 5\n5 6\n5 7\n\
            oops\n9 0\n9 1\n\
            7 9\n8 9\n";
        let config = test_config(200);
        let mut out = Vec::new();
        let board = Session::new(Cursor::new(script), &mut out, &config)
            .place_manual(Player::Alice)
            .unwrap();
        let output = String::from_utf8(out).unwrap();

        assert!(board.is_full_fleet());
        assert!(board.has_ship(Coordinate::new(4, 0).unwrap()));
        assert!(!board.has_ship(Coordinate::new(1, 1).unwrap()));
        assert!(board.has_ship(Coordinate::new(7, 9).unwrap()));
        assert!(output.contains("(1, 1) leaves the horizontal line of this ship"));
        assert!(output.contains("Invalid format"));
        assert!(output.contains("[OK] Alice's fleet is complete"));
    }
}
