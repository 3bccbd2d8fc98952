use crate::chain::{Chain, Progress, RecordView};
use crate::config::GameConfig;
use crate::error::{ChainError, Result};
use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Chooses which record gets corrupted when a board is set up.
pub trait TamperTarget {
    /// Return an index in `2..=len`. `len` is at least 2.
    fn pick(&mut self, len: usize) -> usize;
}

/// Uniform choice over the non-genesis records.
#[derive(Debug, Clone)]
pub struct RandomTarget {
    rng: Pcg32,
}

impl RandomTarget {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Seeded from `seed` when given, otherwise from the thread RNG.
    pub fn from_seed(seed: Option<u64>) -> Self {
        Self::seeded(seed.unwrap_or_else(|| rand::random()))
    }
}

impl TamperTarget for RandomTarget {
    fn pick(&mut self, len: usize) -> usize {
        self.rng.random_range(2..=len)
    }
}

/// Always the same record.
#[derive(Debug, Clone, Copy)]
pub struct FixedTarget(pub usize);

impl TamperTarget for FixedTarget {
    fn pick(&mut self, _len: usize) -> usize {
        self.0
    }
}

/// One puzzle session: a seeded chain with a single corrupted record.
///
/// The session owns all state; dropping it ends the game and [`Game::reset`]
/// starts a new board from the same config.
#[derive(Debug, Clone)]
pub struct Game {
    config: GameConfig,
    chain: Chain,
    tampered: usize,
}

impl Game {
    /// Build the board: genesis, the configured payloads, then tamper one
    /// non-genesis record chosen by `target`.
    pub fn new(config: GameConfig, target: &mut dyn TamperTarget) -> Result<Self> {
        let (chain, tampered) = Self::setup(&config, target)?;
        Ok(Self {
            config,
            chain,
            tampered,
        })
    }

    /// Discard the board and build a fresh one.
    pub fn reset(&mut self, target: &mut dyn TamperTarget) -> Result<()> {
        let (chain, tampered) = Self::setup(&self.config, target)?;
        self.chain = chain;
        self.tampered = tampered;
        info!("board reset, record {} tampered", tampered);
        Ok(())
    }

    /// Repair one record. Returns whether the whole chain is now valid.
    pub fn repair(&mut self, index: usize) -> Result<bool> {
        self.chain.repair(index)?;
        let solved = self.chain.is_valid();
        if solved {
            info!("chain integrity restored");
        }
        Ok(solved)
    }

    /// Repair left to right from the first broken record until solved.
    /// Returns the indices repaired, in order.
    pub fn solve(&mut self) -> Vec<usize> {
        let mut repaired = Vec::new();
        while let Some(index) = self.chain.first_invalid() {
            // first_invalid only yields in-range indices.
            if self.chain.repair(index).is_err() {
                break;
            }
            repaired.push(index);
        }
        info!("solved with {} repair(s)", repaired.len());
        repaired
    }

    pub fn is_solved(&self) -> bool {
        self.chain.is_valid()
    }

    pub fn is_record_valid(&self, index: usize) -> Result<bool> {
        self.chain.is_record_valid(index)
    }

    pub fn views(&self) -> Vec<RecordView> {
        self.chain.views()
    }

    pub fn progress(&self) -> Progress {
        self.chain.progress()
    }

    /// The record corrupted at setup.
    pub fn tampered_index(&self) -> usize {
        self.tampered
    }

    /// Lowest broken record, if any.
    pub fn hint(&self) -> Option<usize> {
        self.chain.first_invalid()
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    fn setup(config: &GameConfig, target: &mut dyn TamperTarget) -> Result<(Chain, usize)> {
        config.validate()?;
        let mut chain = Chain::new();
        for payload in &config.payloads {
            chain.append(payload);
        }

        let len = chain.len();
        let index = target.pick(len);
        if !(2..=len).contains(&index) {
            return Err(ChainError::Config(format!(
                "tamper target {} must be between 2 and {}",
                index, len
            )));
        }
        debug!("tamper target {} of {}", index, len);
        chain.tamper(index, &config.tamper_payload, &config.tamper_marker)?;
        Ok((chain, index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_game(index: usize) -> Game {
        Game::new(GameConfig::default(), &mut FixedTarget(index)).unwrap()
    }

    #[test]
    fn setup_tampers_exactly_one_record() {
        let game = fixed_game(3);
        assert_eq!(game.len(), 4);
        assert_eq!(game.tampered_index(), 3);
        assert!(!game.is_solved());

        let views = game.views();
        assert_eq!(views[2].payload, "Tampered Data!");
        assert_eq!(views[2].stored_hash, "XXXXX");
        let untouched: Vec<_> = views
            .iter()
            .filter(|v| v.index != 3)
            .map(|v| v.payload.as_str())
            .collect();
        assert_eq!(
            untouched,
            vec!["Genesis Block", "A to B: 5 units", "C to D: 10 units"]
        );
    }

    #[test]
    fn fixing_the_board_front_to_back() {
        let mut game = fixed_game(2);
        assert_eq!(game.hint(), Some(2));
        assert!(!game.repair(2).unwrap());
        assert_eq!(game.hint(), Some(3));
        assert!(!game.repair(3).unwrap());
        assert!(game.repair(4).unwrap());
        assert!(game.is_solved());
        assert!(game.progress().is_complete());
    }

    #[test]
    fn solve_repairs_from_tampered_record_onward() {
        let mut game = fixed_game(3);
        assert_eq!(game.solve(), vec![3, 4]);
        assert!(game.is_solved());
        assert!(game.solve().is_empty());
    }

    #[test]
    fn repair_out_of_range_is_an_error() {
        let mut game = fixed_game(4);
        assert!(matches!(
            game.repair(5),
            Err(ChainError::OutOfRangeIndex { index: 5, len: 4 })
        ));
        assert!(game.is_record_valid(0).is_err());
    }

    #[test]
    fn fixed_target_outside_board_is_rejected() {
        for index in [0, 1, 5] {
            assert!(matches!(
                Game::new(GameConfig::default(), &mut FixedTarget(index)),
                Err(ChainError::Config(_))
            ));
        }
    }

    #[test]
    fn genesis_only_config_is_rejected() {
        let config = GameConfig {
            payloads: Vec::new(),
            ..GameConfig::default()
        };
        assert!(Game::new(config, &mut FixedTarget(2)).is_err());
    }

    #[test]
    fn random_target_stays_off_genesis() {
        let mut target = RandomTarget::seeded(42);
        for _ in 0..200 {
            let index = target.pick(4);
            assert!((2..=4).contains(&index));
        }
    }

    #[test]
    fn random_target_is_reproducible() {
        let picks = |seed| {
            let mut t = RandomTarget::seeded(seed);
            (0..16).map(|_| t.pick(10)).collect::<Vec<_>>()
        };
        assert_eq!(picks(7), picks(7));
    }

    #[test]
    fn reset_rebuilds_the_board() {
        let mut game = fixed_game(2);
        game.solve();
        assert!(game.is_solved());

        game.reset(&mut FixedTarget(4)).unwrap();
        assert!(!game.is_solved());
        assert_eq!(game.tampered_index(), 4);
        assert_eq!(game.hint(), Some(4));
        assert_eq!(game.progress().valid, 3);
    }
}
