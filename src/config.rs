use crate::error::{ChainError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings for one puzzle session.
///
/// Missing fields in a config file fall back to the defaults, which build
/// the standard four-record board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GameConfig {
    /// Payloads appended after genesis, in order.
    pub payloads: Vec<String>,
    /// Payload written into the tampered record.
    pub tamper_payload: String,
    /// Hash stamped onto the tampered record.
    pub tamper_marker: String,
    /// Seed for tamper target selection; random when absent.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            payloads: vec![
                "A to B: 5 units".into(),
                "B to C: 2 units".into(),
                "C to D: 10 units".into(),
            ],
            tamper_payload: "Tampered Data!".into(),
            tamper_marker: "XXXXX".into(),
            seed: None,
        }
    }
}

impl GameConfig {
    /// Load a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        let config: Self = serde_json::from_slice(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configs that cannot produce a playable board.
    pub fn validate(&self) -> Result<()> {
        if self.payloads.is_empty() {
            return Err(ChainError::Config(
                "at least one payload is required after genesis".into(),
            ));
        }
        Ok(())
    }

    /// Records on the board, genesis included.
    pub fn chain_len(&self) -> usize {
        self.payloads.len() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_builds_four_records() {
        let config = GameConfig::default();
        assert_eq!(config.chain_len(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_partial_file_keeps_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("game.json");
        fs::write(&path, r#"{ "payloads": ["x", "y"], "seed": 7 }"#).unwrap();

        let config = GameConfig::load(&path).unwrap();
        assert_eq!(config.payloads, vec!["x", "y"]);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.tamper_marker, "XXXXX");
    }

    #[test]
    fn load_rejects_empty_payloads() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("game.json");
        fs::write(&path, r#"{ "payloads": [] }"#).unwrap();
        assert!(matches!(
            GameConfig::load(&path),
            Err(ChainError::Config(_))
        ));
    }

    #[test]
    fn load_reports_bad_json_and_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("game.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(GameConfig::load(&path), Err(ChainError::Serde(_))));
        assert!(matches!(
            GameConfig::load(&tmp.path().join("missing.json")),
            Err(ChainError::Io(_))
        ));
    }
}
