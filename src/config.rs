use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::constants::{BRACKET_COUNT, NODE_COUNT};
use crate::types::{NodeId, Position, Team};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid bracket id {bracket_id}, expected < {max}")]
    InvalidBracket { bracket_id: usize, max: usize },
}

/// Respawn locations. Node entries are used while the node is held; the
/// team entries are the fallback start graveyards.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GraveyardTable {
    pub nodes: [Option<Position>; NODE_COUNT],
    pub alliance_start: Option<Position>,
    pub horde_start: Option<Position>,
}

impl GraveyardTable {
    pub fn node(&self, node: NodeId) -> Option<Position> {
        self.nodes[node.index()]
    }

    pub fn team_start(&self, team: Team) -> Option<Position> {
        match team {
            Team::Alliance => self.alliance_start,
            Team::Horde => self.horde_start,
        }
    }
}

impl Default for GraveyardTable {
    fn default() -> Self {
        Self {
            nodes: [
                Some(Position {
                    x: 1_201.87,
                    y: 1_163.11,
                }),
                Some(Position { x: 834.73, y: 784.98 }),
                Some(Position {
                    x: 1_016.59,
                    y: 955.18,
                }),
                Some(Position {
                    x: 775.34,
                    y: 1_206.40,
                }),
                Some(Position {
                    x: 1_207.48,
                    y: 787.00,
                }),
            ],
            alliance_start: Some(Position {
                x: 1_354.05,
                y: 1_275.48,
            }),
            horde_start: Some(Position { x: 714.61, y: 646.15 }),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BattlegroundEngineOptions {
    pub bracket_id: usize,
    pub holiday_weekend: bool,
    pub graveyards: GraveyardTable,
}

impl BattlegroundEngineOptions {
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.bracket_id >= BRACKET_COUNT {
            return Err(ConfigError::InvalidBracket {
                bracket_id: self.bracket_id,
                max: BRACKET_COUNT,
            });
        }
        Ok(self)
    }
}

pub fn parse_options(raw: &str, origin: &str) -> Result<BattlegroundEngineOptions, ConfigError> {
    let options: BattlegroundEngineOptions =
        serde_json::from_str(raw).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })?;
    options.validate()
}

pub fn load_options(path: &Path) -> Result<BattlegroundEngineOptions, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_options(&text, &path.display().to_string())
}
