use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{LeaderboardEntry, LeaderboardResponse, MatchSummary};

const STORE_VERSION: u8 = 1;

#[derive(Clone, Debug, Serialize, Deserialize)]
struct StoredPlayerStats {
    name: String,
    matches: u64,
    wins: u64,
    #[serde(rename = "totalBasesAssaulted")]
    total_bases_assaulted: u64,
    #[serde(rename = "totalBasesDefended")]
    total_bases_defended: u64,
    #[serde(rename = "updatedAtMs")]
    updated_at_ms: u64,
}

#[derive(Clone, Debug, Serialize)]
struct StatsStoreFile<'a> {
    version: u8,
    players: &'a HashMap<String, StoredPlayerStats>,
}

#[derive(Clone, Debug, Deserialize)]
struct StatsStoreFileRaw {
    version: u8,
    players: HashMap<String, serde_json::Value>,
}

/// Cross-match totals per player name, persisted as one JSON file. I/O
/// failures are logged and never reach the match.
pub struct StatsStore {
    file_path: PathBuf,
    players: HashMap<String, StoredPlayerStats>,
}

impl StatsStore {
    pub fn new(file_path: PathBuf) -> Self {
        let players = load_players(&file_path);
        Self { file_path, players }
    }

    pub fn record_match(&mut self, summary: &MatchSummary) {
        let now_ms = now_ms();

        for entry in &summary.ranking {
            let key = stats_key(&entry.name);
            if key.is_empty() {
                continue;
            }
            let current = self
                .players
                .entry(key)
                .or_insert_with(|| StoredPlayerStats {
                    name: entry.name.trim().to_string(),
                    matches: 0,
                    wins: 0,
                    total_bases_assaulted: 0,
                    total_bases_defended: 0,
                    updated_at_ms: now_ms,
                });

            current.name = entry.name.trim().to_string();
            current.matches += 1;
            if summary.winner == Some(entry.team) {
                current.wins += 1;
            }
            current.total_bases_assaulted += u64::from(entry.score.bases_assaulted);
            current.total_bases_defended += u64::from(entry.score.bases_defended);
            current.updated_at_ms = now_ms;
        }

        self.save();
    }

    pub fn build_response(&self, requested_limit: Option<usize>) -> LeaderboardResponse {
        LeaderboardResponse {
            generated_at_iso: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            entries: self.get_top(requested_limit),
        }
    }

    fn get_top(&self, requested_limit: Option<usize>) -> Vec<LeaderboardEntry> {
        let limit = requested_limit.unwrap_or(10).clamp(1, 100);
        let mut entries: Vec<LeaderboardEntry> = self
            .players
            .values()
            .map(|stats| {
                let matches = stats.matches.max(1) as f64;
                LeaderboardEntry {
                    name: stats.name.clone(),
                    matches: stats.matches,
                    wins: stats.wins.min(stats.matches),
                    win_rate: stats.wins as f64 / matches,
                    avg_bases_assaulted: stats.total_bases_assaulted as f64 / matches,
                    avg_bases_defended: stats.total_bases_defended as f64 / matches,
                    updated_at_ms: stats.updated_at_ms,
                }
            })
            .collect();

        entries.sort_by(|a, b| {
            cmp_desc_f64(a.win_rate, b.win_rate)
                .then_with(|| {
                    cmp_desc_f64(
                        a.avg_bases_assaulted + a.avg_bases_defended,
                        b.avg_bases_assaulted + b.avg_bases_defended,
                    )
                })
                .then_with(|| b.matches.cmp(&a.matches))
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
        entries.truncate(limit);
        entries
    }

    fn save(&self) {
        if let Some(parent) = self.file_path.parent() {
            if let Err(error) = fs::create_dir_all(parent) {
                log::warn!(
                    "failed to create stats dir {}: {error}",
                    parent.display()
                );
                return;
            }
        }

        let payload = StatsStoreFile {
            version: STORE_VERSION,
            players: &self.players,
        };
        match serde_json::to_string_pretty(&payload) {
            Ok(text) => {
                if let Err(error) = fs::write(&self.file_path, text) {
                    log::warn!(
                        "failed to write stats {}: {error}",
                        self.file_path.display()
                    );
                }
            }
            Err(error) => {
                log::warn!(
                    "failed to serialize stats for {}: {error}",
                    self.file_path.display()
                );
            }
        }
    }
}

fn cmp_desc_f64(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

fn load_players(path: &Path) -> HashMap<String, StoredPlayerStats> {
    let text = match fs::read_to_string(path) {
        Ok(value) => value,
        Err(error) => {
            if error.kind() != std::io::ErrorKind::NotFound {
                log::warn!("failed to read stats {}: {error}", path.display());
            }
            return HashMap::new();
        }
    };
    let parsed = match serde_json::from_str::<StatsStoreFileRaw>(&text) {
        Ok(value) if value.version == STORE_VERSION => value,
        Ok(value) => {
            log::warn!(
                "unsupported stats version {} at {}",
                value.version,
                path.display()
            );
            return HashMap::new();
        }
        Err(error) => {
            log::warn!("failed to parse stats {}: {error}", path.display());
            return HashMap::new();
        }
    };

    let mut merged = HashMap::<String, StoredPlayerStats>::new();
    for (player_key, raw_value) in parsed.players {
        let stats: StoredPlayerStats = match serde_json::from_value(raw_value) {
            Ok(stats) => stats,
            Err(error) => {
                log::warn!(
                    "skipping stats entry '{player_key}' in {}: {error}",
                    path.display()
                );
                continue;
            }
        };
        let name = stats.name.trim().to_string();
        let key = stats_key(&name);
        if key.is_empty() {
            continue;
        }
        let wins = stats.wins.min(stats.matches);

        match merged.get_mut(&key) {
            Some(current) => {
                current.name = name;
                current.matches += stats.matches;
                current.wins += wins;
                current.total_bases_assaulted += stats.total_bases_assaulted;
                current.total_bases_defended += stats.total_bases_defended;
                current.updated_at_ms = current.updated_at_ms.max(stats.updated_at_ms);
            }
            None => {
                merged.insert(
                    key,
                    StoredPlayerStats {
                        name,
                        wins,
                        ..stats
                    },
                );
            }
        }
    }

    merged
}

fn stats_key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn now_ms() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PlayerMatchScore, ScoreEntry, Team, TimelineEvent};

    fn make_summary(winner: Option<Team>, rows: Vec<(&str, &str, Team, u32, u32)>) -> MatchSummary {
        MatchSummary {
            winner,
            duration_ms: 600_000,
            alliance_resources: 2_000,
            horde_resources: 1_240,
            timeline: vec![TimelineEvent {
                at_ms: 1,
                label: "test".to_string(),
            }],
            ranking: rows
                .into_iter()
                .map(|(id, name, team, assaulted, defended)| ScoreEntry {
                    player_id: id.to_string(),
                    name: name.to_string(),
                    team,
                    score: PlayerMatchScore {
                        bases_assaulted: assaulted,
                        bases_defended: defended,
                        ..PlayerMatchScore::default()
                    },
                })
                .collect(),
        }
    }

    fn temp_file(name: &str) -> PathBuf {
        let unique = format!(
            "{}-{}-{}",
            name,
            std::process::id(),
            now_ms().saturating_add(rand::random::<u32>() as u64)
        );
        std::env::temp_dir().join(unique).join("stats.json")
    }

    #[test]
    fn record_match_credits_winning_team() {
        let path = temp_file("stats-store-record");
        let mut store = StatsStore::new(path.clone());
        store.record_match(&make_summary(
            Some(Team::Alliance),
            vec![
                ("p1", "Varian", Team::Alliance, 4, 2),
                ("p2", "Garrosh", Team::Horde, 1, 0),
            ],
        ));
        store.record_match(&make_summary(
            None,
            vec![("p1", "Varian", Team::Alliance, 2, 0)],
        ));

        let response = store.build_response(Some(10));
        assert_eq!(response.entries.len(), 2);
        let varian = response
            .entries
            .iter()
            .find(|entry| entry.name == "Varian")
            .expect("varian exists");
        assert_eq!(varian.matches, 2);
        assert_eq!(varian.wins, 1);
        assert_eq!(varian.avg_bases_assaulted, 3.0);
        assert_eq!(varian.avg_bases_defended, 1.0);
        assert_eq!(response.entries[0].name, "Varian");

        let reloaded = StatsStore::new(path.clone());
        assert_eq!(reloaded.build_response(None).entries.len(), 2);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn load_merges_case_insensitive_names() {
        let path = temp_file("stats-store-load");
        let parent = path.parent().expect("parent exists").to_path_buf();
        fs::create_dir_all(&parent).expect("create dir");
        let raw = r#"{
  "version": 1,
  "players": {
    "SYLVANAS": {
      "name": "Sylvanas",
      "matches": 2,
      "wins": 1,
      "totalBasesAssaulted": 5,
      "totalBasesDefended": 1,
      "updatedAtMs": 10
    },
    "sylvanas_legacy": {
      "name": " sylvanas ",
      "matches": 1,
      "wins": 4,
      "totalBasesAssaulted": 1,
      "totalBasesDefended": 0,
      "updatedAtMs": 20
    },
    "broken": {
      "name": "Broken",
      "matches": -1
    }
  }
}"#;
        fs::write(&path, raw).expect("write file");

        let store = StatsStore::new(path.clone());
        let response = store.build_response(Some(10));
        assert_eq!(response.entries.len(), 1);
        let entry = &response.entries[0];
        assert_eq!(entry.name.to_lowercase(), "sylvanas");
        assert_eq!(entry.matches, 3);
        assert_eq!(entry.wins, 2);
        assert_eq!(entry.updated_at_ms, 20);

        let _ = fs::remove_file(&path);
        let _ = fs::remove_dir_all(&parent);
    }

    #[test]
    fn unsupported_version_starts_empty() {
        let path = temp_file("stats-store-version");
        let parent = path.parent().expect("parent exists").to_path_buf();
        fs::create_dir_all(&parent).expect("create dir");
        fs::write(&path, r#"{"version": 9, "players": {}}"#).expect("write file");

        let store = StatsStore::new(path.clone());
        assert!(store.build_response(None).entries.is_empty());

        let _ = fs::remove_dir_all(&parent);
    }

    #[test]
    fn build_response_limits_range() {
        let path = temp_file("stats-store-limit");
        let mut store = StatsStore::new(path.clone());
        for idx in 0..3 {
            store.record_match(&make_summary(
                Some(Team::Horde),
                vec![(
                    &format!("p{}", idx + 1),
                    &format!("P{}", idx + 1),
                    Team::Horde,
                    idx,
                    0,
                )],
            ));
        }

        assert_eq!(store.build_response(Some(1)).entries.len(), 1);
        assert_eq!(store.build_response(Some(0)).entries.len(), 1);
        assert_eq!(store.build_response(Some(999)).entries.len(), 3);

        let _ = fs::remove_file(path);
    }
}
