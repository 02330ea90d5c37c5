use battleground_server::config::{load_options, BattlegroundEngineOptions};
use battleground_server::constants::{
    BANNER_SWAP_DELAY_MS, BRACKET_COUNT, FLAG_CAPTURING_TIME_MS, MAX_TEAM_SCORE,
    NEAR_VICTORY_SCORE, NODE_COUNT, TICK_MS,
};
use battleground_server::engine::BattlegroundEngine;
use battleground_server::presentation::WorldStateTable;
use battleground_server::types::{
    ChatMessage, MatchEffect, MatchPlayer, MatchSnapshot, NodeStatus, Team, WorldStateUpdate,
};
use chrono::Utc;
use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
enum Strategy {
    /// Alliance claims every node, Horde stays home.
    AllianceSweep,
    /// Alliance works the west nodes, Horde the east ones.
    SplitMap,
    /// Every player clicks a random node now and then.
    TugOfWar,
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long, value_enum)]
    scenario: Option<Strategy>,
    #[arg(long)]
    minutes: Option<u64>,
    #[arg(long)]
    players: Option<usize>,
    #[arg(long)]
    weekend: bool,
    #[arg(long)]
    bracket: Option<usize>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    strategy: Strategy,
    #[serde(rename = "playersPerTeam")]
    players_per_team: usize,
    minutes: u64,
    seed: u64,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u64,
    #[serde(rename = "playersPerTeam")]
    players_per_team: usize,
    minutes: u64,
    winner: Option<Team>,
    #[serde(rename = "endedBy")]
    ended_by: String,
    #[serde(rename = "durationMs")]
    duration_ms: u64,
    #[serde(rename = "allianceResources")]
    alliance_resources: u32,
    #[serde(rename = "hordeResources")]
    horde_resources: u32,
    claims: u32,
    assaults: u32,
    defends: u32,
    captures: u32,
    #[serde(rename = "teamRewards")]
    team_rewards: u32,
    #[serde(rename = "honorGrants")]
    honor_grants: u32,
    #[serde(rename = "reputationGrants")]
    reputation_grants: u32,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioRunResult {
    #[serde(flatten)]
    result: ScenarioResultLine,
    #[serde(rename = "anomalyRecords")]
    anomaly_records: Vec<AnomalyRecord>,
    finished_tick: u64,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageDurationMs")]
    average_duration_ms: u64,
    #[serde(rename = "winnerCounts")]
    winner_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

#[derive(Default)]
struct EffectCounters {
    claims: u32,
    assaults: u32,
    defends: u32,
    captures: u32,
    team_rewards: u32,
    honor_grants: u32,
    reputation_grants: u32,
}

impl EffectCounters {
    fn observe(&mut self, effect: &MatchEffect) {
        match effect {
            MatchEffect::Chat { message, .. } => match message {
                ChatMessage::NodeClaimed { .. } => self.claims += 1,
                ChatMessage::NodeAssaulted { .. } => self.assaults += 1,
                ChatMessage::NodeDefended { .. } => self.defends += 1,
                ChatMessage::NodeTaken { .. } => self.captures += 1,
                ChatMessage::NearVictory { .. } => {}
            },
            MatchEffect::TeamReward { .. } => self.team_rewards += 1,
            MatchEffect::RewardHonor { .. } => self.honor_grants += 1,
            MatchEffect::RewardReputation { .. } => self.reputation_grants += 1,
            _ => {}
        }
    }
}

struct AnomalyLog {
    anomalies: Vec<String>,
    records: Vec<AnomalyRecord>,
    seen: HashSet<String>,
}

impl AnomalyLog {
    fn new() -> Self {
        Self {
            anomalies: Vec::new(),
            records: Vec::new(),
            seen: HashSet::new(),
        }
    }

    fn push(&mut self, tick: u64, message: String) {
        self.records.push(AnomalyRecord {
            tick,
            message: message.clone(),
        });
        if self.seen.insert(message.clone()) {
            self.anomalies.push(message);
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let mut options = match cli.config.as_deref() {
        Some(path) => match load_options(path) {
            Ok(options) => options,
            Err(error) => {
                emit_log(
                    "error",
                    "config_load_failed",
                    "-",
                    None,
                    None,
                    json!({ "error": error.to_string() }),
                );
                std::process::exit(2);
            }
        },
        None => BattlegroundEngineOptions::default(),
    };
    options.holiday_weekend |= cli.weekend;
    if let Some(bracket) = cli.bracket {
        options.bracket_id = bracket.min(BRACKET_COUNT - 1);
    }

    let scenarios = resolve_scenarios(&cli);
    let run_started_at_ms = now_ms();
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(seed_hint, run_started_at_ms));
    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut winner_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_duration_ms = 0u64;
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        emit_log(
            "info",
            "scenario_started",
            &match_id,
            Some(&scenario.name),
            None,
            json!({
                "strategy": scenario.strategy,
                "playersPerTeam": scenario.players_per_team,
                "minutes": scenario.minutes,
                "seed": scenario.seed,
                "bracketId": options.bracket_id,
                "holidayWeekend": options.holiday_weekend,
            }),
        );
        let scenario_run = run_scenario(&scenario, &options);

        for anomaly in &scenario_run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &match_id,
                Some(&scenario.name),
                Some(anomaly.tick),
                json!({ "message": anomaly.message }),
            );
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();
        total_duration_ms += scenario_run.result.duration_ms;
        *winner_counts
            .entry(winner_key(scenario_run.result.winner))
            .or_insert(0) += 1;

        emit_log(
            "info",
            "scenario_finished",
            &match_id,
            Some(&scenario.name),
            Some(scenario_run.finished_tick),
            json!({
                "winner": scenario_run.result.winner,
                "endedBy": scenario_run.result.ended_by,
                "durationMs": scenario_run.result.duration_ms,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );

        match serde_json::to_string(&scenario_run.result) {
            Ok(line) => println!("{line}"),
            Err(error) => emit_log(
                "error",
                "result_serialize_failed",
                &match_id,
                Some(&scenario.name),
                None,
                json!({ "error": error.to_string() }),
            ),
        }
        scenario_results.push(scenario_run.result);
    }

    let summary = build_run_summary(
        match_id.clone(),
        run_started_at_ms,
        now_ms(),
        scenario_results,
        winner_counts,
        total_anomalies,
        total_duration_ms,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &match_id,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &match_id,
        None,
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "averageDurationMs": summary.average_duration_ms,
            "winnerCounts": summary.winner_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn make_roster(players_per_team: usize) -> Vec<MatchPlayer> {
    let mut roster = Vec::new();
    for team in Team::ALL {
        for idx in 0..players_per_team {
            let prefix = match team {
                Team::Alliance => "a",
                Team::Horde => "h",
            };
            roster.push(MatchPlayer {
                id: format!("{prefix}{}", idx + 1),
                name: format!("{team:?}-{:02}", idx + 1),
                team,
            });
        }
    }
    roster
}

/// Node indices a player tries to click this second.
fn planned_clicks(
    strategy: Strategy,
    player: &MatchPlayer,
    player_index: usize,
    rng: &mut StdRng,
) -> Vec<usize> {
    match strategy {
        Strategy::AllianceSweep => match player.team {
            Team::Alliance => (0..NODE_COUNT).collect(),
            Team::Horde => Vec::new(),
        },
        Strategy::SplitMap => match player.team {
            Team::Alliance => vec![0, 1, 2],
            Team::Horde => vec![3, 4],
        },
        Strategy::TugOfWar => {
            if rng.random_bool(0.15) {
                // One slot past the registry to exercise rejected clicks.
                vec![rng.random_range(0..=NODE_COUNT)]
            } else if player_index % 3 == 0 && rng.random_bool(0.05) {
                vec![NODE_COUNT + player_index]
            } else {
                Vec::new()
            }
        }
    }
}

fn run_scenario(scenario: &Scenario, options: &BattlegroundEngineOptions) -> ScenarioRunResult {
    let roster = make_roster(scenario.players_per_team);
    let mut engine = BattlegroundEngine::new(options.clone());
    for player in &roster {
        engine.add_player(player.clone());
    }

    let mut world_states = WorldStateTable::from_updates(&engine.fill_initial_world_states());
    engine.start();

    let mut rng = StdRng::seed_from_u64(scenario.seed);
    let mut counters = EffectCounters::default();
    let mut anomalies = AnomalyLog::new();
    let mut previous_resources = [0u32; 2];
    let time_limit_ms = scenario.minutes * 60_000;
    let mut ended_by = "score";
    let mut last_tick = 0u64;

    while !engine.is_ended() {
        if engine.elapsed_ms() % 1_000 == 0 {
            for (index, player) in roster.iter().enumerate() {
                for node in planned_clicks(scenario.strategy, player, index, &mut rng) {
                    engine.event_player_clicked_on_flag(&player.id, node);
                }
            }
        }

        engine.update(TICK_MS);
        let snapshot = engine.build_snapshot(true);
        last_tick = snapshot.tick;
        for effect in &snapshot.effects {
            counters.observe(effect);
            if let MatchEffect::WorldState { key, value } = effect {
                world_states.apply(WorldStateUpdate {
                    key: *key,
                    value: *value,
                });
            }
        }
        for message in collect_snapshot_anomalies(&snapshot, &previous_resources) {
            anomalies.push(snapshot.tick, message);
        }
        for team in &snapshot.teams {
            previous_resources[team.team.index()] = team.resource_points;
        }

        if !engine.is_ended() && engine.elapsed_ms() >= time_limit_ms {
            ended_by = "time_limit";
            let winner = engine.premature_winner();
            engine.end_battleground(winner);
            for effect in engine.drain_effects() {
                counters.observe(&effect);
            }
        }
    }

    if world_states != WorldStateTable::from_updates(&engine.fill_initial_world_states()) {
        anomalies.push(
            last_tick,
            "replayed world states diverge from a fresh dump".to_string(),
        );
    }

    let summary = engine.build_summary();
    ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            players_per_team: scenario.players_per_team,
            minutes: scenario.minutes,
            winner: summary.winner,
            ended_by: ended_by.to_string(),
            duration_ms: summary.duration_ms,
            alliance_resources: summary.alliance_resources,
            horde_resources: summary.horde_resources,
            claims: counters.claims,
            assaults: counters.assaults,
            defends: counters.defends,
            captures: counters.captures,
            team_rewards: counters.team_rewards,
            honor_grants: counters.honor_grants,
            reputation_grants: counters.reputation_grants,
            anomalies: anomalies.anomalies,
        },
        anomaly_records: anomalies.records,
        finished_tick: last_tick,
    }
}

fn collect_snapshot_anomalies(snapshot: &MatchSnapshot, previous_resources: &[u32; 2]) -> Vec<String> {
    let mut anomalies = Vec::new();

    for team in &snapshot.teams {
        if team.resource_points > MAX_TEAM_SCORE {
            anomalies.push(format!(
                "{:?} resources above max: {}",
                team.team, team.resource_points
            ));
        }
        if team.resource_points < previous_resources[team.team.index()] {
            anomalies.push(format!("{:?} resources decreased", team.team));
        }
    }

    if snapshot.near_victory_announced
        && snapshot
            .teams
            .iter()
            .all(|team| team.resource_points <= NEAR_VICTORY_SCORE)
    {
        anomalies.push("near victory announced below threshold".to_string());
    }

    for node in &snapshot.nodes {
        let contested = matches!(node.status, NodeStatus::Contested(_));
        match node.capture_remaining_ms {
            Some(_) if !contested => {
                anomalies.push(format!("capture timer on uncontested {}", node.name));
            }
            None if contested => {
                anomalies.push(format!("contested {} has no capture timer", node.name));
            }
            Some(remaining) if remaining > FLAG_CAPTURING_TIME_MS => {
                anomalies.push(format!("capture timer overflow on {}", node.name));
            }
            _ => {}
        }
        if node
            .banner_remaining_ms
            .is_some_and(|remaining| remaining > BANNER_SWAP_DELAY_MS)
        {
            anomalies.push(format!("banner timer overflow on {}", node.name));
        }
    }
    anomalies
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let seed = cli.seed.unwrap_or_else(now_ms);
    let minutes = cli.minutes.unwrap_or(30).clamp(1, 60);
    let players_per_team = cli.players.unwrap_or(5).clamp(1, 15);

    let strategies = match cli.scenario {
        Some(strategy) => vec![strategy],
        None => vec![
            Strategy::AllianceSweep,
            Strategy::SplitMap,
            Strategy::TugOfWar,
        ],
    };

    strategies
        .into_iter()
        .enumerate()
        .map(|(index, strategy)| Scenario {
            name: strategy_name(strategy),
            strategy,
            players_per_team,
            minutes,
            seed: seed.wrapping_add(index as u64),
        })
        .collect()
}

fn strategy_name(strategy: Strategy) -> String {
    match strategy {
        Strategy::AllianceSweep => "alliance-sweep",
        Strategy::SplitMap => "split-map",
        Strategy::TugOfWar => "tug-of-war",
    }
    .to_string()
}

fn winner_key(winner: Option<Team>) -> String {
    match winner {
        Some(Team::Alliance) => "alliance",
        Some(Team::Horde) => "horde",
        None => "draw",
    }
    .to_string()
}

fn default_match_id(seed: u64, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    match_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    scenarios: Vec<ScenarioResultLine>,
    winner_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
    total_duration_ms: u64,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let average_duration_ms = if scenario_count == 0 {
        0
    } else {
        total_duration_ms / scenario_count as u64
    };
    RunSummary {
        match_id,
        started_at_ms,
        finished_at_ms,
        scenario_count,
        anomaly_count,
        average_duration_ms,
        winner_counts,
        scenarios,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    match_id: &str,
    scenario: Option<&str>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        match_id: match_id.to_string(),
        scenario: scenario.map(|value| value.to_string()),
        tick,
        details,
    };
    match serde_json::to_string(&log_line) {
        Ok(line) => eprintln!("{line}"),
        Err(error) => eprintln!("{{\"level\":\"error\",\"event\":\"log_serialize_failed\",\"error\":\"{error}\"}}"),
    }
}

fn now_ms() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default()
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}
