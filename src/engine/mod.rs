use crate::config::BattlegroundEngineOptions;
use crate::constants::{
    get_honor_interval, get_reputation_interval, get_win_match_honor, ALLIANCE_EXIT_TRIGGER,
    HORDE_EXIT_TRIGGER, NODE_COUNT, TEAM_COUNT,
};
use crate::presentation::initial_world_states;
use crate::types::{
    MatchEffect, MatchPlayer, MatchSnapshot, MatchStatus, MatchSummary, NodeId, NodeStatus,
    NodeView, Notice, PlayerMatchScore, Position, ScoreEntry, StatKind, Team, TeamScoreView,
    TimelineEvent, WorldStateUpdate,
};

mod node_system;
mod score_system;
mod timer_system;
mod utils;

use self::utils::nearest_location;

const SNAPSHOT_TIMELINE_LEN: usize = 24;

#[derive(Clone, Copy, Debug, PartialEq)]
struct PendingBanner {
    remaining_ms: u64,
    target: NodeStatus,
}

#[derive(Clone, Debug, PartialEq)]
struct NodeInternal {
    status: NodeStatus,
    previous_status: NodeStatus,
    capture_timer_ms: Option<u64>,
    pending_banner: Option<PendingBanner>,
    banner: NodeStatus,
}

impl NodeInternal {
    fn neutral() -> Self {
        Self {
            status: NodeStatus::Neutral,
            previous_status: NodeStatus::Neutral,
            capture_timer_ms: None,
            pending_banner: None,
            banner: NodeStatus::Neutral,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
struct TeamScore {
    resource_points: u32,
    tick_accumulator_ms: u64,
    honor_accumulator: u32,
    reputation_accumulator: u32,
}

#[derive(Clone, Debug)]
struct PlayerInternal {
    id: String,
    name: String,
    team: Team,
    position: Position,
    present: bool,
    score: PlayerMatchScore,
}

/// One capture-point match. Owns the node registry and team scores and queues
/// the effects every transition produces; callers drain and execute them.
#[derive(Clone, Debug)]
pub struct BattlegroundEngine {
    options: BattlegroundEngineOptions,
    status: MatchStatus,
    nodes: [NodeInternal; NODE_COUNT],
    teams: [TeamScore; TEAM_COUNT],
    near_victory_announced: bool,
    honor_interval: u32,
    reputation_interval: u32,
    players: Vec<PlayerInternal>,
    effects: Vec<MatchEffect>,
    timeline: Vec<TimelineEvent>,
    elapsed_ms: u64,
    tick_counter: u64,
    winner: Option<Team>,
}

impl BattlegroundEngine {
    pub fn new(options: BattlegroundEngineOptions) -> Self {
        let mut engine = Self {
            honor_interval: get_honor_interval(options.holiday_weekend),
            reputation_interval: get_reputation_interval(options.holiday_weekend),
            options,
            status: MatchStatus::WaitJoin,
            nodes: std::array::from_fn(|_| NodeInternal::neutral()),
            teams: std::array::from_fn(|_| TeamScore::default()),
            near_victory_announced: false,
            players: Vec::new(),
            effects: Vec::new(),
            timeline: Vec::new(),
            elapsed_ms: 0,
            tick_counter: 0,
            winner: None,
        };
        engine.reset();
        engine
    }

    /// Back to a fresh, not yet started match. Players and their scores are
    /// dropped along with node and team state.
    pub fn reset(&mut self) {
        self.status = MatchStatus::WaitJoin;
        self.nodes = std::array::from_fn(|_| NodeInternal::neutral());
        self.teams = std::array::from_fn(|_| TeamScore::default());
        self.near_victory_announced = false;
        self.honor_interval = get_honor_interval(self.options.holiday_weekend);
        self.reputation_interval = get_reputation_interval(self.options.holiday_weekend);
        self.players.clear();
        self.effects.clear();
        self.timeline.clear();
        self.elapsed_ms = 0;
        self.tick_counter = 0;
        self.winner = None;
    }

    /// Takes effect on the next `reset`.
    pub fn set_holiday_weekend(&mut self, holiday_weekend: bool) {
        self.options.holiday_weekend = holiday_weekend;
    }

    pub fn options(&self) -> &BattlegroundEngineOptions {
        &self.options
    }

    pub fn start(&mut self) {
        if self.status != MatchStatus::WaitJoin {
            return;
        }
        self.status = MatchStatus::InProgress;
        self.effects.push(MatchEffect::MatchStarted);
        self.push_timeline("The battle has begun".to_string());
        log::info!(
            "battleground started with {} players (bracket {}, weekend {})",
            self.players.len(),
            self.options.bracket_id,
            self.options.holiday_weekend
        );
    }

    pub fn status(&self) -> MatchStatus {
        self.status
    }

    pub fn is_ended(&self) -> bool {
        self.status == MatchStatus::Ended
    }

    pub fn winner(&self) -> Option<Team> {
        self.winner
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn node_status(&self, node: NodeId) -> NodeStatus {
        self.nodes[node.index()].status
    }

    pub fn capture_remaining_ms(&self, node: NodeId) -> Option<u64> {
        self.nodes[node.index()].capture_timer_ms
    }

    pub fn resource_points(&self, team: Team) -> u32 {
        self.teams[team.index()].resource_points
    }

    pub fn add_player(&mut self, player: MatchPlayer) {
        if let Some(existing) = self.players.iter_mut().find(|p| p.id == player.id) {
            existing.name = player.name;
            existing.team = player.team;
            existing.present = true;
            return;
        }
        self.players.push(PlayerInternal {
            id: player.id,
            name: player.name,
            team: player.team,
            position: Position::default(),
            present: true,
            score: PlayerMatchScore::default(),
        });
    }

    /// The score entry is kept so the player still shows up in the summary.
    pub fn remove_player(&mut self, player_id: &str) {
        if let Some(player) = self.players.iter_mut().find(|p| p.id == player_id) {
            player.present = false;
        }
    }

    pub fn has_player(&self, player_id: &str) -> bool {
        self.find_present_player(player_id).is_some()
    }

    pub fn player_team(&self, player_id: &str) -> Option<Team> {
        self.find_present_player(player_id).map(|p| p.team)
    }

    pub fn player_score(&self, player_id: &str) -> Option<&PlayerMatchScore> {
        self.players
            .iter()
            .find(|p| p.id == player_id)
            .map(|p| &p.score)
    }

    pub fn set_player_position(&mut self, player_id: &str, position: Position) {
        if let Some(player) = self
            .players
            .iter_mut()
            .find(|p| p.id == player_id && p.present)
        {
            player.position = position;
        }
    }

    pub fn update(&mut self, diff_ms: u64) {
        if self.status != MatchStatus::InProgress {
            return;
        }
        self.tick_counter += 1;
        self.elapsed_ms = self.elapsed_ms.saturating_add(diff_ms);

        self.update_node_timers(diff_ms);
        self.update_team_scores(diff_ms);
        self.check_victory();
    }

    pub fn update_player_score(&mut self, player_id: &str, kind: StatKind, delta: u32) {
        let Some(player) = self.players.iter_mut().find(|p| p.id == player_id) else {
            return;
        };
        let score = &mut player.score;
        let counter = match kind {
            StatKind::BasesAssaulted => &mut score.bases_assaulted,
            StatKind::BasesDefended => &mut score.bases_defended,
            StatKind::KillingBlows => &mut score.killing_blows,
            StatKind::Deaths => &mut score.deaths,
            StatKind::HonorableKills => &mut score.honorable_kills,
            StatKind::BonusHonor => &mut score.bonus_honor,
        };
        *counter = counter.saturating_add(delta);
    }

    /// Returns false when the trigger does not belong to this battleground.
    pub fn handle_area_trigger(&mut self, player_id: &str, trigger_id: u32) -> bool {
        let (required_team, notice) = match trigger_id {
            ALLIANCE_EXIT_TRIGGER => (Team::Alliance, Notice::OnlyAllianceCanUse),
            HORDE_EXIT_TRIGGER => (Team::Horde, Notice::OnlyHordeCanUse),
            _ => return false,
        };
        let Some(team) = self.player_team(player_id) else {
            return true;
        };
        if team != required_team {
            self.effects.push(MatchEffect::Notify {
                player_id: player_id.to_string(),
                notice,
            });
        } else {
            self.effects.push(MatchEffect::LeaveBattleground {
                player_id: player_id.to_string(),
            });
        }
        true
    }

    pub fn end_battleground(&mut self, winner: Option<Team>) {
        if self.status == MatchStatus::Ended {
            return;
        }
        if let Some(team) = winner {
            self.effects.push(MatchEffect::RewardHonor {
                team,
                amount: get_win_match_honor(self.options.bracket_id),
            });
        }
        self.status = MatchStatus::Ended;
        self.winner = winner;
        self.effects.push(MatchEffect::MatchEnded { winner });
        self.push_timeline(match winner {
            Some(team) => format!("{team:?} wins"),
            None => "The battle ended in a draw".to_string(),
        });
        log::info!(
            "battleground ended after {} ms, winner {:?} (alliance {}, horde {})",
            self.elapsed_ms,
            winner,
            self.resource_points(Team::Alliance),
            self.resource_points(Team::Horde)
        );
    }

    /// Winner when the match has to stop early: more resources, then more
    /// players still present.
    pub fn premature_winner(&self) -> Option<Team> {
        let alliance = self.resource_points(Team::Alliance);
        let horde = self.resource_points(Team::Horde);
        if alliance != horde {
            return Some(if alliance > horde {
                Team::Alliance
            } else {
                Team::Horde
            });
        }
        let present = |team: Team| {
            self.players
                .iter()
                .filter(|p| p.present && p.team == team)
                .count()
        };
        let alliance_players = present(Team::Alliance);
        let horde_players = present(Team::Horde);
        if alliance_players == horde_players {
            None
        } else if alliance_players > horde_players {
            Some(Team::Alliance)
        } else {
            Some(Team::Horde)
        }
    }

    pub fn closest_graveyard(&self, player_id: &str) -> Option<Position> {
        let player = self.find_present_player(player_id)?;
        self.closest_graveyard_for(player.team, player.position)
    }

    pub fn closest_graveyard_for(&self, team: Team, from: Position) -> Option<Position> {
        let graveyards = &self.options.graveyards;
        let owned = NodeId::ALL
            .into_iter()
            .filter(|node| self.nodes[node.index()].status.is_occupied_by(team))
            .filter_map(|node| graveyards.node(node));
        nearest_location(owned, from).or_else(|| graveyards.team_start(team))
    }

    pub fn fill_initial_world_states(&self) -> Vec<WorldStateUpdate> {
        initial_world_states(&self.node_statuses(), self.resources())
    }

    pub fn drain_effects(&mut self) -> Vec<MatchEffect> {
        std::mem::take(&mut self.effects)
    }

    pub fn build_snapshot(&mut self, include_effects: bool) -> MatchSnapshot {
        let timeline_start = self.timeline.len().saturating_sub(SNAPSHOT_TIMELINE_LEN);
        let nodes = NodeId::ALL
            .iter()
            .map(|node| {
                let internal = &self.nodes[node.index()];
                NodeView {
                    id: *node,
                    name: node.name().to_string(),
                    status: internal.status,
                    previous_status: internal.previous_status,
                    banner: internal.banner,
                    capture_remaining_ms: internal.capture_timer_ms,
                    banner_remaining_ms: internal.pending_banner.map(|b| b.remaining_ms),
                }
            })
            .collect();
        let teams = Team::ALL
            .iter()
            .map(|team| TeamScoreView {
                team: *team,
                resource_points: self.resource_points(*team),
                occupied_nodes: self.owned_node_count(*team),
            })
            .collect();
        MatchSnapshot {
            tick: self.tick_counter,
            elapsed_ms: self.elapsed_ms,
            status: self.status,
            nodes,
            teams,
            near_victory_announced: self.near_victory_announced,
            effects: if include_effects {
                self.drain_effects()
            } else {
                Vec::new()
            },
            timeline: self.timeline[timeline_start..].to_vec(),
        }
    }

    pub fn build_summary(&self) -> MatchSummary {
        let mut ranking: Vec<ScoreEntry> = self
            .players
            .iter()
            .map(|player| ScoreEntry {
                player_id: player.id.clone(),
                name: player.name.clone(),
                team: player.team,
                score: player.score.clone(),
            })
            .collect();
        ranking.sort_by(|a, b| {
            let a_total = a.score.bases_assaulted + a.score.bases_defended;
            let b_total = b.score.bases_assaulted + b.score.bases_defended;
            b_total.cmp(&a_total).then_with(|| a.name.cmp(&b.name))
        });

        MatchSummary {
            winner: self.winner,
            duration_ms: self.elapsed_ms,
            alliance_resources: self.resource_points(Team::Alliance),
            horde_resources: self.resource_points(Team::Horde),
            timeline: self.timeline.clone(),
            ranking,
        }
    }

    fn find_present_player(&self, player_id: &str) -> Option<&PlayerInternal> {
        self.players.iter().find(|p| p.id == player_id && p.present)
    }

    fn node_statuses(&self) -> [NodeStatus; NODE_COUNT] {
        std::array::from_fn(|slot| self.nodes[slot].status)
    }

    fn resources(&self) -> [u32; TEAM_COUNT] {
        std::array::from_fn(|slot| self.teams[slot].resource_points)
    }

    fn owned_node_count(&self, team: Team) -> usize {
        self.nodes
            .iter()
            .filter(|node| node.status.is_occupied_by(team))
            .count()
    }

    fn push_timeline(&mut self, label: String) {
        self.timeline.push(TimelineEvent {
            at_ms: self.elapsed_ms,
            label,
        });
    }
}
