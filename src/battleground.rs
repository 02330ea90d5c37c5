use crate::engine::BattlegroundEngine;
use crate::types::{
    MatchEffect, MatchPlayer, MatchSnapshot, MatchSummary, Position, StatKind, Team,
    WorldStateUpdate,
};

/// What a match controller needs from a battleground type. Hosts hold a
/// `Box<dyn Battleground + Send>` and never depend on the concrete map.
pub trait Battleground {
    fn reset(&mut self);
    fn start(&mut self);
    fn update(&mut self, diff_ms: u64);

    fn add_player(&mut self, player: MatchPlayer);
    fn remove_player(&mut self, player_id: &str);
    fn has_player(&self, player_id: &str) -> bool;
    fn set_player_position(&mut self, player_id: &str, position: Position);

    fn event_player_clicked_on_flag(&mut self, player_id: &str, node_index: usize);
    fn handle_area_trigger(&mut self, player_id: &str, trigger_id: u32) -> bool;
    fn update_player_score(&mut self, player_id: &str, kind: StatKind, delta: u32);

    fn end_battleground(&mut self, winner: Option<Team>);
    fn premature_winner(&self) -> Option<Team>;
    fn is_ended(&self) -> bool;

    fn closest_graveyard(&self, player_id: &str) -> Option<Position>;
    fn fill_initial_world_states(&self) -> Vec<WorldStateUpdate>;
    fn drain_effects(&mut self) -> Vec<MatchEffect>;
    fn build_snapshot(&mut self, include_effects: bool) -> MatchSnapshot;
    fn build_summary(&self) -> MatchSummary;
}

impl Battleground for BattlegroundEngine {
    fn reset(&mut self) {
        BattlegroundEngine::reset(self);
    }

    fn start(&mut self) {
        BattlegroundEngine::start(self);
    }

    fn update(&mut self, diff_ms: u64) {
        BattlegroundEngine::update(self, diff_ms);
    }

    fn add_player(&mut self, player: MatchPlayer) {
        BattlegroundEngine::add_player(self, player);
    }

    fn remove_player(&mut self, player_id: &str) {
        BattlegroundEngine::remove_player(self, player_id);
    }

    fn has_player(&self, player_id: &str) -> bool {
        BattlegroundEngine::has_player(self, player_id)
    }

    fn set_player_position(&mut self, player_id: &str, position: Position) {
        BattlegroundEngine::set_player_position(self, player_id, position);
    }

    fn event_player_clicked_on_flag(&mut self, player_id: &str, node_index: usize) {
        BattlegroundEngine::event_player_clicked_on_flag(self, player_id, node_index);
    }

    fn handle_area_trigger(&mut self, player_id: &str, trigger_id: u32) -> bool {
        BattlegroundEngine::handle_area_trigger(self, player_id, trigger_id)
    }

    fn update_player_score(&mut self, player_id: &str, kind: StatKind, delta: u32) {
        BattlegroundEngine::update_player_score(self, player_id, kind, delta);
    }

    fn end_battleground(&mut self, winner: Option<Team>) {
        BattlegroundEngine::end_battleground(self, winner);
    }

    fn premature_winner(&self) -> Option<Team> {
        BattlegroundEngine::premature_winner(self)
    }

    fn is_ended(&self) -> bool {
        BattlegroundEngine::is_ended(self)
    }

    fn closest_graveyard(&self, player_id: &str) -> Option<Position> {
        BattlegroundEngine::closest_graveyard(self, player_id)
    }

    fn fill_initial_world_states(&self) -> Vec<WorldStateUpdate> {
        BattlegroundEngine::fill_initial_world_states(self)
    }

    fn drain_effects(&mut self) -> Vec<MatchEffect> {
        BattlegroundEngine::drain_effects(self)
    }

    fn build_snapshot(&mut self, include_effects: bool) -> MatchSnapshot {
        BattlegroundEngine::build_snapshot(self, include_effects)
    }

    fn build_summary(&self) -> MatchSummary {
        BattlegroundEngine::build_summary(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BattlegroundEngineOptions;
    use crate::constants::{FLAG_CAPTURING_TIME_MS, HORDE_EXIT_TRIGGER};

    fn boxed() -> Box<dyn Battleground + Send> {
        Box::new(BattlegroundEngine::new(BattlegroundEngineOptions::default()))
    }

    #[test]
    fn controller_drives_match_through_trait_object() {
        let mut battleground = boxed();
        battleground.add_player(MatchPlayer {
            id: "h1".to_string(),
            name: "Rexxar".to_string(),
            team: Team::Horde,
        });
        battleground.start();
        battleground.event_player_clicked_on_flag("h1", 4);
        battleground.update(FLAG_CAPTURING_TIME_MS);

        let snapshot = battleground.build_snapshot(true);
        assert_eq!(snapshot.teams[Team::Horde.index()].occupied_nodes, 1);
        assert!(!snapshot.effects.is_empty());
        assert!(battleground.drain_effects().is_empty());

        assert!(battleground.handle_area_trigger("h1", HORDE_EXIT_TRIGGER));
        let winner = battleground.premature_winner();
        assert_eq!(winner, Some(Team::Horde));
        battleground.end_battleground(winner);
        assert!(battleground.is_ended());
        assert_eq!(battleground.build_summary().winner, Some(Team::Horde));
    }

    #[test]
    fn reset_through_trait_restores_waiting_state() {
        let mut battleground = boxed();
        battleground.start();
        battleground.update(1_000);
        battleground.reset();
        let snapshot = battleground.build_snapshot(false);
        assert_eq!(snapshot.tick, 0);
        assert_eq!(battleground.fill_initial_world_states().len(), 32);
    }
}
