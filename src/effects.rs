use crate::types::{
    ChatChannel, ChatMessage, MatchEffect, NodeId, NodeStatus, Notice, SoundCue, Team,
    WorldStateUpdate,
};

/// Executes what the engine decided. The engine never talks to clients,
/// characters or the map directly; it queues `MatchEffect`s and the host
/// hands them to a sink.
pub trait EffectSink {
    fn update_world_state(&mut self, update: WorldStateUpdate);
    fn send_chat(&mut self, channel: ChatChannel, message: &ChatMessage);
    fn play_sound(&mut self, cue: SoundCue);
    fn spawn_banner(&mut self, node: NodeId, status: NodeStatus);
    fn enter_pvp_combat(&mut self, player_id: &str);
    fn cast_team_reward(&mut self, team: Team, spell_id: u32);
    fn reward_honor(&mut self, team: Team, amount: u32);
    fn reward_reputation(&mut self, team: Team, faction_id: u32, amount: u32);
    fn notify(&mut self, player_id: &str, notice: Notice);
    fn leave_battleground(&mut self, player_id: &str);

    fn match_started(&mut self) {}

    fn match_ended(&mut self, _winner: Option<Team>) {}
}

pub fn dispatch_effects<S: EffectSink + ?Sized>(sink: &mut S, effects: &[MatchEffect]) {
    for effect in effects {
        match effect {
            MatchEffect::WorldState { key, value } => sink.update_world_state(WorldStateUpdate {
                key: *key,
                value: *value,
            }),
            MatchEffect::Chat { channel, message } => sink.send_chat(*channel, message),
            MatchEffect::Sound { cue } => sink.play_sound(*cue),
            MatchEffect::SpawnBanner { node, status } => sink.spawn_banner(*node, *status),
            MatchEffect::EnterPvpCombat { player_id } => sink.enter_pvp_combat(player_id),
            MatchEffect::TeamReward { team, reward } => {
                sink.cast_team_reward(*team, reward.spell_id())
            }
            MatchEffect::RewardHonor { team, amount } => sink.reward_honor(*team, *amount),
            MatchEffect::RewardReputation {
                team,
                faction_id,
                amount,
            } => sink.reward_reputation(*team, *faction_id, *amount),
            MatchEffect::Notify { player_id, notice } => sink.notify(player_id, *notice),
            MatchEffect::LeaveBattleground { player_id } => sink.leave_battleground(player_id),
            MatchEffect::MatchStarted => sink.match_started(),
            MatchEffect::MatchEnded { winner } => sink.match_ended(*winner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{FIVE_BASES_REWARD_SPELL, HORDE_FACTION_ID};
    use crate::presentation::WorldStateTable;
    use crate::types::TeamReward;

    #[derive(Default)]
    struct RecordingSink {
        world_states: WorldStateTable,
        calls: Vec<String>,
    }

    impl EffectSink for RecordingSink {
        fn update_world_state(&mut self, update: WorldStateUpdate) {
            self.world_states.apply(update);
        }

        fn send_chat(&mut self, channel: ChatChannel, _message: &ChatMessage) {
            self.calls.push(format!("chat:{channel:?}"));
        }

        fn play_sound(&mut self, cue: SoundCue) {
            self.calls.push(format!("sound:{}", cue.sound_id()));
        }

        fn spawn_banner(&mut self, node: NodeId, status: NodeStatus) {
            self.calls
                .push(format!("banner:{}:{}", node.index(), status.protocol_code()));
        }

        fn enter_pvp_combat(&mut self, player_id: &str) {
            self.calls.push(format!("pvp:{player_id}"));
        }

        fn cast_team_reward(&mut self, team: Team, spell_id: u32) {
            self.calls.push(format!("spell:{team:?}:{spell_id}"));
        }

        fn reward_honor(&mut self, team: Team, amount: u32) {
            self.calls.push(format!("honor:{team:?}:{amount}"));
        }

        fn reward_reputation(&mut self, team: Team, faction_id: u32, amount: u32) {
            self.calls
                .push(format!("reputation:{team:?}:{faction_id}:{amount}"));
        }

        fn notify(&mut self, player_id: &str, notice: Notice) {
            self.calls.push(format!("notify:{player_id}:{notice:?}"));
        }

        fn leave_battleground(&mut self, player_id: &str) {
            self.calls.push(format!("leave:{player_id}"));
        }
    }

    #[test]
    fn dispatch_routes_each_effect_in_order() {
        let effects = vec![
            MatchEffect::WorldState {
                key: 1_776,
                value: 40,
            },
            MatchEffect::EnterPvpCombat {
                player_id: "p1".to_string(),
            },
            MatchEffect::TeamReward {
                team: Team::Horde,
                reward: TeamReward::FiveBases,
            },
            MatchEffect::RewardReputation {
                team: Team::Horde,
                faction_id: HORDE_FACTION_ID,
                amount: 10,
            },
            MatchEffect::SpawnBanner {
                node: NodeId::Farm,
                status: NodeStatus::Occupied(Team::Horde),
            },
            MatchEffect::MatchEnded {
                winner: Some(Team::Horde),
            },
        ];

        let mut sink = RecordingSink::default();
        dispatch_effects(&mut sink, &effects);

        assert_eq!(sink.world_states.get(1_776), Some(40));
        assert_eq!(
            sink.calls,
            vec![
                "pvp:p1".to_string(),
                format!("spell:Horde:{FIVE_BASES_REWARD_SPELL}"),
                format!("reputation:Horde:{HORDE_FACTION_ID}:10"),
                "banner:2:4".to_string(),
            ]
        );
    }

    #[test]
    fn dispatch_accepts_trait_objects() {
        let mut sink = RecordingSink::default();
        let dyn_sink: &mut dyn EffectSink = &mut sink;
        dispatch_effects(
            dyn_sink,
            &[MatchEffect::Sound {
                cue: SoundCue::NearVictory,
            }],
        );
        assert_eq!(sink.calls, vec!["sound:8456".to_string()]);
    }
}
