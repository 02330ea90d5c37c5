//! Projection of node and score state onto the client protocol: world-state
//! key/value pairs, chat broadcasts and sound cues. Nothing here owns state.

use std::collections::BTreeMap;

use crate::constants::{
    get_node_icon, get_node_state_base, get_occupied_bases_world_state,
    get_resources_world_state, MAX_TEAM_SCORE, NEAR_VICTORY_SCORE, TEAM_COUNT,
    WORLD_STATE_ADD, WORLD_STATE_REMOVE, WS_RESOURCES_MAX, WS_RESOURCES_WARNING,
    WS_TRAILING_UNKNOWN, WS_TRAILING_UNKNOWN_VALUE,
};
use crate::types::{
    ChatChannel, ChatMessage, MatchEffect, NodeId, NodeStatus, SoundCue, Team, TransitionKind,
    WorldStateUpdate,
};

// Offset of each protocol code from the node's state base key.
const STATE_KEY_OFFSET: [u32; 5] = [0, 2, 3, 0, 1];

pub fn node_state_key(node: NodeId, status: NodeStatus) -> u32 {
    get_node_state_base(node) + STATE_KEY_OFFSET[status.protocol_code() as usize]
}

pub fn occupied_counts(statuses: &[NodeStatus]) -> [u32; TEAM_COUNT] {
    let mut counts = [0; TEAM_COUNT];
    for status in statuses {
        if let NodeStatus::Occupied(team) = status {
            counts[team.index()] += 1;
        }
    }
    counts
}

fn update(key: u32, value: u32) -> WorldStateUpdate {
    WorldStateUpdate { key, value }
}

/// Deltas for a node leaving `previous` and entering `current`, followed by
/// the refreshed occupied-base counts of both teams.
pub fn node_update_deltas(
    node: NodeId,
    previous: NodeStatus,
    current: NodeStatus,
    statuses: &[NodeStatus],
) -> Vec<WorldStateUpdate> {
    debug_assert!(current != NodeStatus::Neutral);
    let removed_key = if previous == NodeStatus::Neutral {
        get_node_icon(node)
    } else {
        node_state_key(node, previous)
    };
    let counts = occupied_counts(statuses);
    vec![
        update(removed_key, WORLD_STATE_REMOVE),
        update(node_state_key(node, current), WORLD_STATE_ADD),
        update(
            get_occupied_bases_world_state(Team::Alliance),
            counts[Team::Alliance.index()],
        ),
        update(
            get_occupied_bases_world_state(Team::Horde),
            counts[Team::Horde.index()],
        ),
    ]
}

pub fn resource_delta(team: Team, resource_points: u32) -> WorldStateUpdate {
    update(get_resources_world_state(team), resource_points)
}

/// Full dump sent to a joining client. Key order matches the per-transition
/// deltas so that replaying deltas over the post-reset dump reproduces it.
pub fn initial_world_states(
    statuses: &[NodeStatus],
    resources: [u32; TEAM_COUNT],
) -> Vec<WorldStateUpdate> {
    let mut states = Vec::new();

    for (index, status) in statuses.iter().enumerate() {
        let node = NodeId::from_registry_index(index);
        states.push(update(
            get_node_icon(node),
            u32::from(*status == NodeStatus::Neutral),
        ));
    }

    for (index, status) in statuses.iter().enumerate() {
        let node = NodeId::from_registry_index(index);
        for code in 1..STATE_KEY_OFFSET.len() {
            states.push(update(
                get_node_state_base(node) + STATE_KEY_OFFSET[code],
                u32::from(status.protocol_code() as usize == code),
            ));
        }
    }

    let counts = occupied_counts(statuses);
    states.push(update(
        get_occupied_bases_world_state(Team::Alliance),
        counts[Team::Alliance.index()],
    ));
    states.push(update(
        get_occupied_bases_world_state(Team::Horde),
        counts[Team::Horde.index()],
    ));

    states.push(update(WS_RESOURCES_MAX, MAX_TEAM_SCORE));
    states.push(update(WS_RESOURCES_WARNING, NEAR_VICTORY_SCORE));
    states.push(resource_delta(
        Team::Alliance,
        resources[Team::Alliance.index()],
    ));
    states.push(resource_delta(Team::Horde, resources[Team::Horde.index()]));

    states.push(update(WS_TRAILING_UNKNOWN, WS_TRAILING_UNKNOWN_VALUE));
    states
}

pub fn sound_for(kind: TransitionKind, team: Team) -> SoundCue {
    match kind {
        TransitionKind::Claimed => SoundCue::NodeClaimed,
        TransitionKind::Assaulted | TransitionKind::Defended => SoundCue::NodeAssaulted { team },
        TransitionKind::Captured => SoundCue::NodeCaptured { team },
    }
}

/// Chat and sound for a committed transition. `actor` is the clicking
/// player's name and is absent for timer-driven captures.
pub fn transition_announcements(
    kind: TransitionKind,
    node: NodeId,
    team: Team,
    actor: Option<&str>,
) -> Vec<MatchEffect> {
    let channel = ChatChannel::for_team(team);
    let by = actor.unwrap_or_default().to_string();
    let mut effects = Vec::new();
    match kind {
        TransitionKind::Claimed => effects.push(MatchEffect::Chat {
            channel,
            message: ChatMessage::NodeClaimed { node, team, by },
        }),
        TransitionKind::Assaulted => effects.push(MatchEffect::Chat {
            channel,
            message: ChatMessage::NodeAssaulted { node, by },
        }),
        TransitionKind::Defended => {
            effects.push(MatchEffect::Chat {
                channel,
                message: ChatMessage::NodeDefended { node, by },
            });
            effects.push(taken_announcement(node, team));
        }
        TransitionKind::Captured => effects.push(taken_announcement(node, team)),
    }
    effects.push(MatchEffect::Sound {
        cue: sound_for(kind, team),
    });
    effects
}

fn taken_announcement(node: NodeId, team: Team) -> MatchEffect {
    MatchEffect::Chat {
        channel: ChatChannel::Neutral,
        message: ChatMessage::NodeTaken { node, team },
    }
}

pub fn near_victory_announcements(team: Team) -> Vec<MatchEffect> {
    vec![
        MatchEffect::Chat {
            channel: ChatChannel::Neutral,
            message: ChatMessage::NearVictory { team },
        },
        MatchEffect::Sound {
            cue: SoundCue::NearVictory,
        },
    ]
}

/// Client-side view of the world-state protocol: last value per key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorldStateTable {
    values: BTreeMap<u32, u32>,
}

impl WorldStateTable {
    pub fn from_updates(updates: &[WorldStateUpdate]) -> Self {
        let mut table = Self::default();
        for update in updates {
            table.apply(*update);
        }
        table
    }

    pub fn apply(&mut self, update: WorldStateUpdate) {
        self.values.insert(update.key, update.value);
    }

    pub fn get(&self, key: u32) -> Option<u32> {
        self.values.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn entries(&self) -> Vec<WorldStateUpdate> {
        self.values
            .iter()
            .map(|(key, value)| update(*key, *value))
            .collect()
    }
}
