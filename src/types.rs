use serde::{Deserialize, Serialize};

use crate::constants::{
    FIVE_BASES_REWARD_SPELL, FOUR_BASES_REWARD_SPELL, NODE_COUNT, SOUND_NEAR_VICTORY,
    SOUND_NODE_ASSAULTED_ALLIANCE, SOUND_NODE_ASSAULTED_HORDE, SOUND_NODE_CAPTURED_ALLIANCE,
    SOUND_NODE_CAPTURED_HORDE, SOUND_NODE_CLAIMED,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Alliance,
    Horde,
}

impl Team {
    pub const ALL: [Team; 2] = [Team::Alliance, Team::Horde];

    pub fn index(self) -> usize {
        match self {
            Self::Alliance => 0,
            Self::Horde => 1,
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Self::Alliance => Self::Horde,
            Self::Horde => Self::Alliance,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "alliance" => Some(Self::Alliance),
            "horde" => Some(Self::Horde),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeId {
    Stables,
    Blacksmith,
    Farm,
    LumberMill,
    GoldMine,
}

impl NodeId {
    pub const ALL: [NodeId; NODE_COUNT] = [
        NodeId::Stables,
        NodeId::Blacksmith,
        NodeId::Farm,
        NodeId::LumberMill,
        NodeId::GoldMine,
    ];

    /// Resolves a client supplied index. Unknown indices are `None`.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Resolves a slot of the node registry. Every slot must map to a known
    /// capture point; anything else means the registry was built wrong.
    pub fn from_registry_index(index: usize) -> Self {
        match Self::from_index(index) {
            Some(node) => node,
            None => panic!("node registry misconfigured: no capture point at slot {index}"),
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::Stables => 0,
            Self::Blacksmith => 1,
            Self::Farm => 2,
            Self::LumberMill => 3,
            Self::GoldMine => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Stables => "Stables",
            Self::Blacksmith => "Blacksmith",
            Self::Farm => "Farm",
            Self::LumberMill => "Lumber Mill",
            Self::GoldMine => "Gold Mine",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "team", rename_all = "snake_case")]
pub enum NodeStatus {
    Neutral,
    Contested(Team),
    Occupied(Team),
}

impl NodeStatus {
    pub fn team(self) -> Option<Team> {
        match self {
            Self::Neutral => None,
            Self::Contested(team) | Self::Occupied(team) => Some(team),
        }
    }

    pub fn is_occupied_by(self, team: Team) -> bool {
        self == Self::Occupied(team)
    }

    pub fn is_contested(self) -> bool {
        matches!(self, Self::Contested(_))
    }

    /// A team may only touch a node that is neutral or held by the other side.
    pub fn accepts_interaction_from(self, team: Team) -> bool {
        match self.team() {
            None => true,
            Some(holder) => holder != team,
        }
    }

    /// Integer encoding used by the client map protocol.
    pub fn protocol_code(self) -> u8 {
        match self {
            Self::Neutral => 0,
            Self::Contested(Team::Alliance) => 1,
            Self::Contested(Team::Horde) => 2,
            Self::Occupied(Team::Alliance) => 3,
            Self::Occupied(Team::Horde) => 4,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    WaitJoin,
    InProgress,
    Ended,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    BasesAssaulted,
    BasesDefended,
    KillingBlows,
    Deaths,
    HonorableKills,
    BonusHonor,
}

impl StatKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "bases_assaulted" => Some(Self::BasesAssaulted),
            "bases_defended" => Some(Self::BasesDefended),
            "killing_blows" => Some(Self::KillingBlows),
            "deaths" => Some(Self::Deaths),
            "honorable_kills" => Some(Self::HonorableKills),
            "bonus_honor" => Some(Self::BonusHonor),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PlayerMatchScore {
    #[serde(rename = "basesAssaulted")]
    pub bases_assaulted: u32,
    #[serde(rename = "basesDefended")]
    pub bases_defended: u32,
    #[serde(rename = "killingBlows")]
    pub killing_blows: u32,
    pub deaths: u32,
    #[serde(rename = "honorableKills")]
    pub honorable_kills: u32,
    #[serde(rename = "bonusHonor")]
    pub bonus_honor: u32,
}

#[derive(Clone, Debug)]
pub struct MatchPlayer {
    pub id: String,
    pub name: String,
    pub team: Team,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Claimed,
    Assaulted,
    Defended,
    Captured,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatChannel {
    Alliance,
    Horde,
    Neutral,
}

impl ChatChannel {
    pub fn for_team(team: Team) -> Self {
        match team {
            Team::Alliance => Self::Alliance,
            Team::Horde => Self::Horde,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChatMessage {
    NodeClaimed { node: NodeId, team: Team, by: String },
    NodeAssaulted { node: NodeId, by: String },
    NodeDefended { node: NodeId, by: String },
    NodeTaken { node: NodeId, team: Team },
    NearVictory { team: Team },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SoundCue {
    NodeClaimed,
    NodeAssaulted { team: Team },
    NodeCaptured { team: Team },
    NearVictory,
}

impl SoundCue {
    pub fn sound_id(self) -> u32 {
        match self {
            Self::NodeClaimed => SOUND_NODE_CLAIMED,
            Self::NodeAssaulted {
                team: Team::Alliance,
            } => SOUND_NODE_ASSAULTED_ALLIANCE,
            Self::NodeAssaulted { team: Team::Horde } => SOUND_NODE_ASSAULTED_HORDE,
            Self::NodeCaptured {
                team: Team::Alliance,
            } => SOUND_NODE_CAPTURED_ALLIANCE,
            Self::NodeCaptured { team: Team::Horde } => SOUND_NODE_CAPTURED_HORDE,
            Self::NearVictory => SOUND_NEAR_VICTORY,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamReward {
    FourBases,
    FiveBases,
}

impl TeamReward {
    pub fn spell_id(self) -> u32 {
        match self {
            Self::FourBases => FOUR_BASES_REWARD_SPELL,
            Self::FiveBases => FIVE_BASES_REWARD_SPELL,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    OnlyAllianceCanUse,
    OnlyHordeCanUse,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct WorldStateUpdate {
    pub key: u32,
    pub value: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MatchEffect {
    WorldState {
        key: u32,
        value: u32,
    },
    Chat {
        channel: ChatChannel,
        message: ChatMessage,
    },
    Sound {
        cue: SoundCue,
    },
    SpawnBanner {
        node: NodeId,
        status: NodeStatus,
    },
    EnterPvpCombat {
        #[serde(rename = "playerId")]
        player_id: String,
    },
    TeamReward {
        team: Team,
        reward: TeamReward,
    },
    RewardHonor {
        team: Team,
        amount: u32,
    },
    RewardReputation {
        team: Team,
        #[serde(rename = "factionId")]
        faction_id: u32,
        amount: u32,
    },
    Notify {
        #[serde(rename = "playerId")]
        player_id: String,
        notice: Notice,
    },
    LeaveBattleground {
        #[serde(rename = "playerId")]
        player_id: String,
    },
    MatchStarted,
    MatchEnded {
        winner: Option<Team>,
    },
}

impl From<WorldStateUpdate> for MatchEffect {
    fn from(update: WorldStateUpdate) -> Self {
        MatchEffect::WorldState {
            key: update.key,
            value: update.value,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimelineEvent {
    #[serde(rename = "atMs")]
    pub at_ms: u64,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NodeView {
    pub id: NodeId,
    pub name: String,
    pub status: NodeStatus,
    #[serde(rename = "previousStatus")]
    pub previous_status: NodeStatus,
    pub banner: NodeStatus,
    #[serde(rename = "captureRemainingMs")]
    pub capture_remaining_ms: Option<u64>,
    #[serde(rename = "bannerRemainingMs")]
    pub banner_remaining_ms: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TeamScoreView {
    pub team: Team,
    #[serde(rename = "resourcePoints")]
    pub resource_points: u32,
    #[serde(rename = "occupiedNodes")]
    pub occupied_nodes: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatchSnapshot {
    pub tick: u64,
    #[serde(rename = "elapsedMs")]
    pub elapsed_ms: u64,
    pub status: MatchStatus,
    pub nodes: Vec<NodeView>,
    pub teams: Vec<TeamScoreView>,
    #[serde(rename = "nearVictoryAnnounced")]
    pub near_victory_announced: bool,
    pub effects: Vec<MatchEffect>,
    pub timeline: Vec<TimelineEvent>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoreEntry {
    #[serde(rename = "playerId")]
    pub player_id: String,
    pub name: String,
    pub team: Team,
    #[serde(flatten)]
    pub score: PlayerMatchScore,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatchSummary {
    pub winner: Option<Team>,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
    #[serde(rename = "allianceResources")]
    pub alliance_resources: u32,
    #[serde(rename = "hordeResources")]
    pub horde_resources: u32,
    pub timeline: Vec<TimelineEvent>,
    pub ranking: Vec<ScoreEntry>,
}

#[derive(Clone, Debug, Serialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub matches: u64,
    pub wins: u64,
    #[serde(rename = "winRate")]
    pub win_rate: f64,
    #[serde(rename = "avgBasesAssaulted")]
    pub avg_bases_assaulted: f64,
    #[serde(rename = "avgBasesDefended")]
    pub avg_bases_defended: f64,
    #[serde(rename = "updatedAtMs")]
    pub updated_at_ms: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct LeaderboardResponse {
    #[serde(rename = "generatedAtIso")]
    pub generated_at_iso: String,
    pub entries: Vec<LeaderboardEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_code_is_unique_per_status() {
        let statuses = [
            NodeStatus::Neutral,
            NodeStatus::Contested(Team::Alliance),
            NodeStatus::Contested(Team::Horde),
            NodeStatus::Occupied(Team::Alliance),
            NodeStatus::Occupied(Team::Horde),
        ];
        let codes: Vec<u8> = statuses.iter().map(|s| s.protocol_code()).collect();
        assert_eq!(codes, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn friendly_nodes_reject_interaction() {
        assert!(NodeStatus::Neutral.accepts_interaction_from(Team::Horde));
        assert!(!NodeStatus::Contested(Team::Horde).accepts_interaction_from(Team::Horde));
        assert!(!NodeStatus::Occupied(Team::Alliance).accepts_interaction_from(Team::Alliance));
        assert!(NodeStatus::Occupied(Team::Alliance).accepts_interaction_from(Team::Horde));
    }

    #[test]
    fn node_index_lookup_rejects_unknown_slots() {
        assert_eq!(NodeId::from_index(4), Some(NodeId::GoldMine));
        assert_eq!(NodeId::from_index(5), None);
        for node in NodeId::ALL {
            assert_eq!(NodeId::from_index(node.index()), Some(node));
        }
    }

    #[test]
    #[should_panic(expected = "node registry misconfigured")]
    fn registry_slot_outside_known_nodes_is_fatal() {
        let _ = NodeId::from_registry_index(NODE_COUNT);
    }

    #[test]
    fn sound_cue_resolves_team_specific_ids() {
        assert_eq!(
            SoundCue::NodeCaptured { team: Team::Horde }.sound_id(),
            SOUND_NODE_CAPTURED_HORDE
        );
        assert_eq!(
            SoundCue::NodeAssaulted {
                team: Team::Alliance
            }
            .sound_id(),
            SOUND_NODE_ASSAULTED_ALLIANCE
        );
    }

    #[test]
    fn effects_serialize_with_type_tag() {
        let effect = MatchEffect::SpawnBanner {
            node: NodeId::LumberMill,
            status: NodeStatus::Contested(Team::Horde),
        };
        let value = serde_json::to_value(&effect).expect("effect serializes");
        assert_eq!(value["type"], "spawn_banner");
        assert_eq!(value["node"], "lumber_mill");
        assert_eq!(value["status"]["kind"], "contested");
        assert_eq!(value["status"]["team"], "horde");
    }
}
