use crate::types::{NodeId, Team};

pub const TICK_RATE: u32 = 20;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

pub const NODE_COUNT: usize = 5;
pub const TEAM_COUNT: usize = 2;

pub const FLAG_CAPTURING_TIME_MS: u64 = 60_000;
pub const BANNER_SWAP_DELAY_MS: u64 = 2_000;

pub const MAX_TEAM_SCORE: u32 = 2_000;
pub const NEAR_VICTORY_SCORE: u32 = 1_800;

pub const NORMAL_HONOR_INTERVAL: u32 = 330;
pub const WEEKEND_HONOR_INTERVAL: u32 = 200;
pub const NORMAL_REPUTATION_INTERVAL: u32 = 200;
pub const WEEKEND_REPUTATION_INTERVAL: u32 = 150;
pub const REPUTATION_PER_GRANT: u32 = 10;

pub const ALLIANCE_FACTION_ID: u32 = 509;
pub const HORDE_FACTION_ID: u32 = 510;

pub const FOUR_BASES_REWARD_SPELL: u32 = 24_061;
pub const FIVE_BASES_REWARD_SPELL: u32 = 24_064;

pub const ALLIANCE_EXIT_TRIGGER: u32 = 3_948;
pub const HORDE_EXIT_TRIGGER: u32 = 3_949;

pub const BRACKET_COUNT: usize = 6;
const PER_TICK_HONOR: [u32; BRACKET_COUNT] = [24, 41, 68, 113, 189, 198];
const WIN_MATCH_HONOR: [u32; BRACKET_COUNT] = [28, 48, 80, 136, 226, 237];

// World-state keys understood by the client map.
pub const WS_RESOURCES_ALLIANCE: u32 = 1_776;
pub const WS_RESOURCES_HORDE: u32 = 1_777;
pub const WS_OCCUPIED_BASES_HORDE: u32 = 1_778;
pub const WS_OCCUPIED_BASES_ALLIANCE: u32 = 1_779;
pub const WS_RESOURCES_MAX: u32 = 1_780;
pub const WS_RESOURCES_WARNING: u32 = 1_955;
pub const WS_TRAILING_UNKNOWN: u32 = 0x745;
pub const WS_TRAILING_UNKNOWN_VALUE: u32 = 0x2;
pub const WORLD_STATE_REMOVE: u32 = 0;
pub const WORLD_STATE_ADD: u32 = 1;

const WS_NODE_STATE_BASE: [u32; NODE_COUNT] = [1_767, 1_782, 1_772, 1_792, 1_787];
const WS_NODE_ICON: [u32; NODE_COUNT] = [1_842, 1_846, 1_845, 1_844, 1_843];

pub const SOUND_NODE_CLAIMED: u32 = 8_192;
pub const SOUND_NODE_CAPTURED_ALLIANCE: u32 = 8_173;
pub const SOUND_NODE_CAPTURED_HORDE: u32 = 8_213;
pub const SOUND_NODE_ASSAULTED_ALLIANCE: u32 = 8_212;
pub const SOUND_NODE_ASSAULTED_HORDE: u32 = 8_174;
pub const SOUND_NEAR_VICTORY: u32 = 8_456;

/// Resource tick interval in milliseconds for a team holding `owned_nodes`.
pub fn get_tick_interval_ms(owned_nodes: usize) -> u64 {
    match owned_nodes {
        0 => 0,
        1 => 12_000,
        2 => 9_000,
        3 => 6_000,
        4 => 3_000,
        _ => 1_000,
    }
}

pub fn get_tick_points(owned_nodes: usize) -> u32 {
    match owned_nodes {
        0 => 0,
        1..=4 => 10,
        _ => 30,
    }
}

pub fn get_honor_interval(holiday_weekend: bool) -> u32 {
    if holiday_weekend {
        WEEKEND_HONOR_INTERVAL
    } else {
        NORMAL_HONOR_INTERVAL
    }
}

pub fn get_reputation_interval(holiday_weekend: bool) -> u32 {
    if holiday_weekend {
        WEEKEND_REPUTATION_INTERVAL
    } else {
        NORMAL_REPUTATION_INTERVAL
    }
}

pub fn get_per_tick_honor(bracket_id: usize) -> u32 {
    PER_TICK_HONOR[bracket_id.min(BRACKET_COUNT - 1)]
}

pub fn get_win_match_honor(bracket_id: usize) -> u32 {
    WIN_MATCH_HONOR[bracket_id.min(BRACKET_COUNT - 1)]
}

pub fn get_faction_id(team: Team) -> u32 {
    match team {
        Team::Alliance => ALLIANCE_FACTION_ID,
        Team::Horde => HORDE_FACTION_ID,
    }
}

pub fn get_node_state_base(node: NodeId) -> u32 {
    WS_NODE_STATE_BASE[node.index()]
}

pub fn get_node_icon(node: NodeId) -> u32 {
    WS_NODE_ICON[node.index()]
}

pub fn get_resources_world_state(team: Team) -> u32 {
    match team {
        Team::Alliance => WS_RESOURCES_ALLIANCE,
        Team::Horde => WS_RESOURCES_HORDE,
    }
}

pub fn get_occupied_bases_world_state(team: Team) -> u32 {
    match team {
        Team::Alliance => WS_OCCUPIED_BASES_ALLIANCE,
        Team::Horde => WS_OCCUPIED_BASES_HORDE,
    }
}
