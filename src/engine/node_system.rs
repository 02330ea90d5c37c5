use super::{BattlegroundEngine, PendingBanner};
use crate::constants::{BANNER_SWAP_DELAY_MS, FLAG_CAPTURING_TIME_MS};
use crate::presentation::{node_update_deltas, transition_announcements};
use crate::types::{
    MatchEffect, MatchStatus, NodeId, NodeStatus, StatKind, Team, TeamReward, TransitionKind,
};

impl BattlegroundEngine {
    /// A player used the banner of the node at `node_index`. Clicks outside a
    /// running match, on unknown nodes, by unknown players or on nodes the
    /// player's team already holds are ignored.
    pub fn event_player_clicked_on_flag(&mut self, player_id: &str, node_index: usize) {
        if self.status != MatchStatus::InProgress {
            return;
        }
        let Some(node) = NodeId::from_index(node_index) else {
            log::debug!("ignoring click on unknown node {node_index} from {player_id}");
            return;
        };
        let Some((team, name)) = self
            .find_present_player(player_id)
            .map(|player| (player.team, player.name.clone()))
        else {
            return;
        };

        let slot = node.index();
        let current = self.nodes[slot].status;
        if !current.accepts_interaction_from(team) {
            return;
        }

        self.effects.push(MatchEffect::EnterPvpCombat {
            player_id: player_id.to_string(),
        });

        let kind = match current {
            NodeStatus::Neutral => TransitionKind::Claimed,
            NodeStatus::Contested(_)
                if self.nodes[slot].previous_status == NodeStatus::Occupied(team) =>
            {
                TransitionKind::Defended
            }
            NodeStatus::Contested(_) | NodeStatus::Occupied(_) => TransitionKind::Assaulted,
        };

        if kind == TransitionKind::Defended {
            self.update_player_score(player_id, StatKind::BasesDefended, 1);
            self.commit_transition(node, NodeStatus::Occupied(team));
            self.node_occupied(team);
        } else {
            self.update_player_score(player_id, StatKind::BasesAssaulted, 1);
            self.commit_transition(node, NodeStatus::Contested(team));
        }
        self.effects
            .extend(transition_announcements(kind, node, team, Some(&name)));

        log::debug!(
            "{} {:?} {} ({:?} -> {:?})",
            name,
            kind,
            node.name(),
            current,
            self.nodes[slot].status
        );
        if kind == TransitionKind::Defended {
            self.push_timeline(format!("{name} defended the {}", node.name()));
        }
    }

    /// Moves `node` into `next`: remembers the status it leaves, arms or
    /// clears the capture timer, queues the banner swap and emits the
    /// world-state deltas.
    pub(super) fn commit_transition(&mut self, node: NodeId, next: NodeStatus) {
        let slot = node.index();
        let previous = self.nodes[slot].status;
        let internal = &mut self.nodes[slot];
        internal.previous_status = previous;
        internal.status = next;
        internal.capture_timer_ms = match next {
            NodeStatus::Contested(_) => Some(FLAG_CAPTURING_TIME_MS),
            NodeStatus::Neutral | NodeStatus::Occupied(_) => None,
        };
        internal.pending_banner = Some(PendingBanner {
            remaining_ms: BANNER_SWAP_DELAY_MS,
            target: next,
        });

        let statuses = self.node_statuses();
        self.effects.extend(
            node_update_deltas(node, previous, next, &statuses)
                .into_iter()
                .map(MatchEffect::from),
        );
    }

    /// Team-wide buffs once a team holds four or five nodes outright.
    pub(super) fn node_occupied(&mut self, team: Team) {
        let held = self
            .nodes
            .iter()
            .filter(|node| node.status.is_occupied_by(team) && node.capture_timer_ms.is_none())
            .count();
        if held >= 4 {
            self.effects.push(MatchEffect::TeamReward {
                team,
                reward: TeamReward::FourBases,
            });
        }
        if held >= 5 {
            self.effects.push(MatchEffect::TeamReward {
                team,
                reward: TeamReward::FiveBases,
            });
        }
    }
}
