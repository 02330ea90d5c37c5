use super::BattlegroundEngine;
use crate::presentation::transition_announcements;
use crate::types::{MatchEffect, NodeId, NodeStatus, TransitionKind};

impl BattlegroundEngine {
    pub(super) fn update_node_timers(&mut self, diff_ms: u64) {
        for slot in 0..self.nodes.len() {
            let node = NodeId::from_registry_index(slot);
            self.advance_banner_timer(node, diff_ms);
            self.advance_capture_timer(node, diff_ms);
        }
    }

    fn advance_banner_timer(&mut self, node: NodeId, diff_ms: u64) {
        let internal = &mut self.nodes[node.index()];
        let Some(pending) = internal.pending_banner.as_mut() else {
            return;
        };
        if pending.remaining_ms > diff_ms {
            pending.remaining_ms -= diff_ms;
            return;
        }
        let target = pending.target;
        internal.pending_banner = None;
        internal.banner = target;
        self.effects.push(MatchEffect::SpawnBanner {
            node,
            status: target,
        });
    }

    fn advance_capture_timer(&mut self, node: NodeId, diff_ms: u64) {
        let slot = node.index();
        let Some(remaining) = self.nodes[slot].capture_timer_ms else {
            return;
        };
        if remaining > diff_ms {
            self.nodes[slot].capture_timer_ms = Some(remaining - diff_ms);
            return;
        }

        let NodeStatus::Contested(team) = self.nodes[slot].status else {
            // Timers are only armed on contested nodes.
            log::warn!(
                "dropping capture timer on {} in status {:?}",
                node.name(),
                self.nodes[slot].status
            );
            self.nodes[slot].capture_timer_ms = None;
            return;
        };

        self.commit_transition(node, NodeStatus::Occupied(team));
        self.node_occupied(team);
        self.effects.extend(transition_announcements(
            TransitionKind::Captured,
            node,
            team,
            None,
        ));
        self.push_timeline(format!("{team:?} took the {}", node.name()));
        log::debug!("{team:?} captured {}", node.name());
    }
}
