use super::BattlegroundEngine;
use crate::constants::{
    get_faction_id, get_per_tick_honor, get_tick_interval_ms, get_tick_points, MAX_TEAM_SCORE,
    NEAR_VICTORY_SCORE, REPUTATION_PER_GRANT,
};
use crate::presentation::{near_victory_announcements, resource_delta};
use crate::types::{MatchEffect, MatchStatus, Team};

struct TickOutcome {
    resource_points: u32,
    grant_reputation: bool,
    grant_honor: bool,
}

impl BattlegroundEngine {
    /// Accrues elapsed time per team and pays out at most one resource tick
    /// per team per update.
    pub(super) fn update_team_scores(&mut self, diff_ms: u64) {
        for team in Team::ALL {
            let owned = self.owned_node_count(team);
            if owned == 0 {
                continue;
            }
            let interval = get_tick_interval_ms(owned);
            let score = &mut self.teams[team.index()];
            score.tick_accumulator_ms = score.tick_accumulator_ms.saturating_add(diff_ms);
            if score.tick_accumulator_ms <= interval {
                continue;
            }
            score.tick_accumulator_ms -= interval;
            self.award_resource_tick(team, get_tick_points(owned));
        }
    }

    fn award_resource_tick(&mut self, team: Team, points: u32) {
        let outcome = self.accrue(team, points);

        if outcome.grant_reputation {
            self.effects.push(MatchEffect::RewardReputation {
                team,
                faction_id: get_faction_id(team),
                amount: REPUTATION_PER_GRANT,
            });
        }
        if outcome.grant_honor {
            self.effects.push(MatchEffect::RewardHonor {
                team,
                amount: get_per_tick_honor(self.options.bracket_id),
            });
        }

        if !self.near_victory_announced && outcome.resource_points > NEAR_VICTORY_SCORE {
            self.near_victory_announced = true;
            self.effects.extend(near_victory_announcements(team));
            self.push_timeline(format!("{team:?} is near victory"));
        }

        let clamped = outcome.resource_points.min(MAX_TEAM_SCORE);
        self.teams[team.index()].resource_points = clamped;
        self.effects
            .push(MatchEffect::from(resource_delta(team, clamped)));
    }

    fn accrue(&mut self, team: Team, points: u32) -> TickOutcome {
        let honor_interval = self.honor_interval;
        let reputation_interval = self.reputation_interval;
        let score = &mut self.teams[team.index()];
        score.resource_points = score.resource_points.saturating_add(points);
        score.honor_accumulator += points;
        score.reputation_accumulator += points;

        let grant_reputation = score.reputation_accumulator >= reputation_interval;
        if grant_reputation {
            score.reputation_accumulator -= reputation_interval;
        }
        let grant_honor = score.honor_accumulator >= honor_interval;
        if grant_honor {
            score.honor_accumulator -= honor_interval;
        }

        TickOutcome {
            resource_points: score.resource_points,
            grant_reputation,
            grant_honor,
        }
    }

    /// Alliance is checked first, so a tick that tops both teams goes to it.
    pub(super) fn check_victory(&mut self) {
        for team in Team::ALL {
            if self.status != MatchStatus::InProgress {
                return;
            }
            if self.resource_points(team) >= MAX_TEAM_SCORE {
                self.end_battleground(Some(team));
            }
        }
    }
}
