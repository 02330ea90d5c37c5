use chrono::{DateTime, Datelike, Utc, Weekday};

use crate::types::Team;

pub fn sanitize_name(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "Player".to_string();
    }
    trimmed.chars().take(16).collect()
}

pub fn player_order_key(player_id: &str) -> u64 {
    player_id
        .rsplit('_')
        .next()
        .and_then(|suffix| suffix.parse::<u64>().ok())
        .unwrap_or(u64::MAX)
}

pub fn parse_leaderboard_limit(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|value| value.parse::<usize>().ok())
}

/// Holiday weekend bonus intervals apply Friday through Sunday (UTC).
pub fn is_holiday_weekend(now: DateTime<Utc>) -> bool {
    matches!(now.weekday(), Weekday::Fri | Weekday::Sat | Weekday::Sun)
}

/// Team for a joining player who did not pick one: the smaller side, ties
/// go to the Alliance.
pub fn balance_team(alliance_count: usize, horde_count: usize) -> Team {
    if horde_count < alliance_count {
        Team::Horde
    } else {
        Team::Alliance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn player_order_key_uses_numeric_suffix() {
        assert!(player_order_key("player_2") < player_order_key("player_10"));
        assert_eq!(player_order_key("host"), u64::MAX);
    }

    #[test]
    fn leaderboard_limit_parsing_is_lenient_for_invalid_values() {
        assert_eq!(parse_leaderboard_limit(Some("8")), Some(8));
        assert_eq!(parse_leaderboard_limit(Some("0")), Some(0));
        assert_eq!(parse_leaderboard_limit(Some("abc")), None);
        assert_eq!(parse_leaderboard_limit(Some("-1")), None);
        assert_eq!(parse_leaderboard_limit(None), None);
    }

    #[test]
    fn sanitize_name_applies_trim_empty_and_max_len() {
        assert_eq!(sanitize_name(""), "Player");
        assert_eq!(sanitize_name("   "), "Player");
        assert_eq!(sanitize_name(" Tyrande "), "Tyrande");
        assert_eq!(sanitize_name("12345678901234567890"), "1234567890123456");
    }

    #[test]
    fn weekend_covers_friday_through_sunday() {
        // 2024-03-01 was a Friday.
        let friday = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let sunday = Utc.with_ymd_and_hms(2024, 3, 3, 23, 59, 0).unwrap();
        let monday = Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap();
        let thursday = Utc.with_ymd_and_hms(2024, 2, 29, 18, 0, 0).unwrap();
        assert!(is_holiday_weekend(friday));
        assert!(is_holiday_weekend(sunday));
        assert!(!is_holiday_weekend(monday));
        assert!(!is_holiday_weekend(thursday));
    }

    #[test]
    fn balance_team_fills_smaller_side() {
        assert_eq!(balance_team(0, 0), Team::Alliance);
        assert_eq!(balance_team(3, 2), Team::Horde);
        assert_eq!(balance_team(2, 3), Team::Alliance);
    }
}
