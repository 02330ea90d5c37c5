use crate::types::Position;

pub(super) fn squared_distance(a: Position, b: Position) -> f32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}

/// Closest candidate to `from`. Ties keep the earlier candidate.
pub(super) fn nearest_location(
    candidates: impl IntoIterator<Item = Position>,
    from: Position,
) -> Option<Position> {
    let mut best: Option<(Position, f32)> = None;
    for candidate in candidates {
        let distance = squared_distance(candidate, from);
        match best {
            Some((_, best_distance)) if best_distance <= distance => {}
            _ => best = Some((candidate, distance)),
        }
    }
    best.map(|(position, _)| position)
}
