use leashbreak_core::side::{PerSide, SideId};

/// Round wins needed to take a best-of-`max_rounds` match.
pub fn wins_needed(max_rounds: u32) -> u32 {
    max_rounds / 2 + 1
}

/// Strictly higher value wins; equal is a tie.
pub fn leader(values: &PerSide<u32>) -> Option<SideId> {
    if values.left > values.right {
        Some(SideId::Left)
    } else if values.right > values.left {
        Some(SideId::Right)
    } else {
        None
    }
}

pub fn round_winner(scores: &PerSide<u32>) -> Option<SideId> {
    leader(scores)
}

pub fn match_winner(round_wins: &PerSide<u32>) -> Option<SideId> {
    leader(round_wins)
}

/// The match ends once either side has enough wins or the last round is done.
pub fn match_over(round_wins: &PerSide<u32>, current_round: u32, max_rounds: u32) -> bool {
    let needed = wins_needed(max_rounds);
    round_wins.left >= needed || round_wins.right >= needed || current_round >= max_rounds
}
