//! Flat UCB1 arm selection.
//!
//! The bandit engine treats each candidate move as an arm and each
//! playout as a pull. These helpers work on bare `(wins, pulls)` pairs
//! so they can be tested without a board in sight.

/// Index of the arm UCB1 pulls for 0-based simulation `n`.
///
/// Unpulled arms are tried first, in order. Once every arm has been
/// pulled at least once the bound
/// `wins/pulls + exploration * sqrt(ln(n) / pulls)` applies, ties going
/// to the earliest arm.
pub fn select_arm(stats: &[(u32, u32)], n: usize, exploration: f64) -> usize {
    debug_assert!(!stats.is_empty());
    if let Some(i) = stats.iter().position(|&(_, pulls)| pulls == 0) {
        return i;
    }
    let ln_n = (n as f64).ln();
    let mut best = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (i, &(wins, pulls)) in stats.iter().enumerate() {
        let value = wins as f64 / pulls as f64 + exploration * (ln_n / pulls as f64).sqrt();
        if value > best_value {
            best = i;
            best_value = value;
        }
    }
    best
}

/// Index of the most-pulled arm, earliest on ties.
pub fn most_pulled(stats: &[(u32, u32)]) -> usize {
    let mut best = 0;
    for (i, &(_, pulls)) in stats.iter().enumerate().skip(1) {
        if pulls > stats[best].1 {
            best = i;
        }
    }
    best
}

/// Index of the arm with the most wins, earliest on ties.
pub fn most_wins(stats: &[(u32, u32)]) -> usize {
    let mut best = 0;
    for (i, &(wins, _)) in stats.iter().enumerate().skip(1) {
        if wins > stats[best].0 {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpulled_arms_go_first_in_order() {
        let stats = [(0, 3), (0, 0), (0, 0)];
        assert_eq!(select_arm(&stats, 3, 0.4), 1);
    }

    #[test]
    fn test_ties_go_to_the_earliest_arm() {
        let stats = [(1, 2), (1, 2), (1, 2)];
        assert_eq!(select_arm(&stats, 6, 0.4), 0);
        assert_eq!(most_pulled(&stats), 0);
        assert_eq!(most_wins(&stats), 0);
    }

    #[test]
    fn test_exploitation_beats_a_losing_arm() {
        // Arm 0 always wins, arm 1 always loses. A modest budget must
        // concentrate pulls on arm 0.
        let mut stats = [(0u32, 0u32); 2];
        for n in 0..20 {
            let i = select_arm(&stats, n, 0.4);
            stats[i].1 += 1;
            if i == 0 {
                stats[i].0 += 1;
            }
        }
        assert!(stats[0].1 > stats[1].1);
        assert_eq!(most_pulled(&stats), 0);
        assert_eq!(most_wins(&stats), 0);
    }

    #[test]
    fn test_exploration_revisits_the_weaker_arm() {
        // With a huge exploration constant the weaker arm still gets
        // pulled regularly.
        let mut stats = [(0u32, 0u32); 2];
        for n in 0..40 {
            let i = select_arm(&stats, n, 100.0);
            stats[i].1 += 1;
            if i == 0 {
                stats[i].0 += 1;
            }
        }
        assert!(stats[1].1 >= 10);
    }
}
