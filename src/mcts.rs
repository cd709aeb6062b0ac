//! Monte Carlo tree search (UCT).
//!
//! The tree is rebuilt around the game as it goes: each simulation
//! walks expanded nodes by the UCB rule, expands the leaf it lands on,
//! plays the position out with the configured policy, and credits every
//! node on its path with the result. [`Uct::advance`] re-roots the tree
//! after a real move so earlier work carries over.
//!
//! Statistics are stored as wins for Black and converted to the mover's
//! point of view during selection.

use std::collections::BTreeMap;
use std::time::Instant;

use crate::board::{Color, Point};
use crate::config::SearchConfig;
use crate::playout::playout;
use crate::policy::MoveGenerator;
use crate::position::Position;

/// A node in the search tree. The move leading here is the key under
/// which the parent stores it; `None` is a pass.
#[derive(Default)]
pub struct TreeNode {
    /// Simulations that passed through this node.
    pub visits: u32,
    /// Of those, the ones Black went on to win.
    pub black_wins: u32,
    /// Whether the children map has been populated.
    pub expanded: bool,
    pub children: BTreeMap<Option<Point>, TreeNode>,
}

impl TreeNode {
    pub fn new() -> TreeNode {
        TreeNode::default()
    }

    /// Wins from `color`'s point of view.
    pub fn wins_for(&self, color: Color) -> u32 {
        match color {
            Color::Black => self.black_wins,
            Color::White => self.visits - self.black_wins,
        }
    }

    /// Populate the children: one node per legal move that is not an
    /// own-eye fill, plus a pass node. Finished games stay leaves, so
    /// every later simulation through them just scores the board.
    fn expand(&mut self, pos: &mut Position) {
        if self.expanded || pos.is_end_of_game() {
            return;
        }
        let color = pos.side_to_move();
        for mv in pos.legal_moves(color) {
            if pos.is_eye(mv, color) {
                continue;
            }
            self.children.insert(Some(mv), TreeNode::new());
        }
        self.children.insert(None, TreeNode::new());
        self.expanded = true;
    }
}

/// UCT searcher. `side` is the color to move at the root; it flips on
/// [`Uct::advance`] and snaps back to the position's mover when a
/// search finds the two out of step.
pub struct Uct {
    root: TreeNode,
    side: Color,
    simulations: u64,
}

impl Uct {
    pub fn new(side: Color) -> Uct {
        Uct {
            root: TreeNode::new(),
            side,
            simulations: 0,
        }
    }

    pub fn side(&self) -> Color {
        self.side
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Playouts run over the life of this searcher, across re-roots
    /// and resets.
    pub fn simulations(&self) -> u64 {
        self.simulations
    }

    /// Throw the tree away and point it at `side` to move.
    pub fn reset(&mut self, side: Color) {
        self.root = TreeNode::new();
        self.side = side;
    }

    /// Re-root the tree under the move just played, keeping its
    /// statistics. An unexplored move starts a fresh root.
    pub fn advance(&mut self, mv: Option<Point>) {
        self.root = self.root.children.remove(&mv).unwrap_or_default();
        self.side = self.side.opponent();
    }

    /// Run simulations from `pos` and return the most-visited root
    /// move, preferring stone moves over a pass on equal visits.
    pub fn search<G: MoveGenerator>(
        &mut self,
        pos: &Position,
        config: &SearchConfig,
        generator: &mut G,
    ) -> Option<Point> {
        if pos.side_to_move() != self.side {
            // The game went somewhere the tree did not follow.
            self.reset(pos.side_to_move());
        }
        let deadline = config.time_limit.map(|limit| Instant::now() + limit);
        for _ in 0..config.simulations {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    break;
                }
            }
            self.run_simulation(
                pos,
                config.exploration,
                config.komi,
                config.playout_limit,
                generator,
            );
        }
        self.best_move()
    }

    /// The most-visited root child, stone moves winning ties over a
    /// pass. `None` when the root was never expanded.
    pub fn best_move(&self) -> Option<Point> {
        let order = answer_order(&self.root.children);
        let Some(&first) = order.first() else {
            return None;
        };
        let mut best = first;
        for &mv in &order[1..] {
            if self.root.children[&mv].visits > self.root.children[&best].visits {
                best = mv;
            }
        }
        best
    }

    /// Expanded node counts per tree depth, the root at index 0.
    pub fn depth_profile(&self) -> Vec<usize> {
        let mut counts = Vec::new();
        count_expanded(&self.root, 0, &mut counts);
        counts
    }

    fn run_simulation<G: MoveGenerator>(
        &mut self,
        start: &Position,
        exploration: f64,
        komi: f32,
        playout_limit: usize,
        generator: &mut G,
    ) {
        self.simulations += 1;
        let mut scratch = start.clone();
        let mut path: Vec<Option<Point>> = Vec::new();

        // Selection: follow the UCB rule through expanded nodes.
        {
            let mut node = &self.root;
            while node.expanded {
                let mover = scratch.side_to_move();
                let mv = select_child(node, mover, exploration);
                let legal = scratch.play(mv, mover);
                debug_assert!(legal, "tree held an illegal move");
                path.push(mv);
                node = &node.children[&mv];
            }
        }

        // Expansion happens before the rollout consumes the scratch
        // position.
        self.node_at_mut(&path).expand(&mut scratch);

        let to_move = scratch.side_to_move();
        let winner = playout(&mut scratch, to_move, komi, playout_limit, generator);
        let win = u32::from(winner == Some(Color::Black));

        // Backpropagation, root first.
        let mut node = &mut self.root;
        node.visits += 1;
        node.black_wins += win;
        for &mv in &path {
            node = node
                .children
                .get_mut(&mv)
                .expect("selection path left the tree");
            node.visits += 1;
            node.black_wins += win;
        }
    }

    fn node_at_mut(&mut self, path: &[Option<Point>]) -> &mut TreeNode {
        let mut node = &mut self.root;
        for &mv in path {
            node = node
                .children
                .get_mut(&mv)
                .expect("selection path left the tree");
        }
        node
    }
}

/// Child moves in answer order: stones ascending, then the pass.
fn answer_order(children: &BTreeMap<Option<Point>, TreeNode>) -> Vec<Option<Point>> {
    let mut order: Vec<Option<Point>> = children.keys().copied().filter(Option::is_some).collect();
    if children.contains_key(&None) {
        order.push(None);
    }
    order
}

/// The child the UCB rule picks for `mover`. Unvisited children rank
/// infinite, so each gets tried once before the bound applies.
fn select_child(node: &TreeNode, mover: Color, exploration: f64) -> Option<Point> {
    let order = answer_order(&node.children);
    let ln_parent = f64::from(node.visits.max(1)).ln();
    let mut best = order[0];
    let mut best_value = f64::NEG_INFINITY;
    for mv in order {
        let value = uct_value(&node.children[&mv], mover, ln_parent, exploration);
        if value > best_value {
            best = mv;
            best_value = value;
        }
    }
    best
}

fn uct_value(child: &TreeNode, mover: Color, ln_parent: f64, exploration: f64) -> f64 {
    if child.visits == 0 {
        return f64::INFINITY;
    }
    let visits = f64::from(child.visits);
    let wins = f64::from(child.wins_for(mover));
    wins / visits + exploration * (ln_parent / visits).sqrt()
}

fn count_expanded(node: &TreeNode, depth: usize, counts: &mut Vec<usize>) {
    if !node.expanded {
        return;
    }
    if counts.len() <= depth {
        counts.resize(depth + 1, 0);
    }
    counts[depth] += 1;
    for child in node.children.values() {
        count_expanded(child, depth + 1, counts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::RandomGenerator;
    use std::time::Duration;

    fn config(simulations: usize) -> SearchConfig {
        SearchConfig::new()
            .with_simulations(simulations)
            .with_playout_limit(80)
    }

    fn generator() -> RandomGenerator {
        RandomGenerator::new(fastrand::Rng::with_seed(17))
    }

    #[test]
    fn test_visit_accounting() {
        let pos = Position::new(3).unwrap();
        let mut uct = Uct::new(Color::Black);
        let mv = uct.search(&pos, &config(25), &mut generator());
        let root = uct.root();
        assert!(root.expanded);
        assert!(root.children.contains_key(&mv));
        assert_eq!(root.visits, 25);
        // The first simulation only expands the root; every later one
        // descends into exactly one child.
        let child_visits: u32 = root.children.values().map(|c| c.visits).sum();
        assert_eq!(child_visits, 24);
    }

    #[test]
    fn test_best_move_is_most_visited() {
        let pos = Position::new(3).unwrap();
        let mut uct = Uct::new(Color::Black);
        let best = uct.search(&pos, &config(40), &mut generator());
        let best_visits = uct.root().children[&best].visits;
        for child in uct.root().children.values() {
            assert!(child.visits <= best_visits);
        }
    }

    #[test]
    fn test_advance_keeps_the_subtree() {
        let pos = Position::new(3).unwrap();
        let mut uct = Uct::new(Color::Black);
        let best = uct.search(&pos, &config(30), &mut generator());
        let kept = uct.root().children[&best].visits;
        uct.advance(best);
        assert_eq!(uct.root().visits, kept);
        assert_eq!(uct.side(), Color::White);
    }

    #[test]
    fn test_advance_on_unseen_move_starts_fresh() {
        let mut uct = Uct::new(Color::Black);
        uct.advance(Some(7));
        assert_eq!(uct.root().visits, 0);
        assert!(!uct.root().expanded);
        assert_eq!(uct.side(), Color::White);
    }

    #[test]
    fn test_search_resets_a_stale_tree() {
        let pos = Position::new(3).unwrap();
        let mut uct = Uct::new(Color::White);
        uct.search(&pos, &config(10), &mut generator());
        assert_eq!(uct.side(), Color::Black);
        assert_eq!(uct.root().visits, 10);
    }

    #[test]
    fn test_expired_time_limit_means_pass() {
        let pos = Position::new(3).unwrap();
        let mut uct = Uct::new(Color::Black);
        let cfg = config(1000).with_time_limit(Some(Duration::ZERO));
        assert_eq!(uct.search(&pos, &cfg, &mut generator()), None);
        assert_eq!(uct.root().visits, 0);
    }

    #[test]
    fn test_finished_game_stays_a_leaf() {
        let mut pos = Position::new(3).unwrap();
        assert!(pos.play(None, Color::Black));
        assert!(pos.play(None, Color::White));
        let mut uct = Uct::new(Color::Black);
        let mv = uct.search(&pos, &config(5), &mut generator());
        assert_eq!(mv, None);
        assert!(!uct.root().expanded);
        assert_eq!(uct.root().visits, 5);
    }

    #[test]
    fn test_depth_profile_counts_expansions() {
        let pos = Position::new(3).unwrap();
        let mut uct = Uct::new(Color::Black);
        uct.search(&pos, &config(30), &mut generator());
        let profile = uct.depth_profile();
        assert_eq!(profile[0], 1);
        let total: usize = profile.iter().sum();
        assert!(total >= 2);
    }
}
