//! Go Text Protocol front end.
//!
//! Implements GTP version 2 plus the analysis commands GoGui knows how
//! to display, so the engine can sit behind a graphical board. The
//! protocol loop is line based: an optional numeric id, a command, its
//! arguments. Responses echo the id behind `=` on success and `?` on
//! failure, followed by a blank line.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use crate::ConfigError;
use crate::board::{Color, Point, parse_coord, sorted_point_string, str_coord};
use crate::engine::SearchEngine;
use crate::patterns::PatternTable;
use crate::policy::{all_policy_moves, all_random_moves};
use crate::position::Position;

/// Every command the engine answers, as advertised to controllers.
const KNOWN_COMMANDS: &[&str] = &[
    "boardsize",
    "clear_board",
    "final_score",
    "genmove",
    "gogui-analyze_commands",
    "known_command",
    "komi",
    "legal_moves",
    "legal_moves_for_toPlay",
    "list_commands",
    "mcts_info",
    "name",
    "num_total_sim",
    "play",
    "policy_moves",
    "protocol_version",
    "quit",
    "random_moves",
    "score",
    "selfatari",
    "set_free_handicap",
    "showboard",
    "version",
];

/// GTP session state: the live position plus the search engine behind
/// it.
pub struct GtpEngine {
    pos: Position,
    engine: SearchEngine,
    table: Arc<PatternTable>,
}

impl GtpEngine {
    pub fn new(
        engine: SearchEngine,
        table: Arc<PatternTable>,
        size: usize,
    ) -> Result<GtpEngine, ConfigError> {
        Ok(GtpEngine {
            pos: Position::new(size)?,
            engine,
            table,
        })
    }

    /// Read commands from stdin until `quit` or end of input.
    pub fn run(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        for line in stdin.lock().lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (id, rest) = Self::parse_id(line);
            let parts: Vec<&str> = rest.split_whitespace().collect();
            let Some((head, args)) = parts.split_first() else {
                continue;
            };
            let command = head.to_lowercase();
            log::debug!("gtp <- {line}");

            let (ok, message) = self.execute(&command, args);
            let prefix = if ok { '=' } else { '?' };
            let id = id.map(|i| i.to_string()).unwrap_or_default();
            write!(stdout, "{prefix}{id} {message}\n\n")?;
            stdout.flush()?;

            if ok && command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Split an optional numeric command id off the front of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let end = line
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(line.len());
        if end > 0 {
            if let Ok(id) = line[..end].parse() {
                return (Some(id), line[end..].trim_start());
            }
        }
        (None, line)
    }

    /// Execute one command and return (success, response body). The
    /// command must already be lowercased.
    fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        match command {
            "protocol_version" => (true, "2".to_string()),

            "name" => (true, "sente".to_string()),

            "version" => (true, env!("CARGO_PKG_VERSION").to_string()),

            "known_command" => {
                let Some(&cmd) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                let known = KNOWN_COMMANDS.iter().any(|c| c.eq_ignore_ascii_case(cmd));
                (true, if known { "true" } else { "false" }.to_string())
            }

            "list_commands" => (true, KNOWN_COMMANDS.join("\n")),

            "quit" => (true, String::new()),

            "boardsize" => {
                let Some(size) = args.first().and_then(|a| a.parse::<usize>().ok()) else {
                    return (false, "invalid size".to_string());
                };
                match Position::new(size) {
                    Ok(pos) => {
                        self.pos = pos;
                        self.engine.reset(Color::Black);
                        (true, String::new())
                    }
                    Err(e) => (false, e.to_string()),
                }
            }

            "clear_board" => {
                match Position::new(self.pos.size()) {
                    Ok(pos) => self.pos = pos,
                    Err(e) => return (false, e.to_string()),
                }
                self.engine.reset(Color::Black);
                (true, String::new())
            }

            "komi" => {
                let Some(komi) = args.first().and_then(|a| a.parse::<f32>().ok()) else {
                    return (false, "invalid komi".to_string());
                };
                self.engine.set_komi(komi);
                (true, String::new())
            }

            "set_free_handicap" => {
                if args.is_empty() {
                    return (false, "missing argument".to_string());
                }
                let size = self.pos.size();
                let mut fresh = match Position::new(size) {
                    Ok(pos) => pos,
                    Err(e) => return (false, e.to_string()),
                };
                for arg in args {
                    let Some(pt) = parse_coord(arg, size) else {
                        return (false, format!("invalid vertex: {arg}"));
                    };
                    if !fresh.play(Some(pt), Color::Black) {
                        return (false, format!("illegal handicap placement: {arg}"));
                    }
                }
                fresh.set_to_play(Color::White);
                self.pos = fresh;
                self.engine.reset(Color::White);
                (true, String::new())
            }

            "play" => {
                if args.len() < 2 {
                    return (false, "missing arguments".to_string());
                }
                let Some(color) = Color::from_gtp(args[0]) else {
                    return (false, "invalid color".to_string());
                };
                let mv = match self.parse_vertex(args[1]) {
                    Ok(mv) => mv,
                    Err(message) => return (false, message),
                };
                if !self.pos.play(mv, color) {
                    return (false, "illegal move".to_string());
                }
                self.engine.advance(mv);
                (true, String::new())
            }

            "genmove" => {
                let Some(color) = args.first().and_then(|a| Color::from_gtp(a)) else {
                    return (false, "invalid color".to_string());
                };
                self.pos.set_to_play(color);
                let mv = self.engine.genmove(&self.pos);
                if !self.pos.play(mv, color) {
                    return (false, "engine produced an illegal move".to_string());
                }
                self.engine.advance(mv);
                (true, str_coord(mv, self.pos.size()))
            }

            "showboard" => {
                let board = self.pos.to_string();
                (true, format!("\n{}", board.trim_end()))
            }

            "score" | "final_score" => {
                let (winner, margin) = self.pos.score(self.engine.config().komi);
                match winner {
                    Some(Color::Black) => (true, format!("B+{margin}")),
                    Some(Color::White) => (true, format!("W+{margin}")),
                    None => (true, "0".to_string()),
                }
            }

            "legal_moves" => {
                let Some(color) = args.first().and_then(|a| Color::from_gtp(a)) else {
                    return (false, "invalid color".to_string());
                };
                let moves = self.pos.legal_moves(color);
                (true, sorted_point_string(&moves, self.pos.size()))
            }

            "legal_moves_for_toplay" => {
                let color = self.pos.side_to_move();
                let moves = self.pos.legal_moves(color);
                (true, sorted_point_string(&moves, self.pos.size()))
            }

            "policy_moves" => {
                let check_selfatari = self.engine.config().check_selfatari;
                let (moves, label) = all_policy_moves(&mut self.pos, &self.table, check_selfatari);
                if moves.is_empty() {
                    (true, "Pass".to_string())
                } else {
                    let coords = sorted_point_string(&moves, self.pos.size());
                    (true, format!("{label} {coords}"))
                }
            }

            "random_moves" => {
                let moves = all_random_moves(&mut self.pos);
                if moves.is_empty() {
                    (true, "Pass".to_string())
                } else {
                    (true, sorted_point_string(&moves, self.pos.size()))
                }
            }

            "gogui-analyze_commands" => (
                true,
                [
                    "pstring/Legal Moves For ToPlay/legal_moves_for_toPlay",
                    "pstring/Policy Moves/policy_moves",
                    "pstring/Random Moves/random_moves",
                    "pstring/MCTS Info/mcts_info",
                ]
                .join("\n"),
            ),

            "selfatari" => match args.first().and_then(|a| a.parse::<u8>().ok()) {
                Some(0) => {
                    self.engine.set_check_selfatari(false);
                    (true, String::new())
                }
                Some(1) => {
                    self.engine.set_check_selfatari(true);
                    (true, String::new())
                }
                _ => (false, "expected 0 or 1".to_string()),
            },

            "num_total_sim" => {
                let Some(n) = args.first().and_then(|a| a.parse::<usize>().ok()) else {
                    return (false, "invalid argument".to_string());
                };
                match self.engine.set_simulations(n) {
                    Ok(()) => (true, String::new()),
                    Err(e) => (false, e.to_string()),
                }
            }

            "mcts_info" => match self.engine.tree() {
                None => (false, "this engine keeps no search tree".to_string()),
                Some(uct) => {
                    let mut out = format!("total playouts: {}", self.engine.total_simulations());
                    out.push_str(&format!("\nroot visits: {}", uct.root().visits));
                    for (depth, count) in uct.depth_profile().iter().enumerate() {
                        out.push_str(&format!("\ndepth {depth}: {count} expanded"));
                    }
                    (true, out)
                }
            },

            _ => (false, format!("unknown command: {command}")),
        }
    }

    /// A vertex argument: `pass` or a board coordinate.
    fn parse_vertex(&self, arg: &str) -> Result<Option<Point>, String> {
        if arg.eq_ignore_ascii_case("pass") {
            return Ok(None);
        }
        parse_coord(arg, self.pos.size())
            .map(Some)
            .ok_or_else(|| format!("invalid vertex: {arg}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::engine::{BanditSearch, TreeSearch};

    fn quick_config() -> SearchConfig {
        SearchConfig::new()
            .with_simulations(20)
            .with_playout_limit(50)
            .with_seed(1)
    }

    fn bandit_gtp(size: usize) -> GtpEngine {
        let table = Arc::new(PatternTable::new());
        let search = BanditSearch::new(quick_config(), table.clone(), None).unwrap();
        GtpEngine::new(SearchEngine::Bandit(search), table, size).unwrap()
    }

    fn tree_gtp(size: usize) -> GtpEngine {
        let table = Arc::new(PatternTable::new());
        let search = TreeSearch::new(quick_config(), table.clone(), None).unwrap();
        GtpEngine::new(SearchEngine::Tree(search), table, size).unwrap()
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(GtpEngine::parse_id("12 name"), (Some(12), "name"));
        assert_eq!(GtpEngine::parse_id("name"), (None, "name"));
    }

    #[test]
    fn test_identity_commands() {
        let mut gtp = bandit_gtp(5);
        assert_eq!(gtp.execute("protocol_version", &[]), (true, "2".into()));
        assert_eq!(gtp.execute("name", &[]), (true, "sente".into()));
        let (ok, commands) = gtp.execute("list_commands", &[]);
        assert!(ok);
        assert!(commands.contains("genmove"));
        assert!(commands.contains("mcts_info"));
    }

    #[test]
    fn test_known_command_is_case_insensitive() {
        let mut gtp = bandit_gtp(5);
        assert_eq!(gtp.execute("known_command", &["genmove"]), (true, "true".into()));
        assert_eq!(
            gtp.execute("known_command", &["legal_moves_for_toPlay"]),
            (true, "true".into())
        );
        assert_eq!(gtp.execute("known_command", &["nonsense"]), (true, "false".into()));
    }

    #[test]
    fn test_boardsize_bounds() {
        let mut gtp = bandit_gtp(5);
        let (ok, _) = gtp.execute("boardsize", &["9"]);
        assert!(ok);
        assert_eq!(gtp.pos.size(), 9);
        let (ok, _) = gtp.execute("boardsize", &["30"]);
        assert!(!ok);
        let (ok, _) = gtp.execute("boardsize", &["huge"]);
        assert!(!ok);
    }

    #[test]
    fn test_play_and_illegal_play() {
        let mut gtp = bandit_gtp(5);
        let (ok, _) = gtp.execute("play", &["b", "c3"]);
        assert!(ok);
        let (ok, message) = gtp.execute("play", &["w", "c3"]);
        assert!(!ok);
        assert_eq!(message, "illegal move");
        let (ok, _) = gtp.execute("play", &["w", "pass"]);
        assert!(ok);
        assert_eq!(gtp.pos.moves_count(), 2);
    }

    #[test]
    fn test_genmove_plays_its_answer() {
        let mut gtp = bandit_gtp(5);
        let (ok, vertex) = gtp.execute("genmove", &["b"]);
        assert!(ok);
        assert_eq!(gtp.pos.moves_count(), 1);
        if vertex != "pass" {
            let pt = parse_coord(&vertex, 5).unwrap();
            assert!(gtp.pos.cell(pt).is_stone());
        }
    }

    #[test]
    fn test_score_reflects_komi() {
        let mut gtp = bandit_gtp(5);
        assert_eq!(gtp.execute("score", &[]), (true, "W+0.5".into()));
        let (ok, _) = gtp.execute("komi", &["6.5"]);
        assert!(ok);
        assert_eq!(gtp.execute("score", &[]), (true, "W+6.5".into()));
        assert_eq!(gtp.execute("final_score", &[]), (true, "W+6.5".into()));
    }

    #[test]
    fn test_set_free_handicap_scores_for_black() {
        let mut gtp = bandit_gtp(5);
        let (ok, _) = gtp.execute("set_free_handicap", &["c3", "d4"]);
        assert!(ok);
        assert_eq!(gtp.pos.side_to_move(), Color::White);
        // Black owns the whole board; only komi goes the other way.
        assert_eq!(gtp.execute("score", &[]), (true, "B+24.5".into()));
    }

    #[test]
    fn test_legal_move_listings() {
        let mut gtp = bandit_gtp(5);
        let (ok, listed) = gtp.execute("legal_moves", &["b"]);
        assert!(ok);
        assert_eq!(listed.split_whitespace().count(), 25);
        let (ok, for_toplay) = gtp.execute("legal_moves_for_toplay", &[]);
        assert!(ok);
        assert_eq!(listed, for_toplay);
    }

    #[test]
    fn test_policy_and_random_listings() {
        let mut gtp = bandit_gtp(5);
        let (ok, policy) = gtp.execute("policy_moves", &[]);
        assert!(ok);
        assert!(policy.starts_with("Random "));
        let (ok, random) = gtp.execute("random_moves", &[]);
        assert!(ok);
        assert!(random.starts_with("a1 "));
        let (ok, _) = gtp.execute("play", &["b", "b2"]);
        assert!(ok);
        let (ok, _) = gtp.execute("play", &["w", "c2"]);
        assert!(ok);
        let (ok, policy) = gtp.execute("policy_moves", &[]);
        assert!(ok);
        assert!(policy.starts_with("Pattern ") || policy.starts_with("Random "));
    }

    #[test]
    fn test_selfatari_and_num_total_sim_setters() {
        let mut gtp = bandit_gtp(5);
        let (ok, _) = gtp.execute("selfatari", &["1"]);
        assert!(ok);
        assert!(gtp.engine.config().check_selfatari);
        let (ok, _) = gtp.execute("selfatari", &["2"]);
        assert!(!ok);
        let (ok, _) = gtp.execute("num_total_sim", &["55"]);
        assert!(ok);
        assert_eq!(gtp.engine.config().simulations, 55);
        let (ok, _) = gtp.execute("num_total_sim", &["0"]);
        assert!(!ok);
    }

    #[test]
    fn test_mcts_info_needs_a_tree() {
        let mut gtp = bandit_gtp(3);
        let (ok, _) = gtp.execute("mcts_info", &[]);
        assert!(!ok);
        let mut gtp = tree_gtp(3);
        let (ok, _) = gtp.execute("genmove", &["b"]);
        assert!(ok);
        let (ok, info) = gtp.execute("mcts_info", &[]);
        assert!(ok);
        assert!(info.contains("total playouts: 20"));
    }

    #[test]
    fn test_unknown_command() {
        let mut gtp = bandit_gtp(5);
        let (ok, message) = gtp.execute("frobnicate", &[]);
        assert!(!ok);
        assert!(message.contains("unknown command"));
    }
}
