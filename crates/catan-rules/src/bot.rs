//! AI players.
//!
//! Bots pick from [`GameState::legal_actions`], so anything they choose passes the
//! reducer. Two difficulty levels are provided:
//! - Easy: random legal moves
//! - Medium: priority heuristics (cities, good settlement spots, robber on the leader)

use crate::actions::{ActionKind, GameAction};
use crate::dispatch::dispatch;
use crate::game::{GameState, TurnPhase};
use crate::graph::{HexId, VertexId};
use crate::player::Seat;
use crate::rng::Mulberry32;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Upper bound on actions taken in one [`drive`] call
pub const MAX_BOT_STEPS: usize = 200;

/// Bot difficulty level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BotDifficulty {
    Easy,
    Medium,
}

/// A bot player that can decide on actions
#[derive(Debug, Clone)]
pub struct Bot {
    pub seat: Seat,
    pub difficulty: BotDifficulty,
    rng: Mulberry32,
}

/// Dice probability weight of a number token
fn pips(number: u8) -> i32 {
    6 - (7 - i32::from(number)).abs()
}

impl Bot {
    pub fn new(seat: Seat, difficulty: BotDifficulty, seed: u32) -> Self {
        Self {
            seat,
            difficulty,
            rng: Mulberry32::keyed(seed, usize::from(seat)),
        }
    }

    /// Choose an action from the legal actions
    pub fn choose_action(&mut self, game: &GameState) -> Option<GameAction> {
        let player_id = game.player(self.seat)?.id.clone();
        let actions = game.legal_actions(self.seat);
        if actions.is_empty() {
            return None;
        }

        // Dice are rolled, not chosen
        if game.turn_phase == TurnPhase::PreRoll
            && actions.iter().any(|a| matches!(a.kind, ActionKind::RollDice { .. }))
        {
            let roll = ActionKind::RollDice {
                die1: self.rng.gen_range(1..=6),
                die2: self.rng.gen_range(1..=6),
            };
            return Some(GameAction::new(player_id, roll));
        }

        match self.difficulty {
            BotDifficulty::Easy => actions.choose(&mut self.rng).cloned(),
            BotDifficulty::Medium => self.choose_medium(game, &actions),
        }
    }

    /// Medium: first matching priority wins
    fn choose_medium(&mut self, game: &GameState, actions: &[GameAction]) -> Option<GameAction> {
        let of = |pred: fn(&ActionKind) -> bool| -> Vec<&GameAction> {
            actions.iter().filter(|a| pred(&a.kind)).collect()
        };

        // Forced responses
        let discards = of(|k| matches!(k, ActionKind::DiscardResources { .. }));
        if let Some(discard) = discards.first() {
            return Some((*discard).clone());
        }
        let robber = of(|k| matches!(k, ActionKind::MoveRobber { .. }));
        if !robber.is_empty() {
            return self.best_by(&robber, |a| match a.kind {
                ActionKind::MoveRobber { hex } => self.score_robber_spot(game, hex),
                _ => 0,
            });
        }
        let steals = of(|k| matches!(k, ActionKind::StealResource { .. }));
        if !steals.is_empty() {
            return self.best_by(&steals, |a| match &a.kind {
                ActionKind::StealResource { victim } => game
                    .seat_of(victim)
                    .and_then(|s| game.player(s))
                    .map_or(0, |p| p.resources.total() as i32),
                _ => 0,
            });
        }

        // Building, best spots first
        let cities = of(|k| matches!(k, ActionKind::BuildCity { .. }));
        if let Some(city) = cities.choose(&mut self.rng) {
            return Some((*city).clone());
        }
        let settlements = of(|k| matches!(k, ActionKind::PlaceSettlement { .. }));
        if !settlements.is_empty() {
            return self.best_by(&settlements, |a| match a.kind {
                ActionKind::PlaceSettlement { vertex } => self.score_vertex(game, vertex),
                _ => 0,
            });
        }
        let improvements = of(|k| matches!(k, ActionKind::CkImproveCity { .. }));
        if let Some(improve) = improvements.choose(&mut self.rng) {
            return Some((*improve).clone());
        }
        let knights = of(|k| {
            matches!(
                k,
                ActionKind::CkBuildKnight { .. } | ActionKind::CkActivateKnight { .. }
            )
        });
        if !knights.is_empty() && self.rng.gen_bool(0.5) {
            return knights.choose(&mut self.rng).map(|a| (*a).clone());
        }

        // Setup roads are mandatory; other roads only some of the time
        let roads = of(|k| matches!(k, ActionKind::BuildRoad { .. }));
        if !roads.is_empty() && (game.in_setup() || self.rng.gen_bool(0.3)) {
            return roads.choose(&mut self.rng).map(|a| (*a).clone());
        }

        let cards = of(|k| {
            matches!(
                k,
                ActionKind::PlayKnight { .. }
                    | ActionKind::PlayMonopoly { .. }
                    | ActionKind::PlayYearOfPlenty { .. }
                    | ActionKind::PlayRoadBuilding { .. }
            )
        });
        if !cards.is_empty() && self.rng.gen_bool(0.5) {
            return cards.choose(&mut self.rng).map(|a| (*a).clone());
        }
        if let Some(buy) = of(|k| matches!(k, ActionKind::BuyDevCard)).first() {
            if self.rng.gen_bool(0.2) {
                return Some((*buy).clone());
            }
        }

        if let Some(end) = of(|k| matches!(k, ActionKind::EndTurn)).first() {
            return Some((*end).clone());
        }
        actions.choose(&mut self.rng).cloned()
    }

    /// Highest score, earliest on ties
    fn best_by(&self, actions: &[&GameAction], score: impl Fn(&GameAction) -> i32) -> Option<GameAction> {
        actions
            .iter()
            .rev()
            .max_by_key(|a| score(a))
            .map(|a| (*a).clone())
    }

    /// Pip total of the hexes around a vertex
    fn score_vertex(&self, game: &GameState, vertex: VertexId) -> i32 {
        let Some(v) = game.board.graph.vertex(vertex) else {
            return 0;
        };
        v.hexes
            .iter()
            .filter_map(|h| game.board.graph.hex(*h))
            .filter_map(|h| h.number)
            .map(pips)
            .sum()
    }

    /// Prefer busy hexes next to opponents, never our own
    fn score_robber_spot(&self, game: &GameState, hex: HexId) -> i32 {
        let Some(tile) = game.board.graph.hex(hex) else {
            return -100;
        };
        let mut score = tile.number.map_or(0, |n| 2 * pips(n));
        for seat in game.board.players_on_hex(hex) {
            if seat == self.seat {
                score -= 20;
            } else {
                score += 5 + game.victory_points(seat) as i32;
            }
        }
        score
    }
}

/// Seat expected to act next: the first pending discarder, else the current player
pub fn acting_seat(game: &GameState) -> Seat {
    match game.turn_phase {
        TurnPhase::Discarding => game
            .pending_discards
            .first()
            .copied()
            .unwrap_or(game.current_player),
        _ => game.current_player,
    }
}

/// Let bots play until a seat without a bot must act, the game ends, or `max_steps`
/// actions have been attempted
pub fn drive(mut game: GameState, bots: &mut [Bot], max_steps: usize) -> GameState {
    for _ in 0..max_steps {
        if game.is_finished() {
            break;
        }
        let seat = acting_seat(&game);
        let Some(bot) = bots.iter_mut().find(|b| b.seat == seat) else {
            break;
        };
        let Some(action) = bot.choose_action(&game) else {
            tracing::debug!(seat, "bot has no legal action");
            break;
        };
        game = dispatch(&game, &action);
    }
    game
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::replay;
    use crate::game::{GameConfig, Phase};
    use pretty_assertions::assert_eq;

    fn game() -> GameState {
        GameState::new(GameConfig::new(&["bot", "human"], 8)).unwrap()
    }

    #[test]
    fn test_easy_bot_chooses_legal_action() {
        let game = game();
        let mut bot = Bot::new(0, BotDifficulty::Easy, 1);
        let action = bot.choose_action(&game).unwrap();
        assert!(matches!(action.kind, ActionKind::PlaceSettlement { .. }));
        assert_eq!(action.player_id, "bot");
    }

    #[test]
    fn test_bot_without_turn_has_nothing() {
        let game = game();
        let mut bot = Bot::new(1, BotDifficulty::Medium, 1);
        assert_eq!(bot.choose_action(&game), None);
    }

    #[test]
    fn test_medium_picks_best_setup_spot() {
        let game = game();
        let mut bot = Bot::new(0, BotDifficulty::Medium, 1);
        let ActionKind::PlaceSettlement { vertex } = bot.choose_action(&game).unwrap().kind else {
            panic!("expected a settlement");
        };
        let best = game
            .board
            .graph
            .vertices
            .iter()
            .map(|v| bot.score_vertex(&game, v.id))
            .max()
            .unwrap();
        assert_eq!(bot.score_vertex(&game, vertex), best);
    }

    #[test]
    fn test_drive_stops_at_human_seat() {
        let game = game();
        let mut bots = vec![Bot::new(0, BotDifficulty::Medium, 3)];
        let after = drive(game, &mut bots, MAX_BOT_STEPS);
        // Seat 0 placed a settlement and road, then it is seat 1's turn
        assert_eq!(after.current_player, 1);
        assert_eq!(after.action_log.len(), 2);
    }

    #[test]
    fn test_bot_game_is_replayable() {
        let initial = GameState::new(GameConfig::new(&["a", "b", "c"], 2024)).unwrap();
        let mut bots: Vec<Bot> = (0..3).map(|s| Bot::new(s, BotDifficulty::Medium, 9)).collect();
        let played = drive(initial.clone(), &mut bots, MAX_BOT_STEPS);
        assert_eq!(played.phase, Phase::Playing);
        assert_eq!(replay(&initial, &played.action_log), played);
    }

    #[test]
    fn test_drive_respects_step_cap() {
        let initial = GameState::new(GameConfig::new(&["a", "b"], 11)).unwrap();
        let mut bots: Vec<Bot> = (0..2).map(|s| Bot::new(s, BotDifficulty::Easy, 4)).collect();
        let played = drive(initial, &mut bots, 3);
        assert!(played.action_log.len() <= 3);
    }
}
