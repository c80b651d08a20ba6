//! Saving and loading games as JSON.
//!
//! Older saves may lack `ruleset`, `victoryPointTarget` or the expansion state; those
//! are filled in from the detected ruleset. Imports that parse but describe an
//! impossible game are rejected with a message.

use crate::expansion::{CkState, DEFAULT_BARBARIAN_THRESHOLD};
use crate::game::{GameState, Ruleset};
use crate::player::Seat;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("malformed save: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid save: {0}")]
    Invalid(String),
}

fn invalid(message: impl Into<String>) -> PersistError {
    PersistError::Invalid(message.into())
}

pub fn save(state: &GameState) -> Result<String, PersistError> {
    Ok(serde_json::to_string(state)?)
}

pub fn load(json: &str) -> Result<GameState, PersistError> {
    let raw: Value = serde_json::from_str(json)?;
    let has_ruleset = raw.get("ruleset").is_some_and(|v| !v.is_null());
    let mut state: GameState = serde_json::from_value(raw)?;

    if !has_ruleset && state.ck.is_some() {
        state.ruleset = Ruleset::CitiesAndKnights;
    }
    if state.victory_point_target == 0 {
        state.victory_point_target = state.ruleset.default_victory_points();
    }
    if state.ruleset == Ruleset::CitiesAndKnights && state.ck.is_none() {
        state.ck = Some(restored_expansion(&state));
        state.update_metropolises();
    }
    let free_knight_id = state.board.knights.keys().map(|k| k.0 + 1).max().unwrap_or(0);
    if let Some(ck) = state.ck.as_mut() {
        ck.next_knight_id = ck.next_knight_id.max(free_knight_id);
    }

    check_structure(&state)?;
    tracing::debug!(
        players = state.player_count(),
        actions = state.action_log.len(),
        ruleset = ?state.ruleset,
        "game loaded"
    );
    Ok(state)
}

/// Expansion state for a save that lost it: the game's own progress decks, less the
/// cards players already hold
fn restored_expansion(state: &GameState) -> CkState {
    let mut ck = CkState::new(
        DEFAULT_BARBARIAN_THRESHOLD,
        &mut GameState::expansion_stream(state.seed),
    );
    for card in state.players.iter().flat_map(|p| &p.progress_cards) {
        let deck = ck.progress_decks.get_mut(card.track());
        if let Some(index) = deck.iter().position(|c| c == card) {
            deck.remove(index);
        }
    }
    ck
}

fn check_structure(state: &GameState) -> Result<(), PersistError> {
    let count = state.player_count();
    if !(2..=4).contains(&count) {
        return Err(invalid(format!("{count} players")));
    }
    let seat_ok = |seat: Seat| (seat as usize) < count;
    if !seat_ok(state.current_player) {
        return Err(invalid("current player out of range"));
    }
    if state.setup_order.iter().any(|s| !seat_ok(*s)) || state.pending_discards.iter().any(|s| !seat_ok(*s)) {
        return Err(invalid("seat out of range"));
    }

    let board = &state.board;
    if !board.graph.is_standard() {
        return Err(invalid("board graph is not the standard island"));
    }
    if board.graph.hex(board.robber).is_none() {
        return Err(invalid("robber off the board"));
    }
    for (vertex, building) in &board.buildings {
        if board.graph.vertex(*vertex).is_none() || !seat_ok(building.owner) {
            return Err(invalid(format!("bad building at {vertex}")));
        }
    }
    for (edge, owner) in &board.roads {
        if board.graph.edge(*edge).is_none() || !seat_ok(*owner) {
            return Err(invalid(format!("bad road at {edge}")));
        }
    }
    for knight in board.knights.values() {
        if board.graph.vertex(knight.vertex).is_none() || !seat_ok(knight.owner) {
            return Err(invalid(format!("bad knight {}", knight.id)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameConfig, BASE_VICTORY_POINTS, CK_VICTORY_POINTS};
    use crate::graph::{EdgeId, VertexId};
    use pretty_assertions::assert_eq;

    fn game() -> GameState {
        let mut game = GameState::new(GameConfig::new(&["a", "b", "c"], 77)).unwrap();
        game.board.place_settlement(VertexId(10), 1);
        game.board.place_road(EdgeId(20), 1);
        game
    }

    #[test]
    fn test_save_load_preserves_state() {
        let game = game();
        let loaded = load(&save(&game).unwrap()).unwrap();
        assert_eq!(loaded, game);
    }

    #[test]
    fn test_maps_serialize_as_objects() {
        let json: Value = serde_json::from_str(&save(&game()).unwrap()).unwrap();
        assert_eq!(json["board"]["roads"]["20"], Value::from(1));
        assert!(json["board"]["buildings"]["10"].is_object());
    }

    #[test]
    fn test_missing_target_defaults_by_ruleset() {
        let mut json: Value = serde_json::from_str(&save(&game()).unwrap()).unwrap();
        json.as_object_mut().unwrap().remove("victoryPointTarget");
        let loaded = load(&json.to_string()).unwrap();
        assert_eq!(loaded.victory_point_target, BASE_VICTORY_POINTS);

        let ck_game = GameState::new(GameConfig::new(&["a", "b"], 3).with_expansion()).unwrap();
        let mut json: Value = serde_json::from_str(&save(&ck_game).unwrap()).unwrap();
        let object = json.as_object_mut().unwrap();
        object.remove("victoryPointTarget");
        object.remove("ruleset");
        let loaded = load(&json.to_string()).unwrap();
        assert_eq!(loaded.ruleset, Ruleset::CitiesAndKnights);
        assert_eq!(loaded.victory_point_target, CK_VICTORY_POINTS);
    }

    #[test]
    fn test_missing_expansion_state_is_rebuilt_from_seed() {
        let ck_game = GameState::new(GameConfig::new(&["a", "b"], 3).with_expansion()).unwrap();
        let mut json: Value = serde_json::from_str(&save(&ck_game).unwrap()).unwrap();
        json.as_object_mut().unwrap().remove("ck");
        let loaded = load(&json.to_string()).unwrap();
        assert_eq!(loaded.ck, ck_game.ck);
    }

    #[test]
    fn test_rebuilt_decks_leave_out_held_cards() {
        let mut ck_game = GameState::new(GameConfig::new(&["a", "b"], 3).with_expansion()).unwrap();
        let card = ck_game.ck.as_mut().unwrap().progress_decks.trade.pop().unwrap();
        ck_game.players[1].progress_cards.push(card);
        let mut json: Value = serde_json::from_str(&save(&ck_game).unwrap()).unwrap();
        json.as_object_mut().unwrap().remove("ck");
        let loaded = load(&json.to_string()).unwrap();
        assert_eq!(
            loaded.ck.unwrap().progress_decks.trade,
            ck_game.ck.unwrap().progress_decks.trade
        );
    }

    #[test]
    fn test_knight_counter_skips_existing_knights() {
        use crate::expansion::knights::{KnightId, KnightState};

        let mut ck_game = GameState::new(GameConfig::new(&["a", "b"], 3).with_expansion()).unwrap();
        for id in [0, 4] {
            ck_game.board.knights.insert(
                KnightId(id),
                KnightState {
                    id: KnightId(id),
                    owner: 1,
                    vertex: VertexId(id * 3),
                    level: 1,
                    active: false,
                    has_acted: false,
                },
            );
        }
        let mut json: Value = serde_json::from_str(&save(&ck_game).unwrap()).unwrap();
        json["ck"].as_object_mut().unwrap().remove("nextKnightId");
        let loaded = load(&json.to_string()).unwrap();
        assert_eq!(loaded.ck.as_ref().unwrap().next_knight_id, 5);

        json.as_object_mut().unwrap().remove("ck");
        let loaded = load(&json.to_string()).unwrap();
        assert_eq!(loaded.ck.as_ref().unwrap().next_knight_id, 5);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(load("{not json"), Err(PersistError::Json(_))));
        assert!(matches!(load("{\"phase\": \"setup\"}"), Err(PersistError::Json(_))));
    }

    #[test]
    fn test_rejects_impossible_state() {
        let mut game = game();
        game.current_player = 7;
        assert!(matches!(
            load(&save(&game).unwrap()),
            Err(PersistError::Invalid(_))
        ));

        let mut game = self::game();
        game.board.roads.insert(EdgeId(500), 0);
        assert!(matches!(
            load(&save(&game).unwrap()),
            Err(PersistError::Invalid(_))
        ));

        let mut game = self::game();
        game.players.truncate(1);
        assert!(matches!(
            load(&save(&game).unwrap()),
            Err(PersistError::Invalid(_))
        ));
    }
}
