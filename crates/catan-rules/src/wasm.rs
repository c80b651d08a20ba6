//! WebAssembly bindings for a browser host.
//!
//! The host owns the single [`WasmGame`]; every call threads state through the pure
//! engine functions and swaps in the result. Values cross the boundary as JSON strings.

use wasm_bindgen::prelude::*;

use crate::actions::GameAction;
use crate::bot::{Bot, BotDifficulty};
use crate::dispatch::{Dispatcher, LoggingMiddleware, ValidationMiddleware};
use crate::game::{GameConfig, GameState};
use crate::persist;
use crate::player::Seat;
use crate::validation::{validate, Validation};

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn to_json<T: serde::Serialize>(value: &T, fallback: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| fallback.to_string())
}

/// WASM-exposed game wrapper
#[wasm_bindgen]
pub struct WasmGame {
    state: GameState,
    dispatcher: Dispatcher,
}

impl WasmGame {
    fn wrap(state: GameState) -> Self {
        Self {
            state,
            dispatcher: Dispatcher::new()
                .with(LoggingMiddleware)
                .with(ValidationMiddleware),
        }
    }
}

#[wasm_bindgen]
impl WasmGame {
    /// Create a game from a JSON `GameConfig`
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<WasmGame, JsValue> {
        let config: GameConfig = serde_json::from_str(config_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid config: {e}")))?;
        let state = GameState::new(config).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self::wrap(state))
    }

    /// Restore a saved game
    pub fn load(json: &str) -> Result<WasmGame, JsValue> {
        let state = persist::load(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self::wrap(state))
    }

    pub fn save(&self) -> Result<String, JsValue> {
        persist::save(&self.state).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Get the current game state as JSON
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> String {
        to_json(&self.state, "{}")
    }

    /// Dispatch a JSON action; returns whether the state changed
    pub fn dispatch(&mut self, action_json: &str) -> Result<bool, JsValue> {
        let action: GameAction = serde_json::from_str(action_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid action JSON: {e}")))?;
        let next = self.dispatcher.dispatch(&self.state, &action);
        let changed = next.action_log.len() != self.state.action_log.len();
        self.state = next;
        Ok(changed)
    }

    /// `{valid, reason?}` for a JSON action
    pub fn validate(&self, action_json: &str) -> String {
        let verdict = match serde_json::from_str::<GameAction>(action_json) {
            Ok(action) => validate(&action, &self.state),
            Err(e) => Validation::reject(format!("Invalid action JSON: {e}")),
        };
        to_json(&verdict, "{\"valid\":false}")
    }

    /// Legal actions for a seat as a JSON array
    #[wasm_bindgen(js_name = legalActions)]
    pub fn legal_actions(&self, seat: Seat) -> String {
        to_json(&self.state.legal_actions(seat), "[]")
    }

    #[wasm_bindgen(js_name = victoryPoints)]
    pub fn victory_points(&self, seat: Seat) -> u32 {
        self.state.victory_points(seat)
    }

    #[wasm_bindgen(js_name = isFinished)]
    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn winner(&self) -> Option<Seat> {
        self.state.winner
    }

    /// A bot's suggested action for a seat; difficulty is "easy" or "medium"
    #[wasm_bindgen(js_name = botAction)]
    pub fn bot_action(&self, seat: Seat, difficulty: &str) -> String {
        let difficulty = match difficulty {
            "easy" => BotDifficulty::Easy,
            _ => BotDifficulty::Medium,
        };
        let salt = self.state.action_log.len() as u32;
        let mut bot = Bot::new(seat, difficulty, self.state.seed.wrapping_add(salt));
        match bot.choose_action(&self.state) {
            Some(action) => to_json(&action, "null"),
            None => "null".to_string(),
        }
    }
}
