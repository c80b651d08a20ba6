//! Core game state.
//!
//! This module contains the `GameState` struct, the game configuration and the errors
//! raised by the rules. The transition logic lives in [`crate::turn`]; hosts drive it
//! through [`crate::dispatch`].

use crate::board::Board;
use crate::distribution::Distribution;
use crate::expansion::{CkState, DEFAULT_BARBARIAN_THRESHOLD};
use crate::graph::BoardGraph;
use crate::player::{DevelopmentCard, PlayerState, Seat};
use crate::rng::Mulberry32;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Victory points needed to win the base game
pub const BASE_VICTORY_POINTS: u32 = 10;
/// Victory points needed to win with the expansion
pub const CK_VICTORY_POINTS: u32 = 13;
/// Allowed range for a custom victory point target
pub const VICTORY_POINT_RANGE: std::ops::RangeInclusive<u32> = 6..=16;

/// Overall game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Setup,
    Playing,
    Finished,
}

/// Step within a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TurnPhase {
    /// Initial settlement + road placement
    SetupPlacement,
    /// Before rolling dice at start of turn
    PreRoll,
    /// After a 7, the robber must move
    Robber,
    /// Robber moved next to opponents, a victim must be chosen
    Stealing,
    /// After a 7, players over the limit must discard
    Discarding,
    /// Main phase: build, trade, play cards, end turn
    PostRoll,
}

/// Which rules are in force
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Ruleset {
    #[default]
    Base,
    CitiesAndKnights,
}

impl Ruleset {
    /// Victory points needed to win when no target is configured
    pub fn default_victory_points(&self) -> u32 {
        match self {
            Ruleset::Base => BASE_VICTORY_POINTS,
            Ruleset::CitiesAndKnights => CK_VICTORY_POINTS,
        }
    }
}

/// Errors that can occur when applying actions
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Not your turn")]
    NotYourTurn,

    #[error("Invalid action for current phase")]
    InvalidPhase,

    #[error("Unknown player {0}")]
    UnknownPlayer(String),

    #[error("Expansion rules are not active")]
    ExpansionDisabled,

    #[error("Dice values must be between 1 and 6")]
    InvalidDice,

    #[error("Invalid placement location")]
    InvalidLocation,

    #[error("Cannot afford this")]
    CannotAfford,

    #[error("No pieces remaining")]
    NoPiecesRemaining,

    #[error("No development cards left in deck")]
    EmptyDeck,

    #[error("Don't have that card")]
    NoSuchCard,

    #[error("A development card was already played this turn")]
    CardAlreadyPlayed,

    #[error("Invalid trade")]
    InvalidTrade,

    #[error("Must discard exactly {expected} cards")]
    InvalidDiscard { expected: u32 },

    #[error("Invalid steal target")]
    InvalidVictim,

    #[error("Unknown knight")]
    UnknownKnight,

    #[error("Knight cannot act")]
    KnightCannotAct,

    #[error("Knight limit reached")]
    KnightLimit,

    #[error("Improvement track is maxed out")]
    ImprovementMaxed,

    #[error("Requires a city")]
    CityRequired,

    #[error("Invalid card target: {0}")]
    InvalidTarget(String),

    #[error("Unknown action {0}")]
    UnknownAction(String),

    #[error("Malformed {tag} payload: {reason}")]
    MalformedAction { tag: String, reason: String },

    #[error("Game is over")]
    GameOver,
}

/// Errors raised while building a game from a configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("a game needs 2-4 players, got {0}")]
    PlayerCount(usize),

    #[error("duplicate player id {0}")]
    DuplicatePlayer(String),

    #[error("victory point target {0} is outside 6-16")]
    VictoryPointTarget(u32),

    #[error("barbarian threshold must be at least 1")]
    BarbarianThreshold,
}

/// A seat at the table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub id: String,
    pub name: String,
}

impl PlayerConfig {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Everything needed to create a game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    pub players: Vec<PlayerConfig>,
    #[serde(default)]
    pub seed: u32,
    #[serde(default)]
    pub ruleset: Ruleset,
    #[serde(default)]
    pub victory_point_target: Option<u32>,
    #[serde(default = "default_barbarian_threshold")]
    pub barbarian_threshold: u32,
}

fn default_barbarian_threshold() -> u32 {
    DEFAULT_BARBARIAN_THRESHOLD
}

impl GameConfig {
    /// Base-game config with players named after their ids
    pub fn new<S: AsRef<str>>(player_ids: &[S], seed: u32) -> Self {
        Self {
            players: player_ids
                .iter()
                .map(|id| PlayerConfig::new(id.as_ref(), id.as_ref()))
                .collect(),
            seed,
            ruleset: Ruleset::Base,
            victory_point_target: None,
            barbarian_threshold: DEFAULT_BARBARIAN_THRESHOLD,
        }
    }

    /// Switch to the expansion rules
    pub fn with_expansion(mut self) -> Self {
        self.ruleset = Ruleset::CitiesAndKnights;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(2..=4).contains(&self.players.len()) {
            return Err(ConfigError::PlayerCount(self.players.len()));
        }
        let mut seen = HashSet::new();
        for player in &self.players {
            if !seen.insert(player.id.as_str()) {
                return Err(ConfigError::DuplicatePlayer(player.id.clone()));
            }
        }
        if let Some(target) = self.victory_point_target {
            if !VICTORY_POINT_RANGE.contains(&target) {
                return Err(ConfigError::VictoryPointTarget(target));
            }
        }
        if self.barbarian_threshold == 0 {
            return Err(ConfigError::BarbarianThreshold);
        }
        Ok(())
    }
}

/// The complete game state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub phase: Phase,
    pub turn_phase: TurnPhase,
    pub players: Vec<PlayerState>,
    /// Seat of the player whose turn it is
    pub current_player: Seat,
    pub board: Board,
    /// Remaining development cards; the top of the deck is the end of the vec
    pub dev_deck: Vec<DevelopmentCard>,
    /// Every successfully applied action, in order
    #[serde(default)]
    pub action_log: Vec<crate::actions::GameAction>,
    /// Snake order of seats for initial placement
    pub setup_order: Vec<Seat>,
    pub setup_index: usize,
    /// Settlement just placed during setup, awaiting its road
    #[serde(default)]
    pub setup_anchor: Option<crate::graph::VertexId>,
    pub seed: u32,
    #[serde(default)]
    pub victory_point_target: u32,
    #[serde(default)]
    pub winner: Option<Seat>,
    /// Seats that still owe a discard after a 7
    #[serde(default)]
    pub pending_discards: Vec<Seat>,
    #[serde(default)]
    pub ruleset: Ruleset,
    #[serde(default)]
    pub ck: Option<CkState>,
    /// Turn number (0 during setup, 1 for the first regular turn)
    #[serde(default)]
    pub turn_number: u32,
    #[serde(default)]
    pub last_roll: Option<(u8, u8)>,
    /// Per-player gains from the last roll, for UI feedback
    #[serde(default)]
    pub last_distribution: Option<Distribution>,
}

impl GameState {
    /// Create a new game. The board, development deck and progress decks are drawn in
    /// that order from one generator seeded with `config.seed`.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rng = Mulberry32::new(config.seed);
        let graph = BoardGraph::generate(config.seed, &mut rng);
        let mut dev_deck = DevelopmentCard::standard_deck();
        dev_deck.shuffle(&mut rng);
        let ck = match config.ruleset {
            Ruleset::CitiesAndKnights => Some(CkState::new(config.barbarian_threshold, &mut rng)),
            Ruleset::Base => None,
        };

        let players: Vec<PlayerState> = config
            .players
            .iter()
            .enumerate()
            .map(|(seat, p)| PlayerState::new(seat as Seat, p.id.clone(), p.name.clone()))
            .collect();

        let count = players.len() as Seat;
        let setup_order: Vec<Seat> = (0..count).chain((0..count).rev()).collect();

        Ok(Self {
            phase: Phase::Setup,
            turn_phase: TurnPhase::SetupPlacement,
            players,
            current_player: setup_order[0],
            board: Board::new(graph),
            dev_deck,
            action_log: Vec::new(),
            setup_order,
            setup_index: 0,
            setup_anchor: None,
            seed: config.seed,
            victory_point_target: config
                .victory_point_target
                .unwrap_or_else(|| config.ruleset.default_victory_points()),
            winner: None,
            pending_discards: Vec::new(),
            ruleset: config.ruleset,
            ck,
            turn_number: 0,
            last_roll: None,
            last_distribution: None,
        })
    }

    /// The seeded stream positioned where [`GameState::new`] draws the progress decks
    pub(crate) fn expansion_stream(seed: u32) -> Mulberry32 {
        let mut rng = Mulberry32::new(seed);
        BoardGraph::generate(seed, &mut rng);
        DevelopmentCard::standard_deck().shuffle(&mut rng);
        rng
    }

    /// Get the number of players
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Seat of the player with this external id
    pub fn seat_of(&self, player_id: &str) -> Option<Seat> {
        self.players
            .iter()
            .position(|p| p.id == player_id)
            .map(|i| i as Seat)
    }

    pub fn player(&self, seat: Seat) -> Option<&PlayerState> {
        self.players.get(seat as usize)
    }

    pub(crate) fn player_mut(&mut self, seat: Seat) -> Result<&mut PlayerState, GameError> {
        self.players
            .get_mut(seat as usize)
            .ok_or_else(|| GameError::UnknownPlayer(seat.to_string()))
    }

    /// The player whose turn it is
    pub fn current(&self) -> Option<&PlayerState> {
        self.player(self.current_player)
    }

    pub fn is_expansion(&self) -> bool {
        self.ruleset == Ruleset::CitiesAndKnights
    }

    pub(crate) fn ck_mut(&mut self) -> Result<&mut CkState, GameError> {
        self.ck.as_mut().ok_or(GameError::ExpansionDisabled)
    }

    /// Check if the game is finished
    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    pub fn in_setup(&self) -> bool {
        self.phase == Phase::Setup
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_game_starts_in_setup() {
        let game = GameState::new(GameConfig::new(&["a", "b", "c"], 7)).unwrap();
        assert_eq!(game.phase, Phase::Setup);
        assert_eq!(game.turn_phase, TurnPhase::SetupPlacement);
        assert_eq!(game.setup_order, vec![0, 1, 2, 2, 1, 0]);
        assert_eq!(game.current_player, 0);
        assert_eq!(game.dev_deck.len(), 25);
        assert_eq!(game.victory_point_target, 10);
        assert!(game.ck.is_none());
    }

    #[test]
    fn test_same_seed_same_game() {
        let a = GameState::new(GameConfig::new(&["a", "b"], 99).with_expansion()).unwrap();
        let b = GameState::new(GameConfig::new(&["a", "b"], 99).with_expansion()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_expansion_defaults() {
        let game = GameState::new(GameConfig::new(&["a", "b"], 1).with_expansion()).unwrap();
        assert_eq!(game.victory_point_target, 13);
        let ck = game.ck.as_ref().unwrap();
        assert_eq!(ck.barbarian_threshold, 7);
        assert_eq!(ck.barbarian_position, 0);
    }

    #[test]
    fn test_config_validation() {
        assert_eq!(
            GameState::new(GameConfig::new(&["solo"], 1)).unwrap_err(),
            ConfigError::PlayerCount(1)
        );
        assert_eq!(
            GameState::new(GameConfig::new(&["a", "a"], 1)).unwrap_err(),
            ConfigError::DuplicatePlayer("a".into())
        );
        let mut config = GameConfig::new(&["a", "b"], 1);
        config.victory_point_target = Some(20);
        assert_eq!(GameState::new(config).unwrap_err(), ConfigError::VictoryPointTarget(20));

        let mut config = GameConfig::new(&["a", "b"], 1);
        config.victory_point_target = Some(6);
        assert_eq!(GameState::new(config).unwrap().victory_point_target, 6);
    }

    #[test]
    fn test_config_from_json() {
        let config: GameConfig = serde_json::from_str(
            r#"{"players":[{"id":"p1","name":"Ann"},{"id":"p2","name":"Ben"}],"seed":3,"ruleset":"citiesAndKnights"}"#,
        )
        .unwrap();
        assert_eq!(config.ruleset, Ruleset::CitiesAndKnights);
        assert_eq!(config.barbarian_threshold, 7);
        assert_eq!(config.victory_point_target, None);
    }

    #[test]
    fn test_seat_lookup() {
        let game = GameState::new(GameConfig::new(&["x", "y"], 1)).unwrap();
        assert_eq!(game.seat_of("y"), Some(1));
        assert_eq!(game.seat_of("z"), None);
    }
}
