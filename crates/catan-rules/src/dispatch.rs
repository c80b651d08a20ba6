//! State transitions for hosts.
//!
//! [`dispatch`] is the total function the host calls: it never fails, and an illegal
//! action hands back the input state untouched. [`Dispatcher`] layers ordered
//! middleware in front of it, and [`replay`] folds an action log over an initial state.

use crate::actions::{GameAction, GameEvent};
use crate::game::{GameError, GameState};
use crate::validation::validate;

/// Apply `action` to a copy of `state`, appending it to the action log on success
pub fn try_dispatch(state: &GameState, action: &GameAction) -> Result<(GameState, Vec<GameEvent>), GameError> {
    let mut next = state.clone();
    match next.apply_action(action) {
        Ok(events) => {
            next.action_log.push(action.clone());
            tracing::trace!(
                action = action.kind.tag(),
                player = %action.player_id,
                events = events.len(),
                "action applied"
            );
            Ok((next, events))
        }
        Err(err) => {
            tracing::debug!(
                action = action.kind.tag(),
                player = %action.player_id,
                %err,
                "action rejected"
            );
            Err(err)
        }
    }
}

/// The next state after `action`; the unchanged state if it is not legal
pub fn dispatch(state: &GameState, action: &GameAction) -> GameState {
    match try_dispatch(state, action) {
        Ok((next, _)) => next,
        Err(_) => state.clone(),
    }
}

/// Re-run an action log from an initial state
pub fn replay(initial: &GameState, log: &[GameAction]) -> GameState {
    log.iter()
        .fold(initial.clone(), |state, action| dispatch(&state, action))
}

/// Continuation handed to a middleware
pub type Next<'a> = &'a dyn Fn(&GameState, &GameAction) -> GameState;

/// A wrapper around dispatch. Returning without calling `next` short-circuits the
/// remaining chain.
pub trait Middleware {
    fn handle(&self, state: &GameState, action: &GameAction, next: Next<'_>) -> GameState;
}

/// Logs every action and whether it changed the state
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingMiddleware;

impl Middleware for LoggingMiddleware {
    fn handle(&self, state: &GameState, action: &GameAction, next: Next<'_>) -> GameState {
        let result = next(state, action);
        let applied = result.action_log.len() > state.action_log.len();
        tracing::info!(
            action = action.kind.tag(),
            player = %action.player_id,
            applied,
            "dispatch"
        );
        result
    }
}

/// Stops actions that fail [`validate`] before they reach the reducer
#[derive(Debug, Default, Clone, Copy)]
pub struct ValidationMiddleware;

impl Middleware for ValidationMiddleware {
    fn handle(&self, state: &GameState, action: &GameAction, next: Next<'_>) -> GameState {
        let verdict = validate(action, state);
        if !verdict.valid {
            tracing::debug!(
                action = action.kind.tag(),
                reason = verdict.reason.as_deref().unwrap_or_default(),
                "validation rejected action"
            );
            return state.clone();
        }
        next(state, action)
    }
}

/// Ordered middleware chain ending in [`dispatch`]
#[derive(Default)]
pub struct Dispatcher {
    middleware: Vec<Box<dyn Middleware>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a middleware; earlier ones run first
    pub fn with(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Box::new(middleware));
        self
    }

    pub fn dispatch(&self, state: &GameState, action: &GameAction) -> GameState {
        self.run(0, state, action)
    }

    fn run(&self, index: usize, state: &GameState, action: &GameAction) -> GameState {
        match self.middleware.get(index) {
            Some(middleware) => {
                middleware.handle(state, action, &|state, action| self.run(index + 1, state, action))
            }
            None => dispatch(state, action),
        }
    }
}
