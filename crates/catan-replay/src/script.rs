//! Replay scripts: a game configuration plus the actions to feed it.

use std::fmt;

use anyhow::{Context, Result};
use catan_rules::{bot, try_dispatch, Bot, BotDifficulty, GameAction, GameConfig, GameState, Phase};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Everything needed to reproduce a game from scratch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayScript {
    pub config: GameConfig,
    #[serde(default)]
    pub actions: Vec<GameAction>,
}

/// What happened when a script was played
#[derive(Debug, Clone)]
pub struct Outcome {
    pub state: GameState,
    pub applied: usize,
    pub rejected: usize,
}

impl ReplayScript {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("reading replay script")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("writing replay script")
    }

    /// Feed every action through the reducer. Rejected actions are skipped, exactly as a
    /// live host would drop them.
    pub fn run(&self) -> Result<Outcome> {
        let mut state = GameState::new(self.config.clone())?;
        let mut rejected = 0;
        for (index, action) in self.actions.iter().enumerate() {
            match try_dispatch(&state, action) {
                Ok((next, events)) => {
                    debug!(index, events = events.len(), "applied");
                    state = next;
                }
                Err(err) => {
                    warn!(index, action = action.kind.tag(), player = %action.player_id, %err, "rejected");
                    rejected += 1;
                }
            }
        }
        Ok(Outcome {
            applied: state.action_log.len(),
            rejected,
            state,
        })
    }
}

/// Options for a bot-only game
#[derive(Debug, Clone)]
pub struct Simulation {
    pub seed: u32,
    pub players: usize,
    pub expansion: bool,
    pub turns: u32,
    pub difficulty: BotDifficulty,
}

impl Simulation {
    fn config(&self) -> GameConfig {
        let ids: Vec<String> = (1..=self.players).map(|n| format!("bot{n}")).collect();
        let config = GameConfig::new(&ids, self.seed);
        if self.expansion {
            config.with_expansion()
        } else {
            config
        }
    }

    /// Let bots play until someone wins or `turns` turns have passed, returning the
    /// script that reproduces the game
    pub fn run(&self) -> Result<(ReplayScript, GameState)> {
        let config = self.config();
        let mut state = GameState::new(config.clone())?;
        let mut bots: Vec<Bot> = (0..self.players)
            .map(|seat| Bot::new(seat as u8, self.difficulty, self.seed))
            .collect();

        while !state.is_finished() && state.turn_number <= self.turns {
            let before = state.action_log.len();
            state = bot::drive(state, &mut bots, bot::MAX_BOT_STEPS);
            if state.action_log.len() == before {
                warn!(turn = state.turn_number, "bots stalled");
                break;
            }
        }
        info!(
            turns = state.turn_number,
            actions = state.action_log.len(),
            finished = state.is_finished(),
            "simulation done"
        );

        let script = ReplayScript {
            config,
            actions: state.action_log.clone(),
        };
        Ok((script, state))
    }
}

/// Human-readable end-of-game report
pub struct Summary<'a>(pub &'a Outcome);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = &self.0.state;
        writeln!(f, "phase: {:?} / {:?} (turn {})", state.phase, state.turn_phase, state.turn_number)?;
        writeln!(f, "actions: {} applied, {} rejected", self.0.applied, self.0.rejected)?;
        for (seat, player) in state.players.iter().enumerate() {
            writeln!(
                f,
                "  {} ({}): {} VP",
                player.name,
                player.id,
                state.victory_points(seat as u8)
            )?;
        }
        match (state.phase, state.winner.and_then(|s| state.player(s))) {
            (Phase::Finished, Some(winner)) => write!(f, "winner: {}", winner.name),
            _ => write!(f, "no winner yet"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catan_rules::ActionKind;
    use pretty_assertions::assert_eq;

    fn simulation(expansion: bool) -> Simulation {
        Simulation {
            seed: 99,
            players: 3,
            expansion,
            turns: 6,
            difficulty: BotDifficulty::Medium,
        }
    }

    #[test]
    fn test_simulated_script_replays_to_same_state() {
        let (script, live) = simulation(false).run().unwrap();
        let json = script.to_json().unwrap();
        let outcome = ReplayScript::from_json(&json).unwrap().run().unwrap();
        assert_eq!(outcome.rejected, 0);
        assert_eq!(outcome.state, live);
    }

    #[test]
    fn test_expansion_simulation_replays() {
        let (script, live) = simulation(true).run().unwrap();
        assert!(live.is_expansion());
        assert_eq!(script.run().unwrap().state, live);
    }

    #[test]
    fn test_rejected_actions_are_counted() {
        let config = GameConfig::new(&["a", "b"], 5);
        let script = ReplayScript {
            config: config.clone(),
            actions: vec![
                GameAction::new("a", ActionKind::RollDice { die1: 3, die2: 3 }),
                GameAction::new("b", ActionKind::EndTurn),
            ],
        };
        let outcome = script.run().unwrap();
        assert_eq!(outcome.rejected, 2);
        assert_eq!(outcome.applied, 0);
        assert_eq!(outcome.state, GameState::new(config).unwrap());
    }

    #[test]
    fn test_script_without_actions_parses() {
        let script = ReplayScript::from_json(
            r#"{"config": {"players": [{"id": "a", "name": "A"}, {"id": "b", "name": "B"}], "seed": 1}}"#,
        )
        .unwrap();
        assert!(script.actions.is_empty());
        assert_eq!(script.run().unwrap().state.player_count(), 2);
    }

    #[test]
    fn test_summary_names_winner() {
        let mut state = GameState::new(GameConfig::new(&["a", "b"], 5)).unwrap();
        state.phase = Phase::Finished;
        state.winner = Some(1);
        let text = Summary(&Outcome {
            state,
            applied: 0,
            rejected: 0,
        })
        .to_string();
        assert!(text.ends_with("winner: b"));
    }
}
