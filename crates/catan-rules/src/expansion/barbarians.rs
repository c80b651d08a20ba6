//! The barbarian ship and its attacks on the island.

use crate::actions::GameEvent;
use crate::expansion::Track;
use crate::game::GameState;
use crate::graph::VertexId;
use crate::player::Seat;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttackOutcome {
    /// Defense matched or beat the barbarians
    Defended,
    /// The weakest defenders lost a city each
    CitiesLost,
    /// Neither side had any strength
    Unopposed,
}

/// A city reduced to a settlement by an attack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pillaged {
    pub seat: Seat,
    pub vertex: VertexId,
}

/// A defender rewarded with a progress card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Defender {
    pub seat: Seat,
    pub track: Track,
    /// False when the hand or deck was full or empty
    pub drew_card: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackReport {
    /// Number of cities on the board
    pub barbarian_strength: u32,
    /// Sum of active knight levels
    pub defense_strength: u32,
    pub outcome: AttackOutcome,
    pub pillaged: Vec<Pillaged>,
    pub defenders: Vec<Defender>,
}

/// Seats whose value in `by_seat` equals the extreme chosen by `pick`
fn seats_matching(candidates: &[Seat], by_seat: impl Fn(Seat) -> u32, pick: fn(u32, u32) -> u32) -> Vec<Seat> {
    let Some(target) = candidates.iter().map(|s| by_seat(*s)).reduce(pick) else {
        return Vec::new();
    };
    candidates
        .iter()
        .copied()
        .filter(|s| by_seat(*s) == target)
        .collect()
}

impl GameState {
    /// Move the ship one step; attack when it reaches the threshold
    pub(crate) fn advance_barbarians(&mut self) -> Vec<GameEvent> {
        let Some(ck) = self.ck.as_mut() else {
            return Vec::new();
        };
        ck.barbarian_position += 1;
        let position = ck.barbarian_position;
        let mut events = vec![GameEvent::BarbariansAdvanced { position }];
        if position >= ck.barbarian_threshold {
            events.extend(self.resolve_barbarian_attack());
        }
        events
    }

    /// Compare cities against active knights and settle the consequences.
    ///
    /// A failed defense costs every lowest contributor among city owners one city,
    /// the lowest vertex id first; metropolis cities are immune. A successful defense
    /// gives every top contributor a progress card from their highest track. Knights
    /// stand down afterwards and the ship returns to the start.
    pub(crate) fn resolve_barbarian_attack(&mut self) -> Vec<GameEvent> {
        let seats: Vec<Seat> = (0..self.players.len() as Seat).collect();
        let barbarian_strength: u32 = seats.iter().map(|s| self.board.cities_of(*s).len() as u32).sum();
        let defense_strength: u32 = seats.iter().map(|s| self.knight_defense(*s)).sum();

        let mut events = Vec::new();
        let mut pillaged = Vec::new();
        let mut defenders = Vec::new();
        let outcome = if defense_strength < barbarian_strength {
            let city_owners: Vec<Seat> = seats
                .iter()
                .copied()
                .filter(|s| !self.board.cities_of(*s).is_empty())
                .collect();
            for seat in seats_matching(&city_owners, |s| self.knight_defense(s), u32::min) {
                let vertex = self.board.cities_of(seat).into_iter().find(|v| {
                    !self.ck.as_ref().is_some_and(|ck| ck.is_metropolis(*v))
                });
                if let Some(vertex) = vertex {
                    self.board.demote_city(vertex);
                    if let Some(player) = self.players.get_mut(seat as usize) {
                        player.cities_remaining += 1;
                        player.settlements_remaining = player.settlements_remaining.saturating_sub(1);
                    }
                    pillaged.push(Pillaged { seat, vertex });
                }
            }
            AttackOutcome::CitiesLost
        } else if defense_strength > 0 {
            for seat in seats_matching(&seats, |s| self.knight_defense(s), u32::max) {
                let improvements = self.players[seat as usize].improvements.clone();
                let best = Track::ALL.iter().map(|t| improvements.at(*t)).max().unwrap_or(0);
                let track = Track::ALL
                    .into_iter()
                    .find(|t| improvements.at(*t) == best)
                    .unwrap_or(Track::Politics);
                let drawn = self.draw_progress_card(seat, track);
                defenders.push(Defender {
                    seat,
                    track,
                    drew_card: drawn.is_some(),
                });
                events.extend(drawn);
            }
            AttackOutcome::Defended
        } else {
            AttackOutcome::Unopposed
        };

        for knight in self.board.knights.values_mut() {
            knight.active = false;
            knight.has_acted = false;
        }
        events.extend(self.update_metropolises());

        let report = AttackReport {
            barbarian_strength,
            defense_strength,
            outcome,
            pillaged,
            defenders,
        };
        tracing::info!(
            barbarian_strength,
            defense_strength,
            ?outcome,
            "barbarians attacked"
        );
        if let Some(ck) = self.ck.as_mut() {
            ck.barbarian_position = 0;
            ck.last_attack = Some(report.clone());
        }
        events.insert(0, GameEvent::BarbarianAttack { report });
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expansion::knights::{KnightId, KnightState};
    use crate::expansion::Metropolis;
    use crate::game::GameConfig;
    use pretty_assertions::assert_eq;

    fn game() -> GameState {
        let mut game = GameState::new(GameConfig::new(&["a", "b", "c"], 70).with_expansion()).unwrap();
        for (seat, v) in [(0, 3), (1, 25), (2, 45)] {
            game.board.place_settlement(VertexId(v), seat);
            game.board.upgrade_to_city(VertexId(v), seat);
            game.players[seat as usize].cities_remaining = 3;
        }
        game
    }

    fn add_knight(game: &mut GameState, id: u16, owner: Seat, vertex: u16, level: u8) {
        game.board.knights.insert(
            KnightId(id),
            KnightState {
                id: KnightId(id),
                owner,
                vertex: VertexId(vertex),
                level,
                active: true,
                has_acted: false,
            },
        );
    }

    #[test]
    fn test_advance_until_attack() {
        let mut game = game();
        for step in 1..7 {
            let events = game.advance_barbarians();
            assert_eq!(events, vec![GameEvent::BarbariansAdvanced { position: step }]);
        }
        let events = game.advance_barbarians();
        assert!(matches!(events[1], GameEvent::BarbarianAttack { .. }));
        let ck = game.ck.as_ref().unwrap();
        assert_eq!(ck.barbarian_position, 0);
        assert!(ck.last_attack.is_some());
    }

    #[test]
    fn test_base_game_has_no_barbarians() {
        let mut game = GameState::new(GameConfig::new(&["a", "b"], 70)).unwrap();
        assert!(game.advance_barbarians().is_empty());
    }

    #[test]
    fn test_failed_defense_pillages_weakest() {
        let mut game = game();
        add_knight(&mut game, 0, 0, 10, 2);
        game.resolve_barbarian_attack();

        let report = game.ck.as_ref().unwrap().last_attack.clone().unwrap();
        assert_eq!(report.barbarian_strength, 3);
        assert_eq!(report.defense_strength, 2);
        assert_eq!(report.outcome, AttackOutcome::CitiesLost);
        assert_eq!(
            report.pillaged,
            vec![
                Pillaged { seat: 1, vertex: VertexId(25) },
                Pillaged { seat: 2, vertex: VertexId(45) },
            ]
        );
        assert_eq!(game.board.cities_of(0), vec![VertexId(3)]);
        assert!(game.board.cities_of(1).is_empty());
        assert_eq!(game.players[1].cities_remaining, 4);
        assert_eq!(game.victory_points(1), 1);
        assert!(!game.board.knights[&KnightId(0)].active, "knights stand down");
    }

    #[test]
    fn test_metropolis_is_immune() {
        let mut game = game();
        game.ck.as_mut().unwrap().metropolises.science = Some(Metropolis {
            owner: 1,
            vertex: VertexId(25),
        });
        game.players[1].improvements.science = 4;
        game.resolve_barbarian_attack();
        assert_eq!(game.board.cities_of(1), vec![VertexId(25)]);
        let report = game.ck.as_ref().unwrap().last_attack.clone().unwrap();
        assert_eq!(report.pillaged.len(), 2);
    }

    #[test]
    fn test_successful_defense_rewards_top_defender() {
        let mut game = game();
        add_knight(&mut game, 0, 0, 10, 2);
        add_knight(&mut game, 1, 1, 30, 1);
        add_knight(&mut game, 2, 2, 50, 1);
        game.players[0].improvements.trade = 2;
        let top = *game.ck.as_ref().unwrap().progress_decks.trade.last().unwrap();

        game.resolve_barbarian_attack();
        let report = game.ck.as_ref().unwrap().last_attack.clone().unwrap();
        assert_eq!(report.outcome, AttackOutcome::Defended);
        assert_eq!(
            report.defenders,
            vec![Defender {
                seat: 0,
                track: Track::Trade,
                drew_card: true
            }]
        );
        assert_eq!(game.players[0].progress_cards, vec![top]);
        assert_eq!(game.board.cities_of(1), vec![VertexId(25)]);
    }

    #[test]
    fn test_tied_defenders_draw_from_politics_first() {
        let mut game = game();
        add_knight(&mut game, 0, 0, 10, 2);
        add_knight(&mut game, 1, 1, 30, 2);
        game.resolve_barbarian_attack();
        let report = game.ck.as_ref().unwrap().last_attack.clone().unwrap();
        assert_eq!(report.defenders.len(), 2);
        assert!(report.defenders.iter().all(|d| d.track == Track::Politics));
    }

    #[test]
    fn test_no_cities_no_knights() {
        let mut game = GameState::new(GameConfig::new(&["a", "b"], 70).with_expansion()).unwrap();
        game.resolve_barbarian_attack();
        let report = game.ck.as_ref().unwrap().last_attack.clone().unwrap();
        assert_eq!(report.outcome, AttackOutcome::Unopposed);
    }
}
