//! City improvements and metropolises.

use crate::actions::GameEvent;
use crate::board::BuildingKind;
use crate::expansion::{Metropolis, Track};
use crate::game::{GameError, GameState};
use crate::graph::VertexId;
use crate::player::{costs, Seat};

/// Highest level on an improvement track
pub const MAX_IMPROVEMENT_LEVEL: u8 = 5;
/// Level from which a track can earn a metropolis
pub const METROPOLIS_LEVEL: u8 = 4;

/// Commodities needed to raise a track from `level`
pub fn improvement_cost(level: u8) -> u32 {
    u32::from(level) + 1
}

impl GameState {
    pub(crate) fn improve_city(&mut self, seat: Seat, track: Track) -> Result<Vec<GameEvent>, GameError> {
        if self.board.cities_of(seat).is_empty() {
            return Err(GameError::CityRequired);
        }
        let player = self.player_mut(seat)?;
        let level = player.improvements.at(track);
        if level >= MAX_IMPROVEMENT_LEVEL {
            return Err(GameError::ImprovementMaxed);
        }
        if !player
            .commodities
            .try_remove(track.commodity(), improvement_cost(level))
        {
            return Err(GameError::CannotAfford);
        }
        *player.improvements.get_mut(track) = level + 1;

        let mut events = vec![GameEvent::CityImproved {
            seat,
            track,
            level: level + 1,
        }];
        events.extend(self.update_metropolises());
        Ok(events)
    }

    /// Wall a city for two brick
    pub(crate) fn build_city_wall(&mut self, seat: Seat, vertex: VertexId) -> Result<GameEvent, GameError> {
        self.raise_city_wall(seat, vertex)?;
        if !self.player_mut(seat)?.pay(&costs::city_wall()) {
            self.board.city_walls.remove(&vertex);
            return Err(GameError::CannotAfford);
        }
        Ok(GameEvent::CityWallBuilt { seat, vertex })
    }

    /// Re-evaluate every metropolis.
    ///
    /// A metropolis whose city is gone is vacated. A player with a strictly highest
    /// level of at least [`METROPOLIS_LEVEL`] takes the track's metropolis onto their
    /// lowest-id city that has none; ties leave it where it is.
    pub(crate) fn update_metropolises(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        let Some(ck) = self.ck.as_ref() else {
            return events;
        };
        let mut metropolises = ck.metropolises.clone();

        for track in Track::ALL {
            let previous = *metropolises.get(track);
            let mut current = previous.filter(|m| {
                self.board
                    .building(m.vertex)
                    .is_some_and(|b| b.owner == m.owner && b.kind == BuildingKind::City)
            });

            let levels: Vec<u8> = self.players.iter().map(|p| p.improvements.at(track)).collect();
            let best = levels.iter().copied().max().unwrap_or(0);
            let leaders: Vec<Seat> = (0..levels.len())
                .filter(|i| levels[*i] == best)
                .map(|i| i as Seat)
                .collect();

            if let [leader] = leaders[..] {
                let held = current.is_some_and(|m| m.owner == leader);
                if best >= METROPOLIS_LEVEL && !held {
                    let free_city = self
                        .board
                        .cities_of(leader)
                        .into_iter()
                        .find(|v| !Track::ALL.iter().any(|t| {
                            *t != track && metropolises.get(*t).is_some_and(|m| m.vertex == *v)
                        }));
                    if let Some(vertex) = free_city {
                        current = Some(Metropolis {
                            owner: leader,
                            vertex,
                        });
                    }
                }
            }

            if current != previous {
                *metropolises.get_mut(track) = current;
                tracing::info!(%track, ?previous, ?current, "metropolis changed");
                events.push(GameEvent::MetropolisChanged {
                    track,
                    previous,
                    current,
                });
            }
        }

        if let Some(ck) = self.ck.as_mut() {
            ck.metropolises = metropolises;
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameConfig;
    use crate::player::{CommodityHand, ResourceHand};
    use pretty_assertions::assert_eq;

    fn game() -> GameState {
        let mut game = GameState::new(GameConfig::new(&["a", "b", "c"], 50).with_expansion()).unwrap();
        for (seat, v) in [(0, 3), (1, 25), (2, 45)] {
            game.board.place_settlement(VertexId(v), seat);
            game.board.upgrade_to_city(VertexId(v), seat);
            game.players[seat as usize].cities_remaining = 3;
        }
        game
    }

    #[test]
    fn test_improvement_cost_and_cap() {
        let mut game = game();
        game.players[0].commodities = CommodityHand::with_amounts(20, 0, 0);
        for level in 1..=5u8 {
            game.improve_city(0, Track::Science).unwrap();
            assert_eq!(game.players[0].improvements.science, level);
        }
        assert_eq!(game.players[0].commodities.paper, 20 - (1 + 2 + 3 + 4 + 5));
        assert_eq!(game.improve_city(0, Track::Science), Err(GameError::ImprovementMaxed));
    }

    #[test]
    fn test_improvement_needs_city_and_commodity() {
        let mut game = GameState::new(GameConfig::new(&["a", "b"], 50).with_expansion()).unwrap();
        game.players[0].commodities = CommodityHand::with_amounts(5, 5, 5);
        assert_eq!(game.improve_city(0, Track::Trade), Err(GameError::CityRequired));

        let mut game = self::game();
        assert_eq!(game.improve_city(0, Track::Trade), Err(GameError::CannotAfford));
    }

    #[test]
    fn test_metropolis_at_level_four() {
        let mut game = game();
        game.players[1].improvements.politics = 3;
        assert!(game.update_metropolises().is_empty());

        game.players[1].improvements.politics = 4;
        let events = game.update_metropolises();
        assert_eq!(events.len(), 1);
        let metro = game.ck.as_ref().unwrap().metropolises.politics.unwrap();
        assert_eq!(metro, Metropolis { owner: 1, vertex: VertexId(25) });
        assert_eq!(game.victory_points(1), 2 + 2);
    }

    #[test]
    fn test_metropolis_tie_keeps_incumbent() {
        let mut game = game();
        game.players[0].improvements.trade = 4;
        game.update_metropolises();
        game.players[2].improvements.trade = 4;
        assert!(game.update_metropolises().is_empty());
        assert_eq!(game.ck.as_ref().unwrap().metropolises.trade.unwrap().owner, 0);

        game.players[2].improvements.trade = 5;
        game.update_metropolises();
        assert_eq!(
            game.ck.as_ref().unwrap().metropolises.trade,
            Some(Metropolis { owner: 2, vertex: VertexId(45) })
        );
    }

    #[test]
    fn test_tied_start_awards_nobody() {
        let mut game = game();
        game.players[0].improvements.science = 4;
        game.players[1].improvements.science = 4;
        assert!(game.update_metropolises().is_empty());
        assert_eq!(game.ck.as_ref().unwrap().metropolises.science, None);
    }

    #[test]
    fn test_one_metropolis_per_city() {
        let mut game = game();
        game.players[0].improvements.science = 4;
        game.players[0].improvements.trade = 4;
        game.update_metropolises();
        let ck = game.ck.as_ref().unwrap();
        // Player 0 has a single city, so only the first track gets it
        assert_eq!(ck.metropolis_count(0), 1);
    }

    #[test]
    fn test_city_wall() {
        let mut game = game();
        game.players[0].resources = ResourceHand::with_amounts(0, 3, 0, 0, 0);
        assert_eq!(game.build_city_wall(0, VertexId(25)), Err(GameError::CityRequired));
        game.build_city_wall(0, VertexId(3)).unwrap();
        assert_eq!(game.board.walls_of(0), 1);
        assert_eq!(game.players[0].resources.brick, 1);
        assert_eq!(game.build_city_wall(0, VertexId(3)), Err(GameError::InvalidLocation));
    }

    #[test]
    fn test_city_wall_unaffordable_leaves_no_wall() {
        let mut game = game();
        assert_eq!(game.build_city_wall(1, VertexId(25)), Err(GameError::CannotAfford));
        assert_eq!(game.board.walls_of(1), 0);
    }
}
