//! Development card purchase and effects.

use crate::actions::GameEvent;
use crate::game::{GameError, GameState};
use crate::graph::{EdgeId, HexId, Resource};
use crate::placement;
use crate::player::{costs, DevCardEntry, DevelopmentCard, Seat};

/// Minimum knights for Largest Army
pub const MIN_LARGEST_ARMY: u32 = 3;
/// Free roads granted by Road Building
pub const ROAD_BUILDING_ROADS: usize = 2;

impl GameState {
    pub(crate) fn buy_dev_card(&mut self, seat: Seat) -> Result<GameEvent, GameError> {
        if self.dev_deck.is_empty() {
            return Err(GameError::EmptyDeck);
        }
        let turn = self.turn_number;
        if !self.player_mut(seat)?.pay(&costs::development_card()) {
            return Err(GameError::CannotAfford);
        }
        let card = self.dev_deck.pop().ok_or(GameError::EmptyDeck)?;
        self.player_mut(seat)?.dev_cards.push(DevCardEntry {
            card,
            bought_on_turn: turn,
        });
        Ok(GameEvent::DevelopmentCardPurchased { seat })
    }

    /// Remove a playable copy of `card` from the hand and mark the turn's play as used
    fn take_dev_card(&mut self, seat: Seat, card: DevelopmentCard) -> Result<(), GameError> {
        let turn = self.turn_number;
        let player = self.player_mut(seat)?;
        if player.dev_card_played_this_turn {
            return Err(GameError::CardAlreadyPlayed);
        }
        if !card.is_playable() {
            return Err(GameError::NoSuchCard);
        }
        let index = player
            .playable_dev_card(card, turn)
            .ok_or(GameError::NoSuchCard)?;
        player.dev_cards.remove(index);
        player.dev_card_played_this_turn = true;
        Ok(())
    }

    /// Knight: move the robber, optionally steal, and count toward Largest Army.
    /// An illegal robber move rejects the whole play.
    pub(crate) fn play_knight(
        &mut self,
        seat: Seat,
        hex: HexId,
        victim: Option<&str>,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.take_dev_card(seat, DevelopmentCard::Knight)?;
        self.player_mut(seat)?.knights_played += 1;

        let mut events = vec![GameEvent::KnightPlayed { seat }];
        events.push(self.relocate_robber(seat, hex)?);
        events.extend(self.steal_inline(seat, hex, victim)?);
        events.extend(self.update_largest_army());
        Ok(events)
    }

    /// Road Building: up to two free roads, each validated on its own; an illegal one
    /// is skipped
    pub(crate) fn play_road_building(
        &mut self,
        seat: Seat,
        edges: &[EdgeId],
    ) -> Result<Vec<GameEvent>, GameError> {
        if edges.len() > ROAD_BUILDING_ROADS {
            return Err(GameError::InvalidTarget(format!(
                "at most {ROAD_BUILDING_ROADS} roads"
            )));
        }
        self.take_dev_card(seat, DevelopmentCard::RoadBuilding)?;

        let mut built = Vec::new();
        for edge in edges {
            let has_piece = self.player(seat).is_some_and(|p| p.roads_remaining > 0);
            if has_piece && placement::can_place_road(&self.board, seat, *edge, None) {
                self.board.place_road(*edge, seat);
                self.player_mut(seat)?.roads_remaining -= 1;
                built.push(*edge);
            }
        }

        let mut events: Vec<GameEvent> = built
            .iter()
            .map(|edge| GameEvent::RoadBuilt { seat, edge: *edge })
            .collect();
        events.push(GameEvent::RoadBuildingPlayed { seat, built });
        events.extend(self.update_longest_road());
        Ok(events)
    }

    pub(crate) fn play_year_of_plenty(
        &mut self,
        seat: Seat,
        resources: [Resource; 2],
    ) -> Result<GameEvent, GameError> {
        self.take_dev_card(seat, DevelopmentCard::YearOfPlenty)?;
        let player = self.player_mut(seat)?;
        for resource in resources {
            player.resources.add(resource, 1);
        }
        Ok(GameEvent::YearOfPlentyPlayed { seat, resources })
    }

    pub(crate) fn play_monopoly(&mut self, seat: Seat, resource: Resource) -> Result<GameEvent, GameError> {
        self.take_dev_card(seat, DevelopmentCard::Monopoly)?;
        let mut total = 0;
        for (index, player) in self.players.iter_mut().enumerate() {
            if index != seat as usize {
                total += player.resources.take_all(resource);
            }
        }
        self.player_mut(seat)?.resources.add(resource, total);
        Ok(GameEvent::MonopolyPlayed {
            seat,
            resource,
            total,
        })
    }

    /// Re-evaluate Largest Army: at least three knights, and a challenger must strictly
    /// exceed the holder
    pub(crate) fn update_largest_army(&mut self) -> Option<GameEvent> {
        let holder = self
            .players
            .iter()
            .position(|p| p.has_largest_army)
            .map(|i| i as Seat);
        let holder_count = holder
            .and_then(|s| self.player(s))
            .map(|p| p.knights_played)
            .unwrap_or(0);

        let most = self.players.iter().map(|p| p.knights_played).max().unwrap_or(0);
        if most < MIN_LARGEST_ARMY || most <= holder_count {
            return None;
        }
        let leaders: Vec<Seat> = (0..self.players.len() as Seat)
            .filter(|s| self.player(*s).is_some_and(|p| p.knights_played == most))
            .collect();
        let [leader] = leaders[..] else {
            return None;
        };

        for (index, player) in self.players.iter_mut().enumerate() {
            player.has_largest_army = index == leader as usize;
        }
        Some(GameEvent::LargestArmyChanged {
            previous: holder,
            current: Some(leader),
            knights: most,
        })
    }
}
