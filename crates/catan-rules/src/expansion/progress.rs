//! Progress cards: three themed decks of one-shot effects.

use crate::actions::GameEvent;
use crate::expansion::knights::{level_cap, KnightId, MAX_KNIGHTS_PER_LEVEL};
use crate::expansion::{Commodity, PerTrack, Track};
use crate::game::{GameError, GameState};
use crate::graph::{Resource, Terrain, VertexId};
use crate::player::{ResourceHand, Seat};
use crate::rng::Mulberry32;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Progress cards a player may hold at once
pub const MAX_PROGRESS_HAND: usize = 5;
/// Maximum city walls per player
pub const MAX_CITY_WALLS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "camelCase")]
pub enum ProgressCard {
    // Science
    /// 2 wheat per wheat hex next to your buildings
    Irrigation,
    /// 2 ore per ore hex next to your buildings
    Mining,
    /// 1 permanent victory point
    Printer,
    /// A free city wall
    Engineer,
    /// Promote up to two knights for free
    Smith,

    // Politics
    /// Activate all of your knights for free
    Warlord,
    /// Take a progress card from an opponent
    Spy,
    /// An opponent's knight loses a level, or leaves the board at level 1
    Deserter,
    /// Chase an opponent's knight off your road network
    Intrigue,
    /// 1 permanent victory point
    Constitution,

    // Trade
    /// Every opponent gives you up to 2 of a named resource
    ResourceMonopoly,
    /// Every opponent gives you 1 of a named commodity
    TradeMonopoly,
    /// Take 2 resources from a player with more victory points
    MasterMerchant,
}

impl ProgressCard {
    /// The deck this card belongs to
    pub fn track(&self) -> Track {
        match self {
            ProgressCard::Irrigation
            | ProgressCard::Mining
            | ProgressCard::Printer
            | ProgressCard::Engineer
            | ProgressCard::Smith => Track::Science,
            ProgressCard::Warlord
            | ProgressCard::Spy
            | ProgressCard::Deserter
            | ProgressCard::Intrigue
            | ProgressCard::Constitution => Track::Politics,
            ProgressCard::ResourceMonopoly
            | ProgressCard::TradeMonopoly
            | ProgressCard::MasterMerchant => Track::Trade,
        }
    }

    /// Copies of this card in its deck
    pub fn copies(&self) -> usize {
        match self {
            ProgressCard::Printer | ProgressCard::Engineer | ProgressCard::Constitution => 1,
            ProgressCard::Spy => 3,
            ProgressCard::ResourceMonopoly => 4,
            _ => 2,
        }
    }
}

/// Unshuffled deck for one track
pub fn standard_deck(track: Track) -> Vec<ProgressCard> {
    use strum::IntoEnumIterator;
    ProgressCard::iter()
        .filter(|c| c.track() == track)
        .flat_map(|c| std::iter::repeat(c).take(c.copies()))
        .collect()
}

/// All three decks, shuffled in politics, science, trade order
pub fn shuffled_decks(rng: &mut Mulberry32) -> PerTrack<Vec<ProgressCard>> {
    let mut decks = PerTrack {
        politics: standard_deck(Track::Politics),
        science: standard_deck(Track::Science),
        trade: standard_deck(Track::Trade),
    };
    for track in Track::ALL {
        decks.get_mut(track).shuffle(rng);
    }
    decks
}

/// Choices a card may need; unused fields are ignored
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressTarget {
    pub resource: Option<Resource>,
    pub commodity: Option<Commodity>,
    /// External id of the affected player
    pub player: Option<String>,
    pub knight: Option<KnightId>,
    pub knights: Vec<KnightId>,
    pub vertex: Option<VertexId>,
    pub card: Option<ProgressCard>,
}

fn missing(what: &str) -> GameError {
    GameError::InvalidTarget(format!("{what} required"))
}

impl GameState {
    /// Draw the top card of a track's deck. A full hand sends the card to the bottom.
    pub(crate) fn draw_progress_card(&mut self, seat: Seat, track: Track) -> Option<GameEvent> {
        let hand_full = self
            .player(seat)
            .map_or(true, |p| p.progress_cards.len() >= MAX_PROGRESS_HAND);
        let deck = self.ck.as_mut()?.progress_decks.get_mut(track);
        let card = deck.pop()?;
        if hand_full {
            deck.insert(0, card);
            return None;
        }
        self.players.get_mut(seat as usize)?.progress_cards.push(card);
        Some(GameEvent::ProgressCardDrawn { seat, track })
    }

    fn opponent(&self, seat: Seat, target: &ProgressTarget) -> Result<Seat, GameError> {
        let id = target.player.as_deref().ok_or_else(|| missing("player"))?;
        let other = self
            .seat_of(id)
            .ok_or_else(|| GameError::UnknownPlayer(id.to_string()))?;
        if other == seat {
            return Err(GameError::InvalidTarget("must target an opponent".into()));
        }
        Ok(other)
    }

    /// Play a progress card from hand; it goes to the bottom of its deck afterwards.
    /// The card leaves the hand only once its effect has succeeded.
    pub(crate) fn play_progress_card(
        &mut self,
        seat: Seat,
        card: ProgressCard,
        target: &ProgressTarget,
    ) -> Result<Vec<GameEvent>, GameError> {
        if !self.player_mut(seat)?.progress_cards.contains(&card) {
            return Err(GameError::NoSuchCard);
        }
        let events = self.progress_effect(seat, card, target)?;

        let hand = &mut self.player_mut(seat)?.progress_cards;
        if let Some(index) = hand.iter().position(|c| *c == card) {
            hand.remove(index);
        }
        if let Ok(ck) = self.ck_mut() {
            ck.progress_decks.get_mut(card.track()).insert(0, card);
        }
        Ok(events)
    }

    fn progress_effect(
        &mut self,
        seat: Seat,
        card: ProgressCard,
        target: &ProgressTarget,
    ) -> Result<Vec<GameEvent>, GameError> {
        let mut events = vec![GameEvent::ProgressCardPlayed { seat, card }];
        match card {
            ProgressCard::Irrigation => self.harvest(seat, Resource::Wheat)?,
            ProgressCard::Mining => self.harvest(seat, Resource::Ore)?,
            ProgressCard::Printer | ProgressCard::Constitution => {
                self.player_mut(seat)?.ck_victory_points += 1;
            }
            ProgressCard::Engineer => {
                let vertex = target.vertex.ok_or_else(|| missing("vertex"))?;
                self.raise_city_wall(seat, vertex)?;
                events.push(GameEvent::CityWallBuilt { seat, vertex });
            }
            ProgressCard::Smith => {
                if target.knights.is_empty() || target.knights.len() > 2 {
                    return Err(GameError::InvalidTarget("one or two knights".into()));
                }
                for id in &target.knights {
                    events.push(self.free_promotion(seat, *id)?);
                }
            }
            ProgressCard::Warlord => {
                for knight in self.board.knights.values_mut().filter(|k| k.owner == seat) {
                    if !knight.active {
                        knight.active = true;
                        events.push(GameEvent::KnightActivated { knight: knight.id });
                    }
                }
            }
            ProgressCard::Spy => {
                let victim = self.opponent(seat, target)?;
                let hand = &mut self.player_mut(victim)?.progress_cards;
                let taken = match target.card {
                    Some(wanted) => hand.iter().position(|c| *c == wanted),
                    None => (!hand.is_empty()).then_some(0),
                }
                .ok_or_else(|| GameError::InvalidTarget("victim has no such card".into()))?;
                let stolen = hand.remove(taken);
                // The Spy itself is still in hand
                let kept = self.player_mut(seat)?.progress_cards.len() - 1;
                if kept >= MAX_PROGRESS_HAND {
                    self.ck_mut()?.progress_decks.get_mut(stolen.track()).insert(0, stolen);
                } else {
                    self.player_mut(seat)?.progress_cards.push(stolen);
                }
            }
            ProgressCard::Deserter => {
                let victim = self.opponent(seat, target)?;
                let id = target.knight.ok_or_else(|| missing("knight"))?;
                let knight = self
                    .board
                    .knights
                    .get_mut(&id)
                    .filter(|k| k.owner == victim)
                    .ok_or(GameError::UnknownKnight)?;
                if knight.level > 1 {
                    knight.level -= 1;
                    events.push(GameEvent::KnightPromoted {
                        knight: id,
                        level: knight.level,
                    });
                } else {
                    self.board.knights.remove(&id);
                    events.push(GameEvent::KnightRemoved { knight: id });
                }
            }
            ProgressCard::Intrigue => {
                let id = target.knight.ok_or_else(|| missing("knight"))?;
                let knight = self
                    .board
                    .knights
                    .get(&id)
                    .copied()
                    .filter(|k| k.owner != seat)
                    .ok_or(GameError::UnknownKnight)?;
                if !self.board.vertex_touches_road(knight.vertex, seat) {
                    return Err(GameError::InvalidTarget("knight is not on your roads".into()));
                }
                let mut targets = self.displacement_targets(&knight, knight.vertex, knight.vertex);
                targets.sort();
                let destination = match target.vertex {
                    Some(v) if targets.contains(&v) => Some(v),
                    Some(_) => return Err(GameError::InvalidLocation),
                    None => targets.first().copied(),
                };
                match destination {
                    Some(to) => {
                        if let Some(k) = self.board.knights.get_mut(&id) {
                            k.vertex = to;
                        }
                        events.push(GameEvent::KnightDisplaced {
                            knight: id,
                            from: knight.vertex,
                            to,
                        });
                    }
                    None => {
                        self.board.knights.remove(&id);
                        events.push(GameEvent::KnightRemoved { knight: id });
                    }
                }
            }
            ProgressCard::ResourceMonopoly => {
                let resource = target.resource.ok_or_else(|| missing("resource"))?;
                let mut total = 0;
                for (index, player) in self.players.iter_mut().enumerate() {
                    if index != seat as usize {
                        let take = player.resources.get(resource).min(2);
                        player.resources.set(resource, player.resources.get(resource) - take);
                        total += take;
                    }
                }
                self.player_mut(seat)?.resources.add(resource, total);
            }
            ProgressCard::TradeMonopoly => {
                let commodity = target.commodity.ok_or_else(|| missing("commodity"))?;
                let mut total = 0;
                for (index, player) in self.players.iter_mut().enumerate() {
                    if index != seat as usize && player.commodities.try_remove(commodity, 1) {
                        total += 1;
                    }
                }
                self.player_mut(seat)?.commodities.add(commodity, total);
            }
            ProgressCard::MasterMerchant => {
                let victim = self.opponent(seat, target)?;
                if self.victory_points(victim) <= self.victory_points(seat) {
                    return Err(GameError::InvalidTarget("victim must lead you in points".into()));
                }
                let cards = self.player(victim).map(|p| p.resources.cards()).unwrap_or_default();
                let mut ordered: Vec<Resource> = cards
                    .iter()
                    .copied()
                    .filter(|r| Some(*r) == target.resource)
                    .collect();
                ordered.extend(cards.iter().copied().filter(|r| Some(*r) != target.resource));
                let mut taken = ResourceHand::new();
                for resource in ordered.into_iter().take(2) {
                    taken.add(resource, 1);
                }
                self.player_mut(victim)?.pay(&taken);
                self.player_mut(seat)?.resources.add_hand(&taken);
            }
        }
        Ok(events)
    }

    /// 2 of `resource` per matching hex touching one of the player's buildings
    fn harvest(&mut self, seat: Seat, resource: Resource) -> Result<(), GameError> {
        let hexes = self
            .board
            .graph
            .hexes
            .iter()
            .filter(|h| h.terrain == Terrain::Resource(resource))
            .filter(|h| {
                h.vertices
                    .iter()
                    .any(|v| self.board.building(*v).is_some_and(|b| b.owner == seat))
            })
            .count() as u32;
        self.player_mut(seat)?.resources.add(resource, 2 * hexes);
        Ok(())
    }

    fn free_promotion(&mut self, seat: Seat, id: KnightId) -> Result<GameEvent, GameError> {
        let politics = self
            .player(seat)
            .map(|p| p.improvements.at(Track::Politics))
            .unwrap_or(0);
        let level = match self.board.knights.get(&id) {
            Some(k) if k.owner == seat => k.level + 1,
            _ => return Err(GameError::UnknownKnight),
        };
        let at_level = self.knights_of(seat).filter(|k| k.level == level).count();
        if level > level_cap(politics) || at_level >= MAX_KNIGHTS_PER_LEVEL {
            return Err(GameError::KnightLimit);
        }
        if let Some(k) = self.board.knights.get_mut(&id) {
            k.level = level;
        }
        Ok(GameEvent::KnightPromoted { knight: id, level })
    }

    /// Put a wall on one of the player's unwalled cities
    pub(crate) fn raise_city_wall(&mut self, seat: Seat, vertex: VertexId) -> Result<(), GameError> {
        if !self.board.cities_of(seat).contains(&vertex) {
            return Err(GameError::CityRequired);
        }
        if self.board.city_walls.contains_key(&vertex) || self.board.walls_of(seat) >= MAX_CITY_WALLS {
            return Err(GameError::InvalidLocation);
        }
        self.board.city_walls.insert(vertex, seat);
        Ok(())
    }
}
