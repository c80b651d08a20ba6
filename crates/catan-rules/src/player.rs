//! Player state and resource management.
//!
//! This module contains:
//! - PlayerState with resources, commodities, cards and achievements
//! - ResourceHand / CommodityHand for managing card counts
//! - Development card types and the standard deck
//! - Building costs

use crate::expansion::progress::ProgressCard;
use crate::expansion::{Commodity, PerTrack};
use crate::graph::Resource;
use serde::{Deserialize, Serialize};

/// Seat index of a player (0-3), the position in `GameState::players`
pub type Seat = u8;

/// Pieces each player starts with
pub const MAX_SETTLEMENTS: u32 = 5;
pub const MAX_CITIES: u32 = 4;
pub const MAX_ROADS: u32 = 15;

/// Player color for UI rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerColor {
    Red,
    Blue,
    Orange,
    White,
}

impl PlayerColor {
    /// Color for a seat
    pub fn for_seat(seat: Seat) -> Self {
        match seat % 4 {
            0 => PlayerColor::Red,
            1 => PlayerColor::Blue,
            2 => PlayerColor::Orange,
            _ => PlayerColor::White,
        }
    }
}

/// Development card types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DevelopmentCard {
    /// Move robber and steal, counts toward Largest Army
    Knight,
    /// Worth 1 VP, never played
    VictoryPoint,
    /// Build 2 roads for free
    RoadBuilding,
    /// Take any 2 resources from the bank
    YearOfPlenty,
    /// All players must give you all of one resource type
    Monopoly,
}

impl DevelopmentCard {
    /// The standard development card deck (25 cards), unshuffled
    pub fn standard_deck() -> Vec<DevelopmentCard> {
        let mut deck = Vec::with_capacity(25);
        deck.extend(std::iter::repeat(DevelopmentCard::Knight).take(14));
        deck.extend(std::iter::repeat(DevelopmentCard::VictoryPoint).take(5));
        deck.extend(std::iter::repeat(DevelopmentCard::RoadBuilding).take(2));
        deck.extend(std::iter::repeat(DevelopmentCard::YearOfPlenty).take(2));
        deck.extend(std::iter::repeat(DevelopmentCard::Monopoly).take(2));
        deck
    }

    /// Whether this card can be played (VP cards are never "played")
    pub fn is_playable(&self) -> bool {
        !matches!(self, DevelopmentCard::VictoryPoint)
    }
}

/// A development card in hand with the turn it was bought on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevCardEntry {
    pub card: DevelopmentCard,
    pub bought_on_turn: u32,
}

/// A hand of resources
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceHand {
    pub wood: u32,
    pub brick: u32,
    pub sheep: u32,
    pub wheat: u32,
    pub ore: u32,
}

impl ResourceHand {
    /// Create an empty hand
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hand with specific amounts
    pub fn with_amounts(wood: u32, brick: u32, sheep: u32, wheat: u32, ore: u32) -> Self {
        Self {
            wood,
            brick,
            sheep,
            wheat,
            ore,
        }
    }

    /// Create a hand with a single resource
    pub fn single(resource: Resource, amount: u32) -> Self {
        let mut hand = Self::new();
        hand.add(resource, amount);
        hand
    }

    /// Total number of resource cards
    pub fn total(&self) -> u32 {
        self.wood + self.brick + self.sheep + self.wheat + self.ore
    }

    /// Check if hand is empty
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Get count of a specific resource
    pub fn get(&self, resource: Resource) -> u32 {
        match resource {
            Resource::Wood => self.wood,
            Resource::Brick => self.brick,
            Resource::Sheep => self.sheep,
            Resource::Wheat => self.wheat,
            Resource::Ore => self.ore,
        }
    }

    fn slot(&mut self, resource: Resource) -> &mut u32 {
        match resource {
            Resource::Wood => &mut self.wood,
            Resource::Brick => &mut self.brick,
            Resource::Sheep => &mut self.sheep,
            Resource::Wheat => &mut self.wheat,
            Resource::Ore => &mut self.ore,
        }
    }

    /// Set count of a specific resource
    pub fn set(&mut self, resource: Resource, count: u32) {
        *self.slot(resource) = count;
    }

    /// Add resources to hand
    pub fn add(&mut self, resource: Resource, amount: u32) {
        *self.slot(resource) += amount;
    }

    /// Add another hand to this one
    pub fn add_hand(&mut self, other: &ResourceHand) {
        for resource in Resource::ALL {
            self.add(resource, other.get(resource));
        }
    }

    /// Check if can afford a cost
    pub fn can_afford(&self, cost: &ResourceHand) -> bool {
        Resource::ALL.iter().all(|r| self.get(*r) >= cost.get(*r))
    }

    /// Subtract a cost, leaving the hand untouched and returning false if insufficient
    pub fn try_subtract(&mut self, cost: &ResourceHand) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        for resource in Resource::ALL {
            *self.slot(resource) -= cost.get(resource);
        }
        true
    }

    /// Take every card of one resource, returning how many were taken
    pub fn take_all(&mut self, resource: Resource) -> u32 {
        std::mem::take(self.slot(resource))
    }

    /// Cards as a flat list in resource order, one entry per card
    pub fn cards(&self) -> Vec<Resource> {
        Resource::ALL
            .iter()
            .flat_map(|r| std::iter::repeat(*r).take(self.get(*r) as usize))
            .collect()
    }
}

/// A hand of commodities (expansion only)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommodityHand {
    pub paper: u32,
    pub cloth: u32,
    pub coin: u32,
}

impl CommodityHand {
    pub fn with_amounts(paper: u32, cloth: u32, coin: u32) -> Self {
        Self { paper, cloth, coin }
    }

    pub fn total(&self) -> u32 {
        self.paper + self.cloth + self.coin
    }

    pub fn get(&self, commodity: Commodity) -> u32 {
        match commodity {
            Commodity::Paper => self.paper,
            Commodity::Cloth => self.cloth,
            Commodity::Coin => self.coin,
        }
    }

    fn slot(&mut self, commodity: Commodity) -> &mut u32 {
        match commodity {
            Commodity::Paper => &mut self.paper,
            Commodity::Cloth => &mut self.cloth,
            Commodity::Coin => &mut self.coin,
        }
    }

    pub fn add(&mut self, commodity: Commodity, amount: u32) {
        *self.slot(commodity) += amount;
    }

    pub fn add_hand(&mut self, other: &CommodityHand) {
        for commodity in Commodity::ALL {
            self.add(commodity, other.get(commodity));
        }
    }

    /// Remove `amount` of a commodity, returning false (and changing nothing) if short
    pub fn try_remove(&mut self, commodity: Commodity, amount: u32) -> bool {
        let slot = self.slot(commodity);
        if *slot < amount {
            return false;
        }
        *slot -= amount;
        true
    }

    pub fn take_all(&mut self, commodity: Commodity) -> u32 {
        std::mem::take(self.slot(commodity))
    }
}

/// Building costs
pub mod costs {
    use super::ResourceHand;

    /// 1 wood, 1 brick
    pub fn road() -> ResourceHand {
        ResourceHand::with_amounts(1, 1, 0, 0, 0)
    }

    /// 1 wood, 1 brick, 1 sheep, 1 wheat
    pub fn settlement() -> ResourceHand {
        ResourceHand::with_amounts(1, 1, 1, 1, 0)
    }

    /// 2 wheat, 3 ore
    pub fn city() -> ResourceHand {
        ResourceHand::with_amounts(0, 0, 0, 2, 3)
    }

    /// 1 sheep, 1 wheat, 1 ore
    pub fn development_card() -> ResourceHand {
        ResourceHand::with_amounts(0, 0, 1, 1, 1)
    }

    /// 1 sheep, 1 ore
    pub fn knight() -> ResourceHand {
        ResourceHand::with_amounts(0, 0, 1, 0, 1)
    }

    /// 1 wheat
    pub fn knight_activation() -> ResourceHand {
        ResourceHand::with_amounts(0, 0, 0, 1, 0)
    }

    /// 2 brick
    pub fn city_wall() -> ResourceHand {
        ResourceHand::with_amounts(0, 2, 0, 0, 0)
    }
}

/// A single player's state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    /// External player id used on the wire
    pub id: String,
    /// Display name
    pub name: String,
    pub color: PlayerColor,
    pub resources: ResourceHand,
    #[serde(default)]
    pub commodities: CommodityHand,
    /// Development cards in hand
    pub dev_cards: Vec<DevCardEntry>,
    /// Whether a non-VP development card was played this turn
    pub dev_card_played_this_turn: bool,
    #[serde(default)]
    pub progress_cards: Vec<ProgressCard>,
    pub settlements_remaining: u32,
    pub cities_remaining: u32,
    pub roads_remaining: u32,
    /// Number of knight cards played (for Largest Army)
    pub knights_played: u32,
    pub has_largest_army: bool,
    pub has_longest_road: bool,
    /// City improvement levels (0-5 per track)
    #[serde(default)]
    pub improvements: PerTrack<u8>,
    /// Permanent victory points from progress cards
    #[serde(default)]
    pub ck_victory_points: u32,
}

impl PlayerState {
    /// Create a new player
    pub fn new(seat: Seat, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: PlayerColor::for_seat(seat),
            resources: ResourceHand::new(),
            commodities: CommodityHand::default(),
            dev_cards: Vec::new(),
            dev_card_played_this_turn: false,
            progress_cards: Vec::new(),
            settlements_remaining: MAX_SETTLEMENTS,
            cities_remaining: MAX_CITIES,
            roads_remaining: MAX_ROADS,
            knights_played: 0,
            has_largest_army: false,
            has_longest_road: false,
            improvements: PerTrack::default(),
            ck_victory_points: 0,
        }
    }

    /// Settlements currently on the board
    pub fn settlements_placed(&self) -> u32 {
        MAX_SETTLEMENTS.saturating_sub(self.settlements_remaining)
    }

    /// Cities currently on the board
    pub fn cities_placed(&self) -> u32 {
        MAX_CITIES.saturating_sub(self.cities_remaining)
    }

    /// Number of VP development cards held
    pub fn victory_point_cards(&self) -> u32 {
        self.dev_cards
            .iter()
            .filter(|e| e.card == DevelopmentCard::VictoryPoint)
            .count() as u32
    }

    /// Index of a card that may be played on `turn` (not bought this turn)
    pub fn playable_dev_card(&self, card: DevelopmentCard, turn: u32) -> Option<usize> {
        self.dev_cards
            .iter()
            .position(|e| e.card == card && e.bought_on_turn < turn)
    }

    /// Whether the player holds a playable copy of `card` this turn
    pub fn can_play_dev_card(&self, card: DevelopmentCard, turn: u32) -> bool {
        card.is_playable()
            && !self.dev_card_played_this_turn
            && self.playable_dev_card(card, turn).is_some()
    }

    /// Pay a resource cost; false (and no change) if unaffordable
    pub fn pay(&mut self, cost: &ResourceHand) -> bool {
        self.resources.try_subtract(cost)
    }
}
