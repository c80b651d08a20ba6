//! Cities & Knights expansion.
//!
//! Layered over the base rules: commodities produced by cities, knights, the barbarian
//! track, city improvements with metropolises, and progress cards. The shared
//! expansion state lives in [`CkState`], stored as `GameState::ck` when the ruleset is
//! active.

pub mod barbarians;
pub mod improvements;
pub mod knights;
pub mod progress;

use crate::graph::{Resource, VertexId};
use crate::player::Seat;
use barbarians::AttackReport;
use progress::ProgressCard;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Default number of rolls before the barbarians land
pub const DEFAULT_BARBARIAN_THRESHOLD: u32 = 7;

/// Commodities produced by cities on forest, pasture and mountain hexes
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Commodity {
    Paper,
    Cloth,
    Coin,
}

impl Commodity {
    pub const ALL: [Commodity; 3] = [Commodity::Paper, Commodity::Cloth, Commodity::Coin];

    /// Commodity a city yields on a hex of this resource
    pub fn from_resource(resource: Resource) -> Option<Commodity> {
        match resource {
            Resource::Wood => Some(Commodity::Paper),
            Resource::Sheep => Some(Commodity::Cloth),
            Resource::Ore => Some(Commodity::Coin),
            Resource::Brick | Resource::Wheat => None,
        }
    }
}

/// City improvement tracks, declared in alphabetical order so `Ord` breaks ties
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Track {
    Politics,
    Science,
    Trade,
}

impl Track {
    pub const ALL: [Track; 3] = [Track::Politics, Track::Science, Track::Trade];

    /// Commodity paid to improve this track
    pub fn commodity(&self) -> Commodity {
        match self {
            Track::Politics => Commodity::Coin,
            Track::Science => Commodity::Paper,
            Track::Trade => Commodity::Cloth,
        }
    }
}

/// One value per improvement track
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerTrack<T> {
    pub politics: T,
    pub science: T,
    pub trade: T,
}

impl<T> PerTrack<T> {
    pub fn get(&self, track: Track) -> &T {
        match track {
            Track::Politics => &self.politics,
            Track::Science => &self.science,
            Track::Trade => &self.trade,
        }
    }

    pub fn get_mut(&mut self, track: Track) -> &mut T {
        match track {
            Track::Politics => &mut self.politics,
            Track::Science => &mut self.science,
            Track::Trade => &mut self.trade,
        }
    }
}

impl<T: Copy> PerTrack<T> {
    pub fn at(&self, track: Track) -> T {
        *self.get(track)
    }
}

/// A metropolis bound to one of its owner's cities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metropolis {
    pub owner: Seat,
    pub vertex: VertexId,
}

/// Expansion-only game state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CkState {
    /// Steps the barbarian ship has advanced since the last attack
    pub barbarian_position: u32,
    /// Steps at which the barbarians attack
    pub barbarian_threshold: u32,
    pub metropolises: PerTrack<Option<Metropolis>>,
    /// Remaining progress cards; the top of each deck is the end of the vec
    pub progress_decks: PerTrack<Vec<ProgressCard>>,
    pub next_knight_id: u16,
    /// Outcome of the most recent attack, for UI feedback
    pub last_attack: Option<AttackReport>,
}

impl Default for CkState {
    fn default() -> Self {
        Self {
            barbarian_position: 0,
            barbarian_threshold: DEFAULT_BARBARIAN_THRESHOLD,
            metropolises: PerTrack::default(),
            progress_decks: PerTrack::default(),
            next_knight_id: 0,
            last_attack: None,
        }
    }
}

impl CkState {
    /// Fresh expansion state with shuffled progress decks
    pub fn new(barbarian_threshold: u32, rng: &mut crate::rng::Mulberry32) -> Self {
        Self {
            barbarian_threshold,
            progress_decks: progress::shuffled_decks(rng),
            ..Self::default()
        }
    }

    /// Whether `vertex` carries a metropolis
    pub fn is_metropolis(&self, vertex: VertexId) -> bool {
        Track::ALL
            .iter()
            .any(|t| self.metropolises.get(*t).is_some_and(|m| m.vertex == vertex))
    }

    /// Metropolises held by a player
    pub fn metropolis_count(&self, seat: Seat) -> u32 {
        Track::ALL
            .iter()
            .filter(|t| self.metropolises.get(**t).is_some_and(|m| m.owner == seat))
            .count() as u32
    }
}
