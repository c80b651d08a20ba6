//! Resource production for a dice roll.

use crate::board::{Board, BuildingKind};
use crate::expansion::Commodity;
use crate::graph::VertexId;
use crate::player::{CommodityHand, PlayerState, ResourceHand, Seat};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What one player receives from a roll
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gain {
    pub resources: ResourceHand,
    #[serde(default)]
    pub commodities: CommodityHand,
}

impl Gain {
    pub fn is_empty(&self) -> bool {
        self.resources.total() == 0 && self.commodities.total() == 0
    }
}

/// Per-player production for one roll
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub roll: u8,
    pub gains: BTreeMap<Seat, Gain>,
}

impl Distribution {
    pub fn is_empty(&self) -> bool {
        self.gains.values().all(Gain::is_empty)
    }

    /// Credit every gain at once
    pub fn apply(&self, players: &mut [PlayerState]) {
        for (seat, gain) in &self.gains {
            if let Some(player) = players.get_mut(*seat as usize) {
                player.resources.add_hand(&gain.resources);
                player.commodities.add_hand(&gain.commodities);
            }
        }
    }
}

/// Compute production for a dice total.
///
/// Every hex showing `roll` that is not blocked by the robber pays 1 resource per
/// settlement and 2 per city on its corners. With `commodities` set, a city on a
/// wood, sheep or ore hex takes 1 resource and 1 matching commodity instead.
/// A 7 produces nothing.
pub fn distribute(board: &Board, roll: u8, commodities: bool) -> Distribution {
    let mut distribution = Distribution {
        roll,
        gains: BTreeMap::new(),
    };
    if roll == 7 {
        return distribution;
    }

    for hex in &board.graph.hexes {
        if hex.number != Some(roll) || hex.id == board.robber {
            continue;
        }
        let Some(resource) = hex.resource() else {
            continue;
        };

        for vertex in hex.vertices {
            let Some(building) = board.building(vertex) else {
                continue;
            };
            let gain = distribution.gains.entry(building.owner).or_default();
            match (building.kind, commodities.then(|| Commodity::from_resource(resource)).flatten()) {
                (BuildingKind::City, Some(commodity)) => {
                    gain.resources.add(resource, 1);
                    gain.commodities.add(commodity, 1);
                }
                (kind, _) => gain.resources.add(resource, kind.resource_multiplier()),
            }
        }
    }

    distribution
}

/// Resources granted for a second-round setup settlement: one per adjacent producing hex
pub fn starting_resources(board: &Board, vertex: VertexId) -> ResourceHand {
    let mut hand = ResourceHand::new();
    if let Some(v) = board.graph.vertex(vertex) {
        for hex in &v.hexes {
            if let Some(resource) = board.graph.hex(*hex).and_then(|h| h.resource()) {
                hand.add(resource, 1);
            }
        }
    }
    hand
}
