//! Mutable board state layered over the immutable [`BoardGraph`].
//!
//! Only pieces change during a game: buildings, roads, knights, city walls and the
//! robber. All maps are keyed by integer handles and kept ordered so that iteration
//! (and therefore every tie-break derived from it) is deterministic.

use crate::expansion::knights::{KnightId, KnightState};
use crate::graph::{BoardGraph, EdgeId, HexId, PortKind, VertexId};
use crate::player::Seat;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// What stands on a vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildingKind {
    Settlement,
    City,
}

impl BuildingKind {
    /// Resources produced per matching roll
    pub fn resource_multiplier(&self) -> u32 {
        match self {
            BuildingKind::Settlement => 1,
            BuildingKind::City => 2,
        }
    }
}

/// A building and its owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub kind: BuildingKind,
    pub owner: Seat,
}

/// The game board: topology plus every piece placed on it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    /// Immutable topology, shared between snapshots
    pub graph: Arc<BoardGraph>,
    pub buildings: BTreeMap<VertexId, Building>,
    pub roads: BTreeMap<EdgeId, Seat>,
    #[serde(default)]
    pub knights: BTreeMap<KnightId, KnightState>,
    #[serde(default)]
    pub city_walls: BTreeMap<VertexId, Seat>,
    pub robber: HexId,
}

impl Board {
    /// An empty board with the robber on the desert
    pub fn new(graph: BoardGraph) -> Self {
        let robber = graph.robber_start;
        Self {
            graph: Arc::new(graph),
            buildings: BTreeMap::new(),
            roads: BTreeMap::new(),
            knights: BTreeMap::new(),
            city_walls: BTreeMap::new(),
            robber,
        }
    }

    /// Standard board for a seed
    pub fn from_seed(seed: u32) -> Self {
        Self::new(BoardGraph::from_seed(seed))
    }

    // ==================== Queries ====================

    pub fn building(&self, vertex: VertexId) -> Option<Building> {
        self.buildings.get(&vertex).copied()
    }

    pub fn road_owner(&self, edge: EdgeId) -> Option<Seat> {
        self.roads.get(&edge).copied()
    }

    /// The knight standing on a vertex
    pub fn knight_at(&self, vertex: VertexId) -> Option<&KnightState> {
        self.knights.values().find(|k| k.vertex == vertex)
    }

    /// Whether a vertex holds a building owned by someone other than `seat`
    pub fn is_opponent_building(&self, vertex: VertexId, seat: Seat) -> bool {
        self.building(vertex).is_some_and(|b| b.owner != seat)
    }

    /// Whether any of the vertex's edges carries a road owned by `seat`
    pub fn vertex_touches_road(&self, vertex: VertexId, seat: Seat) -> bool {
        self.graph
            .vertex(vertex)
            .is_some_and(|v| v.edges.iter().any(|e| self.road_owner(*e) == Some(seat)))
    }

    /// Vertices holding a city owned by `seat`, ascending
    pub fn cities_of(&self, seat: Seat) -> Vec<VertexId> {
        self.buildings
            .iter()
            .filter(|(_, b)| b.owner == seat && b.kind == BuildingKind::City)
            .map(|(v, _)| *v)
            .collect()
    }

    /// Number of city walls owned by `seat`
    pub fn walls_of(&self, seat: Seat) -> u32 {
        self.city_walls.values().filter(|owner| **owner == seat).count() as u32
    }

    /// Port kinds a player can use through their buildings
    pub fn player_ports(&self, seat: Seat) -> Vec<PortKind> {
        self.graph
            .ports
            .iter()
            .filter(|port| {
                port.vertices
                    .iter()
                    .any(|v| self.building(*v).is_some_and(|b| b.owner == seat))
            })
            .map(|port| port.kind)
            .collect()
    }

    /// Owners of buildings on a hex's corners
    pub fn players_on_hex(&self, hex: HexId) -> BTreeSet<Seat> {
        self.graph
            .hex(hex)
            .map(|tile| {
                tile.vertices
                    .iter()
                    .filter_map(|v| self.building(*v).map(|b| b.owner))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Edges owned by a player
    pub fn roads_of(&self, seat: Seat) -> impl Iterator<Item = EdgeId> + '_ {
        self.roads
            .iter()
            .filter(move |(_, owner)| **owner == seat)
            .map(|(e, _)| *e)
    }

    // ==================== Mutations (assume validation already done) ====================

    pub fn place_settlement(&mut self, vertex: VertexId, seat: Seat) {
        self.buildings.insert(
            vertex,
            Building {
                kind: BuildingKind::Settlement,
                owner: seat,
            },
        );
    }

    pub fn upgrade_to_city(&mut self, vertex: VertexId, seat: Seat) {
        self.buildings.insert(
            vertex,
            Building {
                kind: BuildingKind::City,
                owner: seat,
            },
        );
    }

    /// Turn a city back into a settlement; its wall is lost
    pub fn demote_city(&mut self, vertex: VertexId) {
        if let Some(building) = self.buildings.get_mut(&vertex) {
            building.kind = BuildingKind::Settlement;
        }
        self.city_walls.remove(&vertex);
    }

    pub fn place_road(&mut self, edge: EdgeId, seat: Seat) {
        self.roads.insert(edge, seat);
    }

    pub fn move_robber(&mut self, hex: HexId) {
        self.robber = hex;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_robber_starts_on_desert() {
        let board = Board::from_seed(5);
        assert_eq!(board.robber, board.graph.robber_start);
        assert!(board.graph.hex(board.robber).unwrap().number.is_none());
    }

    #[test]
    fn test_players_on_hex() {
        let mut board = Board::from_seed(5);
        let hex = board.graph.hexes[0].clone();
        board.place_settlement(hex.vertices[0], 1);
        board.place_settlement(hex.vertices[3], 2);
        assert_eq!(board.players_on_hex(hex.id), BTreeSet::from([1, 2]));
    }

    #[test]
    fn test_demote_removes_wall() {
        let mut board = Board::from_seed(5);
        let v = VertexId(10);
        board.place_settlement(v, 0);
        board.upgrade_to_city(v, 0);
        board.city_walls.insert(v, 0);
        assert_eq!(board.cities_of(0), vec![v]);
        assert_eq!(board.walls_of(0), 1);

        board.demote_city(v);
        assert_eq!(board.building(v).unwrap().kind, BuildingKind::Settlement);
        assert_eq!(board.walls_of(0), 0);
    }

    #[test]
    fn test_player_ports() {
        let mut board = Board::from_seed(2);
        let port = board.graph.ports[1].clone();
        assert!(board.player_ports(0).is_empty());
        board.place_settlement(port.vertices[1], 0);
        assert_eq!(board.player_ports(0), vec![port.kind]);
        assert!(board.player_ports(1).is_empty());
    }

    #[test]
    fn test_maps_serialize_as_objects() {
        let mut board = Board::from_seed(2);
        board.place_road(EdgeId(7), 3);
        let json = serde_json::to_value(&board).unwrap();
        assert_eq!(json["roads"]["7"], 3);

        let back: Board = serde_json::from_value(json).unwrap();
        assert_eq!(back, board);
    }
}
