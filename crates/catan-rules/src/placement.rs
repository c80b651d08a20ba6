//! Placement legality.
//!
//! Pure predicates over a [`Board`]; nothing here mutates state. The reducer calls the
//! `can_place_*` checks for every build, and the `legal_*` enumerations feed the bot
//! and [`GameState::legal_actions`](crate::game::GameState::legal_actions).

use crate::board::{Board, BuildingKind};
use crate::graph::{EdgeId, VertexId};
use crate::player::Seat;

/// Settlement: empty vertex, no neighbouring building, no knight on it, and touching
/// one of the player's roads outside setup
pub fn can_place_settlement(board: &Board, seat: Seat, vertex: VertexId, setup: bool) -> bool {
    let Some(v) = board.graph.vertex(vertex) else {
        return false;
    };
    if board.building(vertex).is_some() || board.knight_at(vertex).is_some() {
        return false;
    }
    if v.neighbors.iter().any(|n| board.building(*n).is_some()) {
        return false;
    }
    setup || board.vertex_touches_road(vertex, seat)
}

/// Road: empty edge that touches `anchor` when one is given (setup), otherwise one
/// that extends the player's network without passing through an opponent's building
pub fn can_place_road(board: &Board, seat: Seat, edge: EdgeId, anchor: Option<VertexId>) -> bool {
    let Some(e) = board.graph.edge(edge) else {
        return false;
    };
    if board.road_owner(edge).is_some() {
        return false;
    }
    if let Some(anchor) = anchor {
        return e.vertices.contains(&anchor);
    }

    e.vertices.iter().any(|endpoint| match board.building(*endpoint) {
        Some(b) if b.owner == seat => true,
        Some(_) => false,
        None => board.graph.vertex(*endpoint).is_some_and(|v| {
            v.edges
                .iter()
                .any(|other| *other != edge && board.road_owner(*other) == Some(seat))
        }),
    })
}

/// City: the player's own settlement
pub fn can_place_city(board: &Board, seat: Seat, vertex: VertexId) -> bool {
    board
        .building(vertex)
        .is_some_and(|b| b.owner == seat && b.kind == BuildingKind::Settlement)
}

/// Every vertex where `seat` may place a settlement
pub fn legal_settlements(board: &Board, seat: Seat, setup: bool) -> Vec<VertexId> {
    board
        .graph
        .vertices
        .iter()
        .map(|v| v.id)
        .filter(|v| can_place_settlement(board, seat, *v, setup))
        .collect()
}

/// Every edge where `seat` may place a road
pub fn legal_roads(board: &Board, seat: Seat, anchor: Option<VertexId>) -> Vec<EdgeId> {
    board
        .graph
        .edges
        .iter()
        .map(|e| e.id)
        .filter(|e| can_place_road(board, seat, *e, anchor))
        .collect()
}

/// Every settlement `seat` may upgrade
pub fn legal_cities(board: &Board, seat: Seat) -> Vec<VertexId> {
    board
        .buildings
        .keys()
        .copied()
        .filter(|v| can_place_city(board, seat, *v))
        .collect()
}
