//! Victory points, Longest Road and win detection.

use crate::actions::GameEvent;
use crate::board::Board;
use crate::game::{GameState, Phase};
use crate::graph::{EdgeId, VertexId};
use crate::player::Seat;
use std::collections::HashSet;

/// Minimum road length for Longest Road
pub const MIN_LONGEST_ROAD: u32 = 5;
/// Victory points for each of Longest Road, Largest Army and a metropolis
pub const BONUS_POINTS: u32 = 2;

/// Length in edges of the player's longest simple path.
///
/// Searches from every vertex touching one of the player's roads. A vertex holding an
/// opponent's building can be reached but not passed through.
pub fn longest_road(board: &Board, seat: Seat) -> u32 {
    let starts: HashSet<VertexId> = board
        .roads_of(seat)
        .filter_map(|e| board.graph.edge(e))
        .flat_map(|e| e.vertices)
        .collect();

    let mut visited = HashSet::new();
    starts
        .into_iter()
        .map(|start| dfs_road_length(board, seat, start, &mut visited))
        .max()
        .unwrap_or(0)
}

fn dfs_road_length(board: &Board, seat: Seat, at: VertexId, visited: &mut HashSet<EdgeId>) -> u32 {
    let Some(vertex) = board.graph.vertex(at) else {
        return 0;
    };
    let mut best = 0;
    for edge in &vertex.edges {
        if visited.contains(edge) || board.road_owner(*edge) != Some(seat) {
            continue;
        }
        let Some(next) = board.graph.edge(*edge).map(|e| e.other_end(at)) else {
            continue;
        };
        visited.insert(*edge);
        let onward = if board.is_opponent_building(next, seat) {
            0
        } else {
            dfs_road_length(board, seat, next, visited)
        };
        visited.remove(edge);
        best = best.max(1 + onward);
    }
    best
}

impl GameState {
    /// Total victory points for a player
    pub fn victory_points(&self, seat: Seat) -> u32 {
        let Some(player) = self.player(seat) else {
            return 0;
        };
        let mut vp = player.settlements_placed() + 2 * player.cities_placed();
        vp += player.victory_point_cards();
        if player.has_largest_army {
            vp += BONUS_POINTS;
        }
        if player.has_longest_road {
            vp += BONUS_POINTS;
        }
        vp += player.ck_victory_points;
        if let Some(ck) = &self.ck {
            vp += BONUS_POINTS * ck.metropolis_count(seat);
        }
        vp
    }

    /// Current holder of Longest Road
    pub fn longest_road_holder(&self) -> Option<Seat> {
        self.players
            .iter()
            .position(|p| p.has_longest_road)
            .map(|i| i as Seat)
    }

    /// Re-evaluate Longest Road after anything that adds roads or buildings.
    ///
    /// A challenger must reach [`MIN_LONGEST_ROAD`] and strictly exceed the holder's
    /// current length; a holder who falls below the minimum loses the card. If the best
    /// challengers tie, nobody holds it.
    pub(crate) fn update_longest_road(&mut self) -> Option<GameEvent> {
        let lengths: Vec<u32> = (0..self.players.len() as Seat)
            .map(|seat| longest_road(&self.board, seat))
            .collect();
        let holder = self.longest_road_holder();
        let floor = match holder {
            Some(h) if lengths[h as usize] >= MIN_LONGEST_ROAD => lengths[h as usize],
            _ => MIN_LONGEST_ROAD - 1,
        };

        let best = lengths.iter().copied().max().unwrap_or(0);
        let next = if best > floor {
            let leaders: Vec<usize> = (0..lengths.len()).filter(|i| lengths[*i] == best).collect();
            match leaders[..] {
                [only] => Some(only as Seat),
                _ => None,
            }
        } else if floor >= MIN_LONGEST_ROAD {
            holder
        } else {
            None
        };

        if next == holder {
            return None;
        }
        for (index, player) in self.players.iter_mut().enumerate() {
            player.has_longest_road = Some(index as Seat) == next;
        }
        Some(GameEvent::LongestRoadChanged {
            previous: holder,
            current: next,
            length: next.map(|s| lengths[s as usize]).unwrap_or(best),
        })
    }

    /// Finish the game if anyone has reached the target, checking the current player
    /// first
    pub(crate) fn check_winner(&mut self) -> Option<GameEvent> {
        if self.phase != Phase::Playing {
            return None;
        }
        let count = self.players.len() as Seat;
        let winner = (0..count)
            .map(|offset| (self.current_player + offset) % count)
            .find(|seat| self.victory_points(*seat) >= self.victory_point_target)?;

        self.phase = Phase::Finished;
        self.winner = Some(winner);
        tracing::info!(seat = winner, vp = self.victory_points(winner), "game won");
        Some(GameEvent::GameWon {
            seat: winner,
            victory_points: self.victory_points(winner),
        })
    }
}
