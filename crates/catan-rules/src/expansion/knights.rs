//! Knights: building, activation, promotion, movement and chasing the robber.

use crate::actions::GameEvent;
use crate::expansion::{Commodity, Track};
use crate::game::{GameError, GameState};
use crate::graph::{HexId, VertexId};
use crate::player::{costs, Seat};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest knight level
pub const MAX_KNIGHT_LEVEL: u8 = 3;
/// Knights of one level a player may own
pub const MAX_KNIGHTS_PER_LEVEL: usize = 2;

/// Handle of a knight
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KnightId(pub u16);

impl fmt::Display for KnightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "k{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnightState {
    pub id: KnightId,
    pub owner: Seat,
    pub vertex: VertexId,
    /// 1 (basic) to 3 (mighty)
    pub level: u8,
    pub active: bool,
    pub has_acted: bool,
}

impl KnightState {
    /// Strength this knight adds to the defense, if active
    pub fn defense(&self) -> u32 {
        if self.active {
            u32::from(self.level)
        } else {
            0
        }
    }
}

/// Highest level a player may promote to, from their politics level
pub fn level_cap(politics: u8) -> u8 {
    match politics {
        0..=1 => 1,
        2..=3 => 2,
        _ => MAX_KNIGHT_LEVEL,
    }
}

impl GameState {
    /// Knights owned by a player, ascending by id
    pub fn knights_of(&self, seat: Seat) -> impl Iterator<Item = &KnightState> + '_ {
        self.board.knights.values().filter(move |k| k.owner == seat)
    }

    /// Sum of a player's active knight levels
    pub fn knight_defense(&self, seat: Seat) -> u32 {
        self.knights_of(seat).map(KnightState::defense).sum()
    }

    fn knights_at_level(&self, seat: Seat, level: u8) -> usize {
        self.knights_of(seat).filter(|k| k.level == level).count()
    }

    fn own_knight(&self, seat: Seat, id: KnightId) -> Result<KnightState, GameError> {
        match self.board.knights.get(&id) {
            Some(k) if k.owner == seat => Ok(*k),
            _ => Err(GameError::UnknownKnight),
        }
    }

    fn ready_knight(&self, seat: Seat, id: KnightId) -> Result<KnightState, GameError> {
        let knight = self.own_knight(seat, id)?;
        if !knight.active || knight.has_acted {
            return Err(GameError::KnightCannotAct);
        }
        Ok(knight)
    }

    /// Empty vertex (no building, no knight) touching one of the player's roads
    pub fn can_place_knight(&self, seat: Seat, vertex: VertexId) -> bool {
        self.board.graph.vertex(vertex).is_some()
            && self.board.building(vertex).is_none()
            && self.board.knight_at(vertex).is_none()
            && self.board.vertex_touches_road(vertex, seat)
    }

    pub(crate) fn build_knight(&mut self, seat: Seat, vertex: VertexId) -> Result<GameEvent, GameError> {
        if !self.can_place_knight(seat, vertex) {
            return Err(GameError::InvalidLocation);
        }
        if self.knights_at_level(seat, 1) >= MAX_KNIGHTS_PER_LEVEL {
            return Err(GameError::KnightLimit);
        }
        // Ids already on the board are skipped
        let start = self.ck_mut()?.next_knight_id;
        let id = (start..u16::MAX)
            .map(KnightId)
            .find(|id| !self.board.knights.contains_key(id))
            .ok_or(GameError::KnightLimit)?;
        if !self.player_mut(seat)?.pay(&costs::knight()) {
            return Err(GameError::CannotAfford);
        }

        self.ck_mut()?.next_knight_id = id.0 + 1;
        self.board.knights.insert(
            id,
            KnightState {
                id,
                owner: seat,
                vertex,
                level: 1,
                active: false,
                has_acted: false,
            },
        );
        Ok(GameEvent::KnightBuilt {
            seat,
            knight: id,
            vertex,
        })
    }

    pub(crate) fn activate_knight(&mut self, seat: Seat, id: KnightId) -> Result<GameEvent, GameError> {
        if self.own_knight(seat, id)?.active {
            return Err(GameError::KnightCannotAct);
        }
        if !self.player_mut(seat)?.pay(&costs::knight_activation()) {
            return Err(GameError::CannotAfford);
        }
        if let Some(knight) = self.board.knights.get_mut(&id) {
            knight.active = true;
        }
        Ok(GameEvent::KnightActivated { knight: id })
    }

    pub(crate) fn promote_knight(&mut self, seat: Seat, id: KnightId) -> Result<GameEvent, GameError> {
        let knight = self.own_knight(seat, id)?;
        let politics = self
            .player(seat)
            .map(|p| p.improvements.at(Track::Politics))
            .unwrap_or(0);
        let level = knight.level + 1;
        if level > level_cap(politics) {
            return Err(GameError::KnightLimit);
        }
        if self.knights_at_level(seat, level) >= MAX_KNIGHTS_PER_LEVEL {
            return Err(GameError::KnightLimit);
        }
        if !self.player_mut(seat)?.commodities.try_remove(Commodity::Coin, 1) {
            return Err(GameError::CannotAfford);
        }
        if let Some(knight) = self.board.knights.get_mut(&id) {
            knight.level = level;
        }
        Ok(GameEvent::KnightPromoted { knight: id, level })
    }

    /// Where a displaced knight may retreat: open vertices next to `at` along its
    /// owner's roads, ascending. `vacated` is treated as empty.
    pub fn displacement_targets(&self, displaced: &KnightState, at: VertexId, vacated: VertexId) -> Vec<VertexId> {
        let Some(vertex) = self.board.graph.vertex(at) else {
            return Vec::new();
        };
        vertex
            .edges
            .iter()
            .filter(|e| self.board.road_owner(**e) == Some(displaced.owner))
            .filter_map(|e| self.board.graph.edge(*e).map(|edge| edge.other_end(at)))
            .filter(|v| {
                self.board.building(*v).is_none()
                    && (*v == vacated || self.board.knight_at(*v).is_none())
            })
            .collect()
    }

    /// Move along one of the player's roads, possibly displacing a weaker active
    /// opposing knight
    pub(crate) fn move_knight(
        &mut self,
        seat: Seat,
        id: KnightId,
        to: VertexId,
        displace_to: Option<VertexId>,
    ) -> Result<Vec<GameEvent>, GameError> {
        let knight = self.ready_knight(seat, id)?;
        let from = knight.vertex;
        let road = self
            .board
            .graph
            .edge_between(from, to)
            .ok_or(GameError::InvalidLocation)?;
        if self.board.road_owner(road) != Some(seat) || self.board.building(to).is_some() {
            return Err(GameError::InvalidLocation);
        }

        let mut events = Vec::new();
        if let Some(occupant) = self.board.knight_at(to).copied() {
            if occupant.owner == seat || !occupant.active || occupant.level >= knight.level {
                return Err(GameError::InvalidLocation);
            }
            let mut targets = self.displacement_targets(&occupant, to, from);
            targets.sort();
            let target = match displace_to {
                Some(v) if targets.contains(&v) => v,
                Some(_) => return Err(GameError::InvalidLocation),
                None => *targets.first().ok_or(GameError::InvalidLocation)?,
            };
            if let Some(moved) = self.board.knights.get_mut(&occupant.id) {
                moved.vertex = target;
            }
            events.push(GameEvent::KnightDisplaced {
                knight: occupant.id,
                from: to,
                to: target,
            });
        }

        if let Some(moving) = self.board.knights.get_mut(&id) {
            moving.vertex = to;
            moving.has_acted = true;
        }
        events.insert(0, GameEvent::KnightMoved { knight: id, from, to });
        Ok(events)
    }

    /// Chase the robber from a hex the knight stands next to
    pub(crate) fn drive_away_robber(
        &mut self,
        seat: Seat,
        id: KnightId,
        hex: HexId,
        victim: Option<&str>,
    ) -> Result<Vec<GameEvent>, GameError> {
        let knight = self.ready_knight(seat, id)?;
        let robber = self.board.robber;
        let adjacent = self
            .board
            .graph
            .vertex(knight.vertex)
            .is_some_and(|v| v.hexes.contains(&robber));
        if !adjacent {
            return Err(GameError::InvalidLocation);
        }

        let mut events = vec![self.relocate_robber(seat, hex)?];
        events.extend(self.steal_inline(seat, hex, victim)?);
        if let Some(k) = self.board.knights.get_mut(&id) {
            k.has_acted = true;
        }
        Ok(events)
    }
}
