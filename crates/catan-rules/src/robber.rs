//! Robber relocation, forced discards and theft.
//!
//! Moving the robber is a standalone capability. A 7-roll reaches it through the
//! `Discarding -> Robber -> Stealing` phases; the knight card and a knight driving the
//! robber away call the same functions inline without touching `turn_phase`.

use crate::actions::GameEvent;
use crate::game::{GameError, GameState};
use crate::graph::HexId;
use crate::player::{ResourceHand, Seat};
use crate::rng::Mulberry32;
use rand::Rng;

/// Hand size above which a 7 forces a discard
pub const BASE_DISCARD_THRESHOLD: u32 = 7;
/// Extra hand size granted by each city wall
pub const WALL_DISCARD_BONUS: u32 = 2;

/// Cards a player holding `total` must discard, given their threshold
pub fn discard_requirement(total: u32, threshold: u32) -> u32 {
    if total > threshold {
        total / 2
    } else {
        0
    }
}

impl GameState {
    /// Hand size a player may hold through a 7 without discarding
    pub fn discard_threshold(&self, seat: Seat) -> u32 {
        let walls = if self.is_expansion() {
            self.board.walls_of(seat)
        } else {
            0
        };
        BASE_DISCARD_THRESHOLD + WALL_DISCARD_BONUS * walls
    }

    /// Cards `seat` owes right now
    pub fn discard_owed(&self, seat: Seat) -> u32 {
        self.player(seat)
            .map(|p| discard_requirement(p.resources.total(), self.discard_threshold(seat)))
            .unwrap_or(0)
    }

    /// Seats over their threshold, ascending
    pub(crate) fn players_over_limit(&self) -> Vec<Seat> {
        (0..self.players.len() as Seat)
            .filter(|seat| self.discard_owed(*seat) > 0)
            .collect()
    }

    /// Remove exactly the owed number of cards from a pending player
    pub(crate) fn discard(&mut self, seat: Seat, cards: &ResourceHand) -> Result<GameEvent, GameError> {
        if !self.pending_discards.contains(&seat) {
            return Err(GameError::NotYourTurn);
        }
        let expected = self.discard_owed(seat);
        if cards.total() != expected {
            return Err(GameError::InvalidDiscard { expected });
        }
        if !self.player_mut(seat)?.pay(cards) {
            return Err(GameError::InvalidDiscard { expected });
        }
        self.pending_discards.retain(|s| *s != seat);
        Ok(GameEvent::CardsDiscarded {
            seat,
            count: expected,
        })
    }

    /// Move the robber to a different land hex
    pub(crate) fn relocate_robber(&mut self, seat: Seat, hex: HexId) -> Result<GameEvent, GameError> {
        if self.board.graph.hex(hex).is_none() || hex == self.board.robber {
            return Err(GameError::InvalidLocation);
        }
        let from = self.board.robber;
        self.board.move_robber(hex);
        Ok(GameEvent::RobberMoved {
            seat,
            from,
            to: hex,
        })
    }

    /// Opponents with a building on `hex`
    pub fn steal_candidates(&self, seat: Seat, hex: HexId) -> Vec<Seat> {
        self.board
            .players_on_hex(hex)
            .into_iter()
            .filter(|s| *s != seat)
            .collect()
    }

    /// Take one card uniformly at random from the victim.
    ///
    /// The draw is keyed by the game seed and the current log length so a replay picks
    /// the same card. An empty-handed victim loses nothing.
    pub(crate) fn steal(&mut self, thief: Seat, victim: Seat) -> Result<GameEvent, GameError> {
        let cards = self
            .player(victim)
            .ok_or_else(|| GameError::UnknownPlayer(victim.to_string()))?
            .resources
            .cards();

        let stolen = if cards.is_empty() {
            None
        } else {
            let mut rng = Mulberry32::keyed(self.seed, self.action_log.len());
            Some(cards[rng.gen_range(0..cards.len())])
        };

        if let Some(resource) = stolen {
            self.player_mut(victim)?.pay(&ResourceHand::single(resource, 1));
            self.player_mut(thief)?.resources.add(resource, 1);
        }

        Ok(GameEvent::ResourceStolen {
            thief,
            victim,
            resource: stolen,
        })
    }

    /// Resolve an inline victim (knight card, drive-away) against a hex. A victim is
    /// required whenever an opponent has a building there.
    pub(crate) fn steal_inline(
        &mut self,
        thief: Seat,
        hex: HexId,
        victim: Option<&str>,
    ) -> Result<Option<GameEvent>, GameError> {
        let Some(victim_id) = victim else {
            if self.steal_candidates(thief, hex).is_empty() {
                return Ok(None);
            }
            return Err(GameError::InvalidVictim);
        };
        let victim = self
            .seat_of(victim_id)
            .ok_or_else(|| GameError::UnknownPlayer(victim_id.to_string()))?;
        if !self.steal_candidates(thief, hex).contains(&victim) {
            return Err(GameError::InvalidVictim);
        }
        self.steal(thief, victim).map(Some)
    }
}
