//! Pre-checks for actions and enumeration of legal moves.
//!
//! Validation never disagrees with dispatch: after the cheap requirement check it
//! applies the action to a scratch copy and reports whatever the reducer says.

use crate::actions::{ActionKind, GameAction};
use crate::expansion::progress::ProgressTarget;
use crate::expansion::{Commodity, Track};
use crate::game::{GameState, Phase, TurnPhase};
use crate::graph::{HexId, Resource};
use crate::placement;
use crate::player::{ResourceHand, Seat};
use serde::{Deserialize, Serialize};

/// Outcome of [`validate`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Validation {
    pub fn ok() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
        }
    }
}

/// Check whether `action` would be accepted in `state`.
///
/// Action types the engine does not know pass through as valid; dispatch treats them
/// as no-ops.
pub fn validate(action: &GameAction, state: &GameState) -> Validation {
    if let ActionKind::Unknown(_) = action.kind {
        return Validation::ok();
    }
    if let Err(err) = state.check_requirements(action) {
        return Validation::reject(err.to_string());
    }
    let mut trial = state.clone();
    match trial.apply_action(action) {
        Ok(_) => Validation::ok(),
        Err(err) => Validation::reject(err.to_string()),
    }
}

/// Cards to give up when `count` must go: repeatedly from the largest pile, earlier
/// resources first on ties
pub fn suggested_discard(hand: &ResourceHand, count: u32) -> ResourceHand {
    let mut left = *hand;
    let mut discard = ResourceHand::new();
    for _ in 0..count {
        let Some(most) = Resource::ALL
            .into_iter()
            .rev()
            .filter(|r| left.get(*r) > 0)
            .max_by_key(|r| left.get(*r))
        else {
            break;
        };
        left.set(most, left.get(most) - 1);
        discard.add(most, 1);
    }
    discard
}

impl GameState {
    /// Every action `seat` could legally take right now.
    ///
    /// Candidates are generated per phase and filtered through [`validate`]. Dice are
    /// listed with all 36 outcomes; discards are offered as one suggested split and
    /// player-to-player trades are not enumerated.
    pub fn legal_actions(&self, seat: Seat) -> Vec<GameAction> {
        let Some(player) = self.player(seat) else {
            return Vec::new();
        };
        let candidates = self.candidate_actions(seat);
        candidates
            .into_iter()
            .map(|kind| GameAction::new(player.id.clone(), kind))
            .filter(|action| validate(action, self).valid)
            .collect()
    }

    fn candidate_actions(&self, seat: Seat) -> Vec<ActionKind> {
        let mut candidates = Vec::new();
        if self.phase == Phase::Finished {
            return candidates;
        }
        let Some(player) = self.player(seat) else {
            return candidates;
        };
        let hexes = || self.board.graph.hexes.iter().map(|h| h.id).filter(|h| *h != self.board.robber);

        match self.turn_phase {
            TurnPhase::SetupPlacement => match self.setup_anchor {
                None => candidates.extend(
                    placement::legal_settlements(&self.board, seat, true)
                        .into_iter()
                        .map(|vertex| ActionKind::PlaceSettlement { vertex }),
                ),
                Some(anchor) => candidates.extend(
                    placement::legal_roads(&self.board, seat, Some(anchor))
                        .into_iter()
                        .map(|edge| ActionKind::BuildRoad { edge }),
                ),
            },
            TurnPhase::Discarding => {
                let owed = self.discard_owed(seat);
                if owed > 0 {
                    candidates.push(ActionKind::DiscardResources {
                        resources: suggested_discard(&player.resources, owed),
                    });
                }
            }
            TurnPhase::Robber => candidates.extend(hexes().map(|hex| ActionKind::MoveRobber { hex })),
            TurnPhase::Stealing => {
                let robber = self.board.robber;
                candidates.extend(self.steal_candidates(seat, robber).into_iter().filter_map(|victim| {
                    self.player(victim).map(|p| ActionKind::StealResource { victim: p.id.clone() })
                }));
            }
            TurnPhase::PreRoll => {
                for die1 in 1..=6 {
                    for die2 in 1..=6 {
                        candidates.push(ActionKind::RollDice { die1, die2 });
                    }
                }
                candidates.extend(self.knight_card_candidates(seat));
            }
            TurnPhase::PostRoll => {
                candidates.push(ActionKind::EndTurn);
                self.post_roll_candidates(seat, &mut candidates);
                candidates.extend(self.knight_card_candidates(seat));
                if self.is_expansion() {
                    self.expansion_candidates(seat, &mut candidates);
                }
            }
        }
        candidates
    }

    fn knight_card_candidates(&self, seat: Seat) -> Vec<ActionKind> {
        let has_card = self.player(seat).is_some_and(|p| {
            p.can_play_dev_card(crate::player::DevelopmentCard::Knight, self.turn_number)
        });
        if !has_card {
            return Vec::new();
        }
        self.board
            .graph
            .hexes
            .iter()
            .filter(|h| h.id != self.board.robber)
            .map(|h| ActionKind::PlayKnight {
                hex: h.id,
                victim: self.first_victim(seat, h.id),
            })
            .collect()
    }

    /// Id of the lowest seat that can be robbed on `hex`
    fn first_victim(&self, seat: Seat, hex: HexId) -> Option<String> {
        self.steal_candidates(seat, hex)
            .first()
            .and_then(|s| self.player(*s))
            .map(|p| p.id.clone())
    }

    fn post_roll_candidates(&self, seat: Seat, candidates: &mut Vec<ActionKind>) {
        let roads = placement::legal_roads(&self.board, seat, None);
        candidates.extend(roads.iter().map(|edge| ActionKind::BuildRoad { edge: *edge }));
        candidates.push(ActionKind::PlayRoadBuilding {
            edges: roads.iter().take(2).copied().collect(),
        });
        candidates.extend(
            placement::legal_settlements(&self.board, seat, false)
                .into_iter()
                .map(|vertex| ActionKind::PlaceSettlement { vertex }),
        );
        candidates.extend(
            placement::legal_cities(&self.board, seat)
                .into_iter()
                .map(|vertex| ActionKind::BuildCity { vertex }),
        );
        candidates.push(ActionKind::BuyDevCard);

        for (i, first) in Resource::ALL.into_iter().enumerate() {
            for second in Resource::ALL.into_iter().skip(i) {
                candidates.push(ActionKind::PlayYearOfPlenty {
                    resources: [first, second],
                });
            }
        }
        for resource in Resource::ALL {
            candidates.push(ActionKind::PlayMonopoly { resource });
            for receive in Resource::ALL.into_iter().filter(|r| *r != resource) {
                candidates.push(ActionKind::TradeBank {
                    give: resource,
                    receive,
                });
            }
        }
    }

    fn expansion_candidates(&self, seat: Seat, candidates: &mut Vec<ActionKind>) {
        candidates.extend(
            self.board
                .graph
                .vertices
                .iter()
                .filter(|v| self.can_place_knight(seat, v.id))
                .map(|v| ActionKind::CkBuildKnight { vertex: v.id }),
        );
        for knight in self.knights_of(seat) {
            candidates.push(ActionKind::CkActivateKnight { knight: knight.id });
            candidates.push(ActionKind::CkPromoteKnight { knight: knight.id });
            if let Some(vertex) = self.board.graph.vertex(knight.vertex) {
                for neighbour in &vertex.neighbors {
                    candidates.push(ActionKind::CkMoveKnight {
                        knight: knight.id,
                        to: *neighbour,
                        displace_to: None,
                    });
                }
            }
            for hex in self.board.graph.hexes.iter().filter(|h| h.id != self.board.robber) {
                candidates.push(ActionKind::CkDriveAwayRobber {
                    knight: knight.id,
                    hex: hex.id,
                    victim: self.first_victim(seat, hex.id),
                });
            }
        }
        for track in Track::ALL {
            candidates.push(ActionKind::CkImproveCity { track });
        }
        for vertex in self.board.cities_of(seat) {
            candidates.push(ActionKind::CkBuildCityWall { vertex });
        }
        for give in Commodity::ALL {
            for receive in Resource::ALL {
                candidates.push(ActionKind::CkTradeCommodity { give, receive });
            }
        }
        if let Some(player) = self.player(seat) {
            for card in &player.progress_cards {
                candidates.push(ActionKind::CkPlayProgressCard {
                    card: *card,
                    target: ProgressTarget::default(),
                });
            }
        }
    }
}
