//! The central reducer.
//!
//! [`GameState::apply_action`] checks an action's phase, turn and ruleset
//! requirements, then routes it to the rule module that owns it. It mutates `self`
//! freely and reports violations as `Err`; callers run it on a working copy (see
//! [`crate::dispatch`]) so a rejected action never leaves a partial change behind.

use crate::actions::{ActionKind, GameAction, GameEvent};
use crate::distribution::{distribute, starting_resources};
use crate::game::{GameError, GameState, Phase, TurnPhase};
use crate::placement;
use crate::player::{costs, Seat};

/// When an action may be taken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirement {
    /// Turn phases in which the action is accepted
    pub phases: &'static [TurnPhase],
    /// Only the player whose turn it is may act
    pub current_player_only: bool,
    /// Needs the expansion ruleset
    pub expansion: bool,
}

const SETUP_OR_MAIN: &[TurnPhase] = &[TurnPhase::SetupPlacement, TurnPhase::PostRoll];
const MAIN: &[TurnPhase] = &[TurnPhase::PostRoll];

impl Requirement {
    const fn main() -> Self {
        Self {
            phases: MAIN,
            current_player_only: true,
            expansion: false,
        }
    }

    const fn expansion() -> Self {
        Self {
            expansion: true,
            ..Self::main()
        }
    }

    const fn during(phases: &'static [TurnPhase]) -> Self {
        Self {
            phases,
            ..Self::main()
        }
    }
}

/// Requirements for an action kind; `None` for unknown or unreadable actions
pub fn requirement(kind: &ActionKind) -> Option<Requirement> {
    use ActionKind::*;
    let requirement = match kind {
        RollDice { .. } => Requirement::during(&[TurnPhase::PreRoll]),
        PlaceSettlement { .. } | BuildRoad { .. } => Requirement::during(SETUP_OR_MAIN),
        MoveRobber { .. } => Requirement::during(&[TurnPhase::Robber]),
        StealResource { .. } => Requirement::during(&[TurnPhase::Stealing]),
        DiscardResources { .. } => Requirement {
            phases: &[TurnPhase::Discarding],
            current_player_only: false,
            expansion: false,
        },
        PlayKnight { .. } => Requirement::during(&[TurnPhase::PreRoll, TurnPhase::PostRoll]),
        EndTurn
        | BuildCity { .. }
        | BuyDevCard
        | PlayRoadBuilding { .. }
        | PlayYearOfPlenty { .. }
        | PlayMonopoly { .. }
        | TradeBank { .. }
        | TradePlayer { .. } => Requirement::main(),
        CkBuildKnight { .. }
        | CkActivateKnight { .. }
        | CkPromoteKnight { .. }
        | CkMoveKnight { .. }
        | CkDriveAwayRobber { .. }
        | CkImproveCity { .. }
        | CkBuildCityWall { .. }
        | CkTradeCommodity { .. }
        | CkPlayProgressCard { .. } => Requirement::expansion(),
        Unknown(_) | Malformed { .. } => return None,
    };
    Some(requirement)
}

impl GameState {
    /// Resolve the acting seat and check the action's requirements against the
    /// current phase
    pub(crate) fn check_requirements(&self, action: &GameAction) -> Result<Seat, GameError> {
        if self.phase == Phase::Finished {
            return Err(GameError::GameOver);
        }
        let requirement = match &action.kind {
            ActionKind::Unknown(tag) => return Err(GameError::UnknownAction(tag.clone())),
            ActionKind::Malformed { tag, reason } => {
                return Err(GameError::MalformedAction {
                    tag: tag.clone(),
                    reason: reason.clone(),
                })
            }
            kind => requirement(kind).ok_or_else(|| GameError::UnknownAction(kind.tag().to_string()))?,
        };
        let seat = self
            .seat_of(&action.player_id)
            .ok_or_else(|| GameError::UnknownPlayer(action.player_id.clone()))?;

        if requirement.expansion && !self.is_expansion() {
            return Err(GameError::ExpansionDisabled);
        }
        if !requirement.phases.contains(&self.turn_phase) {
            return Err(GameError::InvalidPhase);
        }
        if requirement.current_player_only && seat != self.current_player {
            return Err(GameError::NotYourTurn);
        }
        Ok(seat)
    }

    /// Apply one action in place, returning what happened.
    ///
    /// On `Err` the state may be partially modified and must be discarded.
    pub(crate) fn apply_action(&mut self, action: &GameAction) -> Result<Vec<GameEvent>, GameError> {
        let seat = self.check_requirements(action)?;
        let mut events = Vec::new();

        match &action.kind {
            // ==================== Setup ====================
            ActionKind::PlaceSettlement { vertex } if self.phase == Phase::Setup => {
                if self.setup_anchor.is_some() {
                    return Err(GameError::InvalidPhase);
                }
                if !placement::can_place_settlement(&self.board, seat, *vertex, true) {
                    return Err(GameError::InvalidLocation);
                }
                let second_round = self.setup_index >= self.player_count();
                let player = self.player_mut(seat)?;
                if player.settlements_remaining == 0 {
                    return Err(GameError::NoPiecesRemaining);
                }
                player.settlements_remaining -= 1;
                self.board.place_settlement(*vertex, seat);
                self.setup_anchor = Some(*vertex);
                events.push(GameEvent::SettlementBuilt {
                    seat,
                    vertex: *vertex,
                });

                if second_round {
                    let gained = starting_resources(&self.board, *vertex);
                    self.player_mut(seat)?.resources.add_hand(&gained);
                }
            }

            ActionKind::BuildRoad { edge } if self.phase == Phase::Setup => {
                let anchor = self.setup_anchor.ok_or(GameError::InvalidPhase)?;
                if !placement::can_place_road(&self.board, seat, *edge, Some(anchor)) {
                    return Err(GameError::InvalidLocation);
                }
                let player = self.player_mut(seat)?;
                if player.roads_remaining == 0 {
                    return Err(GameError::NoPiecesRemaining);
                }
                player.roads_remaining -= 1;
                self.board.place_road(*edge, seat);
                self.setup_anchor = None;
                events.push(GameEvent::RoadBuilt { seat, edge: *edge });
                events.extend(self.advance_setup());
            }

            // ==================== Dice ====================
            ActionKind::RollDice { die1, die2 } => {
                if !(1..=6).contains(die1) || !(1..=6).contains(die2) {
                    return Err(GameError::InvalidDice);
                }
                let total = die1 + die2;
                self.last_roll = Some((*die1, *die2));
                events.push(GameEvent::DiceRolled {
                    seat,
                    roll: (*die1, *die2),
                    total,
                });
                events.extend(self.advance_barbarians());

                if total == 7 {
                    self.last_distribution = None;
                    self.pending_discards = self.players_over_limit();
                    if self.pending_discards.is_empty() {
                        self.turn_phase = TurnPhase::Robber;
                    } else {
                        self.turn_phase = TurnPhase::Discarding;
                        events.push(GameEvent::DiscardRequired {
                            seats: self.pending_discards.clone(),
                        });
                    }
                } else {
                    let distribution = distribute(&self.board, total, self.is_expansion());
                    distribution.apply(&mut self.players);
                    if !distribution.is_empty() {
                        events.push(GameEvent::ResourcesDistributed {
                            distribution: distribution.clone(),
                        });
                    }
                    self.last_distribution = Some(distribution);
                    self.turn_phase = TurnPhase::PostRoll;
                }
            }

            // ==================== Robber ====================
            ActionKind::DiscardResources { resources } => {
                events.push(self.discard(seat, resources)?);
                if self.pending_discards.is_empty() {
                    self.turn_phase = TurnPhase::Robber;
                }
            }

            ActionKind::MoveRobber { hex } => {
                events.push(self.relocate_robber(seat, *hex)?);
                self.turn_phase = if self.steal_candidates(seat, *hex).is_empty() {
                    TurnPhase::PostRoll
                } else {
                    TurnPhase::Stealing
                };
            }

            ActionKind::StealResource { victim } => {
                let victim = self
                    .seat_of(victim)
                    .ok_or_else(|| GameError::UnknownPlayer(victim.clone()))?;
                if !self.steal_candidates(seat, self.board.robber).contains(&victim) {
                    return Err(GameError::InvalidVictim);
                }
                events.push(self.steal(seat, victim)?);
                self.turn_phase = TurnPhase::PostRoll;
            }

            // ==================== Building ====================
            ActionKind::PlaceSettlement { vertex } => {
                if !placement::can_place_settlement(&self.board, seat, *vertex, false) {
                    return Err(GameError::InvalidLocation);
                }
                let player = self.player_mut(seat)?;
                if player.settlements_remaining == 0 {
                    return Err(GameError::NoPiecesRemaining);
                }
                if !player.pay(&costs::settlement()) {
                    return Err(GameError::CannotAfford);
                }
                player.settlements_remaining -= 1;
                self.board.place_settlement(*vertex, seat);
                events.push(GameEvent::SettlementBuilt {
                    seat,
                    vertex: *vertex,
                });
                // A new settlement can cut an opponent's road
                events.extend(self.update_longest_road());
            }

            ActionKind::BuildRoad { edge } => {
                if !placement::can_place_road(&self.board, seat, *edge, None) {
                    return Err(GameError::InvalidLocation);
                }
                let player = self.player_mut(seat)?;
                if player.roads_remaining == 0 {
                    return Err(GameError::NoPiecesRemaining);
                }
                if !player.pay(&costs::road()) {
                    return Err(GameError::CannotAfford);
                }
                player.roads_remaining -= 1;
                self.board.place_road(*edge, seat);
                events.push(GameEvent::RoadBuilt { seat, edge: *edge });
                events.extend(self.update_longest_road());
            }

            ActionKind::BuildCity { vertex } => {
                if !placement::can_place_city(&self.board, seat, *vertex) {
                    return Err(GameError::InvalidLocation);
                }
                let player = self.player_mut(seat)?;
                if player.cities_remaining == 0 {
                    return Err(GameError::NoPiecesRemaining);
                }
                if !player.pay(&costs::city()) {
                    return Err(GameError::CannotAfford);
                }
                player.cities_remaining -= 1;
                player.settlements_remaining += 1;
                self.board.upgrade_to_city(*vertex, seat);
                events.push(GameEvent::CityBuilt {
                    seat,
                    vertex: *vertex,
                });
            }

            ActionKind::BuyDevCard => events.push(self.buy_dev_card(seat)?),

            // ==================== Development cards ====================
            ActionKind::PlayKnight { hex, victim } => {
                events.extend(self.play_knight(seat, *hex, victim.as_deref())?);
            }
            ActionKind::PlayRoadBuilding { edges } => {
                events.extend(self.play_road_building(seat, edges)?);
            }
            ActionKind::PlayYearOfPlenty { resources } => {
                events.push(self.play_year_of_plenty(seat, *resources)?);
            }
            ActionKind::PlayMonopoly { resource } => {
                events.push(self.play_monopoly(seat, *resource)?);
            }

            // ==================== Trading ====================
            ActionKind::TradeBank { give, receive } => {
                events.push(self.trade_bank(seat, *give, *receive)?);
            }
            ActionKind::TradePlayer {
                partner,
                offer,
                request,
            } => {
                let partner = self
                    .seat_of(partner)
                    .ok_or_else(|| GameError::UnknownPlayer(partner.clone()))?;
                events.push(self.trade_players(seat, partner, offer, request)?);
            }

            // ==================== Turn ====================
            ActionKind::EndTurn => {
                self.player_mut(seat)?.dev_card_played_this_turn = false;
                for knight in self.board.knights.values_mut() {
                    knight.has_acted = false;
                }
                let next = (self.current_player + 1) % self.player_count() as Seat;
                self.current_player = next;
                self.turn_number += 1;
                self.turn_phase = TurnPhase::PreRoll;
                self.last_roll = None;
                self.last_distribution = None;
                events.push(GameEvent::TurnEnded { seat, next });
            }

            // ==================== Cities & Knights ====================
            ActionKind::CkBuildKnight { vertex } => events.push(self.build_knight(seat, *vertex)?),
            ActionKind::CkActivateKnight { knight } => {
                events.push(self.activate_knight(seat, *knight)?);
            }
            ActionKind::CkPromoteKnight { knight } => {
                events.push(self.promote_knight(seat, *knight)?);
            }
            ActionKind::CkMoveKnight {
                knight,
                to,
                displace_to,
            } => events.extend(self.move_knight(seat, *knight, *to, *displace_to)?),
            ActionKind::CkDriveAwayRobber { knight, hex, victim } => {
                events.extend(self.drive_away_robber(seat, *knight, *hex, victim.as_deref())?);
            }
            ActionKind::CkImproveCity { track } => events.extend(self.improve_city(seat, *track)?),
            ActionKind::CkBuildCityWall { vertex } => {
                events.push(self.build_city_wall(seat, *vertex)?);
            }
            ActionKind::CkTradeCommodity { give, receive } => {
                events.push(self.trade_commodity(seat, *give, *receive)?);
            }
            ActionKind::CkPlayProgressCard { card, target } => {
                events.extend(self.play_progress_card(seat, *card, target)?);
            }

            ActionKind::Unknown(tag) | ActionKind::Malformed { tag, .. } => {
                return Err(GameError::UnknownAction(tag.clone()));
            }
        }

        events.extend(self.check_winner());
        Ok(events)
    }

    /// Move to the next setup step, or into the first regular turn
    fn advance_setup(&mut self) -> Vec<GameEvent> {
        self.setup_index += 1;
        if let Some(next) = self.setup_order.get(self.setup_index) {
            self.current_player = *next;
            return Vec::new();
        }

        self.phase = Phase::Playing;
        self.turn_phase = TurnPhase::PreRoll;
        self.current_player = 0;
        self.turn_number = 1;
        tracing::info!(players = self.player_count(), "setup complete");
        vec![GameEvent::SetupComplete]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameConfig;
    use crate::graph::{EdgeId, Resource, VertexId};
    use crate::player::ResourceHand;
    use pretty_assertions::assert_eq;

    fn act(game: &mut GameState, player: &str, kind: ActionKind) -> Result<Vec<GameEvent>, GameError> {
        game.apply_action(&GameAction::new(player, kind))
    }

    /// Play through setup with the first legal spots, returning each settlement placed
    fn setup(game: &mut GameState) -> Vec<(Seat, VertexId)> {
        let mut placed = Vec::new();
        while game.phase == Phase::Setup {
            let seat = game.current_player;
            let id = game.players[seat as usize].id.clone();
            let vertex = placement::legal_settlements(&game.board, seat, true)[0];
            act(game, &id, ActionKind::PlaceSettlement { vertex }).unwrap();
            let edge = placement::legal_roads(&game.board, seat, Some(vertex))[0];
            act(game, &id, ActionKind::BuildRoad { edge }).unwrap();
            placed.push((seat, vertex));
        }
        placed
    }

    fn game() -> GameState {
        GameState::new(GameConfig::new(&["a", "b", "c"], 1234)).unwrap()
    }

    #[test]
    fn test_setup_snake_order() {
        let mut game = game();
        let placed = setup(&mut game);
        let order: Vec<Seat> = placed.iter().map(|(seat, _)| *seat).collect();
        assert_eq!(order, vec![0, 1, 2, 2, 1, 0]);
        assert_eq!(game.turn_phase, TurnPhase::PreRoll);
        assert_eq!(game.current_player, 0);
        assert_eq!(game.turn_number, 1);
        for player in &game.players {
            assert_eq!(player.settlements_remaining, 3);
            assert_eq!(player.roads_remaining, 13);
        }
    }

    #[test]
    fn test_second_settlement_grants_resources() {
        let mut game = GameState::new(GameConfig::new(&["a", "b"], 99)).unwrap();
        let placed = setup(&mut game);
        // Snake order 0, 1, 1, 0: the second-round settlements are the last two
        let (seat, vertex) = placed[2];
        assert_eq!(seat, 1);
        assert_eq!(game.players[1].resources, starting_resources(&game.board, vertex));
        let (seat, vertex) = placed[3];
        assert_eq!(seat, 0);
        assert_eq!(game.players[0].resources, starting_resources(&game.board, vertex));
    }

    #[test]
    fn test_setup_rejects_second_settlement_before_road() {
        let mut game = game();
        let vertex = placement::legal_settlements(&game.board, 0, true)[0];
        act(&mut game, "a", ActionKind::PlaceSettlement { vertex }).unwrap();
        let other = placement::legal_settlements(&game.board, 0, true)[0];
        assert_eq!(
            act(&mut game, "a", ActionKind::PlaceSettlement { vertex: other }),
            Err(GameError::InvalidPhase)
        );
    }

    #[test]
    fn test_setup_road_must_touch_new_settlement() {
        let mut game = game();
        let vertex = placement::legal_settlements(&game.board, 0, true)[0];
        act(&mut game, "a", ActionKind::PlaceSettlement { vertex }).unwrap();
        let far = game
            .board
            .graph
            .edges
            .iter()
            .find(|e| !e.vertices.contains(&vertex))
            .unwrap()
            .id;
        assert_eq!(
            act(&mut game, "a", ActionKind::BuildRoad { edge: far }),
            Err(GameError::InvalidLocation)
        );
    }

    #[test]
    fn test_roll_requires_turn_and_phase() {
        let mut game = game();
        setup(&mut game);
        let roll = ActionKind::RollDice { die1: 3, die2: 4 };
        assert_eq!(act(&mut game, "b", roll.clone()), Err(GameError::NotYourTurn));
        assert_eq!(
            act(&mut game, "a", ActionKind::RollDice { die1: 0, die2: 4 }),
            Err(GameError::InvalidDice)
        );
        assert_eq!(act(&mut game, "a", ActionKind::EndTurn), Err(GameError::InvalidPhase));
        assert_eq!(
            act(&mut game, "zed", roll),
            Err(GameError::UnknownPlayer("zed".into()))
        );
    }

    #[test]
    fn test_seven_goes_to_robber_or_discard() {
        let mut game = game();
        setup(&mut game);
        act(&mut game, "a", ActionKind::RollDice { die1: 3, die2: 4 }).unwrap();
        assert_eq!(game.turn_phase, TurnPhase::Robber);

        let mut game = self::game();
        setup(&mut game);
        game.players[1].resources = ResourceHand::single(Resource::Ore, 9);
        let events = act(&mut game, "a", ActionKind::RollDice { die1: 5, die2: 2 }).unwrap();
        assert!(events.contains(&GameEvent::DiscardRequired { seats: vec![1] }));
        assert_eq!(game.turn_phase, TurnPhase::Discarding);

        assert_eq!(
            act(&mut game, "b", ActionKind::DiscardResources {
                resources: ResourceHand::single(Resource::Ore, 3)
            }),
            Err(GameError::InvalidDiscard { expected: 4 })
        );
        act(&mut game, "b", ActionKind::DiscardResources {
            resources: ResourceHand::single(Resource::Ore, 4),
        })
        .unwrap();
        assert_eq!(game.turn_phase, TurnPhase::Robber);
        assert_eq!(game.players[1].resources.ore, 5);
    }

    #[test]
    fn test_normal_roll_distributes() {
        let mut game = game();
        setup(&mut game);
        let before: u32 = game.players.iter().map(|p| p.resources.total()).sum();
        act(&mut game, "a", ActionKind::RollDice { die1: 4, die2: 4 }).unwrap();
        assert_eq!(game.turn_phase, TurnPhase::PostRoll);
        let dist = game.last_distribution.clone().unwrap();
        let gained: u32 = dist.gains.values().map(|g| g.resources.total()).sum();
        let after: u32 = game.players.iter().map(|p| p.resources.total()).sum();
        assert_eq!(after, before + gained);
    }

    #[test]
    fn test_end_turn_rotates() {
        let mut game = game();
        setup(&mut game);
        act(&mut game, "a", ActionKind::RollDice { die1: 4, die2: 4 }).unwrap();
        let events = act(&mut game, "a", ActionKind::EndTurn).unwrap();
        assert_eq!(events, vec![GameEvent::TurnEnded { seat: 0, next: 1 }]);
        assert_eq!(game.current_player, 1);
        assert_eq!(game.turn_number, 2);
        assert_eq!(game.turn_phase, TurnPhase::PreRoll);
    }

    #[test]
    fn test_build_road_costs_and_connects() {
        let mut game = game();
        setup(&mut game);
        act(&mut game, "a", ActionKind::RollDice { die1: 4, die2: 4 }).unwrap();
        let edge = placement::legal_roads(&game.board, 0, None)[0];
        game.players[0].resources = ResourceHand::default();
        assert_eq!(
            act(&mut game, "a", ActionKind::BuildRoad { edge }),
            Err(GameError::CannotAfford)
        );
        game.players[0].resources = ResourceHand::with_amounts(1, 1, 0, 0, 0);
        act(&mut game, "a", ActionKind::BuildRoad { edge }).unwrap();
        assert_eq!(game.board.road_owner(edge), Some(0));
        assert!(game.players[0].resources.is_empty());
    }

    #[test]
    fn test_city_returns_settlement_piece() {
        let mut game = game();
        setup(&mut game);
        act(&mut game, "a", ActionKind::RollDice { die1: 4, die2: 4 }).unwrap();
        let vertex = placement::legal_cities(&game.board, 0)[0];
        game.players[0].resources = ResourceHand::with_amounts(0, 0, 0, 2, 3);
        act(&mut game, "a", ActionKind::BuildCity { vertex }).unwrap();
        assert_eq!(game.players[0].settlements_remaining, 4);
        assert_eq!(game.players[0].cities_remaining, 3);
        assert_eq!(game.victory_points(0), 3);
    }

    #[test]
    fn test_expansion_actions_need_ruleset() {
        let mut game = game();
        setup(&mut game);
        act(&mut game, "a", ActionKind::RollDice { die1: 4, die2: 4 }).unwrap();
        assert_eq!(
            act(&mut game, "a", ActionKind::CkBuildKnight { vertex: VertexId(0) }),
            Err(GameError::ExpansionDisabled)
        );
    }

    #[test]
    fn test_finished_game_rejects_everything() {
        let mut game = game();
        game.phase = Phase::Finished;
        assert_eq!(
            act(&mut game, "a", ActionKind::BuildRoad { edge: EdgeId(0) }),
            Err(GameError::GameOver)
        );
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let mut game = game();
        assert_eq!(
            act(&mut game, "a", ActionKind::Unknown("DANCE".into())),
            Err(GameError::UnknownAction("DANCE".into()))
        );
    }

    #[test]
    fn test_requirement_table() {
        let roll = requirement(&ActionKind::RollDice { die1: 1, die2: 1 }).unwrap();
        assert_eq!(roll.phases, &[TurnPhase::PreRoll]);
        assert!(roll.current_player_only);
        let discard = requirement(&ActionKind::DiscardResources {
            resources: ResourceHand::default(),
        })
        .unwrap();
        assert!(!discard.current_player_only);
        assert!(requirement(&ActionKind::CkImproveCity {
            track: crate::expansion::Track::Trade
        })
        .unwrap()
        .expansion);
        assert_eq!(requirement(&ActionKind::Unknown("X".into())), None);
    }
}
