//! Expansion flows driven through dispatch: barbarian attacks, metropolises and
//! commodity production.

use catan_rules::expansion::barbarians::{AttackOutcome, Pillaged};
use catan_rules::expansion::knights::{KnightId, KnightState};
use catan_rules::expansion::{Metropolis, Track};
use catan_rules::player::CommodityHand;
use catan_rules::*;
use pretty_assertions::assert_eq;

fn expansion_game(players: &[&str]) -> GameState {
    let mut game = GameState::new(GameConfig::new(players, 31).with_expansion()).unwrap();
    game.phase = Phase::Playing;
    game.turn_phase = TurnPhase::PreRoll;
    game.current_player = 0;
    game.turn_number = 1;
    game
}

fn give_city(game: &mut GameState, seat: Seat, vertex: u16) {
    game.board.place_settlement(VertexId(vertex), seat);
    game.board.upgrade_to_city(VertexId(vertex), seat);
    game.players[seat as usize].cities_remaining -= 1;
}

fn give_knight(game: &mut GameState, seat: Seat, id: u16, vertex: u16, level: u8) {
    game.board.knights.insert(
        KnightId(id),
        KnightState {
            id: KnightId(id),
            owner: seat,
            vertex: VertexId(vertex),
            level,
            active: true,
            has_acted: false,
        },
    );
}

/// Seven cities against four points of knights, one roll before the ship lands
fn siege() -> GameState {
    let mut game = expansion_game(&["a", "b", "c"]);
    for vertex in [0, 10, 20] {
        give_city(&mut game, 0, vertex);
    }
    for vertex in [30, 40] {
        give_city(&mut game, 1, vertex);
    }
    for vertex in [45, 50] {
        give_city(&mut game, 2, vertex);
    }
    give_knight(&mut game, 0, 0, 5, 2);
    give_knight(&mut game, 0, 1, 15, 2);
    let ck = game.ck.as_mut().unwrap();
    ck.barbarian_position = ck.barbarian_threshold - 1;
    game
}

fn roll(game: &GameState) -> GameState {
    dispatch(game, &GameAction::new("a", ActionKind::RollDice { die1: 5, die2: 6 }))
}

#[test]
fn test_failed_defense_pillages_weakest() {
    let after = roll(&siege());
    let ck = after.ck.as_ref().unwrap();
    let report = ck.last_attack.as_ref().unwrap();

    assert_eq!(report.barbarian_strength, 7);
    assert_eq!(report.defense_strength, 4);
    assert_eq!(report.outcome, AttackOutcome::CitiesLost);
    assert_eq!(
        report.pillaged,
        vec![
            Pillaged {
                seat: 1,
                vertex: VertexId(30)
            },
            Pillaged {
                seat: 2,
                vertex: VertexId(45)
            },
        ]
    );
    assert_eq!(ck.barbarian_position, 0);
    assert_eq!(after.board.cities_of(0).len(), 3);
    assert_eq!(after.board.cities_of(1), vec![VertexId(40)]);
    assert_eq!(after.board.building(VertexId(45)).unwrap().kind, BuildingKind::Settlement);
    assert_eq!(after.players[1].cities_remaining, 3);
    assert!(after.board.knights.values().all(|k| !k.active));
    assert_eq!(after.turn_phase, TurnPhase::PostRoll);
}

#[test]
fn test_metropolis_city_is_spared() {
    let mut game = siege();
    game.players[1].improvements.science = 4;
    game.ck.as_mut().unwrap().metropolises.science = Some(Metropolis {
        owner: 1,
        vertex: VertexId(30),
    });

    let after = roll(&game);
    let report = after.ck.as_ref().unwrap().last_attack.clone().unwrap();
    assert!(report.pillaged.contains(&Pillaged {
        seat: 1,
        vertex: VertexId(40)
    }));
    assert_eq!(after.board.cities_of(1), vec![VertexId(30)]);
    assert_eq!(
        after.ck.as_ref().unwrap().metropolises.science,
        Some(Metropolis {
            owner: 1,
            vertex: VertexId(30)
        })
    );
}

#[test]
fn test_successful_defense_rewards_top_knight_owner() {
    let mut game = siege();
    give_knight(&mut game, 1, 2, 35, 3);
    game.players[1].improvements.trade = 2;

    let after = roll(&game);
    let report = after.ck.as_ref().unwrap().last_attack.clone().unwrap();
    assert_eq!(report.defense_strength, 7);
    assert_eq!(report.outcome, AttackOutcome::Defended);
    assert!(report.pillaged.is_empty());
    // Seat 0 has 4 and seat 1 has 3, so only seat 0 is rewarded, from politics
    assert_eq!(report.defenders.len(), 1);
    assert_eq!(report.defenders[0].seat, 0);
    assert_eq!(report.defenders[0].track, Track::Politics);
    assert_eq!(after.players[0].progress_cards.len(), 1);
    assert_eq!(after.players[1].progress_cards.len(), 0);
}

#[test]
fn test_city_improvement_earns_metropolis() {
    let mut game = expansion_game(&["a", "b"]);
    give_city(&mut game, 0, 12);
    game.turn_phase = TurnPhase::PostRoll;
    game.players[0].improvements.science = 3;
    game.players[0].commodities = CommodityHand::with_amounts(4, 0, 0);

    let after = dispatch(
        &game,
        &GameAction::new("a", ActionKind::CkImproveCity { track: Track::Science }),
    );
    assert_eq!(after.players[0].improvements.science, 4);
    assert_eq!(after.players[0].commodities.total(), 0);
    assert_eq!(
        after.ck.as_ref().unwrap().metropolises.science,
        Some(Metropolis {
            owner: 0,
            vertex: VertexId(12)
        })
    );
    assert_eq!(after.victory_points(0), 2 + 2);

    // A fifth level costs five paper
    assert_eq!(
        dispatch(
            &after,
            &GameAction::new("a", ActionKind::CkImproveCity { track: Track::Science }),
        ),
        after
    );
}

#[test]
fn test_city_on_forest_makes_paper() {
    let mut game = expansion_game(&["a", "b"]);
    let forest = game
        .board
        .graph
        .hexes
        .iter()
        .find(|h| h.resource() == Some(Resource::Wood) && h.id != game.board.robber)
        .unwrap()
        .clone();
    let number = forest.number.unwrap();
    give_city(&mut game, 0, forest.vertices[0].0);

    let die1 = (number - 1).min(6);
    let after = dispatch(
        &game,
        &GameAction::new("a", ActionKind::RollDice { die1, die2: number - die1 }),
    );
    let player = &after.players[0];
    assert!(player.commodities.paper >= 1);
    assert_eq!(player.resources.wood, player.commodities.paper);
}

#[test]
fn test_expansion_actions_rejected_in_base_game() {
    let mut game = GameState::new(GameConfig::new(&["a", "b"], 31)).unwrap();
    game.phase = Phase::Playing;
    game.turn_phase = TurnPhase::PostRoll;
    game.turn_number = 1;
    let improve = GameAction::new("a", ActionKind::CkImproveCity { track: Track::Trade });
    assert!(!validate(&improve, &game).valid);
    assert_eq!(dispatch(&game, &improve), game);
}
