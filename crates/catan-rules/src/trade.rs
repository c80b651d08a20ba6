//! Bank, port, player-to-player and commodity trading.

use crate::actions::GameEvent;
use crate::expansion::{Commodity, Track};
use crate::game::{GameError, GameState};
use crate::graph::{PortKind, Resource};
use crate::player::{ResourceHand, Seat};

/// Bank exchange rate without any port
pub const BANK_RATIO: u32 = 4;
/// Commodity exchange rate before the trade track reaches [`TRADING_HOUSE_LEVEL`]
pub const COMMODITY_RATIO: u32 = 4;
/// Commodity exchange rate from [`TRADING_HOUSE_LEVEL`] onwards
pub const TRADING_HOUSE_RATIO: u32 = 2;
pub const TRADING_HOUSE_LEVEL: u8 = 3;

/// Best rate for a resource given the ports a player can use
pub fn port_ratio(ports: &[PortKind], resource: Resource) -> u32 {
    if ports.contains(&PortKind::Specific(resource)) {
        2
    } else if ports.contains(&PortKind::Any) {
        3
    } else {
        BANK_RATIO
    }
}

impl GameState {
    /// How many of `resource` the player gives the bank for one card
    pub fn bank_ratio(&self, seat: Seat, resource: Resource) -> u32 {
        port_ratio(&self.board.player_ports(seat), resource)
    }

    /// How many of a commodity the player gives for one resource
    pub fn commodity_ratio(&self, seat: Seat) -> u32 {
        let level = self
            .player(seat)
            .map(|p| p.improvements.at(Track::Trade))
            .unwrap_or(0);
        if level >= TRADING_HOUSE_LEVEL {
            TRADING_HOUSE_RATIO
        } else {
            COMMODITY_RATIO
        }
    }

    pub(crate) fn trade_bank(
        &mut self,
        seat: Seat,
        give: Resource,
        receive: Resource,
    ) -> Result<GameEvent, GameError> {
        if give == receive {
            return Err(GameError::InvalidTrade);
        }
        let ratio = self.bank_ratio(seat, give);
        let player = self.player_mut(seat)?;
        if !player.pay(&ResourceHand::single(give, ratio)) {
            return Err(GameError::CannotAfford);
        }
        player.resources.add(receive, 1);
        Ok(GameEvent::BankTrade {
            seat,
            give,
            given: ratio,
            receive,
        })
    }

    /// Exchange `offer` (from `seat`) for `request` (from `partner`); all or nothing
    pub(crate) fn trade_players(
        &mut self,
        seat: Seat,
        partner: Seat,
        offer: &ResourceHand,
        request: &ResourceHand,
    ) -> Result<GameEvent, GameError> {
        if partner == seat || (offer.is_empty() && request.is_empty()) {
            return Err(GameError::InvalidTrade);
        }
        let partner_hand = self
            .player(partner)
            .ok_or_else(|| GameError::UnknownPlayer(partner.to_string()))?
            .resources;
        if !partner_hand.can_afford(request) {
            return Err(GameError::CannotAfford);
        }
        if !self.player_mut(seat)?.pay(offer) {
            return Err(GameError::CannotAfford);
        }
        self.player_mut(partner)?.pay(request);
        self.player_mut(partner)?.resources.add_hand(offer);
        self.player_mut(seat)?.resources.add_hand(request);
        Ok(GameEvent::PlayerTrade {
            from: seat,
            to: partner,
        })
    }

    pub(crate) fn trade_commodity(
        &mut self,
        seat: Seat,
        give: Commodity,
        receive: Resource,
    ) -> Result<GameEvent, GameError> {
        let ratio = self.commodity_ratio(seat);
        let player = self.player_mut(seat)?;
        if !player.commodities.try_remove(give, ratio) {
            return Err(GameError::CannotAfford);
        }
        player.resources.add(receive, 1);
        Ok(GameEvent::CommodityTraded {
            seat,
            give,
            given: ratio,
            receive,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameConfig;
    use crate::player::CommodityHand;
    use pretty_assertions::assert_eq;

    fn game() -> GameState {
        GameState::new(GameConfig::new(&["a", "b"], 4)).unwrap()
    }

    #[test]
    fn test_port_ratio() {
        assert_eq!(port_ratio(&[], Resource::Ore), 4);
        assert_eq!(port_ratio(&[PortKind::Any], Resource::Ore), 3);
        assert_eq!(
            port_ratio(&[PortKind::Any, PortKind::Specific(Resource::Ore)], Resource::Ore),
            2
        );
        assert_eq!(port_ratio(&[PortKind::Specific(Resource::Wood)], Resource::Ore), 4);
    }

    #[test]
    fn test_bank_ratio_uses_ports() {
        let mut game = game();
        let port = game
            .board
            .graph
            .ports
            .iter()
            .find(|p| p.kind == PortKind::Specific(Resource::Wheat))
            .cloned()
            .unwrap();
        assert_eq!(game.bank_ratio(0, Resource::Wheat), 4);
        game.board.place_settlement(port.vertices[0], 0);
        assert_eq!(game.bank_ratio(0, Resource::Wheat), 2);
        assert_eq!(game.bank_ratio(0, Resource::Wood), 4);
        assert_eq!(game.bank_ratio(1, Resource::Wheat), 4);
    }

    #[test]
    fn test_bank_trade_four_to_one() {
        let mut game = game();
        game.players[0].resources = ResourceHand::single(Resource::Wood, 4);
        game.trade_bank(0, Resource::Wood, Resource::Ore).unwrap();
        assert_eq!(game.players[0].resources, ResourceHand::single(Resource::Ore, 1));

        game.players[0].resources = ResourceHand::single(Resource::Wood, 3);
        assert_eq!(
            game.trade_bank(0, Resource::Wood, Resource::Ore),
            Err(GameError::CannotAfford)
        );
        assert_eq!(game.players[0].resources, ResourceHand::single(Resource::Wood, 3));
    }

    #[test]
    fn test_bank_trade_same_resource_rejected() {
        let mut game = game();
        game.players[0].resources = ResourceHand::single(Resource::Wood, 8);
        assert_eq!(
            game.trade_bank(0, Resource::Wood, Resource::Wood),
            Err(GameError::InvalidTrade)
        );
    }

    #[test]
    fn test_player_trade_is_atomic() {
        let mut game = game();
        game.players[0].resources = ResourceHand::single(Resource::Brick, 2);
        game.players[1].resources = ResourceHand::single(Resource::Sheep, 1);

        let offer = ResourceHand::single(Resource::Brick, 2);
        let greedy = ResourceHand::single(Resource::Sheep, 2);
        let before = game.players.clone();
        assert_eq!(game.trade_players(0, 1, &offer, &greedy), Err(GameError::CannotAfford));
        assert_eq!(game.players, before);

        let fair = ResourceHand::single(Resource::Sheep, 1);
        game.trade_players(0, 1, &offer, &fair).unwrap();
        assert_eq!(game.players[0].resources, fair);
        assert_eq!(game.players[1].resources, offer);
    }

    #[test]
    fn test_commodity_trade_rates() {
        let mut game = GameState::new(GameConfig::new(&["a", "b"], 4).with_expansion()).unwrap();
        game.players[0].commodities = CommodityHand::with_amounts(0, 5, 0);
        game.trade_commodity(0, Commodity::Cloth, Resource::Ore).unwrap();
        assert_eq!(game.players[0].commodities.cloth, 1);

        game.players[0].improvements.trade = 3;
        game.players[0].commodities.cloth = 2;
        game.trade_commodity(0, Commodity::Cloth, Resource::Wheat).unwrap();
        assert_eq!(game.players[0].commodities.cloth, 0);
        assert_eq!(game.players[0].resources, ResourceHand::with_amounts(0, 0, 0, 1, 1));
    }
}
