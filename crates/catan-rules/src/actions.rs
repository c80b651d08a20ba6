//! Game actions that players can take.
//!
//! This module defines the action union accepted by the dispatcher and the events
//! that result from applying it. On the wire an action is a flat JSON object:
//!
//! ```json
//! {"type": "BUILD_ROAD", "playerId": "p1", "payload": {"edge": 12}, "timestamp": 0}
//! ```

use crate::distribution::Distribution;
use crate::expansion::barbarians::AttackReport;
use crate::expansion::knights::KnightId;
use crate::expansion::progress::{ProgressCard, ProgressTarget};
use crate::expansion::{Commodity, Metropolis, Track};
use crate::graph::{EdgeId, HexId, Resource, VertexId};
use crate::player::{ResourceHand, Seat};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{IntoStaticStr, VariantNames};

/// Every kind of action, with its typed payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr, VariantNames)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    // ==================== Turn ====================
    /// Dice values are supplied by the caller
    RollDice { die1: u8, die2: u8 },
    EndTurn,

    // ==================== Building ====================
    /// Also used for initial placement during setup
    PlaceSettlement { vertex: VertexId },
    /// Also used for initial placement during setup
    BuildRoad { edge: EdgeId },
    BuildCity { vertex: VertexId },
    BuyDevCard,

    // ==================== Robber ====================
    MoveRobber { hex: HexId },
    StealResource { victim: String },
    DiscardResources { resources: ResourceHand },

    // ==================== Development cards ====================
    PlayKnight {
        hex: HexId,
        #[serde(default)]
        victim: Option<String>,
    },
    PlayRoadBuilding { edges: Vec<EdgeId> },
    PlayYearOfPlenty { resources: [Resource; 2] },
    PlayMonopoly { resource: Resource },

    // ==================== Trading ====================
    TradeBank { give: Resource, receive: Resource },
    TradePlayer {
        partner: String,
        offer: ResourceHand,
        request: ResourceHand,
    },

    // ==================== Cities & Knights ====================
    CkBuildKnight { vertex: VertexId },
    CkActivateKnight { knight: KnightId },
    CkPromoteKnight { knight: KnightId },
    CkMoveKnight {
        knight: KnightId,
        to: VertexId,
        #[serde(default)]
        displace_to: Option<VertexId>,
    },
    CkDriveAwayRobber {
        knight: KnightId,
        hex: HexId,
        #[serde(default)]
        victim: Option<String>,
    },
    CkImproveCity { track: Track },
    CkBuildCityWall { vertex: VertexId },
    CkTradeCommodity { give: Commodity, receive: Resource },
    CkPlayProgressCard {
        card: ProgressCard,
        #[serde(default)]
        target: ProgressTarget,
    },

    /// A type tag this engine does not know
    #[serde(skip)]
    Unknown(String),
    /// A known type tag whose payload could not be read
    #[serde(skip)]
    Malformed { tag: String, reason: String },
}

impl ActionKind {
    /// The wire type tag
    pub fn tag(&self) -> &str {
        match self {
            ActionKind::Unknown(tag) => tag,
            ActionKind::Malformed { tag, .. } => tag,
            other => other.into(),
        }
    }

    /// Whether this action belongs to the expansion
    pub fn is_expansion(&self) -> bool {
        self.tag().starts_with("CK_")
    }

    /// Every known type tag
    pub fn tags() -> impl Iterator<Item = &'static str> {
        ActionKind::VARIANTS
            .iter()
            .copied()
            .filter(|t| *t != "UNKNOWN" && *t != "MALFORMED")
    }
}

/// An action submitted by a player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireAction", into = "WireAction")]
pub struct GameAction {
    pub kind: ActionKind,
    pub player_id: String,
    pub timestamp: u64,
}

impl GameAction {
    pub fn new(player_id: impl Into<String>, kind: ActionKind) -> Self {
        Self {
            kind,
            player_id: player_id.into(),
            timestamp: 0,
        }
    }

    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// The flat JSON shape of an action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAction {
    #[serde(rename = "type")]
    pub kind: String,
    pub player_id: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub timestamp: u64,
}

impl From<WireAction> for GameAction {
    fn from(wire: WireAction) -> Self {
        let known = ActionKind::tags().any(|t| t == wire.kind);
        let kind = if !known {
            ActionKind::Unknown(wire.kind)
        } else {
            let mut tagged = serde_json::Map::new();
            tagged.insert("type".into(), Value::String(wire.kind.clone()));
            let empty = match &wire.payload {
                Value::Null => true,
                Value::Object(map) => map.is_empty(),
                _ => false,
            };
            if !empty {
                tagged.insert("payload".into(), wire.payload);
            }
            serde_json::from_value(Value::Object(tagged)).unwrap_or_else(|err| ActionKind::Malformed {
                tag: wire.kind,
                reason: err.to_string(),
            })
        };
        GameAction {
            kind,
            player_id: wire.player_id,
            timestamp: wire.timestamp,
        }
    }
}

impl From<GameAction> for WireAction {
    fn from(action: GameAction) -> Self {
        let (kind, payload) = match action.kind {
            ActionKind::Unknown(tag) | ActionKind::Malformed { tag, .. } => (tag, Value::Null),
            known => {
                let tag = known.tag().to_string();
                let payload = match serde_json::to_value(&known) {
                    Ok(Value::Object(mut map)) => map.remove("payload").unwrap_or(Value::Null),
                    _ => Value::Null,
                };
                (tag, payload)
            }
        };
        WireAction {
            kind,
            player_id: action.player_id,
            payload,
            timestamp: action.timestamp,
        }
    }
}

/// Events that occur as a result of actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameEvent {
    SetupComplete,
    DiceRolled {
        seat: Seat,
        roll: (u8, u8),
        total: u8,
    },
    ResourcesDistributed {
        distribution: Distribution,
    },
    DiscardRequired {
        seats: Vec<Seat>,
    },
    CardsDiscarded {
        seat: Seat,
        count: u32,
    },
    SettlementBuilt {
        seat: Seat,
        vertex: VertexId,
    },
    CityBuilt {
        seat: Seat,
        vertex: VertexId,
    },
    RoadBuilt {
        seat: Seat,
        edge: EdgeId,
    },
    DevelopmentCardPurchased {
        seat: Seat,
    },
    KnightPlayed {
        seat: Seat,
    },
    RoadBuildingPlayed {
        seat: Seat,
        built: Vec<EdgeId>,
    },
    YearOfPlentyPlayed {
        seat: Seat,
        resources: [Resource; 2],
    },
    MonopolyPlayed {
        seat: Seat,
        resource: Resource,
        total: u32,
    },
    RobberMoved {
        seat: Seat,
        from: HexId,
        to: HexId,
    },
    ResourceStolen {
        thief: Seat,
        victim: Seat,
        resource: Option<Resource>,
    },
    BankTrade {
        seat: Seat,
        give: Resource,
        given: u32,
        receive: Resource,
    },
    PlayerTrade {
        from: Seat,
        to: Seat,
    },
    LongestRoadChanged {
        previous: Option<Seat>,
        current: Option<Seat>,
        length: u32,
    },
    LargestArmyChanged {
        previous: Option<Seat>,
        current: Option<Seat>,
        knights: u32,
    },
    TurnEnded {
        seat: Seat,
        next: Seat,
    },
    GameWon {
        seat: Seat,
        victory_points: u32,
    },

    // ==================== Cities & Knights ====================
    KnightBuilt {
        seat: Seat,
        knight: KnightId,
        vertex: VertexId,
    },
    KnightActivated {
        knight: KnightId,
    },
    KnightPromoted {
        knight: KnightId,
        level: u8,
    },
    KnightMoved {
        knight: KnightId,
        from: VertexId,
        to: VertexId,
    },
    KnightDisplaced {
        knight: KnightId,
        from: VertexId,
        to: VertexId,
    },
    KnightRemoved {
        knight: KnightId,
    },
    CityImproved {
        seat: Seat,
        track: Track,
        level: u8,
    },
    MetropolisChanged {
        track: Track,
        previous: Option<Metropolis>,
        current: Option<Metropolis>,
    },
    CityWallBuilt {
        seat: Seat,
        vertex: VertexId,
    },
    CommodityTraded {
        seat: Seat,
        give: Commodity,
        given: u32,
        receive: Resource,
    },
    BarbariansAdvanced {
        position: u32,
    },
    BarbarianAttack {
        report: AttackReport,
    },
    ProgressCardDrawn {
        seat: Seat,
        track: Track,
    },
    ProgressCardPlayed {
        seat: Seat,
        card: ProgressCard,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let action = GameAction::new("p1", ActionKind::BuildRoad { edge: EdgeId(12) }).with_timestamp(5);
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(
            json,
            json!({"type": "BUILD_ROAD", "playerId": "p1", "payload": {"edge": 12}, "timestamp": 5})
        );
    }

    #[test]
    fn test_parse_camel_case_payload() {
        let action: GameAction = serde_json::from_value(json!({
            "type": "CK_MOVE_KNIGHT",
            "playerId": "p2",
            "payload": {"knight": 3, "to": 17, "displaceTo": 18},
            "timestamp": 1
        }))
        .unwrap();
        assert_eq!(
            action.kind,
            ActionKind::CkMoveKnight {
                knight: KnightId(3),
                to: VertexId(17),
                displace_to: Some(VertexId(18)),
            }
        );
        assert!(action.kind.is_expansion());
    }

    #[test]
    fn test_unit_actions_accept_empty_payload() {
        for payload in [json!({}), json!(null)] {
            let action: GameAction =
                serde_json::from_value(json!({"type": "END_TURN", "playerId": "p1", "payload": payload}))
                    .unwrap();
            assert_eq!(action.kind, ActionKind::EndTurn);
        }
    }

    #[test]
    fn test_unknown_type_is_kept() {
        let action: GameAction =
            serde_json::from_value(json!({"type": "SHUFFLE_BOARD", "playerId": "p1", "payload": {}}))
                .unwrap();
        assert_eq!(action.kind, ActionKind::Unknown("SHUFFLE_BOARD".into()));
        assert_eq!(serde_json::to_value(&action).unwrap()["type"], "SHUFFLE_BOARD");
    }

    #[test]
    fn test_bad_payload_is_malformed() {
        let action: GameAction = serde_json::from_value(
            json!({"type": "BUILD_ROAD", "playerId": "p1", "payload": {"edge": "north"}}),
        )
        .unwrap();
        assert!(matches!(action.kind, ActionKind::Malformed { ref tag, .. } if tag == "BUILD_ROAD"));
    }

    #[test]
    fn test_tags_are_screaming_snake_case() {
        let tags: Vec<&str> = ActionKind::tags().collect();
        assert!(tags.contains(&"ROLL_DICE"));
        assert!(tags.contains(&"CK_PLAY_PROGRESS_CARD"));
        assert!(!tags.contains(&"UNKNOWN"));
        assert_eq!(ActionKind::BuyDevCard.tag(), "BUY_DEV_CARD");
    }
}
