//! Node types, categories, and their typed configuration payloads.
//!
//! On the wire a node's `data` is a free-form JSON object. In memory it is a
//! [`NodeData`] variant chosen by the node's `type`, so every place that
//! cares about a particular kind of node matches on it exhaustively. Keys a
//! config struct does not know about are kept in its `extra` map and written
//! back unchanged.

use crate::error::GraphError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// ─── Taxonomy ────────────────────────────────────────────────────────────

/// The closed set of block types the editor can create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Risk,
    Price,
    Percentage,
    TimeInterval,
    SentimentTrigger,
    LogicGate,
    IfGate,
    Tracking,
    Nexus,
    SendEmail,
    Webhook,
    EmailInfo,
    RhInfo,
}

/// Category of a block; connection rules are expressed per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Conditional,
    Logic,
    Action,
    Info,
}

impl NodeType {
    pub const ALL: [NodeType; 13] = [
        NodeType::Risk,
        NodeType::Price,
        NodeType::Percentage,
        NodeType::TimeInterval,
        NodeType::SentimentTrigger,
        NodeType::LogicGate,
        NodeType::IfGate,
        NodeType::Tracking,
        NodeType::Nexus,
        NodeType::SendEmail,
        NodeType::Webhook,
        NodeType::EmailInfo,
        NodeType::RhInfo,
    ];

    pub fn category(self) -> Category {
        match self {
            Self::Risk
            | Self::Price
            | Self::Percentage
            | Self::TimeInterval
            | Self::SentimentTrigger => Category::Conditional,
            Self::LogicGate | Self::IfGate => Category::Logic,
            Self::Tracking | Self::Nexus | Self::SendEmail | Self::Webhook => Category::Action,
            Self::EmailInfo | Self::RhInfo => Category::Info,
        }
    }

    /// Wire name, e.g. `time_interval`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Risk => "risk",
            Self::Price => "price",
            Self::Percentage => "percentage",
            Self::TimeInterval => "time_interval",
            Self::SentimentTrigger => "sentiment_trigger",
            Self::LogicGate => "logic_gate",
            Self::IfGate => "if_gate",
            Self::Tracking => "tracking",
            Self::Nexus => "nexus",
            Self::SendEmail => "send_email",
            Self::Webhook => "webhook",
            Self::EmailInfo => "email_info",
            Self::RhInfo => "rh_info",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    /// Parse a type name, rejecting anything outside the taxonomy.
    pub fn parse(name: &str) -> Result<Self, GraphError> {
        Self::from_name(name).ok_or_else(|| GraphError::UnknownNodeType(name.to_string()))
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Conditional => "Conditional",
            Self::Logic => "Logic",
            Self::Action => "Action",
            Self::Info => "Info",
        })
    }
}

// ─── Config payloads ─────────────────────────────────────────────────────

/// `{metric, op, value}`: fires when a portfolio risk metric crosses a threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RiskConfig {
    pub metric: String,
    pub op: String,
    pub value: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            metric: "volatility".to_string(),
            op: ">".to_string(),
            value: Value::Null,
            extra: Map::new(),
        }
    }
}

/// `{ticker, op, value}`, shared by `price`, `percentage`, and `sentiment_trigger`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThresholdConfig {
    pub ticker: String,
    pub op: String,
    pub value: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            ticker: String::new(),
            op: ">".to_string(),
            value: Value::Null,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimeIntervalConfig {
    pub interval: Value,
    pub unit: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for TimeIntervalConfig {
    fn default() -> Self {
        Self {
            interval: Value::from(1),
            unit: "hours".to_string(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LogicGateConfig {
    /// `AND`, `OR`, or `NOT`; interpreted by the execution engine.
    pub operator: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for LogicGateConfig {
    fn default() -> Self {
        Self {
            operator: "AND".to_string(),
            extra: Map::new(),
        }
    }
}

/// One row of an `if_gate`. Row `N` owns handles `in-N` and `out-N`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IfCondition {
    /// Hosts write either a string or a millisecond timestamp here.
    pub id: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IfCondition {
    pub fn new(id: impl Into<Value>) -> Self {
        Self {
            id: id.into(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IfGateConfig {
    pub conditions: Vec<IfCondition>,
    pub else_output_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for IfGateConfig {
    fn default() -> Self {
        Self {
            conditions: vec![IfCondition::new("cond-0")],
            else_output_id: "else".to_string(),
            extra: Map::new(),
        }
    }
}

impl IfGateConfig {
    /// Append a condition row; `out-else` moves down by one row.
    pub fn push_condition(&mut self) -> &IfCondition {
        let id = format!("cond-{}", self.conditions.len());
        self.conditions.push(IfCondition::new(id));
        &self.conditions[self.conditions.len() - 1]
    }
}

/// `{code, value}` for a position tracking action.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrackingConfig {
    pub code: String,
    pub value: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NexusConfig {
    pub message: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SendEmailConfig {
    pub to: String,
    pub subject: String,
    pub body: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WebhookConfig {
    pub url: String,
    pub method: String,
    pub payload: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            method: "POST".to_string(),
            payload: Value::Null,
            extra: Map::new(),
        }
    }
}

/// Credentials for an outgoing mail account.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmailInfoConfig {
    pub email: String,
    pub password: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Brokerage account credentials.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RhInfoConfig {
    pub username: String,
    pub password: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ─── NodeData ────────────────────────────────────────────────────────────

/// Typed `data` bag of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Risk(RiskConfig),
    Price(ThresholdConfig),
    Percentage(ThresholdConfig),
    TimeInterval(TimeIntervalConfig),
    SentimentTrigger(ThresholdConfig),
    LogicGate(LogicGateConfig),
    IfGate(IfGateConfig),
    Tracking(TrackingConfig),
    Nexus(NexusConfig),
    SendEmail(SendEmailConfig),
    Webhook(WebhookConfig),
    EmailInfo(EmailInfoConfig),
    RhInfo(RhInfoConfig),
    /// A known type whose payload does not fit its config, kept verbatim.
    Raw { node_type: NodeType, data: Value },
    /// A type this build does not recognize, preserved verbatim.
    Unknown { type_name: String, data: Value },
}

impl NodeData {
    /// Default payload for a freshly created block of `node_type`.
    pub fn default_for(node_type: NodeType) -> Self {
        match node_type {
            NodeType::Risk => Self::Risk(RiskConfig::default()),
            NodeType::Price => Self::Price(ThresholdConfig::default()),
            NodeType::Percentage => Self::Percentage(ThresholdConfig::default()),
            NodeType::TimeInterval => Self::TimeInterval(TimeIntervalConfig::default()),
            NodeType::SentimentTrigger => Self::SentimentTrigger(ThresholdConfig::default()),
            NodeType::LogicGate => Self::LogicGate(LogicGateConfig::default()),
            NodeType::IfGate => Self::IfGate(IfGateConfig::default()),
            NodeType::Tracking => Self::Tracking(TrackingConfig::default()),
            NodeType::Nexus => Self::Nexus(NexusConfig::default()),
            NodeType::SendEmail => Self::SendEmail(SendEmailConfig::default()),
            NodeType::Webhook => Self::Webhook(WebhookConfig::default()),
            NodeType::EmailInfo => Self::EmailInfo(EmailInfoConfig::default()),
            NodeType::RhInfo => Self::RhInfo(RhInfoConfig::default()),
        }
    }

    /// `None` for opaque, unrecognized types.
    pub fn node_type(&self) -> Option<NodeType> {
        Some(match self {
            Self::Risk(_) => NodeType::Risk,
            Self::Price(_) => NodeType::Price,
            Self::Percentage(_) => NodeType::Percentage,
            Self::TimeInterval(_) => NodeType::TimeInterval,
            Self::SentimentTrigger(_) => NodeType::SentimentTrigger,
            Self::LogicGate(_) => NodeType::LogicGate,
            Self::IfGate(_) => NodeType::IfGate,
            Self::Tracking(_) => NodeType::Tracking,
            Self::Nexus(_) => NodeType::Nexus,
            Self::SendEmail(_) => NodeType::SendEmail,
            Self::Webhook(_) => NodeType::Webhook,
            Self::EmailInfo(_) => NodeType::EmailInfo,
            Self::RhInfo(_) => NodeType::RhInfo,
            Self::Raw { node_type, .. } => *node_type,
            Self::Unknown { .. } => return None,
        })
    }

    pub fn category(&self) -> Option<Category> {
        self.node_type().map(NodeType::category)
    }

    /// The wire `type` string.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Unknown { type_name, .. } => type_name,
            known => known.node_type().map(NodeType::as_str).unwrap_or_default(),
        }
    }

    /// Number of condition rows, for nodes with dynamic handles.
    ///
    /// An `if_gate` whose `conditions` is not a list has no rows.
    pub fn condition_count(&self) -> Option<usize> {
        match self {
            Self::IfGate(cfg) => Some(cfg.conditions.len()),
            Self::Raw {
                node_type: NodeType::IfGate,
                data,
            } => Some(
                data.get("conditions")
                    .and_then(Value::as_array)
                    .map_or(0, Vec::len),
            ),
            _ => None,
        }
    }

    /// Whether the payload is held verbatim instead of as a typed config.
    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw { .. } | Self::Unknown { .. })
    }

    /// Decode the wire `(type, data)` pair. Never fails.
    ///
    /// Unrecognized types become [`NodeData::Unknown`]. A recognized type
    /// whose payload does not fit its config becomes [`NodeData::Raw`].
    pub fn from_wire(type_name: &str, data: Value) -> Self {
        let Some(node_type) = NodeType::from_name(type_name) else {
            return Self::Unknown {
                type_name: type_name.to_string(),
                data,
            };
        };
        // Older rows may carry `null` instead of an empty object.
        let data = if data.is_null() {
            Value::Object(Map::new())
        } else {
            data
        };
        match Self::decode_typed(node_type, data.clone()) {
            Ok(typed) => typed,
            Err(e) => {
                log::warn!("{type_name} payload kept verbatim: {e}");
                Self::Raw { node_type, data }
            }
        }
    }

    fn decode_typed(node_type: NodeType, data: Value) -> Result<Self, serde_json::Error> {
        Ok(match node_type {
            NodeType::Risk => Self::Risk(serde_json::from_value(data)?),
            NodeType::Price => Self::Price(serde_json::from_value(data)?),
            NodeType::Percentage => Self::Percentage(serde_json::from_value(data)?),
            NodeType::TimeInterval => Self::TimeInterval(serde_json::from_value(data)?),
            NodeType::SentimentTrigger => Self::SentimentTrigger(serde_json::from_value(data)?),
            NodeType::LogicGate => Self::LogicGate(serde_json::from_value(data)?),
            NodeType::IfGate => Self::IfGate(serde_json::from_value(data)?),
            NodeType::Tracking => Self::Tracking(serde_json::from_value(data)?),
            NodeType::Nexus => Self::Nexus(serde_json::from_value(data)?),
            NodeType::SendEmail => Self::SendEmail(serde_json::from_value(data)?),
            NodeType::Webhook => Self::Webhook(serde_json::from_value(data)?),
            NodeType::EmailInfo => Self::EmailInfo(serde_json::from_value(data)?),
            NodeType::RhInfo => Self::RhInfo(serde_json::from_value(data)?),
        })
    }

    /// Encode the payload as the wire `data` object.
    pub fn to_wire(&self) -> Value {
        match self {
            Self::Risk(c) => encode(c),
            Self::Price(c) | Self::Percentage(c) | Self::SentimentTrigger(c) => encode(c),
            Self::TimeInterval(c) => encode(c),
            Self::LogicGate(c) => encode(c),
            Self::IfGate(c) => encode(c),
            Self::Tracking(c) => encode(c),
            Self::Nexus(c) => encode(c),
            Self::SendEmail(c) => encode(c),
            Self::Webhook(c) => encode(c),
            Self::EmailInfo(c) => encode(c),
            Self::RhInfo(c) => encode(c),
            Self::Raw { data, .. } | Self::Unknown { data, .. } => data.clone(),
        }
    }

    /// Shallow merge: each top-level key of `partial` replaces the same key
    /// of the current payload. The merged object is always kept; it is
    /// re-typed when it fits the config and held verbatim otherwise.
    pub fn merge(&mut self, partial: &Map<String, Value>) {
        let mut current = match self.to_wire() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in partial {
            current.insert(key.clone(), value.clone());
        }
        let type_name = self.type_name().to_string();
        *self = Self::from_wire(&type_name, Value::Object(current));
    }
}

/// Config structs hold only strings, maps and JSON values, so encoding
/// cannot fail in practice.
fn encode<T: Serialize>(config: &T) -> Value {
    serde_json::to_value(config).unwrap_or_else(|e| {
        log::warn!("node data failed to encode: {e}");
        Value::Object(Map::new())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_type_has_a_category_and_round_trips_its_name() {
        for t in NodeType::ALL {
            assert_eq!(NodeType::from_name(t.as_str()), Some(t));
            let _ = t.category();
        }
        assert_eq!(NodeType::SentimentTrigger.category(), Category::Conditional);
        assert_eq!(NodeType::IfGate.category(), Category::Logic);
        assert_eq!(NodeType::Webhook.category(), Category::Action);
        assert_eq!(NodeType::RhInfo.category(), Category::Info);
    }

    #[test]
    fn parse_rejects_unknown_type() {
        assert_eq!(
            NodeType::parse("moon_phase"),
            Err(GraphError::UnknownNodeType("moon_phase".into()))
        );
    }

    #[test]
    fn defaults_match_type() {
        for t in NodeType::ALL {
            assert_eq!(NodeData::default_for(t).node_type(), Some(t));
        }
    }

    #[test]
    fn if_gate_wire_uses_camel_case() {
        let data = NodeData::default_for(NodeType::IfGate);
        let wire = data.to_wire();
        assert_eq!(
            wire,
            json!({"conditions": [{"id": "cond-0"}], "elseOutputId": "else"})
        );
    }

    #[test]
    fn unknown_keys_survive_round_trip() {
        let wire = json!({"ticker": "AAPL", "op": ">", "value": 150, "note": "earnings"});
        let data = NodeData::from_wire("price", wire.clone());
        assert_eq!(data.to_wire(), wire);
    }

    #[test]
    fn unknown_type_is_opaque() {
        let wire = json!({"anything": [1, 2, 3]});
        let data = NodeData::from_wire("future_block", wire.clone());
        assert_eq!(data.node_type(), None);
        assert_eq!(data.type_name(), "future_block");
        assert_eq!(data.to_wire(), wire);
    }

    #[test]
    fn merge_is_shallow() {
        let mut data = NodeData::default_for(NodeType::Tracking);
        let partial = json!({"code": "FOO"});
        data.merge(partial.as_object().unwrap());
        let partial = json!({"value": 1000});
        data.merge(partial.as_object().unwrap());
        match &data {
            NodeData::Tracking(cfg) => {
                assert_eq!(cfg.code, "FOO");
                assert_eq!(cfg.value, json!(1000));
            }
            other => panic!("expected tracking, got {other:?}"),
        }
    }

    #[test]
    fn merge_keeps_values_the_config_cannot_hold() {
        let mut data = NodeData::from_wire("price", json!({"ticker": "AAPL", "op": ">", "value": 150}));
        data.merge(json!({"ticker": null}).as_object().unwrap());
        assert_eq!(data.node_type(), Some(NodeType::Price));
        assert!(data.is_raw());
        assert_eq!(data.to_wire(), json!({"ticker": null, "op": ">", "value": 150}));

        // Writing a string back restores the typed view.
        data.merge(json!({"ticker": "MSFT"}).as_object().unwrap());
        assert!(matches!(&data, NodeData::Price(cfg) if cfg.ticker == "MSFT"));
    }

    #[test]
    fn malformed_if_gate_has_no_rows() {
        let mut data = NodeData::default_for(NodeType::IfGate);
        data.merge(json!({"conditions": "not a list"}).as_object().unwrap());
        assert_eq!(data.node_type(), Some(NodeType::IfGate));
        assert_eq!(data.condition_count(), Some(0));
        assert_eq!(data.to_wire()["conditions"], json!("not a list"));
    }

    #[test]
    fn numeric_condition_ids_stay_typed() {
        let wire = json!({"conditions": [{"id": 1718000000000u64}, {"id": "b"}], "elseOutputId": "else"});
        let data = NodeData::from_wire("if_gate", wire.clone());
        assert!(!data.is_raw());
        assert_eq!(data.condition_count(), Some(2));
        assert_eq!(data.to_wire(), wire);
    }
}
