use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use tycoon_core::*;

/// Category of decision an agent is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionKind {
    Property,
    Trade,
    Building,
    Strategy,
}

impl std::fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Property => f.write_str("property"),
            Self::Trade => f.write_str("trade"),
            Self::Building => f.write_str("building"),
            Self::Strategy => f.write_str("strategy"),
        }
    }
}

/// Body of `POST {callbackUrl}/decision`.
/// The deadline is informational; the router enforces its own timeout.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRequest {
    pub request_id: ID<DecisionRequest>,
    pub game_id: GameId,
    pub slot: Slot,
    pub decision_type: DecisionKind,
    pub context: serde_json::Value,
    pub deadline: DateTime<Utc>,
}

/// Structured decision from an agent or from built-in logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl Decision {
    pub fn new(action: &str) -> Self {
        Self {
            action: action.to_string(),
            property_id: None,
            reasoning: None,
            confidence: None,
        }
    }
    pub fn is(&self, action: &str) -> bool {
        self.action.eq_ignore_ascii_case(action)
    }
}

/// Exact shape an agent must answer with.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct Reply {
    request_id: String,
    action: String,
    property_id: Option<i64>,
    reasoning: Option<String>,
    confidence: Option<f64>,
}

/// Why an agent reply was refused.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Malformed {
    #[error("unexpected reply shape: {0}")]
    Shape(String),
    #[error("reply echoes request {got}, expected {want}")]
    Mismatch { want: String, got: String },
}

impl DecisionRequest {
    pub fn new(
        game_id: GameId,
        slot: Slot,
        decision_type: DecisionKind,
        context: serde_json::Value,
        deadline: DateTime<Utc>,
    ) -> Self {
        Self {
            request_id: ID::default(),
            game_id,
            slot,
            decision_type,
            context,
            deadline,
        }
    }
    /// Accepts `body` only if it has the reply shape and echoes this request's id.
    pub fn accept(&self, body: serde_json::Value) -> Result<Decision, Malformed> {
        let reply = serde_json::from_value::<Reply>(body)
            .map_err(|e| Malformed::Shape(e.to_string()))?;
        let want = self.request_id.to_string();
        if reply.request_id != want {
            return Err(Malformed::Mismatch {
                want,
                got: reply.request_id,
            });
        }
        Ok(Decision {
            action: reply.action,
            property_id: reply.property_id,
            reasoning: reply.reasoning,
            confidence: reply.confidence,
        })
    }
}
