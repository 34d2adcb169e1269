//! Wire types for the agent service
//!
//! Field names match the JSON the service produces. Every optional field
//! defaults when absent so older or newer agents stay readable.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Section name used when the agent signals an edit of the whole plan
pub const WHOLE_PLAN_SECTION: &str = "plan";

/// Coarse state of the research agent
///
/// Unknown labels are kept verbatim in [`AgentState::Other`] rather than
/// rejected, so a newer agent never breaks status polling.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AgentState {
    #[default]
    Idle,
    Researching,
    GeneratingPlan,
    Complete,
    Other(String),
}

impl AgentState {
    /// Wire label
    pub fn as_str(&self) -> &str {
        match self {
            Self::Idle => "idle",
            Self::Researching => "researching",
            Self::GeneratingPlan => "generating_plan",
            Self::Complete => "complete",
            Self::Other(label) => label,
        }
    }

    /// Human label, e.g. "generating plan"
    pub fn display_label(&self) -> String {
        self.as_str().replace('_', " ")
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl From<String> for AgentState {
    fn from(label: String) -> Self {
        match label.as_str() {
            "idle" => Self::Idle,
            "researching" => Self::Researching,
            "generating_plan" => Self::GeneratingPlan,
            "complete" => Self::Complete,
            _ => Self::Other(label),
        }
    }
}

impl From<&str> for AgentState {
    fn from(label: &str) -> Self {
        Self::from(label.to_string())
    }
}

impl From<AgentState> for String {
    fn from(state: AgentState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reply to `GET /status`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusReply {
    #[serde(default)]
    pub state: AgentState,
    #[serde(default)]
    pub current_company: Option<String>,
    /// Free-form progress text from the agent
    #[serde(default)]
    pub status: Option<String>,
}

/// A generated account plan, without its body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    #[serde(default = "unknown_company")]
    pub company: String,
    #[serde(default)]
    pub timestamp: String,
    pub filename: String,
}

fn unknown_company() -> String {
    "Unknown".to_string()
}

impl PlanSummary {
    pub fn new(company: impl Into<String>, timestamp: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            timestamp: timestamp.into(),
            filename: filename.into(),
        }
    }
}

/// Reply to `GET /plans`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanListReply {
    #[serde(default)]
    pub plans: Vec<PlanSummary>,
}

/// Body of `POST /chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// In-progress plan edit signalled by the agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditState {
    pub section: String,
    pub instructions_pending: bool,
}

impl EditState {
    /// Interpret the `editing_plan` field of a chat reply
    ///
    /// Accepts `{section, instructions_pending}`, a bare section name, or any
    /// other object (the agent may send the whole plan), which is taken as an
    /// edit of the entire plan. `null`, `false` and empty strings mean no edit.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(section) if !section.trim().is_empty() => Some(Self {
                section: section.trim().to_string(),
                instructions_pending: true,
            }),
            Value::Object(map) => {
                let section = map
                    .get("section")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .unwrap_or(WHOLE_PLAN_SECTION)
                    .to_string();
                let instructions_pending = map
                    .get("instructions_pending")
                    .and_then(Value::as_bool)
                    .unwrap_or(true);
                Some(Self {
                    section,
                    instructions_pending,
                })
            }
            _ => None,
        }
    }
}

/// Reply to `POST /chat`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub plan_summary: Option<String>,
    #[serde(default)]
    pub state: Option<AgentState>,
    #[serde(default)]
    pub plan_created: Option<bool>,
    #[serde(default)]
    pub editing_plan: Option<Value>,
    #[serde(default)]
    pub current_company: Option<String>,
}

impl ChatReply {
    /// Reply with only response text
    pub fn text(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            ..Self::default()
        }
    }

    /// True when the reply means the plan list may have changed
    pub fn signals_new_plan(&self) -> bool {
        self.state.as_ref().is_some_and(AgentState::is_complete) || self.plan_created == Some(true)
    }

    /// Plan summary, if present and non-blank
    pub fn summary(&self) -> Option<&str> {
        self.plan_summary.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Edit descriptor, if the agent is mid-edit
    pub fn edit_state(&self) -> Option<EditState> {
        self.editing_plan.as_ref().and_then(EditState::from_value)
    }
}

/// Reply to `GET /plan/{filename}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanContentReply {
    #[serde(default)]
    pub filename: Option<String>,
    pub content: String,
}

/// Body of `POST /edit-plan`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditRequest {
    pub section: String,
    pub instructions: String,
}

/// Reply to `POST /edit-plan`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditReply {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub success: Option<bool>,
}

impl EditReply {
    pub fn succeeded(&self) -> bool {
        self.success == Some(true)
    }
}

/// Reply to `GET /health`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthReply {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Reply to `GET /cache/status`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStatusReply {
    #[serde(default)]
    pub cached_companies: Vec<String>,
    #[serde(default)]
    pub cache_size: usize,
}

/// Reply to `POST /cache/clear`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheClearReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}
