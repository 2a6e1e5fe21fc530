use serde::Deserialize;
use serde::Serialize;

pub const AGENT_MODEL_ID: &str = "ttmdocs-agents";

fn default_true() -> bool {
    return true;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmModelDescriptor {
    pub name: String,
    pub model: String,
    pub llm_id: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_deprecated: bool,
}

impl LlmModelDescriptor {
    /// The multi-agent orchestration backend. It is not part of the server's
    /// catalog and always sits first in the displayed list.
    pub fn agent() -> LlmModelDescriptor {
        return LlmModelDescriptor {
            name: "Talk to My Docs Agents".to_string(),
            model: AGENT_MODEL_ID.to_string(),
            llm_id: AGENT_MODEL_ID.to_string(),
            is_active: true,
            is_deprecated: false,
        };
    }

    pub fn is_agent(&self) -> bool {
        return self.model == AGENT_MODEL_ID || self.llm_id == AGENT_MODEL_ID;
    }

    pub fn is_available(&self) -> bool {
        return self.is_active && !self.is_deprecated;
    }

    pub fn matches(&self, text: &str) -> bool {
        return self.model == text || self.llm_id == text || self.name == text;
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmCatalog {
    pub data: Vec<LlmModelDescriptor>,
}
