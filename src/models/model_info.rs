//! Model catalog entries

use serde::{Deserialize, Serialize};

use super::de::{non_empty_string, truthy};

/// Description of one model as returned by the `/models` endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawModelInfo", into = "RawModelInfo")]
pub struct ModelInfo {
    pub model: String,
    pub description: Option<String>,
    /// Transient models are wizards without persistent records
    pub is_transient: bool,
}

impl ModelInfo {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            description: None,
            is_transient: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn transient(mut self) -> Self {
        self.is_transient = true;
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawInfo {
    #[serde(default, deserialize_with = "non_empty_string", skip_serializing_if = "Option::is_none")]
    string: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawModelInfo {
    model: String,
    #[serde(default)]
    info: Option<RawInfo>,
    #[serde(default, deserialize_with = "truthy")]
    transient: bool,
}

impl From<RawModelInfo> for ModelInfo {
    fn from(raw: RawModelInfo) -> Self {
        Self {
            model: raw.model,
            description: raw.info.and_then(|info| info.string),
            is_transient: raw.transient,
        }
    }
}

impl From<ModelInfo> for RawModelInfo {
    fn from(info: ModelInfo) -> Self {
        Self {
            model: info.model,
            info: Some(RawInfo {
                string: info.description,
            }),
            transient: info.is_transient,
        }
    }
}
