use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub chain_id: u64,
    pub name: String,
    #[serde(default)]
    pub rpc_url: Option<String>,
}

impl Network {
    pub fn new(chain_id: u64, name: impl Into<String>) -> Self {
        Self {
            chain_id,
            name: name.into(),
            rpc_url: None,
        }
    }
}
