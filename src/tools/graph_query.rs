use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GraphQueryParams {
    #[schemars(description = "Starting resource identifier")]
    pub resource_id: String,

    #[schemars(description = "Maximum number of hops (default 2)")]
    pub max_hops: Option<u32>,

    #[schemars(description = "Optional set of relationship types to follow")]
    pub relation_types: Option<Vec<String>>,
}
