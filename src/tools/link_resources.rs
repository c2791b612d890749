use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct LinkResourcesParams {
    #[schemars(description = "Entity kind of the source node (e.g. 'notebook', 'feature', 'product')")]
    pub from_type: String,

    #[schemars(description = "Source entity identifier")]
    pub from_id: String,

    #[schemars(description = "Relationship type (e.g. 'derived_from', 'contains')")]
    pub rel_type: String,

    #[schemars(description = "Entity kind of the target node")]
    pub to_type: String,

    #[schemars(description = "Target entity identifier")]
    pub to_id: String,

    #[schemars(description = "Optional JSON properties carried on the edge")]
    pub properties: Option<serde_json::Value>,
}
