use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CreateTenantParams {
    #[schemars(description = "Unique tenant identifier")]
    pub tenant_id: String,

    #[schemars(description = "Owner of the tenant (e.g. an email address)")]
    pub owner: String,

    #[schemars(description = "Human-readable display name")]
    pub display_name: String,

    #[schemars(description = "Optional free-form description")]
    pub description: Option<String>,

    #[schemars(description = "Optional string-to-string label map")]
    pub labels: Option<BTreeMap<String, String>>,
}
