use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetTenantParams {
    #[schemars(description = "Tenant identifier to fetch")]
    pub tenant_id: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ListTenantsParams {}
