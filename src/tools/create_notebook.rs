use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CreateNotebookParams {
    #[schemars(description = "Owning tenant identifier")]
    pub tenant_id: String,

    #[schemars(description = "Owning library identifier (must exist under the tenant)")]
    pub library_id: String,

    #[schemars(description = "Unique notebook identifier")]
    pub notebook_id: String,

    #[schemars(description = "Owner of the notebook")]
    pub owner: String,

    #[schemars(description = "Human-readable display name")]
    pub display_name: String,

    #[schemars(description = "Optional free-form description")]
    pub description: Option<String>,

    #[schemars(description = "Initial markdown body. Defaults to empty.")]
    pub markdown: Option<String>,

    #[schemars(description = "Lifecycle status: 'draft' (default), 'published', or 'archived'")]
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetNotebookParams {
    #[schemars(description = "Notebook identifier to fetch")]
    pub notebook_id: String,
}
