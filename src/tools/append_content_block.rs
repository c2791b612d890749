use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct AppendContentBlockParams {
    #[schemars(description = "Notebook to append to")]
    pub notebook_id: String,

    #[schemars(description = "Content type of the block (e.g. 'text/markdown')")]
    pub content_type: String,

    #[schemars(description = "Block payload data")]
    pub data: String,

    #[schemars(
        description = "UID of the parent block. Omit to append as a new root block."
    )]
    pub parent_uid: Option<String>,

    #[schemars(description = "Optional type tags for the block")]
    pub types: Option<Vec<String>>,
}
