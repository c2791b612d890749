use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SemanticSearchParams {
    #[schemars(
        description = "Query vector, produced by the same embedding service that produced the stored embeddings"
    )]
    pub vector: Vec<f32>,

    #[schemars(description = "Optional tenant ID to scope the search")]
    pub tenant_id: Option<String>,

    #[schemars(description = "Maximum number of results (default 10)")]
    pub limit: Option<usize>,
}
