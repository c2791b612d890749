use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UpsertEmbeddingParams {
    #[schemars(description = "Entity the embedding belongs to (notebook or feature id)")]
    pub entity_id: String,

    #[schemars(
        description = "Embedding vector, produced by an external embedding service. Must match the index dimensionality (384)."
    )]
    pub vector: Vec<f32>,

    #[schemars(description = "Embedding model identifier. Defaults to the configured model.")]
    pub model: Option<String>,
}
