pub mod append_content_block;
pub mod create_notebook;
pub mod create_tenant;
pub mod get_tenant;
pub mod graph_query;
pub mod link_resources;
pub mod semantic_search;
pub mod upsert_embedding;

use append_content_block::AppendContentBlockParams;
use create_notebook::{CreateNotebookParams, GetNotebookParams};
use create_tenant::CreateTenantParams;
use get_tenant::{GetTenantParams, ListTenantsParams};
use graph_query::GraphQueryParams;
use link_resources::LinkResourcesParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use rusqlite::Connection;
use semantic_search::SemanticSearchParams;
use std::sync::{Arc, Mutex};
use upsert_embedding::UpsertEmbeddingParams;

use crate::catalog::types::{Notebook, NotebookContents, NotebookData, NotebookStatus, Tenant};
use crate::catalog::{notebooks, tenants};
use crate::config::SynthesisConfig;
use crate::index::{embeddings, graph, sync};
use crate::query::{hydrate, search, traverse};
use crate::uri::{self, EntityKind};

/// The synthesis MCP tool handler. Holds shared state (db connection,
/// config) and exposes all MCP tools via the `#[tool_router]` macro. Tools
/// parse and validate arguments, run core calls, and format results — no
/// business logic lives here.
#[derive(Clone)]
pub struct SynthesisTools {
    tool_router: ToolRouter<Self>,
    db: Arc<Mutex<Connection>>,
    config: Arc<SynthesisConfig>,
}

#[tool_router]
impl SynthesisTools {
    pub fn new(db: Arc<Mutex<Connection>>, config: Arc<SynthesisConfig>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            db,
            config,
        }
    }

    /// Run a core call on the shared connection off the async runtime.
    async fn with_db<T, F>(&self, f: F) -> Result<T, String>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> crate::error::Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let mut conn = db.lock().map_err(|e| format!("db lock poisoned: {e}"))?;
            f(&mut conn).map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| format!("db task failed: {e}"))?
    }

    #[tool(description = "Create a tenant, the top-level isolation boundary owning libraries, notebooks, features, and tools.")]
    async fn create_tenant(
        &self,
        Parameters(params): Parameters<CreateTenantParams>,
    ) -> Result<String, String> {
        tracing::info!(tenant = %params.tenant_id, "create_tenant called");

        let tenant = Tenant {
            id: params.tenant_id,
            owner: params.owner,
            display_name: params.display_name,
            description: params.description.unwrap_or_default(),
            labels: params.labels.unwrap_or_default(),
            version: 0,
            last_modified: String::new(),
        };

        let created = self
            .with_db(move |conn| tenants::create_tenant(conn, &tenant))
            .await?;

        Ok(tenant_json(&created).to_string())
    }

    #[tool(description = "Fetch a tenant by ID.")]
    async fn get_tenant(
        &self,
        Parameters(params): Parameters<GetTenantParams>,
    ) -> Result<String, String> {
        let tenant = self
            .with_db(move |conn| tenants::get_tenant(conn, &params.tenant_id))
            .await?;
        Ok(tenant_json(&tenant).to_string())
    }

    #[tool(description = "List all tenants, newest first.")]
    async fn list_tenants(
        &self,
        Parameters(_params): Parameters<ListTenantsParams>,
    ) -> Result<String, String> {
        let all = self.with_db(|conn| tenants::list_tenants(conn)).await?;
        let items: Vec<serde_json::Value> = all.iter().map(tenant_json).collect();
        serde_json::to_string(&items).map_err(|e| format!("serialization failed: {e}"))
    }

    #[tool(description = "Create a notebook under a library with an initial markdown body.")]
    async fn create_notebook(
        &self,
        Parameters(params): Parameters<CreateNotebookParams>,
    ) -> Result<String, String> {
        let status: NotebookStatus = match &params.status {
            Some(s) => s.parse().map_err(|e: crate::error::Error| e.to_string())?,
            None => NotebookStatus::Draft,
        };

        tracing::info!(
            notebook = %params.notebook_id,
            library = %params.library_id,
            "create_notebook called"
        );

        let notebook = Notebook {
            tenant_id: params.tenant_id.clone(),
            id: params.notebook_id.clone(),
            library_id: params.library_id.clone(),
            status,
            owner: params.owner,
            display_name: params.display_name,
            description: params.description.unwrap_or_default(),
            contents: NotebookContents {
                data: NotebookData {
                    markdown: params.markdown.unwrap_or_default(),
                },
                content_blocks: Vec::new(),
            },
            notifications: Vec::new(),
        };

        let notebook_uri = uri::notebook_uri(&params.tenant_id, &params.notebook_id)
            .map_err(|e| e.to_string())?;
        let library_id = params.library_id;
        let notebook_id = params.notebook_id;

        let drift = self
            .with_db(move |conn| {
                notebooks::create_notebook(conn, &notebook)?;

                // Secondary step after the primary commit: containment edge
                // in the graph index. Failure is drift, not a tool failure.
                let drift = match graph::merge_relationship(
                    conn,
                    EntityKind::Library,
                    &library_id,
                    "contains",
                    EntityKind::Notebook,
                    &notebook_id,
                    None,
                ) {
                    Ok(()) => None,
                    Err(e) => {
                        Some(sync::record_drift(conn, "merge_edge", &notebook_id, &e.to_string())
                            .to_string())
                    }
                };
                Ok(drift)
            })
            .await?;

        let mut response = serde_json::json!({ "uri": notebook_uri, "created": true });
        if let Some(reason) = drift {
            response["index_drift"] = serde_json::Value::String(reason);
        }
        Ok(response.to_string())
    }

    #[tool(description = "Fetch a notebook by ID, including its markdown body, content blocks, and notifications.")]
    async fn get_notebook(
        &self,
        Parameters(params): Parameters<GetNotebookParams>,
    ) -> Result<String, String> {
        let notebook = self
            .with_db(move |conn| notebooks::get_notebook(conn, &params.notebook_id))
            .await?;
        serde_json::to_string(&notebook).map_err(|e| format!("serialization failed: {e}"))
    }

    #[tool(description = "Append a content block to a notebook, as the last child of a parent block or as a new root block.")]
    async fn append_content_block(
        &self,
        Parameters(params): Parameters<AppendContentBlockParams>,
    ) -> Result<String, String> {
        let block = self
            .with_db(move |conn| {
                notebooks::append_block(
                    conn,
                    &params.notebook_id,
                    &params.content_type,
                    &params.data,
                    &params.types.unwrap_or_default(),
                    params.parent_uid.as_deref(),
                )
            })
            .await?;
        serde_json::to_string(&block).map_err(|e| format!("serialization failed: {e}"))
    }

    #[tool(description = "Store or replace the embedding for an entity under a named model. Vectors come from an external embedding service.")]
    async fn upsert_embedding(
        &self,
        Parameters(params): Parameters<UpsertEmbeddingParams>,
    ) -> Result<String, String> {
        let model = params
            .model
            .unwrap_or_else(|| self.config.index.default_model.clone());
        let entity_id = params.entity_id;
        let vector = params.vector;
        let dim = vector.len();

        let model_for_response = model.clone();
        let entity_for_response = entity_id.clone();
        self.with_db(move |conn| embeddings::upsert_embedding(conn, &entity_id, &vector, &model))
            .await?;

        Ok(serde_json::json!({
            "entity_id": entity_for_response,
            "model": model_for_response,
            "dim": dim,
        })
        .to_string())
    }

    #[tool(description = "Perform semantic search on notebooks using vector similarity. The query vector comes from an external embedding service.")]
    async fn semantic_search_notebooks(
        &self,
        Parameters(params): Parameters<SemanticSearchParams>,
    ) -> Result<String, String> {
        let limit = params.limit.unwrap_or(self.config.search.default_limit);
        let multiplier = self.config.search.candidate_multiplier;

        let results = self
            .with_db(move |conn| {
                let hits = search::search_by_similarity(
                    conn,
                    &params.vector,
                    params.tenant_id.as_deref(),
                    limit,
                    multiplier,
                )?;

                let ids: Vec<String> = hits.iter().map(|h| h.entity_id.clone()).collect();
                let hydrated = hydrate::hydrate_notebooks(conn, &ids)?;

                let items: Vec<serde_json::Value> = hits
                    .iter()
                    .map(|hit| {
                        let display_name = hydrated
                            .iter()
                            .find(|n| n.id == hit.entity_id)
                            .map(|n| n.display_name.clone());
                        serde_json::json!({
                            "entity_id": hit.entity_id,
                            "score": hit.score,
                            "display_name": display_name,
                        })
                    })
                    .collect();
                Ok(items)
            })
            .await?;

        let total = results.len();
        Ok(serde_json::json!({ "results": results, "total": total }).to_string())
    }

    #[tool(description = "Create or update a typed relationship between two resources (merge semantics: one edge per (from, to, type)).")]
    async fn link_resources(
        &self,
        Parameters(params): Parameters<LinkResourcesParams>,
    ) -> Result<String, String> {
        let from_kind: EntityKind = params.from_type.parse().map_err(|e: crate::error::Error| e.to_string())?;
        let to_kind: EntityKind = params.to_type.parse().map_err(|e: crate::error::Error| e.to_string())?;

        self.with_db(move |conn| {
            graph::merge_relationship(
                conn,
                from_kind,
                &params.from_id,
                &params.rel_type,
                to_kind,
                &params.to_id,
                params.properties.as_ref(),
            )
        })
        .await?;

        Ok(serde_json::json!({ "merged": true }).to_string())
    }

    #[tool(description = "Query resource relationships by bounded graph traversal from a starting resource.")]
    async fn graph_query_resources(
        &self,
        Parameters(params): Parameters<GraphQueryParams>,
    ) -> Result<String, String> {
        let max_hops = params.max_hops.unwrap_or(self.config.search.default_max_hops);

        let nodes = self
            .with_db(move |conn| {
                traverse::traverse_relationships(
                    conn,
                    &params.resource_id,
                    max_hops,
                    params.relation_types.as_deref(),
                )
            })
            .await?;

        let total = nodes.len();
        serde_json::to_string(&serde_json::json!({ "nodes": nodes, "total": total }))
            .map_err(|e| format!("serialization failed: {e}"))
    }
}

/// Tenant wire shape: version travels as a string, matching the public API.
fn tenant_json(tenant: &Tenant) -> serde_json::Value {
    serde_json::json!({
        "tenantId": tenant.id,
        "owner": tenant.owner,
        "display_name": tenant.display_name,
        "description": tenant.description,
        "labels": tenant.labels,
        "version": tenant.version.to_string(),
        "last_modified": tenant.last_modified,
    })
}

#[tool_handler]
impl ServerHandler for SynthesisTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "Synthesis stores hierarchical notebooks under tenants and libraries. \
                 Use create_tenant/create_notebook to write, append_content_block to \
                 grow a notebook's tree, semantic_search_notebooks for similarity \
                 search, and graph_query_resources for relationship traversal."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
