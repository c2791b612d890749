//! Core entity type definitions.
//!
//! Defines the tenant-scoped aggregates ([`Tenant`], [`Library`],
//! [`Notebook`] with its content-block forest, [`Feature`], [`ToolConfig`])
//! and the global [`TypeDef`] catalog. Configuration payloads for tools and
//! type components are closed tagged variants with an explicit opaque
//! string-map fallback, so validation and serialization stay total.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Error;

/// Top-level organization unit; root of a namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    #[serde(rename = "tenantId")]
    pub id: String,
    pub owner: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Monotonically non-decreasing; bumped on every successful mutation.
    #[serde(default)]
    pub version: u64,
    /// RFC 3339 timestamp of the last mutation.
    #[serde(default)]
    pub last_modified: String,
}

/// A collection of notebooks within a tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Library {
    #[serde(rename = "tenantId")]
    pub tenant_id: String,
    #[serde(rename = "libraryId")]
    pub id: String,
    pub owner: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

/// Notebook lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotebookStatus {
    Draft,
    Published,
    Archived,
}

impl NotebookStatus {
    /// SQL-compatible string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }
}

impl std::fmt::Display for NotebookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NotebookStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "archived" => Ok(Self::Archived),
            other => Err(Error::validation(format!("unknown notebook status: {other}"))),
        }
    }
}

/// The primary editable document: markdown body plus a content-block forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    #[serde(rename = "tenantId")]
    pub tenant_id: String,
    #[serde(rename = "notebookId")]
    pub id: String,
    #[serde(rename = "libraryId")]
    pub library_id: String,
    pub status: NotebookStatus,
    pub owner: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub contents: NotebookContents,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NotebookContents {
    pub data: NotebookData,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content_blocks: Vec<ContentBlock>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NotebookData {
    #[serde(rename = "Markdown", default)]
    pub markdown: String,
}

/// A node in a notebook's hierarchical structure. Blocks with a null
/// `parent_uid` are roots; `order` is unique among siblings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_uid: Option<String>,
    pub content_type: String,
    #[serde(default)]
    pub data: String,
    pub order: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
}

/// A webhook URL for notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "nurl")]
    pub url: String,
}

/// A URL reference to an external resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalResource {
    pub url: String,
}

/// Derived data associated with resources; may reference resources outside
/// the tenant's own entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "tenantId")]
    pub tenant_id: String,
    #[serde(rename = "featureId")]
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<ExternalResource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notifications: Vec<Notification>,
    /// Time-to-live in seconds, if the feature expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_seconds: Option<u64>,
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

/// Configuration payload for an external tool integration. Closed variants
/// for the known kinds; anything else rides in the opaque bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolSettings {
    /// Outbound webhook invocation.
    Webhook {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        secret: Option<String>,
    },
    /// Object-store export target.
    ObjectStore {
        bucket: String,
        #[serde(default)]
        prefix: String,
    },
    /// String-keyed scalar values for kinds this build doesn't model.
    Opaque { values: BTreeMap<String, String> },
}

/// Configuration for an external tool/integration, scoped to a tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(rename = "tenantId")]
    pub tenant_id: String,
    #[serde(rename = "toolId")]
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub settings: ToolSettings,
}

/// Component configuration used by type renderers, editors, and constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComponentConfig {
    Markdown {
        #[serde(default)]
        sanitize: bool,
    },
    CodeBlock {
        language: String,
    },
    Opaque {
        values: BTreeMap<String, String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Renderer {
    pub name: String,
    pub config: ComponentConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Editor {
    pub name: String,
    pub config: ComponentConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    #[serde(rename = "type")]
    pub constraint_type: String,
    pub config: ComponentConfig,
}

/// Content type definition in the global catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDef {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub renderers: Vec<Renderer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub editors: Vec<Editor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notebook_status_round_trips() {
        for status in [
            NotebookStatus::Draft,
            NotebookStatus::Published,
            NotebookStatus::Archived,
        ] {
            let parsed: NotebookStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("stale".parse::<NotebookStatus>().is_err());
    }

    #[test]
    fn tool_settings_serialize_tagged() {
        let settings = ToolSettings::Webhook {
            url: "https://hooks.example.com/x".into(),
            secret: None,
        };
        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["kind"], "webhook");
        assert_eq!(json["url"], "https://hooks.example.com/x");

        let back: ToolSettings = serde_json::from_value(json).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn opaque_settings_carry_unmodeled_kinds() {
        let json = serde_json::json!({
            "kind": "opaque",
            "values": {"endpoint": "ldap://example", "retries": "3"}
        });
        let settings: ToolSettings = serde_json::from_value(json).unwrap();
        match settings {
            ToolSettings::Opaque { values } => {
                assert_eq!(values["endpoint"], "ldap://example");
                assert_eq!(values["retries"], "3");
            }
            other => panic!("expected opaque, got {other:?}"),
        }
    }

    #[test]
    fn notebook_markdown_field_name_matches_wire_format() {
        let nb = NotebookData {
            markdown: "# Hello".into(),
        };
        let json = serde_json::to_value(&nb).unwrap();
        assert_eq!(json["Markdown"], "# Hello");
    }
}
