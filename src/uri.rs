//! Canonical resource URIs.
//!
//! Every addressable entity maps to exactly one `synthesis://` URI, built as
//! a pure function of its type and compound key. The mapping is injective
//! and stable across restarts; segments are opaque identifier strings and
//! are never percent-escaped or unescaped here.

use crate::error::{Error, Result};

/// URI scheme prefix for all addressable entities.
pub const SCHEME: &str = "synthesis";

/// The seven addressable entity kinds, with their `resource_index`
/// `entity_type` strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Tenant,
    Library,
    Notebook,
    Feature,
    Tool,
    Product,
    TypeDef,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tenant => "tenant",
            Self::Library => "library",
            Self::Notebook => "notebook",
            Self::Feature => "feature",
            Self::Tool => "tool",
            Self::Product => "product",
            Self::TypeDef => "type",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tenant" => Ok(Self::Tenant),
            "library" => Ok(Self::Library),
            "notebook" => Ok(Self::Notebook),
            "feature" => Ok(Self::Feature),
            "tool" => Ok(Self::Tool),
            "product" => Ok(Self::Product),
            "type" => Ok(Self::TypeDef),
            other => Err(Error::validation(format!("unknown entity kind: {other}"))),
        }
    }
}

fn require(segment: &str, name: &str) -> Result<()> {
    if segment.is_empty() {
        return Err(Error::validation(format!("empty {name} segment in URI")));
    }
    Ok(())
}

/// `synthesis://tenant/{tenantId}`
pub fn tenant_uri(tenant_id: &str) -> Result<String> {
    require(tenant_id, "tenant id")?;
    Ok(format!("{SCHEME}://tenant/{tenant_id}"))
}

/// `synthesis://tenant/{tenantId}/library/{libraryId}`
pub fn library_uri(tenant_id: &str, library_id: &str) -> Result<String> {
    require(tenant_id, "tenant id")?;
    require(library_id, "library id")?;
    Ok(format!("{SCHEME}://tenant/{tenant_id}/library/{library_id}"))
}

/// `synthesis://tenant/{tenantId}/notebook/{notebookId}`
pub fn notebook_uri(tenant_id: &str, notebook_id: &str) -> Result<String> {
    require(tenant_id, "tenant id")?;
    require(notebook_id, "notebook id")?;
    Ok(format!(
        "{SCHEME}://tenant/{tenant_id}/notebook/{notebook_id}"
    ))
}

/// `synthesis://tenant/{tenantId}/feature/{featureId}`
pub fn feature_uri(tenant_id: &str, feature_id: &str) -> Result<String> {
    require(tenant_id, "tenant id")?;
    require(feature_id, "feature id")?;
    Ok(format!("{SCHEME}://tenant/{tenant_id}/feature/{feature_id}"))
}

/// `synthesis://tenant/{tenantId}/tool/{toolId}`
pub fn tool_uri(tenant_id: &str, tool_id: &str) -> Result<String> {
    require(tenant_id, "tenant id")?;
    require(tool_id, "tool id")?;
    Ok(format!("{SCHEME}://tenant/{tenant_id}/tool/{tool_id}"))
}

/// `synthesis://tenant/{tenantId}/product/{productId}`
pub fn product_uri(tenant_id: &str, product_id: &str) -> Result<String> {
    require(tenant_id, "tenant id")?;
    require(product_id, "product id")?;
    Ok(format!("{SCHEME}://tenant/{tenant_id}/product/{product_id}"))
}

/// `synthesis://type/{typeName}` — the global type catalog is not
/// tenant-scoped.
pub fn type_uri(type_name: &str) -> Result<String> {
    require(type_name, "type name")?;
    Ok(format!("{SCHEME}://type/{type_name}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_formats_are_exact() {
        assert_eq!(tenant_uri("t1").unwrap(), "synthesis://tenant/t1");
        assert_eq!(
            library_uri("t1", "l1").unwrap(),
            "synthesis://tenant/t1/library/l1"
        );
        assert_eq!(
            notebook_uri("t1", "n1").unwrap(),
            "synthesis://tenant/t1/notebook/n1"
        );
        assert_eq!(
            feature_uri("t1", "f1").unwrap(),
            "synthesis://tenant/t1/feature/f1"
        );
        assert_eq!(
            tool_uri("t1", "x1").unwrap(),
            "synthesis://tenant/t1/tool/x1"
        );
        assert_eq!(
            product_uri("t1", "p1").unwrap(),
            "synthesis://tenant/t1/product/p1"
        );
        assert_eq!(type_uri("markdown").unwrap(), "synthesis://type/markdown");
    }

    #[test]
    fn empty_segments_rejected() {
        assert!(tenant_uri("").is_err());
        assert!(library_uri("t1", "").is_err());
        assert!(library_uri("", "l1").is_err());
        assert!(notebook_uri("t1", "").is_err());
        assert!(type_uri("").is_err());
    }

    #[test]
    fn distinct_entities_produce_distinct_uris() {
        // Same id under different kinds must never collide.
        let a = notebook_uri("t1", "x").unwrap();
        let b = feature_uri("t1", "x").unwrap();
        let c = tool_uri("t1", "x").unwrap();
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
    }

    #[test]
    fn segments_are_opaque() {
        // No escaping: caller-supplied strings pass through verbatim.
        assert_eq!(
            tenant_uri("acme co").unwrap(),
            "synthesis://tenant/acme co"
        );
    }

    #[test]
    fn entity_kind_round_trips() {
        for kind in [
            EntityKind::Tenant,
            EntityKind::Library,
            EntityKind::Notebook,
            EntityKind::Feature,
            EntityKind::Tool,
            EntityKind::Product,
            EntityKind::TypeDef,
        ] {
            assert_eq!(kind.as_str().parse::<EntityKind>().unwrap(), kind);
        }
    }
}
