//! Deterministic identifiers for categories and products
//!
//! Identifiers are name-based UUIDs (version 5, SHA-1) over
//! `"<site>:/<tag>/<key>"` under the RFC 4122 URL namespace, so the same key
//! yields the same identifier in every run and every process.

use uuid::Uuid;

/// Site tag used when none is configured
pub const DEFAULT_SITE_TAG: &str = "cellphones";

/// Entity kinds with their own sub-namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Category,
    Product,
}

impl EntityKind {
    /// Sub-namespace tag placed in the canonical string
    pub fn tag(self) -> &'static str {
        match self {
            EntityKind::Category => "cat",
            EntityKind::Product => "prod",
        }
    }
}

/// Namespace and site tag an identifier is derived under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityScheme {
    namespace: Uuid,
    site: String,
}

impl Default for IdentityScheme {
    fn default() -> Self {
        Self::new(Uuid::NAMESPACE_URL, DEFAULT_SITE_TAG)
    }
}

impl IdentityScheme {
    pub fn new(namespace: Uuid, site: impl Into<String>) -> Self {
        Self {
            namespace,
            site: site.into(),
        }
    }

    /// Canonical string hashed for `kind` and `key`
    pub fn canonical(&self, kind: EntityKind, key: &str) -> String {
        format!("{}:/{}/{}", self.site, kind.tag(), key)
    }

    /// Identifier for `key`; pure and stateless
    pub fn identify(&self, kind: EntityKind, key: &str) -> Uuid {
        Uuid::new_v5(&self.namespace, self.canonical(kind, key).as_bytes())
    }
}
