//! Role/Variant Catalog
//!
//! Static whitelist of structural roles and the closed set of layout variants each role
//! may use. The catalog is data, not code: it is parsed from a versioned TOML artifact
//! once at startup and shared read-only (`Arc<RoleVariantCatalog>`) for the life of the
//! process. Plan repair and planner instructions are both driven from it.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use tracing::debug;

const BUILTIN_CATALOG: &str = include_str!("../assets/catalog.toml");

/// Named structural slot of a generated document (e.g. `hero`, `pricing`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Role(String);

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Role {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Concrete layout implementation of a role (e.g. `hero-split`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct VariantId(String);

impl VariantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for VariantId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<VariantId> for String {
    fn from(variant: VariantId) -> Self {
        variant.0
    }
}

impl fmt::Display for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One `[[roles]]` entry of the catalog artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleSpec {
    pub name: Role,
    pub variants: Vec<VariantId>,
    #[serde(default)]
    pub mandatory: bool,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    version: String,
    roles: Vec<RoleSpec>,
}

/// Immutable Role -> allowed Variant registry.
#[derive(Debug, Clone)]
pub struct RoleVariantCatalog {
    version: String,
    roles: Vec<RoleSpec>,
    index: HashMap<Role, usize>,
}

impl RoleVariantCatalog {
    /// Catalog compiled into the binary.
    pub fn builtin() -> Result<Self, ApiError> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ApiError> {
        let file: CatalogFile = toml::from_str(text)?;
        Self::new(file.version, file.roles)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ApiError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ApiError::CatalogError(format!("Failed to read catalog {}: {}", path.display(), e))
        })?;
        let catalog = Self::from_toml_str(&text)?;
        debug!(
            path = %path.display(),
            version = %catalog.version,
            roles = catalog.roles.len(),
            "Loaded role catalog"
        );
        Ok(catalog)
    }

    /// Build a catalog from explicit entries, rejecting anything inconsistent.
    pub fn new(version: String, roles: Vec<RoleSpec>) -> Result<Self, ApiError> {
        if version.trim().is_empty() {
            return Err(ApiError::CatalogError(
                "Catalog version cannot be empty".to_string(),
            ));
        }
        if roles.is_empty() {
            return Err(ApiError::CatalogError(
                "Catalog must define at least one role".to_string(),
            ));
        }

        let mut index = HashMap::new();
        for (position, spec) in roles.iter().enumerate() {
            if spec.name.as_str().is_empty() {
                return Err(ApiError::CatalogError(format!(
                    "Role at position {} has an empty name",
                    position
                )));
            }
            if index.insert(spec.name.clone(), position).is_some() {
                return Err(ApiError::CatalogError(format!(
                    "Duplicate role '{}'",
                    spec.name
                )));
            }
            if spec.variants.is_empty() {
                return Err(ApiError::CatalogError(format!(
                    "Role '{}' has no variants",
                    spec.name
                )));
            }
            let mut seen = HashSet::new();
            for variant in &spec.variants {
                if variant.as_str().is_empty() || !seen.insert(variant) {
                    return Err(ApiError::CatalogError(format!(
                        "Role '{}' has an empty or duplicate variant '{}'",
                        spec.name, variant
                    )));
                }
            }
        }
        if !roles.iter().any(|spec| spec.mandatory) {
            return Err(ApiError::CatalogError(
                "Catalog must mark at least one role as mandatory".to_string(),
            ));
        }

        Ok(Self {
            version,
            roles,
            index,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn roles(&self) -> &[RoleSpec] {
        &self.roles
    }

    pub fn contains_role(&self, role: &Role) -> bool {
        self.index.contains_key(role)
    }

    pub fn allowed_variants(&self, role: &Role) -> Option<&[VariantId]> {
        self.index
            .get(role)
            .map(|&position| self.roles[position].variants.as_slice())
    }

    pub fn is_allowed(&self, role: &Role, variant: &VariantId) -> bool {
        self.allowed_variants(role)
            .map(|variants| variants.contains(variant))
            .unwrap_or(false)
    }

    /// Substitute used when a planned variant falls outside the whitelist.
    pub fn first_variant(&self, role: &Role) -> Option<&VariantId> {
        self.allowed_variants(role)
            .and_then(|variants| variants.first())
    }

    pub fn mandatory_roles(&self) -> impl Iterator<Item = &Role> {
        self.roles
            .iter()
            .filter(|spec| spec.mandatory)
            .map(|spec| &spec.name)
    }

    /// Compact JSON form embedded into planner instructions.
    pub fn to_prompt_json(&self) -> String {
        let mut roles = serde_json::Map::new();
        for spec in &self.roles {
            roles.insert(
                spec.name.to_string(),
                serde_json::json!({
                    "variants": spec.variants,
                    "mandatory": spec.mandatory,
                }),
            );
        }
        serde_json::Value::Object(roles).to_string()
    }
}
