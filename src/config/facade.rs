//! Loader facade over the merge policy and sources.

use super::merge::builder_with_defaults;
use super::sources::{environment, global_file, workspace_file};
use super::SitesmithConfig;
use config::{ConfigError, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence (lowest to highest): defaults, global file, `config/config.toml`,
    /// `config/{SITESMITH_ENV}.toml`, `SITESMITH__*` environment variables.
    /// A relative `catalog.path` is resolved against the workspace root.
    pub fn load(workspace_root: &Path) -> Result<SitesmithConfig, ConfigError> {
        Self::load_with_global_file(workspace_root, global_file::global_config_path().as_deref())
    }

    /// [`ConfigLoader::load`] with an explicit global file (or none).
    pub fn load_with_global_file(
        workspace_root: &Path,
        global_path: Option<&Path>,
    ) -> Result<SitesmithConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder, global_path)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder);

        let mut config: SitesmithConfig = builder.build()?.try_deserialize()?;
        resolve_catalog_path(&mut config, workspace_root);
        debug!(workspace = %workspace_root.display(), "Configuration loaded");
        Ok(config)
    }

    /// Load a single file, still honoring environment overrides. A relative
    /// `catalog.path` is resolved against the file's directory.
    pub fn load_from_file(path: &Path) -> Result<SitesmithConfig, ConfigError> {
        let builder = builder_with_defaults()?.add_source(File::from(path.to_path_buf()));
        let builder = environment::add_to_builder(builder);

        let mut config: SitesmithConfig = builder.build()?.try_deserialize()?;
        let base = path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
        resolve_catalog_path(&mut config, &base);
        Ok(config)
    }
}

fn resolve_catalog_path(config: &mut SitesmithConfig, base: &Path) {
    if let Some(path) = config.catalog.path.as_mut() {
        if path.is_relative() {
            *path = base.join(&*path);
        }
    }
}
