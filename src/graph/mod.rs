//! Schema diagram generation.
//!
//! This module provides:
//! - Three Graphviz DOT detail tiers (full, medium, light)
//! - Layout, palette and output settings shared by the tiers
//! - The exporter catalog resolving tier names to renderers

pub mod format;

pub use format::dot;
pub use format::{Detail, DotFull, DotLight, DotMedium, Layout, Palette, RenderConfig, Renderer};

use crate::registry::Registry;

/// Registered renderers, keyed by exporter name
pub type ExporterCatalog = Registry<dyn Renderer>;

impl ExporterCatalog {
    /// Catalog holding the three DOT tiers
    pub fn with_builtins() -> Self {
        let mut catalog: Self = Registry::new("exporter");
        catalog
            .register("dot-full", || Box::new(DotFull))
            .register("dot-medium", || Box::new(DotMedium))
            .register("dot-light", || Box::new(DotLight));
        catalog
    }
}
