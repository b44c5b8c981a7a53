//! Output settings and the renderer contract shared by the DOT tiers.

pub mod dot;
mod full;
mod light;
mod medium;

pub use full::DotFull;
pub use light::DotLight;
pub use medium::DotMedium;

use crate::error::Result;
use crate::schema::{Database, RelationType, TableId};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;

/// Layout direction for diagram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Layout {
    /// Left to right
    #[default]
    LR,
    /// Top to bottom
    TB,
}

impl Layout {
    /// Value of the DOT `rankdir` attribute
    pub fn rankdir(&self) -> &'static str {
        match self {
            Layout::LR => "LR",
            Layout::TB => "TB",
        }
    }
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lr" | "left-right" | "horizontal" | "h" => Ok(Layout::LR),
            "tb" | "td" | "top-bottom" | "vertical" | "v" => Ok(Layout::TB),
            _ => Err(format!("Unknown layout: {}. Valid options: lr, tb", s)),
        }
    }
}

impl TryFrom<String> for Layout {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Layout> for String {
    fn from(layout: Layout) -> Self {
        layout.to_string()
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::LR => write!(f, "lr"),
            Layout::TB => write!(f, "tb"),
        }
    }
}

/// Detail tier, mapped onto the registered exporter names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Detail {
    /// Every field with key, index and nullability markers
    #[default]
    Full,
    /// Field names only
    Medium,
    /// Table names only
    Light,
}

impl Detail {
    /// Name of the exporter implementing this tier
    pub fn exporter(&self) -> &'static str {
        match self {
            Detail::Full => "dot-full",
            Detail::Medium => "dot-medium",
            Detail::Light => "dot-light",
        }
    }
}

impl FromStr for Detail {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" | "f" => Ok(Detail::Full),
            "medium" | "m" => Ok(Detail::Medium),
            "light" | "l" => Ok(Detail::Light),
            _ => Err(format!(
                "Unknown detail: {}. Valid options: full, medium, light",
                s
            )),
        }
    }
}

impl TryFrom<String> for Detail {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Detail> for String {
    fn from(detail: Detail) -> Self {
        detail.to_string()
    }
}

impl fmt::Display for Detail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Detail::Full => write!(f, "full"),
            Detail::Medium => write!(f, "medium"),
            Detail::Light => write!(f, "light"),
        }
    }
}

/// Colors used by the renderers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub hard: String,
    pub soft: String,
    pub mixed: String,
    pub table_background: String,
    pub grid: String,
    pub relation_foreground: String,
    pub relation_background: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            hard: "red".to_string(),
            soft: "green".to_string(),
            mixed: "blue".to_string(),
            table_background: "lightgrey".to_string(),
            grid: "white".to_string(),
            relation_foreground: "black".to_string(),
            relation_background: "beige".to_string(),
        }
    }
}

impl Palette {
    /// Edge color for an aggregated relation type
    pub fn relation_color(&self, relation_type: RelationType) -> &str {
        match relation_type {
            RelationType::Hard => &self.hard,
            RelationType::Soft => &self.soft,
            RelationType::Mixed => &self.mixed,
        }
    }
}

/// Where rendered output goes and how it is laid out
#[derive(Debug, Clone, Default)]
pub struct RenderConfig {
    pub layout: Layout,
    /// Target file; standard output when unset
    pub output: Option<PathBuf>,
    pub palette: Palette,
}

impl RenderConfig {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            ..Self::default()
        }
    }

    /// Write rendered text to the configured sink, replacing any existing file
    pub fn emit(&self, text: &str) -> std::io::Result<()> {
        match &self.output {
            Some(path) => std::fs::write(path, text),
            None => {
                let stdout = std::io::stdout();
                let mut handle = stdout.lock();
                handle.write_all(text.as_bytes())?;
                handle.flush()
            }
        }
    }
}

/// A graph description generator
pub trait Renderer {
    /// Registry name, e.g. `dot-full`
    fn name(&self) -> &'static str;

    /// One-line summary shown by `dbview list exporters`
    fn description(&self) -> &'static str;

    /// Render `tables` (all tables when empty).
    ///
    /// Relations whose other end falls outside the subset are left out.
    fn render(&self, db: &Database, tables: &[TableId], config: &RenderConfig) -> Result<String>;
}

/// Validated, deduplicated table subset plus a membership set
pub(crate) struct Subset {
    pub tables: Vec<TableId>,
    members: AHashSet<TableId>,
}

impl Subset {
    pub fn resolve(db: &Database, tables: &[TableId]) -> Result<Self> {
        let requested = if tables.is_empty() {
            db.table_ids()
        } else {
            tables.to_vec()
        };

        let mut members = AHashSet::new();
        let mut ordered = Vec::with_capacity(requested.len());
        for id in requested {
            db.table(id)?;
            if members.insert(id) {
                ordered.push(id);
            }
        }

        Ok(Self {
            tables: ordered,
            members,
        })
    }

    pub fn contains(&self, id: TableId) -> bool {
        self.members.contains(&id)
    }

    /// Related (dependent, reference) pairs with both ends inside the subset
    pub fn relations(&self, db: &Database) -> Result<Vec<(TableId, TableId)>> {
        let mut pairs = Vec::new();
        for &dependent in &self.tables {
            for reference in db.reference_tables(dependent)? {
                if self.contains(reference) {
                    pairs.push((dependent, reference));
                }
            }
        }
        Ok(pairs)
    }
}

/// Edge color of a relation, failing when the pair is unrelated
pub(crate) fn relation_color(
    db: &Database,
    config: &RenderConfig,
    dependent: TableId,
    reference: TableId,
) -> Result<String> {
    let relation_type = db.relation_type(dependent, reference)?;
    Ok(dot::escape_label(config.palette.relation_color(relation_type)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_aliases() {
        assert_eq!("h".parse::<Layout>().unwrap(), Layout::LR);
        assert_eq!("Vertical".parse::<Layout>().unwrap(), Layout::TB);
        assert!("diagonal".parse::<Layout>().is_err());
    }

    #[test]
    fn test_detail_exporter_names() {
        assert_eq!(Detail::Full.exporter(), "dot-full");
        assert_eq!("m".parse::<Detail>().unwrap(), Detail::Medium);
        assert_eq!(Detail::Light.to_string(), "light");
    }
}
