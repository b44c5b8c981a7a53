use super::ListTarget;
use crate::graph::ExporterCatalog;
use crate::loader::DetectorCatalog;
use anyhow::Result;

/// Run the list command
pub fn run(what: ListTarget) -> Result<()> {
    let entries: Vec<(&'static str, &'static str)> = match what {
        ListTarget::Exporters => ExporterCatalog::with_builtins()
            .instances()
            .iter()
            .map(|e| (e.name(), e.description()))
            .collect(),
        ListTarget::Detectors => DetectorCatalog::with_builtins()
            .instances()
            .iter()
            .map(|d| (d.name(), d.description()))
            .collect(),
    };

    let width = entries.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    for (name, description) in entries {
        println!("{:width$}  {}", name, description, width = width);
    }
    Ok(())
}
