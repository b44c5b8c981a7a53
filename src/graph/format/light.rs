//! Light detail tier: table names and colored relation edges.

use super::dot::{escape_record, node_id, DiGraph, Edge, Node};
use super::{relation_color, RenderConfig, Renderer, Subset};
use crate::error::Result;
use crate::schema::{Database, TableId};

pub struct DotLight;

impl Renderer for DotLight {
    fn name(&self) -> &'static str {
        "dot-light"
    }

    fn description(&self) -> &'static str {
        "Table names only; relations as colored edges"
    }

    fn render(&self, db: &Database, tables: &[TableId], config: &RenderConfig) -> Result<String> {
        let subset = Subset::resolve(db, tables)?;
        let mut graph = DiGraph::new(config.layout);

        for &id in &subset.tables {
            let name = db.table(id)?.name();
            graph.add_node(
                Node::new(node_id(name))
                    .attr("shape", "record")
                    .attr("style", "bold")
                    .attr("label", escape_record(name)),
            );
        }

        for (dependent, reference) in subset.relations(db)? {
            let color = relation_color(db, config, dependent, reference)?;
            graph.add_edge(
                Edge::new(node_id(db.table(dependent)?.name()), node_id(db.table(reference)?.name()))
                    .attr("penwidth", "2")
                    .attr("color", color),
            );
        }

        Ok(graph.render())
    }
}
