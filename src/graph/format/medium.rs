//! Medium detail tier: one cluster per table listing field names.

use super::dot::{cluster_id, escape_label, escape_record, node_id, DiGraph, Edge, Grid, Node, Subgraph};
use super::{relation_color, RenderConfig, Renderer, Subset};
use crate::error::Result;
use crate::schema::{Database, TableId};

pub struct DotMedium;

impl Renderer for DotMedium {
    fn name(&self) -> &'static str {
        "dot-medium"
    }

    fn description(&self) -> &'static str {
        "Tables with field names only; relations as colored edges"
    }

    fn render(&self, db: &Database, tables: &[TableId], config: &RenderConfig) -> Result<String> {
        let subset = Subset::resolve(db, tables)?;
        let palette = &config.palette;
        let mut graph = DiGraph::new(config.layout);

        for &id in &subset.tables {
            let table = db.table(id)?;
            let mut grid = Grid::new(config.layout);
            for field in table.fields() {
                grid.push_row(vec![escape_record(field.name())]);
            }

            let mut cluster = Subgraph::new(cluster_id(table.name()))
                .attr("style", "filled")
                .attr("color", escape_label(&palette.table_background))
                .attr("label", escape_label(table.name()))
                .node_default("style", "filled")
                .node_default("color", escape_label(&palette.grid));
            cluster.add_node(
                Node::new(node_id(table.name()))
                    .attr("shape", "record")
                    .attr("label", grid.render()),
            );
            graph.add_subgraph(cluster);
        }

        // Clusters cannot carry a self-loop, so a self-relation goes through
        // a zero-size midpoint node.
        let mut midpoints = 0usize;
        for (dependent, reference) in subset.relations(db)? {
            let dep_name = db.table(dependent)?.name();
            let ref_name = db.table(reference)?.name();
            let color = relation_color(db, config, dependent, reference)?;

            if dependent != reference {
                graph.add_edge(
                    Edge::new(node_id(dep_name), node_id(ref_name))
                        .attr("ltail", cluster_id(dep_name))
                        .attr("lhead", cluster_id(ref_name))
                        .attr("penwidth", "2")
                        .attr("color", color),
                );
                continue;
            }

            let midpoint = format!("loop_{}", midpoints);
            midpoints += 1;
            graph.add_node(
                Node::new(&midpoint)
                    .attr("shape", "point")
                    .attr("width", "0")
                    .attr("height", "0"),
            );
            graph.add_edge(
                Edge::new(node_id(dep_name), &midpoint)
                    .attr("ltail", cluster_id(dep_name))
                    .attr("arrowhead", "none")
                    .attr("penwidth", "2")
                    .attr("color", &color),
            );
            graph.add_edge(
                Edge::new(&midpoint, node_id(dep_name))
                    .attr("lhead", cluster_id(dep_name))
                    .attr("penwidth", "2")
                    .attr("color", color),
            );
        }

        Ok(graph.render())
    }
}
