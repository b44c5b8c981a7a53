//! Full detail tier: every field with its markers, composite indexes, and a
//! labeled node per relation carrying the joins and their cardinalities.

use super::dot::{
    cluster_id, escape_label, escape_record, index_node_id, node_id, relation_node_id, DiGraph,
    Edge, Grid, Node, Subgraph,
};
use super::{relation_color, Layout, RenderConfig, Renderer, Subset};
use crate::error::Result;
use crate::schema::{Database, Field, KeyKind, LinkKind, Table, TableId};

pub struct DotFull;

impl Renderer for DotFull {
    fn name(&self) -> &'static str {
        "dot-full"
    }

    fn description(&self) -> &'static str {
        "Tables with key, nullability, index and link markers; relations as join nodes"
    }

    fn render(&self, db: &Database, tables: &[TableId], config: &RenderConfig) -> Result<String> {
        let subset = Subset::resolve(db, tables)?;
        let palette = &config.palette;
        let mut graph = DiGraph::new(config.layout);

        for &id in &subset.tables {
            let table = db.table(id)?;
            let mut cluster = Subgraph::new(cluster_id(table.name()))
                .attr("style", "filled")
                .attr("color", escape_label(&palette.table_background))
                .attr("label", escape_label(table.name()))
                .node_default("style", "filled")
                .node_default("color", escape_label(&palette.grid));

            let table_node = node_id(table.name());
            if let Some(label) = index_label(table) {
                let index_node = index_node_id(table.name());
                cluster.add_node(
                    Node::new(&index_node)
                        .attr("shape", "record")
                        .attr("label", label),
                );
                if config.layout == Layout::TB {
                    cluster.add_edge(Edge::new(&table_node, &index_node).attr("style", "invis"));
                }
            }

            cluster.add_node(
                Node::new(&table_node)
                    .attr("shape", "record")
                    .attr("style", "bold")
                    .attr("label", field_grid(table, config)),
            );
            graph.add_subgraph(cluster);
        }

        for (dependent, reference) in subset.relations(db)? {
            let dep_name = db.table(dependent)?.name();
            let ref_name = db.table(reference)?.name();
            let color = relation_color(db, config, dependent, reference)?;
            let rel_node = relation_node_id(dep_name, ref_name);

            graph.add_node(
                Node::new(&rel_node)
                    .attr("shape", "record")
                    .attr("style", "filled")
                    .attr("color", escape_label(&palette.relation_foreground))
                    .attr("fillcolor", escape_label(&palette.relation_background))
                    .attr("label", join_grid(db, dependent, reference, config)?),
            );
            graph.add_edge(
                Edge::new(node_id(dep_name), &rel_node)
                    .attr("ltail", cluster_id(dep_name))
                    .attr("arrowhead", "none")
                    .attr("penwidth", "2")
                    .attr("color", &color),
            );
            graph.add_edge(
                Edge::new(&rel_node, node_id(ref_name))
                    .attr("lhead", cluster_id(ref_name))
                    .attr("penwidth", "2")
                    .attr("color", color),
            );
        }

        Ok(graph.render())
    }
}

fn field_grid(table: &Table, config: &RenderConfig) -> String {
    let mut grid = Grid::new(config.layout);
    for field in table.fields() {
        grid.push_row(vec![
            key_marker(field),
            if field.is_nullable() { "NULL" } else { "-" }.to_string(),
            index_marker(field).to_string(),
            escape_record(field.name()),
            link_marker(field).to_string(),
        ]);
    }
    grid.render()
}

fn key_marker(field: &Field) -> String {
    match field.key() {
        KeyKind::Primary => "PRI".to_string(),
        KeyKind::Foreign { .. } => "FK".to_string(),
        KeyKind::DeadForeign(dead) => format!("DFK: {}", escape_record(&dead.full_name())),
        KeyKind::None => "-".to_string(),
    }
}

fn index_marker(field: &Field) -> &'static str {
    if field.is_multiple_index() {
        "MUL"
    } else if field.is_unique_index() {
        "UNI"
    } else {
        "-"
    }
}

fn link_marker(field: &Field) -> &'static str {
    match field.link() {
        Some(LinkKind::Hard) => "H",
        Some(LinkKind::Soft) => "S",
        None => "-",
    }
}

/// One record field per composite index, listing its columns.
fn index_label(table: &Table) -> Option<String> {
    let mut indexes = table.composite_indexes();
    if indexes.is_empty() {
        return None;
    }
    indexes.sort_by(|a, b| a.name.cmp(&b.name));

    let cells: Vec<String> = indexes
        .iter()
        .map(|index| {
            let mut cell = String::from(if index.unique { "UNI:\\l" } else { "MUL:\\l" });
            for &field in &index.fields {
                let name = table.field(field).map(|f| f.name()).unwrap_or("?");
                cell.push_str(&format!(" - {}\\l", escape_record(name)));
            }
            cell
        })
        .collect();
    Some(cells.join("|"))
}

/// Rows of (reference to dependent, source field, destination field, dependent to reference)
fn join_grid(
    db: &Database,
    dependent: TableId,
    reference: TableId,
    config: &RenderConfig,
) -> Result<String> {
    let mut grid = Grid::new(config.layout);
    for join in db.joins_between(dependent, reference)? {
        grid.push_row(vec![
            join.reference_to_dependent()?.to_string(),
            escape_record(db.field(join.source)?.name()),
            escape_record(db.field(join.destination)?.name()),
            join.dependent_to_reference()?.to_string(),
        ]);
    }
    Ok(grid.render())
}
