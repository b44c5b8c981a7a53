//! Export command: render a (sub-)diagram with one of the registered exporters.

use super::InputArgs;
use crate::config::DbviewConfig;
use crate::graph::{Detail, ExporterCatalog, Layout, RenderConfig};
use crate::schema::{Database, TableId};
use ahash::AHashMap;
use anyhow::{bail, Result};
use glob::Pattern;
use petgraph::algo::astar;
use petgraph::graph::{EdgeIndex, EdgeReference, NodeIndex, UnGraph};
use petgraph::visit::{EdgeFiltered, EdgeRef};
use std::path::PathBuf;

/// Run the export command
#[allow(clippy::too_many_arguments)]
pub fn run(
    config: &DbviewConfig,
    input: InputArgs,
    detail: Option<String>,
    exporter: Option<String>,
    layout: Option<String>,
    output: Option<PathBuf>,
    zoom: Option<String>,
    zoom_level: usize,
    path_between: Option<String>,
    path_limit: usize,
    tables: Option<String>,
    exclude: Option<String>,
) -> Result<()> {
    let exporter = match exporter {
        Some(name) => name,
        None => detail
            .map(|d| d.parse::<Detail>())
            .transpose()
            .map_err(|e| anyhow::anyhow!("{}", e))?
            .unwrap_or(config.render.detail)
            .exporter()
            .to_string(),
    };
    let renderer = ExporterCatalog::with_builtins().create(&exporter)?;

    let layout = layout
        .map(|l| l.parse::<Layout>())
        .transpose()
        .map_err(|e| anyhow::anyhow!("{}", e))?
        .unwrap_or(config.render.layout);

    let db = input.load(config)?;

    let mut subset = if let Some(zoom) = zoom {
        let seeds = split_list(&zoom);
        let zoomed = db.zoom_by_names(&seeds, zoom_level)?;
        eprintln!(
            "Zoom: {} -> {} tables (level {})",
            seeds.join(", "),
            zoomed.len(),
            zoom_level
        );
        zoomed
    } else if let Some(pair) = path_between {
        let ends = split_list(&pair);
        let [from, to] = ends.as_slice() else {
            bail!("--path-between expects exactly two tables, got: {}", pair);
        };
        let on_paths = path_tables(&db, db.require_table(from)?, db.require_table(to)?, path_limit)?;
        eprintln!(
            "Paths: {} -> {} ({} tables on up to {} path(s))",
            from,
            to,
            on_paths.len(),
            path_limit
        );
        on_paths
    } else {
        db.table_ids()
    };

    if tables.is_some() || exclude.is_some() {
        subset = filter_tables(&db, subset, tables.as_deref(), exclude.as_deref());
        if subset.is_empty() {
            bail!("No tables left after applying --tables/--exclude filters");
        }
    }

    let render_config = RenderConfig {
        layout,
        output: output.clone(),
        palette: config.render.palette.clone(),
    };
    let content = renderer.render(&db, &subset, &render_config)?;
    render_config.emit(&content)?;

    if let Some(ref out_path) = output {
        eprintln!("Diagram written to: {}", out_path.display());
    }
    eprintln!(
        "{}: {} tables rendered with {} [layout: {}]",
        db.name(),
        if subset.is_empty() { db.len() } else { subset.len() },
        renderer.name(),
        layout
    );

    Ok(())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Apply include/exclude glob patterns, keeping order
fn filter_tables(
    db: &Database,
    subset: Vec<TableId>,
    include: Option<&str>,
    exclude: Option<&str>,
) -> Vec<TableId> {
    let compile = |list: &str| -> Vec<Pattern> {
        split_list(list)
            .iter()
            .filter_map(|p| Pattern::new(p).ok())
            .collect()
    };
    let include = include.map(compile);
    let exclude = exclude.map(compile).unwrap_or_default();

    subset
        .into_iter()
        .filter(|&id| {
            let Ok(table) = db.table(id) else {
                return false;
            };
            let name = table.name();
            let included = include
                .as_ref()
                .map(|patterns| patterns.iter().any(|p| p.matches(name)))
                .unwrap_or(true);
            included && !exclude.iter().any(|p| p.matches(name))
        })
        .collect()
}

/// Tables lying on the `limit` shortest simple paths between two tables
fn path_tables(db: &Database, from: TableId, to: TableId, limit: usize) -> Result<Vec<TableId>> {
    if from == to {
        return Ok(vec![from]);
    }

    let view = db.adjacency(&[])?;
    let mut graph: UnGraph<TableId, ()> = UnGraph::new_undirected();
    let mut nodes: AHashMap<TableId, NodeIndex> = AHashMap::new();
    for &table in &view.vertices {
        nodes.insert(table, graph.add_node(table));
    }
    for &(a, b) in &view.edges {
        if a != b {
            graph.add_edge(nodes[&a], nodes[&b], ());
        }
    }

    let paths = k_shortest_paths(&graph, nodes[&from], nodes[&to], limit.max(1), |n| {
        db.table(graph[n]).map(|t| t.name().to_string()).unwrap_or_default()
    });
    if paths.is_empty() {
        bail!(
            "No path between {} and {}",
            db.table(from)?.name(),
            db.table(to)?.name()
        );
    }

    let mut result = Vec::new();
    for path in &paths {
        for node in path {
            let table = graph[*node];
            if !result.contains(&table) {
                result.push(table);
            }
        }
    }
    Ok(result)
}

/// Yen's algorithm: up to `limit` loopless paths from `start` to `goal`,
/// shortest first, ties broken by the names along the path
fn k_shortest_paths<F>(
    graph: &UnGraph<TableId, ()>,
    start: NodeIndex,
    goal: NodeIndex,
    limit: usize,
    name_of: F,
) -> Vec<Vec<NodeIndex>>
where
    F: Fn(NodeIndex) -> String,
{
    let path_key = |path: &Vec<NodeIndex>| (path.len(), path.iter().map(|&n| name_of(n)).collect::<Vec<_>>());

    let Some(first) = shortest_path(graph, start, goal, &[], &[]) else {
        return Vec::new();
    };
    let mut accepted = vec![first];
    let mut candidates: Vec<Vec<NodeIndex>> = Vec::new();

    while accepted.len() < limit {
        let previous = accepted[accepted.len() - 1].clone();
        for i in 0..previous.len() - 1 {
            let root = &previous[..=i];
            let removed: Vec<EdgeIndex> = accepted
                .iter()
                .filter(|p| p.len() > i + 1 && p[..=i] == *root)
                .filter_map(|p| graph.find_edge(p[i], p[i + 1]))
                .collect();

            let Some(spur) = shortest_path(graph, previous[i], goal, &previous[..i], &removed) else {
                continue;
            };
            let mut candidate = previous[..i].to_vec();
            candidate.extend(spur);
            if !accepted.contains(&candidate) && !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }

        let Some(best) = (0..candidates.len()).min_by_key(|&c| path_key(&candidates[c])) else {
            break;
        };
        accepted.push(candidates.swap_remove(best));
    }

    accepted.sort_by_cached_key(path_key);
    accepted
}

/// Unit-weight shortest path avoiding the `blocked` nodes and `removed` edges
fn shortest_path(
    graph: &UnGraph<TableId, ()>,
    start: NodeIndex,
    goal: NodeIndex,
    blocked: &[NodeIndex],
    removed: &[EdgeIndex],
) -> Option<Vec<NodeIndex>> {
    let filtered = EdgeFiltered::from_fn(graph, |edge: EdgeReference<'_, ()>| {
        !removed.contains(&edge.id())
            && !blocked.contains(&edge.source())
            && !blocked.contains(&edge.target())
    });
    astar(&filtered, start, |n| n == goal, |_| 1usize, |_| 0).map(|(_, path)| path)
}
