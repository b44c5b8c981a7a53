//! Unit tests for the DOT renderers.

use dbview::graph::dot::{cluster_id, index_node_id, node_id, relation_node_id};
use dbview::graph::{DotFull, DotLight, DotMedium, ExporterCatalog, Layout, RenderConfig, Renderer};
use dbview::loader::Loader;
use dbview::schema::{Database, LinkKind, TableId};

const SCHEMA: &str = r#"
CREATE TABLE customers (
  id INT NOT NULL,
  email VARCHAR(255),
  PRIMARY KEY (id)
);
CREATE TABLE orders (
  id INT NOT NULL,
  customer_id INT NOT NULL,
  status VARCHAR(16) NOT NULL,
  created_at DATETIME NOT NULL,
  PRIMARY KEY (id),
  KEY idx_status_created (status, created_at),
  FOREIGN KEY (customer_id) REFERENCES customers (id)
);
CREATE TABLE categories (
  id INT NOT NULL,
  parent_id INT,
  PRIMARY KEY (id),
  FOREIGN KEY (parent_id) REFERENCES categories (id)
);
CREATE TABLE products (
  id INT NOT NULL,
  category_id INT NOT NULL,
  warehouse_id INT,
  PRIMARY KEY (id),
  FOREIGN KEY (category_id) REFERENCES categories (id),
  FOREIGN KEY (warehouse_id) REFERENCES warehouses (id)
);
"#;

fn load() -> Database {
    Loader::new().database_name("shop").load_str(SCHEMA).unwrap()
}

fn lr() -> RenderConfig {
    RenderConfig::new(Layout::LR)
}

/// Node ids of every table outside `kept`
fn foreign_ids(db: &Database, kept: &[&str]) -> Vec<String> {
    db.tables()
        .map(|t| t.name())
        .filter(|name| !kept.contains(name))
        .flat_map(|name| [node_id(name), cluster_id(name)])
        .collect()
}

mod common_tests {
    use super::*;

    #[test]
    fn test_header_and_layout() {
        let db = load();
        for renderer in ExporterCatalog::with_builtins().instances() {
            let lr_out = renderer.render(&db, &[], &lr()).unwrap();
            assert!(lr_out.starts_with("digraph G {\n  rankdir=LR;\n  compound=true;\n"));
            assert!(lr_out.ends_with("}\n"));

            let tb_out = renderer
                .render(&db, &[], &RenderConfig::new(Layout::TB))
                .unwrap();
            assert!(tb_out.contains("rankdir=TB;"));
        }
    }

    #[test]
    fn test_subset_never_references_outside_tables() {
        let db = load();
        let subset = vec![db.require_table("orders").unwrap()];
        let outside = foreign_ids(&db, &["orders"]);

        for renderer in ExporterCatalog::with_builtins().instances() {
            let out = renderer.render(&db, &subset, &lr()).unwrap();
            assert!(out.contains(&node_id("orders")), "{}", renderer.name());
            for id in &outside {
                assert!(!out.contains(id.as_str()), "{} leaked {}", renderer.name(), id);
            }
            assert!(!out.contains("->"), "{}", renderer.name());
        }
    }

    #[test]
    fn test_output_is_deterministic() {
        let db = load();
        for renderer in ExporterCatalog::with_builtins().instances() {
            let first = renderer.render(&db, &[], &lr()).unwrap();
            let second = renderer.render(&load(), &[], &lr()).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_unknown_table_in_subset() {
        let db = load();
        assert!(DotLight.render(&db, &[TableId(99)], &lr()).is_err());
    }

    #[test]
    fn test_palette_colors_edges() {
        let db = load();
        let mut config = lr();
        config.palette.hard = "darkred".to_string();
        let out = DotLight.render(&db, &[], &config).unwrap();
        assert!(out.contains("color=\"darkred\""));
        assert!(!out.contains("color=\"red\""));
    }

    #[test]
    fn test_catalog() {
        let catalog = ExporterCatalog::with_builtins();
        assert_eq!(
            catalog.names().collect::<Vec<_>>(),
            vec!["dot-full", "dot-light", "dot-medium"]
        );
        for name in ["dot-full", "dot-medium", "dot-light"] {
            assert_eq!(catalog.create(name).unwrap().name(), name);
        }
        assert!(catalog.create("mermaid").is_err());
    }
}

mod full_tests {
    use super::*;

    #[test]
    fn test_table_cluster_and_markers() {
        let db = load();
        let out = DotFull.render(&db, &[], &lr()).unwrap();

        assert!(out.contains(&format!("subgraph {} {{", cluster_id("orders"))));
        assert!(out.contains("label=\"orders\";"));
        assert!(out.contains("{PRI|FK|-|-}"));
        assert!(out.contains("{UNI|-|-|-}"));
        assert!(out.contains("{id|customer_id|status|created_at}"));
        assert!(out.contains("{-|H|-|-}"));
        assert!(out.contains("DFK: warehouses.id"));
    }

    #[test]
    fn test_composite_index_node() {
        let db = load();
        let out = DotFull.render(&db, &[], &lr()).unwrap();
        assert!(out.contains(&index_node_id("orders")));
        assert!(out.contains("MUL:\\l - status\\l - created_at\\l"));
        assert!(!out.contains(&index_node_id("customers")));
    }

    #[test]
    fn test_relation_node_between_tables() {
        let db = load();
        let out = DotFull.render(&db, &[], &lr()).unwrap();
        let rel = relation_node_id("orders", "customers");

        assert!(out.contains(&format!("{} -> {} [", node_id("orders"), rel)));
        assert!(out.contains(&format!("{} -> {} [", rel, node_id("customers"))));
        assert!(out.contains(&format!("ltail=\"{}\"", cluster_id("orders"))));
        assert!(out.contains(&format!("lhead=\"{}\"", cluster_id("customers"))));
        // reference->dependent, source, destination, dependent->reference
        assert!(out.contains("{{*} | {customer_id} | {id} | {1}}"));
        assert!(out.contains("fillcolor=\"beige\""));
    }

    #[test]
    fn test_self_relation_through_relation_node() {
        let db = load();
        let out = DotFull.render(&db, &[], &lr()).unwrap();
        let rel = relation_node_id("categories", "categories");
        assert!(out.contains(&format!("{} -> {} [", node_id("categories"), rel)));
        assert!(out.contains(&format!("{} -> {} [", rel, node_id("categories"))));
    }
}

mod medium_tests {
    use super::*;

    #[test]
    fn test_field_names_only() {
        let db = load();
        let out = DotMedium.render(&db, &[], &lr()).unwrap();
        assert!(out.contains("label=\"{{id|customer_id|status|created_at}}\""));
        assert!(!out.contains("PRI"));
        assert!(!out.contains("MUL"));
    }

    #[test]
    fn test_one_midpoint_per_self_relation() {
        let mut db = load();
        let tags = db.add_table("tags").unwrap();
        let id = db.add_field(tags, "id").unwrap();
        let parent = db.add_field(tags, "parent_id").unwrap();
        db.mark_foreign_key(parent, id, LinkKind::Soft).unwrap();

        let out = DotMedium.render(&db, &[], &lr()).unwrap();
        assert_eq!(out.matches("shape=\"point\"").count(), 2);
        assert!(out.contains("loop_0 [shape=\"point\", width=\"0\", height=\"0\"];"));
        assert!(out.contains("loop_1 ["));
        assert!(!out.contains("loop_2"));

        let categories = node_id("categories");
        assert!(out.contains(&format!("{} -> loop_0 [", categories)));
        assert!(out.contains(&format!("loop_0 -> {} [", categories)));
        assert!(!out.contains(&format!("{} -> {}", categories, categories)));
    }

    #[test]
    fn test_edge_between_clusters() {
        let db = load();
        let out = DotMedium.render(&db, &[], &lr()).unwrap();
        assert!(out.contains(&format!(
            "{} -> {} [ltail=\"{}\", lhead=\"{}\", penwidth=\"2\", color=\"red\"];",
            node_id("products"),
            node_id("categories"),
            cluster_id("products"),
            cluster_id("categories")
        )));
    }
}

mod light_tests {
    use super::*;

    #[test]
    fn test_names_and_edges() {
        let db = load();
        let out = DotLight.render(&db, &[], &lr()).unwrap();

        assert!(out.contains(&format!(
            "{} [shape=\"record\", style=\"bold\", label=\"orders\"];",
            node_id("orders")
        )));
        assert!(out.contains(&format!(
            "{} -> {} [penwidth=\"2\", color=\"red\"];",
            node_id("orders"),
            node_id("customers")
        )));
        assert!(!out.contains("subgraph"));
        assert!(!out.contains("customer_id"));
    }

    #[test]
    fn test_zoomed_subset() {
        let db = load();
        let subset = db.zoom_by_names(&["products"], 1).unwrap();
        let out = DotLight.render(&db, &subset, &lr()).unwrap();

        assert!(out.contains(&node_id("products")));
        assert!(out.contains(&node_id("categories")));
        assert!(!out.contains(&node_id("orders")));
        assert!(!out.contains(&node_id("customers")));
    }
}
