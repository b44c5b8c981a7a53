//! Unit tests for the entity model and the relation index.

use ahash::AHashMap;
use dbview::error::SchemaError;
use dbview::schema::{
    cardinality_symbol, Database, FieldRef, Index, KeyKind, LinkKind, RelationType, TableId,
    MAX_1, MAX_N, MIN_0, MIN_1,
};
use std::collections::BTreeSet;

/// orders.customer_id -> customers.id, both ids primary keys
fn shop() -> (Database, TableId, TableId) {
    let mut db = Database::new("shop");
    let orders = db.add_table("orders").unwrap();
    let order_id = db.add_field(orders, "id").unwrap();
    let customer_id = db.add_field(orders, "customer_id").unwrap();
    let customers = db.add_table("customers").unwrap();
    let id = db.add_field(customers, "id").unwrap();

    db.field_mut(order_id).unwrap().mark_primary_key().unwrap();
    db.field_mut(id).unwrap().mark_primary_key().unwrap();
    db.mark_foreign_key(customer_id, id, LinkKind::Hard).unwrap();
    (db, orders, customers)
}

mod model_tests {
    use super::*;

    #[test]
    fn test_duplicate_table_rejected() {
        let mut db = Database::new("shop");
        db.add_table("orders").unwrap();
        let err = db.add_table("orders").unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateName { kind: "table", .. }));
        assert_eq!(db.len(), 1);
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let mut db = Database::new("shop");
        let t = db.add_table("orders").unwrap();
        db.add_field(t, "id").unwrap();
        let err = db.add_field(t, "id").unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateName { kind: "field", .. }));
        assert_eq!(db.table(t).unwrap().fields().len(), 1);
    }

    #[test]
    fn test_table_lookup_case_insensitive() {
        let (db, orders, _) = shop();
        assert_eq!(db.table_id("orders"), Some(orders));
        assert_eq!(db.table_id("ORDERS"), Some(orders));
        assert_eq!(db.table_id("missing"), None);
        assert!(matches!(
            db.require_table("missing"),
            Err(SchemaError::UnknownTable(_))
        ));
    }

    #[test]
    fn test_unknown_field() {
        let (db, _, _) = shop();
        assert!(matches!(
            db.field_ref("orders", "total"),
            Err(SchemaError::UnknownField { .. })
        ));
    }

    #[test]
    fn test_unknown_table_handle() {
        let (db, _, _) = shop();
        assert!(db.table(TableId(42)).is_err());
        assert!(db.reference_tables(TableId(42)).is_err());
    }

    #[test]
    fn test_foreign_key_sets_back_reference() {
        let (db, _, _) = shop();
        let source = db.field_ref("orders", "customer_id").unwrap();
        let target = db.field_ref("customers", "id").unwrap();

        let field = db.field(source).unwrap();
        assert!(field.is_foreign_key());
        assert_eq!(field.foreign_target(), Some(target));
        assert_eq!(field.link(), Some(LinkKind::Hard));
        assert_eq!(db.field(target).unwrap().referenced_by(), Some(source));
    }

    #[test]
    fn test_rekeying_foreign_key_fails() {
        let (mut db, _, _) = shop();
        let source = db.field_ref("orders", "customer_id").unwrap();
        let target = db.field_ref("orders", "id").unwrap();

        let err = db
            .mark_foreign_key(source, target, LinkKind::Soft)
            .unwrap_err();
        assert!(matches!(err, SchemaError::FieldAlreadyKeyed { .. }));
        assert!(db
            .field_mut(source)
            .unwrap()
            .mark_dead_foreign_key("ghosts", "id")
            .is_err());
    }

    #[test]
    fn test_dead_foreign_key_kept_out_of_relations() {
        let mut db = Database::new("shop");
        let t = db.add_table("orders").unwrap();
        let f = db.add_field(t, "warehouse_id").unwrap();
        db.field_mut(f)
            .unwrap()
            .mark_dead_foreign_key("warehouses", "id")
            .unwrap();

        let field = db.field(f).unwrap();
        assert!(field.is_dead_foreign_key());
        assert!(!field.is_foreign_key());
        match field.key() {
            KeyKind::DeadForeign(dead) => assert_eq!(dead.full_name(), "warehouses.id"),
            other => panic!("unexpected key {:?}", other),
        }
        assert_eq!(db.compute_relations().relation_count(), 0);
    }

    #[test]
    fn test_unique_from_index_or_sole_primary_key() {
        let mut db = Database::new("t");
        let t = db.add_table("pairs").unwrap();
        let a = db.add_field(t, "a").unwrap();
        let b = db.add_field(t, "b").unwrap();
        let c = db.add_field(t, "c").unwrap();
        db.field_mut(a).unwrap().mark_primary_key().unwrap();
        db.field_mut(b).unwrap().mark_primary_key().unwrap();
        db.table_mut(t)
            .unwrap()
            .add_index(Index::new("uniq_c", vec![c.field], true))
            .unwrap();

        let table = db.table(t).unwrap();
        assert!(!table.is_unique(a.field));
        assert!(!table.is_unique(b.field));
        assert!(table.is_unique(c.field));
    }

    #[test]
    fn test_display_dump() {
        let (db, _, _) = shop();
        let text = db.to_string();
        assert!(text.starts_with("shop\n\torders"));
        assert!(text.contains("\n\t\tPK orders.id"));
        assert!(text.contains("FK(ST) orders.customer_id => customers.id"));
        assert!(text.contains("PK customers.id <= orders.customer_id"));
    }
}

mod relation_tests {
    use super::*;

    #[test]
    fn test_shop_relation() {
        let (db, orders, customers) = shop();

        assert_eq!(db.reference_tables(orders).unwrap(), vec![customers]);
        assert_eq!(db.dependent_tables(customers).unwrap(), vec![orders]);
        assert_eq!(db.relation_type(orders, customers).unwrap(), RelationType::Hard);

        let joins = db.joins_between(orders, customers).unwrap();
        assert_eq!(joins.len(), 1);
        assert_eq!(joins[0].dependent_to_reference().unwrap(), "1");
        assert_eq!(joins[0].reference_to_dependent().unwrap(), "*");
    }

    #[test]
    fn test_unrelated_pair() {
        let (mut db, orders, _) = shop();
        let notes = db.add_table("notes").unwrap();
        db.add_field(notes, "body").unwrap();

        assert!(db.joins_between(orders, notes).unwrap().is_empty());
        assert!(matches!(
            db.relation_type(orders, notes),
            Err(SchemaError::NoSuchRelation { .. })
        ));
        // Direction matters
        let customers = db.require_table("customers").unwrap();
        assert!(db.relation_type(customers, orders).is_err());
    }

    #[test]
    fn test_nullable_unique_source() {
        let (mut db, orders, customers) = shop();
        let source = db.field_ref("orders", "customer_id").unwrap();
        db.field_mut(source).unwrap().mark_nullable();
        db.table_mut(orders)
            .unwrap()
            .add_index(Index::new("uniq_customer", vec![source.field], true))
            .unwrap();

        let join = &db.joins_between(orders, customers).unwrap()[0];
        assert_eq!((join.src_min, join.src_max), (MIN_0, MAX_1));
        assert_eq!(join.dependent_to_reference().unwrap(), "?");
        assert_eq!(join.reference_to_dependent().unwrap(), "?");
    }

    #[test]
    fn test_mixed_relation() {
        let mut db = Database::new("t");
        let users = db.add_table("users").unwrap();
        let id = db.add_field(users, "id").unwrap();
        let posts = db.add_table("posts").unwrap();
        let author = db.add_field(posts, "author_id").unwrap();
        let editor = db.add_field(posts, "editor_id").unwrap();
        db.mark_foreign_key(author, id, LinkKind::Hard).unwrap();
        db.mark_foreign_key(editor, id, LinkKind::Soft).unwrap();

        assert_eq!(db.relation_type(posts, users).unwrap(), RelationType::Mixed);
        let joins = db.joins_between(posts, users).unwrap();
        assert_eq!(joins.len(), 2);
        assert_eq!(joins[0].source, author);
        assert_eq!(joins[1].source, editor);
        // Last foreign key wins the back-reference
        assert_eq!(db.field(id).unwrap().referenced_by(), Some(editor));
    }

    #[test]
    fn test_index_rebuilt_after_mutation() {
        let (mut db, orders, _) = shop();
        assert_eq!(db.compute_relations().relation_count(), 1);
        assert!(db.has_relation_index());

        let items = db.add_table("items").unwrap();
        assert!(!db.has_relation_index());
        let order_id = db.add_field(items, "order_id").unwrap();
        let target = FieldRef::new(orders, db.table(orders).unwrap().field_id("id").unwrap());
        db.mark_foreign_key(order_id, target, LinkKind::Soft).unwrap();

        assert_eq!(db.compute_relations().relation_count(), 2);
        assert_eq!(db.relation_type(items, orders).unwrap(), RelationType::Soft);
    }

    #[test]
    fn test_relations_by_name() {
        let (db, _, _) = shop();
        assert_eq!(db.joins_between_names("orders", "customers").unwrap().len(), 1);
        assert_eq!(
            db.relation_type_by_names("ORDERS", "customers").unwrap(),
            RelationType::Hard
        );
        assert!(db.relation_type_by_names("orders", "ghosts").is_err());
    }

    #[test]
    fn test_cardinality_symbols() {
        assert_eq!(cardinality_symbol(MIN_0, MAX_1).unwrap(), "?");
        assert_eq!(cardinality_symbol(MIN_0, MAX_N).unwrap(), "*");
        assert_eq!(cardinality_symbol(MIN_1, MAX_1).unwrap(), "1");
        assert_eq!(cardinality_symbol(MIN_1, MAX_N).unwrap(), "+");
        assert!(matches!(
            cardinality_symbol(2, 5),
            Err(SchemaError::InvalidCardinality { min: 2, max: 5 })
        ));
    }
}

mod traversal_tests {
    use super::*;

    #[test]
    fn test_shop_zoom() {
        let (db, orders, customers) = shop();
        assert_eq!(db.zoom(&[orders], 0).unwrap(), vec![orders]);
        assert_eq!(db.zoom(&[orders], 1).unwrap(), vec![orders, customers]);
        assert_eq!(db.zoom_by_names(&["customers"], 1).unwrap(), vec![customers, orders]);
    }

    /// h <- a <- c <- d <- b -> h forms a cycle, e hangs off d and on itself, f stands alone
    fn cyclic() -> (Database, AHashMap<&'static str, TableId>) {
        let mut db = Database::new("cyclic");
        let mut ids = AHashMap::new();
        for name in ["h", "a", "b", "c", "d", "e", "f"] {
            let t = db.add_table(name).unwrap();
            db.add_field(t, "id").unwrap();
            ids.insert(name, t);
        }
        for (from, to) in [("a", "h"), ("b", "h"), ("c", "a"), ("d", "c"), ("b", "d"), ("e", "d"), ("e", "e")] {
            let source = db.add_field(ids[from], format!("{to}_id")).unwrap();
            let target = db.field_ref(to, "id").unwrap();
            db.mark_foreign_key(source, target, LinkKind::Hard).unwrap();
        }
        (db, ids)
    }

    #[test]
    fn test_zoom_levels_are_nested() {
        let (db, ids) = cyclic();
        let seeds = [ids["a"], ids["f"]];
        let set = |names: &[&str]| names.iter().map(|n| ids[n]).collect::<BTreeSet<_>>();

        let levels: Vec<BTreeSet<TableId>> = (0..6)
            .map(|level| db.zoom(&seeds, level).unwrap().into_iter().collect())
            .collect();
        for pair in levels.windows(2) {
            assert!(pair[0].is_subset(&pair[1]), "{:?} not within {:?}", pair[0], pair[1]);
        }

        assert_eq!(levels[0], set(&["a", "f"]));
        assert_eq!(levels[1], set(&["a", "f", "h", "c"]));
        assert_eq!(levels[2], set(&["a", "f", "h", "c", "b", "d"]));
        assert_eq!(levels[3], set(&["a", "f", "h", "c", "b", "d", "e"]));
        assert_eq!(levels[5], levels[3]);
    }

    #[test]
    fn test_self_reference_neighborhood() {
        let mut db = Database::new("t");
        let t = db.add_table("categories").unwrap();
        let id = db.add_field(t, "id").unwrap();
        let parent = db.add_field(t, "parent_id").unwrap();
        db.mark_foreign_key(parent, id, LinkKind::Hard).unwrap();

        assert_eq!(db.reference_tables(t).unwrap(), vec![t]);
        assert!(db.neighborhood(t).unwrap().is_empty());
        assert_eq!(db.zoom(&[t], 3).unwrap(), vec![t]);

        let view = db.adjacency(&[]).unwrap();
        assert_eq!(view.edges, vec![(t, t)]);
        assert!(view.neighbors(t).is_empty());
    }

    #[test]
    fn test_adjacency_restricted_to_subset() {
        let (mut db, orders, customers) = shop();
        let notes = db.add_table("notes").unwrap();
        let view = db.adjacency(&[orders, notes]).unwrap();
        assert_eq!(view.vertices, vec![orders, notes]);
        assert!(view.edges.is_empty());

        let full = db.adjacency(&[]).unwrap();
        assert_eq!(full.neighbors(customers), vec![orders]);
    }
}
