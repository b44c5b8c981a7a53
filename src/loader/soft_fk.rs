//! Naming-convention detectors for foreign keys that have no constraint.

use crate::registry::Registry;

/// Guesses foreign keys from field names alone
pub trait SoftForeignKeyDetector {
    /// Registry name, e.g. `fk-us-target-table-name`
    fn name(&self) -> &'static str;

    /// One-line summary shown by `dbview list detectors`
    fn description(&self) -> &'static str;

    /// Whether the field name follows this convention
    fn is_fk(&self, field: &str) -> bool;

    /// Referenced table guessed from the field name
    fn reference_table(&self, field: &str) -> String;

    /// Referenced field guessed from the field name
    fn reference_field(&self, field: &str) -> String;

    /// Table names to try in order; the first one that is loaded wins
    fn table_candidates(&self, field: &str) -> Vec<String> {
        vec![self.reference_table(field)]
    }
}

/// `fk_<table>` points to `<table>.id`
pub struct FkUsTargetTableName;

impl SoftForeignKeyDetector for FkUsTargetTableName {
    fn name(&self) -> &'static str {
        "fk-us-target-table-name"
    }

    fn description(&self) -> &'static str {
        "fk_<table> references <table>.id"
    }

    fn is_fk(&self, field: &str) -> bool {
        field.len() >= 4 && field.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("fk_"))
    }

    fn reference_table(&self, field: &str) -> String {
        field.get(3..).unwrap_or_default().to_string()
    }

    fn reference_field(&self, _field: &str) -> String {
        "id".to_string()
    }
}

/// `<table>_id` points to `<table>.id`, or `<table>s.id`
pub struct TargetTableNameUsId;

impl SoftForeignKeyDetector for TargetTableNameUsId {
    fn name(&self) -> &'static str {
        "target-table-name-us-id"
    }

    fn description(&self) -> &'static str {
        "<table>_id references <table>.id (plural <table>s also tried)"
    }

    fn is_fk(&self, field: &str) -> bool {
        field.len() > 3 && field.to_ascii_lowercase().ends_with("_id")
    }

    fn reference_table(&self, field: &str) -> String {
        field
            .get(..field.len().saturating_sub(3))
            .unwrap_or(field)
            .to_string()
    }

    fn reference_field(&self, _field: &str) -> String {
        "id".to_string()
    }

    fn table_candidates(&self, field: &str) -> Vec<String> {
        let table = self.reference_table(field);
        let plural = format!("{}s", table);
        vec![table, plural]
    }
}

/// Registered detectors, keyed by detector name
pub type DetectorCatalog = Registry<dyn SoftForeignKeyDetector>;

impl DetectorCatalog {
    /// Catalog holding the built-in naming conventions
    pub fn with_builtins() -> Self {
        let mut catalog: Self = Registry::new("soft foreign key detector");
        catalog
            .register("fk-us-target-table-name", || Box::new(FkUsTargetTableName))
            .register("target-table-name-us-id", || Box::new(TargetTableNameUsId));
        catalog
    }
}
