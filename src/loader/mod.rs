//! Builds the entity model from a SQL schema dump.
//!
//! Population happens in a fixed order: tables and fields, primary keys,
//! indexes, hard foreign keys, nullability, and last the soft foreign keys
//! guessed by an optional naming-convention detector.

pub mod compression;
pub mod ddl;
pub mod soft_fk;
pub mod statements;

pub use compression::Compression;
pub use ddl::{ColumnDef, ForeignKeyDef, IndexDef, SchemaBuilder, TableDef};
pub use soft_fk::{DetectorCatalog, FkUsTargetTableName, SoftForeignKeyDetector, TargetTableNameUsId};
pub use statements::{StatementReader, StatementType};

use crate::error::Result as SchemaResult;
use crate::schema::{Database, FieldRef, Index, LinkKind, TableId};
use anyhow::Context;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

/// Name of the implicit index backing a primary key
pub const PRIMARY_INDEX: &str = "PRIMARY";

/// Loads a [`Database`] from DDL
#[derive(Default)]
pub struct Loader {
    database_name: Option<String>,
    detector: Option<Box<dyn SoftForeignKeyDetector>>,
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the database name (defaults to the file stem)
    pub fn database_name(mut self, name: impl Into<String>) -> Self {
        self.database_name = Some(name.into());
        self
    }

    /// Guess soft foreign keys with the given detector
    pub fn soft_fk_detector(mut self, detector: Box<dyn SoftForeignKeyDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    /// Load a dump file, decompressing by extension
    pub fn load_path(&self, path: &Path) -> anyhow::Result<Database> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open input file: {}", path.display()))?;
        let compression = Compression::from_path(path);
        let reader = compression
            .wrap_reader(Box::new(file))
            .with_context(|| format!("Failed to open {} stream", compression))?;

        debug!(path = %path.display(), %compression, "loading schema dump");
        self.load_reader(reader, &default_database_name(path))
            .with_context(|| format!("Failed to load schema from {}", path.display()))
    }

    /// Load DDL from any reader
    pub fn load_reader<R: Read>(&self, reader: R, default_name: &str) -> anyhow::Result<Database> {
        let mut builder = SchemaBuilder::new();
        let mut statements = StatementReader::new(BufReader::with_capacity(64 * 1024, reader));

        while let Some(stmt) = statements.read_statement()? {
            match StatementType::classify(&stmt) {
                StatementType::CreateTable => {
                    builder.parse_create_table(&stmt);
                }
                StatementType::AlterTable => {
                    builder.parse_alter_table(&stmt);
                }
                StatementType::CreateIndex => {
                    builder.parse_create_index(&stmt);
                }
                StatementType::Unknown => {}
            }
        }

        let name = self.database_name.as_deref().unwrap_or(default_name);
        Ok(self.populate(name, &builder.build())?)
    }

    /// Load DDL held in memory
    pub fn load_str(&self, sql: &str) -> anyhow::Result<Database> {
        self.load_reader(sql.as_bytes(), "schema")
    }

    /// Turn parsed definitions into a database
    pub fn populate(&self, name: &str, tables: &[TableDef]) -> SchemaResult<Database> {
        let mut db = Database::new(name);

        let mut ids = Vec::with_capacity(tables.len());
        for def in tables {
            let id = db.add_table(&def.name)?;
            for column in &def.columns {
                db.add_field(id, &column.name)?;
            }
            ids.push(id);
        }

        for (def, &id) in tables.iter().zip(&ids) {
            add_primary_key(&mut db, id, def)?;
        }
        for (def, &id) in tables.iter().zip(&ids) {
            add_indexes(&mut db, id, def)?;
        }
        for (def, &id) in tables.iter().zip(&ids) {
            add_foreign_keys(&mut db, id, def)?;
            // Primary key columns are implicitly NOT NULL
            for column in def
                .columns
                .iter()
                .filter(|c| c.nullable && !def.primary_key.contains(&c.name))
            {
                let field = field_ref(&db, id, &column.name)?;
                db.field_mut(field)?.mark_nullable();
            }
        }

        if let Some(detector) = &self.detector {
            add_soft_foreign_keys(&mut db, detector.as_ref())?;
        }

        debug!(
            database = %db.name(),
            tables = db.len(),
            "schema loaded"
        );
        Ok(db)
    }
}

fn default_database_name(path: &Path) -> String {
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("schema");
    let name = Compression::strip_suffix(file_name);
    name.strip_suffix(".sql").unwrap_or(name).to_string()
}

fn field_ref(db: &Database, table: TableId, name: &str) -> SchemaResult<FieldRef> {
    db.field_ref(db.table(table)?.name(), name)
}

fn add_primary_key(db: &mut Database, id: TableId, def: &TableDef) -> SchemaResult<()> {
    if def.primary_key.is_empty() {
        return Ok(());
    }

    let mut fields = Vec::with_capacity(def.primary_key.len());
    for column in &def.primary_key {
        let field = field_ref(db, id, column)?;
        db.field_mut(field)?.mark_primary_key()?;
        fields.push(field.field);
    }
    db.table_mut(id)?
        .add_index(Index::new(PRIMARY_INDEX, fields, true))
}

fn add_indexes(db: &mut Database, id: TableId, def: &TableDef) -> SchemaResult<()> {
    for index in &def.indexes {
        let resolved: Option<Vec<FieldRef>> = index
            .columns
            .iter()
            .map(|c| field_ref(db, id, c).ok())
            .collect();
        let Some(fields) = resolved else {
            warn!(table = %def.name, index = %index.name, "index references unknown column, skipped");
            continue;
        };
        if fields.is_empty() {
            continue;
        }

        let table = db.table_mut(id)?;
        if table.indexes().iter().any(|i| i.name == index.name) {
            debug!(table = %def.name, index = %index.name, "duplicate index name, skipped");
            continue;
        }
        table.add_index(Index::new(
            &index.name,
            fields.iter().map(|f| f.field).collect(),
            index.unique,
        ))?;

        if let [single] = fields.as_slice() {
            let field = db.field_mut(*single)?;
            if index.unique {
                field.mark_unique_index();
            } else if !field.is_unique_index() {
                field.mark_multiple_index();
            }
        }
    }

    // The implicit primary index counts as a single-field unique index too
    let primary: Vec<_> = db
        .table(id)?
        .simple_indexes()
        .iter()
        .filter(|i| i.name == PRIMARY_INDEX)
        .flat_map(|i| i.fields.clone())
        .collect();
    for field in primary {
        db.field_mut(FieldRef::new(id, field))?.mark_unique_index();
    }
    Ok(())
}

fn add_foreign_keys(db: &mut Database, id: TableId, def: &TableDef) -> SchemaResult<()> {
    for fk in &def.foreign_keys {
        let target_table = db.table_id(&fk.referenced_table);
        let referenced_columns = if fk.referenced_columns.is_empty() {
            implicit_reference_columns(db, target_table)?
        } else {
            fk.referenced_columns.clone()
        };

        for (column, referenced) in fk.columns.iter().zip(&referenced_columns) {
            let Ok(source) = field_ref(db, id, column) else {
                warn!(table = %def.name, column = %column, "foreign key on unknown column, skipped");
                continue;
            };
            if db.field(source)?.is_foreign_key() || db.field(source)?.is_dead_foreign_key() {
                debug!(field = %db.field(source)?.full_name(), "column already keyed, extra constraint skipped");
                continue;
            }

            let target = target_table.and_then(|t| {
                db.table(t)
                    .ok()
                    .and_then(|table| table.field_id(referenced))
                    .map(|f| FieldRef::new(t, f))
            });
            match target {
                Some(target) => db.mark_foreign_key(source, target, LinkKind::Hard)?,
                None => {
                    warn!(
                        field = %db.field(source)?.full_name(),
                        target = %format!("{}.{}", fk.referenced_table, referenced),
                        "foreign key target not loaded, recorded as dead"
                    );
                    db.field_mut(source)?
                        .mark_dead_foreign_key(&fk.referenced_table, referenced)?;
                }
            }
        }
    }
    Ok(())
}

/// Columns referenced by `REFERENCES t` without a column list: the primary key of `t`
fn implicit_reference_columns(db: &Database, table: Option<TableId>) -> SchemaResult<Vec<String>> {
    let Some(table) = table else {
        return Ok(vec!["id".to_string()]);
    };
    let table = db.table(table)?;
    let columns: Vec<String> = table
        .primary_key()
        .into_iter()
        .filter_map(|f| table.field(f).map(|f| f.name().to_string()))
        .collect();
    if columns.is_empty() {
        Ok(vec!["id".to_string()])
    } else {
        Ok(columns)
    }
}

fn add_soft_foreign_keys(db: &mut Database, detector: &dyn SoftForeignKeyDetector) -> SchemaResult<()> {
    let mut guesses = Vec::new();
    for table in db.tables() {
        for field in table.fields() {
            if field.is_foreign_key() || field.is_dead_foreign_key() || !detector.is_fk(field.name()) {
                continue;
            }
            guesses.push((field.field_ref(), field.full_name(), field.name().to_string()));
        }
    }

    for (source, full_name, name) in guesses {
        let reference_field = detector.reference_field(&name);
        let target = detector
            .table_candidates(&name)
            .iter()
            .find_map(|t| db.field_ref(t, &reference_field).ok());

        match target {
            Some(target) => {
                debug!(field = %full_name, detector = detector.name(), "soft foreign key detected");
                db.mark_foreign_key(source, target, LinkKind::Soft)?;
            }
            None => warn!(
                field = %full_name,
                guess = %format!("{}.{}", detector.reference_table(&name), reference_field),
                "soft foreign key target not loaded, skipped"
            ),
        }
    }
    Ok(())
}
