//! Schema entity model and everything derived from it.
//!
//! This module provides:
//! - Data models for databases, tables, fields and indexes
//! - Foreign key and "dead" foreign key classification of fields
//! - The table-to-table relation index (see [`relation`])
//! - Neighborhood and zoom traversal over that index (see [`graph`])

pub mod graph;
pub mod relation;

pub use graph::AdjacencyView;
pub use relation::{
    cardinality_symbol, FieldToFieldJoin, RelationIndex, RelationType, TableToTableRelation,
    MAX_1, MAX_N, MIN_0, MIN_1,
};

use crate::error::{Result, SchemaError};
use ahash::AHashMap;
use std::fmt;
use std::sync::OnceLock;

/// Unique identifier for a table within a database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(pub u32);

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TableId({})", self.0)
    }
}

/// Unique identifier for a field within a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(pub u16);

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldId({})", self.0)
    }
}

/// Handle to a field anywhere in the database.
///
/// Foreign keys and their back-references are stored as handles, never as
/// mutual references between fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldRef {
    pub table: TableId,
    pub field: FieldId,
}

impl FieldRef {
    pub fn new(table: TableId, field: FieldId) -> Self {
        Self { table, field }
    }
}

/// Whether a foreign key is enforced by a constraint or inferred from naming
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// Inferred purely from a naming convention
    Soft,
    /// Backed by an explicit constraint
    Hard,
}

impl LinkKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkKind::Soft => "soft",
            LinkKind::Hard => "hard",
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target of a foreign key whose table or field is not loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadForeignKey {
    /// Name of the referenced table
    pub table: String,
    /// Name of the referenced field
    pub field: String,
}

impl DeadForeignKey {
    pub fn new(table: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            field: field.into(),
        }
    }

    /// `table.field`
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.table, self.field)
    }
}

/// Key classification of a field
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum KeyKind {
    #[default]
    None,
    Primary,
    Foreign {
        target: FieldRef,
        link: LinkKind,
    },
    DeadForeign(DeadForeignKey),
}

/// Single-field index classification of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexKind {
    #[default]
    None,
    Unique,
    Multiple,
}

/// A table's field
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    id: FieldId,
    table: TableId,
    table_name: String,
    key: KeyKind,
    index: IndexKind,
    nullable: bool,
    referenced_by: Option<FieldRef>,
}

impl Field {
    fn new(name: String, id: FieldId, table: TableId, table_name: String) -> Self {
        Self {
            name,
            id,
            table,
            table_name,
            key: KeyKind::None,
            index: IndexKind::None,
            nullable: false,
            referenced_by: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> FieldId {
        self.id
    }

    /// Handle to this field
    pub fn field_ref(&self) -> FieldRef {
        FieldRef::new(self.table, self.id)
    }

    /// `table.field`
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.table_name, self.name)
    }

    pub fn key(&self) -> &KeyKind {
        &self.key
    }

    pub fn index(&self) -> IndexKind {
        self.index
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_primary_key(&self) -> bool {
        matches!(self.key, KeyKind::Primary)
    }

    pub fn is_foreign_key(&self) -> bool {
        matches!(self.key, KeyKind::Foreign { .. })
    }

    pub fn is_dead_foreign_key(&self) -> bool {
        matches!(self.key, KeyKind::DeadForeign(_))
    }

    pub fn is_unique_index(&self) -> bool {
        self.index == IndexKind::Unique
    }

    pub fn is_multiple_index(&self) -> bool {
        self.index == IndexKind::Multiple
    }

    /// Field this foreign key points to
    pub fn foreign_target(&self) -> Option<FieldRef> {
        match self.key {
            KeyKind::Foreign { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Hard/soft flag, only set for live foreign keys
    pub fn link(&self) -> Option<LinkKind> {
        match self.key {
            KeyKind::Foreign { link, .. } => Some(link),
            _ => None,
        }
    }

    pub fn dead_foreign_key(&self) -> Option<&DeadForeignKey> {
        match &self.key {
            KeyKind::DeadForeign(dead) => Some(dead),
            _ => None,
        }
    }

    /// Foreign key that points to this field, if any
    pub fn referenced_by(&self) -> Option<FieldRef> {
        self.referenced_by
    }

    pub fn mark_nullable(&mut self) {
        self.nullable = true;
    }

    pub fn mark_unique_index(&mut self) {
        self.index = IndexKind::Unique;
    }

    pub fn mark_multiple_index(&mut self) {
        self.index = IndexKind::Multiple;
    }

    pub fn mark_primary_key(&mut self) -> Result<()> {
        self.ensure_not_foreign("primary key")?;
        self.key = KeyKind::Primary;
        Ok(())
    }

    pub fn mark_dead_foreign_key(
        &mut self,
        table: impl Into<String>,
        field: impl Into<String>,
    ) -> Result<()> {
        self.ensure_not_foreign("dead foreign key")?;
        self.key = KeyKind::DeadForeign(DeadForeignKey::new(table, field));
        Ok(())
    }

    /// Only reachable through [`Database::mark_foreign_key`], which also
    /// records the back-reference on the target.
    fn set_foreign_key(&mut self, target: FieldRef, link: LinkKind) -> Result<()> {
        self.ensure_not_foreign("foreign key")?;
        self.key = KeyKind::Foreign { target, link };
        Ok(())
    }

    fn ensure_not_foreign(&self, requested: &str) -> Result<()> {
        let current = match self.key {
            KeyKind::Foreign { .. } => "foreign key",
            KeyKind::DeadForeign(_) => "dead foreign key",
            _ => return Ok(()),
        };
        Err(SchemaError::FieldAlreadyKeyed {
            field: self.full_name(),
            reason: format!("cannot mark a {current} as a {requested}"),
        })
    }

    fn index_tag(&self) -> &'static str {
        match self.index {
            IndexKind::Unique => "UI",
            IndexKind::Multiple => "MI",
            IndexKind::None => "ST",
        }
    }
}

/// Named index over one or more fields of a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    /// Index name
    pub name: String,
    /// Fields in index order
    pub fields: Vec<FieldId>,
    /// Whether this is a unique index
    pub unique: bool,
}

impl Index {
    pub fn new(name: impl Into<String>, fields: Vec<FieldId>, unique: bool) -> Self {
        Self {
            name: name.into(),
            fields,
            unique,
        }
    }
}

/// Positions of a table's indexes, split by field count
#[derive(Debug, Default)]
struct IndexPartition {
    simple: Vec<usize>,
    composite: Vec<usize>,
}

/// A database table
#[derive(Debug)]
pub struct Table {
    name: String,
    id: TableId,
    fields: Vec<Field>,
    field_ids: AHashMap<String, FieldId>,
    indexes: Vec<Index>,
    partition: OnceLock<IndexPartition>,
}

impl Table {
    fn new(name: String, id: TableId) -> Self {
        Self {
            name,
            id,
            fields: Vec::new(),
            field_ids: AHashMap::new(),
            indexes: Vec::new(),
            partition: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> TableId {
        self.id
    }

    /// Add a field at the end of the table
    pub fn add_field(&mut self, name: impl Into<String>) -> Result<FieldId> {
        let name = name.into();
        if self.field_ids.contains_key(&name) {
            return Err(SchemaError::DuplicateName {
                kind: "field",
                owner: format!("table \"{}\"", self.name),
                name,
            });
        }

        let id = u16::try_from(self.fields.len())
            .map(FieldId)
            .map_err(|_| SchemaError::TooManyFields {
                table: self.name.clone(),
                limit: usize::from(u16::MAX) + 1,
            })?;
        self.field_ids.insert(name.clone(), id);
        self.fields
            .push(Field::new(name, id, self.id, self.name.clone()));
        Ok(id)
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, id: FieldId) -> Option<&Field> {
        self.fields.get(id.0 as usize)
    }

    pub fn field_mut(&mut self, id: FieldId) -> Option<&mut Field> {
        self.fields.get_mut(id.0 as usize)
    }

    /// Get field ID by name (case-insensitive fallback)
    pub fn field_id(&self, name: &str) -> Option<FieldId> {
        if let Some(&id) = self.field_ids.get(name) {
            return Some(id);
        }
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .map(|f| f.id)
    }

    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.field_id(name).and_then(|id| self.field(id))
    }

    /// Live foreign keys in declaration order
    pub fn foreign_keys(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_foreign_key())
    }

    /// Primary key fields in declaration order
    pub fn primary_key(&self) -> Vec<FieldId> {
        self.fields
            .iter()
            .filter(|f| f.is_primary_key())
            .map(|f| f.id)
            .collect()
    }

    /// Register a named index
    pub fn add_index(&mut self, index: Index) -> Result<()> {
        if self.indexes.iter().any(|i| i.name == index.name) {
            return Err(SchemaError::DuplicateName {
                kind: "index",
                owner: format!("table \"{}\"", self.name),
                name: index.name,
            });
        }
        self.indexes.push(index);
        self.partition = OnceLock::new();
        Ok(())
    }

    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    /// Indexes made of exactly one field
    pub fn simple_indexes(&self) -> Vec<&Index> {
        self.partition()
            .simple
            .iter()
            .map(|&i| &self.indexes[i])
            .collect()
    }

    /// Indexes made of more than one field
    pub fn composite_indexes(&self) -> Vec<&Index> {
        self.partition()
            .composite
            .iter()
            .map(|&i| &self.indexes[i])
            .collect()
    }

    /// Whether the field holds at most one row per value.
    ///
    /// True for fields carrying a unique single-field index, and for the sole
    /// primary key field of the table.
    pub fn is_unique(&self, id: FieldId) -> bool {
        let Some(field) = self.field(id) else {
            return false;
        };
        if field.is_unique_index()
            || self
                .simple_indexes()
                .iter()
                .any(|index| index.unique && index.fields == [id])
        {
            return true;
        }
        field.is_primary_key() && self.fields.iter().filter(|f| f.is_primary_key()).count() == 1
    }

    fn partition(&self) -> &IndexPartition {
        self.partition.get_or_init(|| {
            let mut partition = IndexPartition::default();
            for (i, index) in self.indexes.iter().enumerate() {
                if index.fields.len() > 1 {
                    partition.composite.push(i);
                } else {
                    partition.simple.push(i);
                }
            }
            partition
        })
    }
}

/// Complete database: the root of the entity model.
///
/// The relation index is derived lazily on first use and cached; any mutable
/// access to the model drops the cache.
#[derive(Debug)]
pub struct Database {
    name: String,
    tables: Vec<Table>,
    table_ids: AHashMap<String, TableId>,
    relations: OnceLock<RelationIndex>,
}

impl Database {
    /// Create a new empty database
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Vec::new(),
            table_ids: AHashMap::new(),
            relations: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a new table, returning its ID
    pub fn add_table(&mut self, name: impl Into<String>) -> Result<TableId> {
        let name = name.into();
        if self.table_ids.contains_key(&name) {
            return Err(SchemaError::DuplicateName {
                kind: "table",
                owner: format!("database \"{}\"", self.name),
                name,
            });
        }

        let id = TableId(self.tables.len() as u32);
        self.table_ids.insert(name.clone(), id);
        self.tables.push(Table::new(name, id));
        self.invalidate_relations();
        Ok(id)
    }

    /// Add a field to a table, returning its handle
    pub fn add_field(&mut self, table: TableId, name: impl Into<String>) -> Result<FieldRef> {
        let table = self.table_mut(table)?;
        let field = table.add_field(name)?;
        Ok(FieldRef::new(table.id(), field))
    }

    /// Mark `source` as a foreign key pointing to `target`.
    ///
    /// The target keeps a single back-reference: the latest foreign key
    /// registered against it.
    pub fn mark_foreign_key(
        &mut self,
        source: FieldRef,
        target: FieldRef,
        link: LinkKind,
    ) -> Result<()> {
        // Resolve the target first so that a bad handle leaves the source untouched
        self.field(target)?;
        self.field_mut(source)?.set_foreign_key(target, link)?;
        self.field_mut(target)?.referenced_by = Some(source);
        Ok(())
    }

    /// Get table ID by name (case-insensitive fallback)
    pub fn table_id(&self, name: &str) -> Option<TableId> {
        if let Some(&id) = self.table_ids.get(name) {
            return Some(id);
        }
        self.tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
            .map(|t| t.id)
    }

    /// Resolve a table name, failing with [`SchemaError::UnknownTable`]
    pub fn require_table(&self, name: &str) -> Result<TableId> {
        self.table_id(name)
            .ok_or_else(|| SchemaError::UnknownTable(name.to_string()))
    }

    /// Get table by ID
    pub fn table(&self, id: TableId) -> Result<&Table> {
        self.tables
            .get(id.0 as usize)
            .ok_or_else(|| SchemaError::UnknownTable(id.to_string()))
    }

    /// Get mutable table by ID; drops the relation cache
    pub fn table_mut(&mut self, id: TableId) -> Result<&mut Table> {
        self.invalidate_relations();
        self.tables
            .get_mut(id.0 as usize)
            .ok_or_else(|| SchemaError::UnknownTable(id.to_string()))
    }

    /// Get table by name
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.table_id(name).map(|id| &self.tables[id.0 as usize])
    }

    pub fn field(&self, field: FieldRef) -> Result<&Field> {
        let table = self.table(field.table)?;
        table.field(field.field).ok_or_else(|| SchemaError::UnknownField {
            table: table.name().to_string(),
            field: field.field.to_string(),
        })
    }

    /// Get mutable field by handle; drops the relation cache
    pub fn field_mut(&mut self, field: FieldRef) -> Result<&mut Field> {
        let table = self.table_mut(field.table)?;
        let table_name = table.name.clone();
        table
            .field_mut(field.field)
            .ok_or_else(|| SchemaError::UnknownField {
                table: table_name,
                field: field.field.to_string(),
            })
    }

    /// Get a field handle by table and field name
    pub fn field_ref(&self, table: &str, field: &str) -> Result<FieldRef> {
        let table_id = self.require_table(table)?;
        let field_id = self.tables[table_id.0 as usize]
            .field_id(field)
            .ok_or_else(|| SchemaError::UnknownField {
                table: table.to_string(),
                field: field.to_string(),
            })?;
        Ok(FieldRef::new(table_id, field_id))
    }

    /// Iterate over all tables in insertion order
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter()
    }

    /// All table IDs in insertion order
    pub fn table_ids(&self) -> Vec<TableId> {
        self.tables.iter().map(|t| t.id).collect()
    }

    /// Names of the given tables, skipping unknown IDs
    pub fn table_names(&self, ids: &[TableId]) -> Vec<&str> {
        ids.iter()
            .filter_map(|id| self.tables.get(id.0 as usize))
            .map(|t| t.name.as_str())
            .collect()
    }

    /// Get the number of tables
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Check if the database is empty
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    fn invalidate_relations(&mut self) {
        self.relations.take();
    }

    fn describe_field(&self, field: &Field) -> String {
        let back = field
            .referenced_by
            .and_then(|r| self.field(r).ok())
            .map(|f| format!(" <= {}", f.full_name()))
            .unwrap_or_default();

        if field.is_primary_key() {
            return format!("PK {}{}", field.full_name(), back);
        }

        let tag = field.index_tag();
        match &field.key {
            KeyKind::Foreign { target, .. } => {
                let target = self
                    .field(*target)
                    .map(|f| f.full_name())
                    .unwrap_or_else(|_| "?".to_string());
                format!("FK({}) {} => {}{}", tag, field.full_name(), target, back)
            }
            KeyKind::DeadForeign(dead) => format!(
                "DFK({}) {} => {}{}",
                tag,
                field.full_name(),
                dead.full_name(),
                back
            ),
            _ => format!("{} {}{}", tag, field.full_name(), back),
        }
    }
}

impl fmt::Display for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for table in &self.tables {
            write!(f, "\n\t{}", table.name)?;
            for field in &table.fields {
                write!(f, "\n\t\t{}", self.describe_field(field))?;
            }
        }
        Ok(())
    }
}
