//! Table-to-table relations derived from foreign keys.
//!
//! Every live foreign key yields one [`FieldToFieldJoin`]. Joins sharing the
//! same (dependent, reference) table pair are grouped into a
//! [`TableToTableRelation`] whose [`RelationType`] summarizes their links.

use super::{Database, FieldRef, LinkKind, Table, TableId};
use crate::error::{Result, SchemaError};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

pub const MIN_0: u32 = 0;
pub const MIN_1: u32 = 1;
pub const MAX_1: u32 = 1;
/// Unbounded upper occurrence
pub const MAX_N: u32 = u32::MAX;

/// Crow's-foot style symbol for an occurrence range.
///
/// `?` zero or one, `*` zero or more, `1` exactly one, `+` one or more.
pub fn cardinality_symbol(min: u32, max: u32) -> Result<&'static str> {
    match (min, max) {
        (MIN_0, MAX_1) => Ok("?"),
        (MIN_0, MAX_N) => Ok("*"),
        (MIN_1, MAX_1) => Ok("1"),
        (MIN_1, MAX_N) => Ok("+"),
        _ => Err(SchemaError::InvalidCardinality { min, max }),
    }
}

/// Summary of the links of all joins between two tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationType {
    Soft,
    Hard,
    Mixed,
}

impl RelationType {
    pub fn from_link(link: LinkKind) -> Self {
        match link {
            LinkKind::Soft => RelationType::Soft,
            LinkKind::Hard => RelationType::Hard,
        }
    }

    /// Least upper bound of two types: equal types stay, anything else is mixed
    pub fn combine(self, other: RelationType) -> RelationType {
        if self == other {
            self
        } else {
            RelationType::Mixed
        }
    }

    /// Fold one more join link into a possibly undefined type
    pub fn merge(current: Option<RelationType>, link: LinkKind) -> RelationType {
        let incoming = RelationType::from_link(link);
        match current {
            None => incoming,
            Some(current) => current.combine(incoming),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RelationType::Soft => "soft",
            RelationType::Hard => "hard",
            RelationType::Mixed => "mixed",
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One foreign key seen as a join between two fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldToFieldJoin {
    /// Foreign key field (dependent side)
    pub source: FieldRef,
    /// Referenced field
    pub destination: FieldRef,
    pub src_min: u32,
    pub src_max: u32,
    pub dst_min: u32,
    pub dst_max: u32,
    pub link: LinkKind,
}

impl FieldToFieldJoin {
    fn derive(source_table: &Table, source: FieldRef, target_table: &Table, destination: FieldRef, link: LinkKind) -> Option<Self> {
        let src = source_table.field(source.field)?;
        let dst = target_table.field(destination.field)?;
        let (src_min, src_max) = occurrence(src.is_nullable(), source_table.is_unique(source.field));
        let (dst_min, dst_max) = occurrence(dst.is_nullable(), target_table.is_unique(destination.field));
        Some(Self {
            source,
            destination,
            src_min,
            src_max,
            dst_min,
            dst_max,
            link,
        })
    }

    /// Symbol drawn on the dependent-to-reference side
    pub fn dependent_to_reference(&self) -> Result<&'static str> {
        cardinality_symbol(self.src_min, self.dst_max)
    }

    /// Symbol drawn on the reference-to-dependent side
    pub fn reference_to_dependent(&self) -> Result<&'static str> {
        cardinality_symbol(MIN_0, self.src_max)
    }
}

fn occurrence(nullable: bool, unique: bool) -> (u32, u32) {
    let min = if nullable { MIN_0 } else { MIN_1 };
    let max = if unique { MAX_1 } else { MAX_N };
    (min, max)
}

/// All joins from one dependent table to one reference table
#[derive(Debug, Clone, Default)]
pub struct TableToTableRelation {
    joins: Vec<FieldToFieldJoin>,
    relation_type: Option<RelationType>,
}

impl TableToTableRelation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, join: FieldToFieldJoin) {
        self.relation_type = Some(RelationType::merge(self.relation_type, join.link));
        self.joins.push(join);
    }

    pub fn joins(&self) -> &[FieldToFieldJoin] {
        &self.joins
    }

    /// `None` only while no join has been added
    pub fn relation_type(&self) -> Option<RelationType> {
        self.relation_type
    }
}

/// Relations keyed by dependent table, then by reference table
#[derive(Debug, Default)]
pub struct RelationIndex {
    outgoing: BTreeMap<TableId, BTreeMap<TableId, TableToTableRelation>>,
}

impl RelationIndex {
    /// Scan every foreign key of the database
    pub fn build(db: &Database) -> Self {
        let mut outgoing: BTreeMap<TableId, BTreeMap<TableId, TableToTableRelation>> =
            BTreeMap::new();

        for table in db.tables() {
            for field in table.foreign_keys() {
                let (Some(target), Some(link)) = (field.foreign_target(), field.link()) else {
                    continue;
                };
                let Ok(target_table) = db.table(target.table) else {
                    continue;
                };
                let Some(join) =
                    FieldToFieldJoin::derive(table, field.field_ref(), target_table, target, link)
                else {
                    continue;
                };
                outgoing
                    .entry(table.id())
                    .or_default()
                    .entry(target.table)
                    .or_default()
                    .push(join);
            }
        }

        Self { outgoing }
    }

    /// Relations whose dependent side is `table`, ordered by reference table
    pub fn outgoing(&self, table: TableId) -> impl Iterator<Item = (TableId, &TableToTableRelation)> {
        self.outgoing
            .get(&table)
            .into_iter()
            .flat_map(|m| m.iter().map(|(&id, rel)| (id, rel)))
    }

    pub fn relation(&self, dependent: TableId, reference: TableId) -> Option<&TableToTableRelation> {
        self.outgoing.get(&dependent)?.get(&reference)
    }

    /// Every relation as (dependent, reference, relation)
    pub fn iter(&self) -> impl Iterator<Item = (TableId, TableId, &TableToTableRelation)> {
        self.outgoing
            .iter()
            .flat_map(|(&dep, m)| m.iter().map(move |(&r, rel)| (dep, r, rel)))
    }

    pub fn relation_count(&self) -> usize {
        self.outgoing.values().map(|m| m.len()).sum()
    }

    pub fn join_count(&self) -> usize {
        self.iter().map(|(_, _, rel)| rel.joins().len()).sum()
    }
}

impl Database {
    /// Build the relation index on first call and return the cached one after
    pub fn compute_relations(&self) -> &RelationIndex {
        self.relations.get_or_init(|| {
            let index = RelationIndex::build(self);
            debug!(
                database = %self.name,
                relations = index.relation_count(),
                joins = index.join_count(),
                "relation index built"
            );
            index
        })
    }

    /// Whether the relation index is currently cached
    pub fn has_relation_index(&self) -> bool {
        self.relations.get().is_some()
    }

    /// Joins from `dependent` to `reference`; empty when they are unrelated
    pub fn joins_between(&self, dependent: TableId, reference: TableId) -> Result<&[FieldToFieldJoin]> {
        self.table(dependent)?;
        self.table(reference)?;
        Ok(self
            .compute_relations()
            .relation(dependent, reference)
            .map(|rel| rel.joins())
            .unwrap_or(&[]))
    }

    /// Type of the relation from `dependent` to `reference`
    pub fn relation_type(&self, dependent: TableId, reference: TableId) -> Result<RelationType> {
        let dep = self.table(dependent)?;
        let reference_table = self.table(reference)?;
        self.compute_relations()
            .relation(dependent, reference)
            .and_then(|rel| rel.relation_type())
            .ok_or_else(|| SchemaError::NoSuchRelation {
                dependent: dep.name().to_string(),
                reference: reference_table.name().to_string(),
            })
    }

    /// [`Database::joins_between`] by table names
    pub fn joins_between_names(&self, dependent: &str, reference: &str) -> Result<&[FieldToFieldJoin]> {
        self.joins_between(self.require_table(dependent)?, self.require_table(reference)?)
    }

    /// [`Database::relation_type`] by table names
    pub fn relation_type_by_names(&self, dependent: &str, reference: &str) -> Result<RelationType> {
        self.relation_type(self.require_table(dependent)?, self.require_table(reference)?)
    }
}
