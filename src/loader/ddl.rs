//! DDL parsing for schema extraction.
//!
//! Parses CREATE TABLE, ALTER TABLE and CREATE INDEX statements into plain
//! definitions:
//! - Column names and nullability
//! - Primary key constraints (inline and table level)
//! - Unique constraints and secondary indexes
//! - Foreign key constraints (table level, inline `REFERENCES`, `ALTER TABLE`)
//!
//! Names are kept as written; resolution against the entity model happens in
//! the loader.

use once_cell::sync::Lazy;
use regex::Regex;

/// Optional `schema.` qualifiers in front of a table name
const QUALIFIER: &str = r#"(?:[\[\]`"\w]+\s*\.\s*)*"#;

/// One identifier, optionally wrapped in backticks, double quotes or brackets
const QUOTED_NAME: &str = r#"[\[`"]?([^\[\]`"\s(]+)[\]`"]?"#;

static CREATE_TABLE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)CREATE\s+TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?{QUALIFIER}{QUOTED_NAME}"
    ))
    .unwrap()
});

static ALTER_TABLE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)ALTER\s+TABLE\s+(?:ONLY\s+)?(?:IF\s+EXISTS\s+)?{QUALIFIER}{QUOTED_NAME}"
    ))
    .unwrap()
});

/// Column name then its type keyword
static COLUMN_DEF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*[\[`"]?([^\[\]`"\s,]+)[\]`"]?\s+(\w+)"#).unwrap()
});

/// `PRIMARY KEY [CLUSTERED|NONCLUSTERED] (cols)`
static PRIMARY_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)PRIMARY\s+KEY\s*(?:CLUSTERED\s+|NONCLUSTERED\s+)?\(([^)]+)\)").unwrap()
});

static INLINE_PRIMARY_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bPRIMARY\s+KEY\b").unwrap());

static INLINE_UNIQUE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bUNIQUE\b").unwrap());

/// `[CONSTRAINT name] FOREIGN KEY [name] (cols) REFERENCES table (cols)`
static FOREIGN_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r#"(?i)(?:CONSTRAINT\s+[\[`"]?([^\[\]`"\s]+)[\]`"]?\s+)?FOREIGN\s+KEY\s*(?:[\[`"]?\w+[\]`"]?\s*)?\(([^)]+)\)\s*REFERENCES\s+{QUALIFIER}{QUOTED_NAME}\s*\(([^)]+)\)"#
    ))
    .unwrap()
});

/// Column-level `REFERENCES table [(cols)]`
static INLINE_REFERENCES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\bREFERENCES\s+{QUALIFIER}{QUOTED_NAME}\s*(?:\(([^)]+)\))?"
    ))
    .unwrap()
});

/// Table body entries that declare a key, index or check rather than a column
static CONSTRAINT_START_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:PRIMARY\s+KEY|CONSTRAINT\s|FOREIGN\s+KEY|KEY\s|INDEX\s|UNIQUE[\s(]|FULLTEXT\s|SPATIAL\s|CHECK[\s(]|EXCLUDE\s)",
    )
    .unwrap()
});

static NOT_NULL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bNOT\s+NULL\b").unwrap());

/// `UNIQUE (a, b)`, `UNIQUE KEY uq (a)` and `CONSTRAINT uq UNIQUE (a)`
static UNIQUE_CONSTRAINT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)^(?:CONSTRAINT\s+[\[`"]?(\w+)[\]`"]?\s+)?UNIQUE\s*(?:(?:KEY|INDEX)\b\s*)?(?:[\[`"]?(\w+)[\]`"]?\s*)?\(([^)]+)\)"#,
    )
    .unwrap()
});

/// `KEY name (cols)` or `INDEX name [USING method] (cols)` inside a table body
static INLINE_INDEX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^(?:INDEX|KEY)\s+[\[`"]?(\w+)[\]`"]?\s*(?:USING\s+\w+\s*)?\(([^)]+)\)"#).unwrap()
});

/// Standalone `CREATE [UNIQUE] INDEX name ON table (cols)` with dialect modifiers
static CREATE_INDEX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r#"(?i)CREATE\s+(UNIQUE\s+)?(?:CLUSTERED\s+|NONCLUSTERED\s+)?INDEX\s+(?:CONCURRENTLY\s+)?(?:IF\s+NOT\s+EXISTS\s+)?[\[`"]?(\w+)[\]`"]?\s+ON\s+(?:ONLY\s+)?{QUALIFIER}[\[`"]?(\w+)[\]`"]?\s*(?:USING\s+\w+\s*)?\(([^)]+)\)"#
    ))
    .unwrap()
});

/// A column as declared
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub nullable: bool,
}

/// A foreign key constraint, possibly spanning several columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyDef {
    pub name: Option<String>,
    pub columns: Vec<String>,
    pub referenced_table: String,
    /// Empty when the constraint points at the referenced table's primary key implicitly
    pub referenced_columns: Vec<String>,
}

/// A named index or unique constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDef {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

/// Everything extracted for one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<ForeignKeyDef>,
    pub indexes: Vec<IndexDef>,
}

impl TableDef {
    fn new(name: String) -> Self {
        Self {
            name,
            columns: Vec::new(),
            primary_key: Vec::new(),
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
        }
    }

    fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name.eq_ignore_ascii_case(name))
    }

    fn add_primary_key_column(&mut self, name: &str) {
        if let Some(col) = self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name)) {
            if !self.primary_key.iter().any(|p| p.eq_ignore_ascii_case(&col.name)) {
                self.primary_key.push(col.name.clone());
            }
        }
    }

    fn add_index(&mut self, index: IndexDef) {
        if !self.indexes.iter().any(|i| i.name == index.name) {
            self.indexes.push(index);
        }
    }
}

/// Builder collecting table definitions from DDL statements
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    tables: Vec<TableDef>,
}

impl SchemaBuilder {
    /// Create a new schema builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a CREATE TABLE statement and record the table.
    ///
    /// A second definition of an already known table is ignored.
    pub fn parse_create_table(&mut self, stmt: &str) -> Option<&TableDef> {
        let table_name = extract_create_table_name(stmt)?;

        if let Some(pos) = self.position(&table_name) {
            return self.tables.get(pos);
        }

        let body = extract_table_body(stmt)?;
        let mut table = TableDef::new(table_name);
        parse_table_body(&body, &mut table);

        self.tables.push(table);
        self.tables.last()
    }

    /// Parse an ALTER TABLE statement and update the existing table
    pub fn parse_alter_table(&mut self, stmt: &str) -> Option<&TableDef> {
        let caps = ALTER_TABLE_NAME_RE.captures(stmt)?;
        let table_name = caps.get(1)?.as_str();
        let actions = &stmt[caps.get(0)?.end()..];
        let pos = self.position(table_name)?;
        let table = &mut self.tables[pos];

        table.foreign_keys.extend(parse_foreign_keys(actions));

        if let Some(cols) = parse_primary_key_constraint(actions) {
            for col in cols {
                table.add_primary_key_column(&col);
            }
        }

        for part in split_table_body(actions) {
            let clause = strip_add_prefix(&part);
            if let Some(index) = parse_unique_constraint(clause) {
                table.add_index(index);
            }
        }

        self.tables.get(pos)
    }

    /// Parse a CREATE INDEX statement and add it to the appropriate table
    pub fn parse_create_index(&mut self, stmt: &str) -> Option<&TableDef> {
        let caps = CREATE_INDEX_RE.captures(stmt)?;

        let unique = caps.get(1).is_some();
        let name = caps.get(2)?.as_str().to_string();
        let table_name = caps.get(3)?.as_str();
        let columns = parse_column_list(caps.get(4)?.as_str());

        let pos = self.position(table_name)?;
        self.tables[pos].add_index(IndexDef {
            name,
            columns,
            unique,
        });
        self.tables.get(pos)
    }

    /// Finish building
    pub fn build(self) -> Vec<TableDef> {
        self.tables
    }

    /// Tables parsed so far
    pub fn tables(&self) -> &[TableDef] {
        &self.tables
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.tables
            .iter()
            .position(|t| t.name == name)
            .or_else(|| {
                self.tables
                    .iter()
                    .position(|t| t.name.eq_ignore_ascii_case(name))
            })
    }
}

/// Extract table name from CREATE TABLE statement
pub fn extract_create_table_name(stmt: &str) -> Option<String> {
    CREATE_TABLE_NAME_RE
        .captures(stmt)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Byte offsets of `(`, `)` and `,` outside quoted strings and identifiers
fn structural_bytes(sql: &str) -> Vec<(usize, u8)> {
    let mut out = Vec::new();
    let mut quote: Option<u8> = None;
    let mut bytes = sql.bytes().enumerate();

    while let Some((i, b)) = bytes.next() {
        match quote {
            Some(q) if b == b'\\' && q != b'`' => {
                bytes.next();
            }
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'\'' | b'"' | b'`' => quote = Some(b),
                b'(' | b')' | b',' => out.push((i, b)),
                _ => {}
            },
        }
    }
    out
}

/// Text between the first `(` of a CREATE TABLE and its matching `)`
fn extract_table_body(stmt: &str) -> Option<String> {
    let mut depth = 0usize;
    let mut start = None;
    for (i, b) in structural_bytes(stmt) {
        match b {
            b'(' => {
                if depth == 0 {
                    start = Some(i + 1);
                }
                depth += 1;
            }
            b')' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return start.map(|s| stmt[s..i].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse the body of a CREATE TABLE to extract columns and constraints
fn parse_table_body(body: &str, table: &mut TableDef) {
    let mut inline_unique = Vec::new();

    for part in split_table_body(body) {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            continue;
        }

        if is_constraint(trimmed) {
            if let Some(cols) = parse_primary_key_constraint(trimmed) {
                for col in cols {
                    table.add_primary_key_column(&col);
                }
            }

            table.foreign_keys.extend(parse_foreign_keys(trimmed));

            if let Some(index) = parse_unique_constraint(trimmed).or_else(|| parse_inline_index(trimmed)) {
                table.add_index(index);
            }
            continue;
        }

        let definition = blank_string_literals(trimmed);
        let Some(col) = parse_column_def(&definition) else {
            continue;
        };
        if table.has_column(&col.name) {
            continue;
        }

        if INLINE_PRIMARY_KEY_RE.is_match(&definition) {
            table.primary_key.push(col.name.clone());
        } else if INLINE_UNIQUE_RE.is_match(&definition) {
            inline_unique.push(col.name.clone());
        }

        if let Some(fk) = parse_inline_reference(&definition, &col.name) {
            table.foreign_keys.push(fk);
        }

        table.columns.push(col);
    }

    for col in inline_unique {
        table.add_index(IndexDef {
            name: col.clone(),
            columns: vec![col],
            unique: true,
        });
    }
}

fn is_constraint(part: &str) -> bool {
    CONSTRAINT_START_RE.is_match(part)
}

/// `part` with the contents of every single-quoted literal removed, so that
/// `DEFAULT` values and `COMMENT` text cannot match column keywords
fn blank_string_literals(part: &str) -> String {
    let mut out = String::with_capacity(part.len());
    let mut quote: Option<char> = None;
    let mut chars = part.chars();

    while let Some(c) = chars.next() {
        match quote {
            Some('\'') if c == '\\' => {
                chars.next();
            }
            Some(q) if c == q => {
                quote = None;
                out.push(c);
            }
            Some('\'') => {}
            Some(_) => out.push(c),
            None => {
                if matches!(c, '\'' | '"' | '`') {
                    quote = Some(c);
                }
                out.push(c);
            }
        }
    }
    out
}

/// `ADD [CONSTRAINT ...]` clause of an ALTER TABLE, without the `ADD`
fn strip_add_prefix(part: &str) -> &str {
    let trimmed = part.trim();
    match trimmed.get(..4) {
        Some(head) if head.eq_ignore_ascii_case("ADD ") => trimmed[4..].trim_start(),
        _ => trimmed,
    }
}

/// Top-level comma-separated parts of a table body, trimmed
pub fn split_table_body(body: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, b) in structural_bytes(body) {
        match b {
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                parts.push(body[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    let rest = body[start..].trim();
    if !rest.is_empty() {
        parts.push(rest.to_string());
    }
    parts
}

/// Parse a column definition
fn parse_column_def(def: &str) -> Option<ColumnDef> {
    let caps = COLUMN_DEF_RE.captures(def)?;
    let name = caps.get(1)?.as_str().to_string();

    Some(ColumnDef {
        name,
        nullable: !NOT_NULL_RE.is_match(def) && !INLINE_PRIMARY_KEY_RE.is_match(def),
    })
}

/// Parse PRIMARY KEY constraint, returns column names
fn parse_primary_key_constraint(constraint: &str) -> Option<Vec<String>> {
    let caps = PRIMARY_KEY_RE.captures(constraint)?;
    let cols_str = caps.get(1)?.as_str();
    Some(parse_column_list(cols_str))
}

/// Parse a table-level UNIQUE constraint.
///
/// Unnamed constraints take the name of their first column, as MySQL does.
fn parse_unique_constraint(constraint: &str) -> Option<IndexDef> {
    let caps = UNIQUE_CONSTRAINT_RE.captures(constraint)?;
    let columns = parse_column_list(caps.get(3)?.as_str());
    let name = caps
        .get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
        .or_else(|| columns.first().cloned())?;

    Some(IndexDef {
        name,
        columns,
        unique: true,
    })
}

/// Parse inline INDEX/KEY constraint from CREATE TABLE body
fn parse_inline_index(constraint: &str) -> Option<IndexDef> {
    let caps = INLINE_INDEX_RE.captures(constraint)?;

    Some(IndexDef {
        name: caps.get(1)?.as_str().to_string(),
        columns: parse_column_list(caps.get(2)?.as_str()),
        unique: false,
    })
}

/// Parse FOREIGN KEY constraints from a statement
fn parse_foreign_keys(stmt: &str) -> Vec<ForeignKeyDef> {
    let mut fks = Vec::new();

    for caps in FOREIGN_KEY_RE.captures_iter(stmt) {
        let name = caps.get(1).map(|m| m.as_str().to_string());
        let columns = caps
            .get(2)
            .map(|m| parse_column_list(m.as_str()))
            .unwrap_or_default();
        let referenced_table = caps
            .get(3)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        let referenced_columns = caps
            .get(4)
            .map(|m| parse_column_list(m.as_str()))
            .unwrap_or_default();

        if !columns.is_empty() && !referenced_table.is_empty() && !referenced_columns.is_empty() {
            fks.push(ForeignKeyDef {
                name,
                columns,
                referenced_table,
                referenced_columns,
            });
        }
    }

    fks
}

/// Parse `col TYPE ... REFERENCES table [(col)]`
fn parse_inline_reference(def: &str, column: &str) -> Option<ForeignKeyDef> {
    let caps = INLINE_REFERENCES_RE.captures(def)?;
    let referenced_table = caps.get(1)?.as_str().to_string();
    let referenced_columns = caps
        .get(2)
        .map(|m| parse_column_list(m.as_str()))
        .unwrap_or_default();

    Some(ForeignKeyDef {
        name: None,
        columns: vec![column.to_string()],
        referenced_table,
        referenced_columns,
    })
}

/// Parse a comma-separated column list, stripping quotes (backticks, double quotes, brackets),
/// prefix lengths and sort order
pub fn parse_column_list(s: &str) -> Vec<String> {
    s.split(',')
        .filter_map(|c| c.split_whitespace().next())
        .map(|c| {
            c.split('(')
                .next()
                .unwrap_or(c)
                .trim_matches('`')
                .trim_matches('"')
                .trim_matches('[')
                .trim_matches(']')
                .to_string()
        })
        .filter(|c| !c.is_empty())
        .collect()
}
