//! Inspect command: dump the entity model and the derived relations.

use super::InputArgs;
use crate::config::DbviewConfig;
use crate::schema::{Database, KeyKind};
use anyhow::Result;
use serde::Serialize;

#[derive(Serialize)]
struct InspectJson {
    database: String,
    tables: Vec<TableJson>,
    relations: Vec<RelationJson>,
}

#[derive(Serialize)]
struct TableJson {
    name: String,
    fields: Vec<FieldJson>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    indexes: Vec<IndexJson>,
}

#[derive(Serialize)]
struct FieldJson {
    name: String,
    key: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    references: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    link: Option<&'static str>,
    unique: bool,
    nullable: bool,
}

#[derive(Serialize)]
struct IndexJson {
    name: String,
    fields: Vec<String>,
    unique: bool,
}

#[derive(Serialize)]
struct RelationJson {
    dependent: String,
    reference: String,
    #[serde(rename = "type")]
    relation_type: &'static str,
    joins: Vec<JoinJson>,
}

#[derive(Serialize)]
struct JoinJson {
    source: String,
    destination: String,
    dependent_to_reference: &'static str,
    reference_to_dependent: &'static str,
}

/// Run the inspect command
pub fn run(config: &DbviewConfig, input: InputArgs, json: bool) -> Result<()> {
    let db = input.load(config)?;

    if json {
        let report = build_report(&db)?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", db);
    let report = build_report(&db)?;
    if report.relations.is_empty() {
        println!("\nNo relations.");
        return Ok(());
    }

    println!("\nRelations ({}):", report.relations.len());
    for relation in &report.relations {
        println!(
            "  {} -> {} [{}]",
            relation.dependent, relation.reference, relation.relation_type
        );
        for join in &relation.joins {
            println!(
                "    {} => {}  ({} / {})",
                join.source,
                join.destination,
                join.dependent_to_reference,
                join.reference_to_dependent
            );
        }
    }
    Ok(())
}

fn build_report(db: &Database) -> Result<InspectJson> {
    let mut tables = Vec::new();
    for table in db.tables() {
        let mut fields = Vec::new();
        for field in table.fields() {
            let (key, references) = match field.key() {
                KeyKind::None => ("none", None),
                KeyKind::Primary => ("primary", None),
                KeyKind::Foreign { target, .. } => ("foreign", Some(db.field(*target)?.full_name())),
                KeyKind::DeadForeign(dead) => ("dead-foreign", Some(dead.full_name())),
            };
            fields.push(FieldJson {
                name: field.name().to_string(),
                key,
                references,
                link: field.link().map(|l| l.as_str()),
                unique: table.is_unique(field.id()),
                nullable: field.is_nullable(),
            });
        }

        let indexes = table
            .indexes()
            .iter()
            .map(|index| IndexJson {
                name: index.name.clone(),
                fields: index
                    .fields
                    .iter()
                    .filter_map(|f| table.field(*f).map(|f| f.name().to_string()))
                    .collect(),
                unique: index.unique,
            })
            .collect();

        tables.push(TableJson {
            name: table.name().to_string(),
            fields,
            indexes,
        });
    }

    let mut relations = Vec::new();
    for (dependent, reference, relation) in db.compute_relations().iter() {
        let mut joins = Vec::new();
        for join in relation.joins() {
            joins.push(JoinJson {
                source: db.field(join.source)?.full_name(),
                destination: db.field(join.destination)?.full_name(),
                dependent_to_reference: join.dependent_to_reference()?,
                reference_to_dependent: join.reference_to_dependent()?,
            });
        }
        relations.push(RelationJson {
            dependent: db.table(dependent)?.name().to_string(),
            reference: db.table(reference)?.name().to_string(),
            relation_type: db.relation_type(dependent, reference)?.as_str(),
            joins,
        });
    }

    Ok(InspectJson {
        database: db.name().to_string(),
        tables,
        relations,
    })
}
