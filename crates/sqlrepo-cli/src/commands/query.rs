//! Run a JSON predicate against one table
//!
//! The predicate uses the serde form of `Predicate`, e.g.
//! `{"comparison": {"field": "amount", "op": "gt", "value": 5}}`.
//! Matching rows are printed as one JSON object per line.

use super::open_existing;
use clap::Args;
use sqlrepo_core::compiler::compile_filter;
use sqlrepo_core::predicate::Predicate;
use sqlrepo_store::{schema, SqliteTables};

#[derive(Debug, Args)]
pub struct QueryArgs {
    #[arg(long, default_value = ".sqlrepo/repo.db")]
    pub db: String,

    /// Registered table name
    #[arg(long)]
    pub table: String,

    /// Predicate as JSON; all rows when omitted
    #[arg(long = "where")]
    pub predicate: Option<String>,
}

pub fn execute(args: QueryArgs) -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_existing(&args.db)?;
    let entity = schema::lookup_entity(&conn, &args.table)?
        .ok_or_else(|| format!("Table not registered: {}", args.table))?;

    let filter = match &args.predicate {
        Some(json) => {
            let predicate: Predicate = serde_json::from_str(json)
                .map_err(|e| format!("Invalid predicate JSON: {}", e))?;
            Some(compile_filter(&predicate, &entity.descriptor)?)
        }
        None => None,
    };

    let rows = SqliteTables::scan(&conn, &entity.descriptor, filter.as_ref())?;
    for row in rows {
        println!("{}", row.to_json());
    }

    Ok(())
}
