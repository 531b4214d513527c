//! List registered entity tables

use super::open_existing;
use clap::Args;
use sqlrepo_store::schema;

#[derive(Debug, Args)]
pub struct TablesArgs {
    #[arg(long, default_value = ".sqlrepo/repo.db")]
    pub db: String,
}

pub fn execute(args: TablesArgs) -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_existing(&args.db)?;
    let entities = schema::list_entities(&conn)?;

    if entities.is_empty() {
        println!("No registered tables");
        return Ok(());
    }

    for entity in entities {
        let desc = &entity.descriptor;
        let fields: Vec<String> = desc
            .persisted_fields()
            .map(|f| format!("{} {}", f.name, f.kind.name()))
            .collect();
        println!("{} (identifier: {})", desc.table(), desc.identifier());
        println!("  fields: {}", fields.join(", "));
        println!("  checksum: {}", entity.checksum);
        println!("  registered_at: {}", entity.registered_at.to_rfc3339());
    }

    Ok(())
}
