//! Instance family listing

use anyhow::Result;
use colored::Colorize;

use crate::client::{ApiClient, FamilyList};
use crate::output::{print_json, print_warning, OutputFormat};

pub async fn list_families(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let list: FamilyList = client.get("api/v1/families").await?;

    match format {
        OutputFormat::Json => print_json(&list)?,
        OutputFormat::Table => {
            if list.families.is_empty() {
                print_warning("Catalog has no instance families");
                return Ok(());
            }
            println!("{} ({})", "Instance families".bold(), list.cloud.cyan());
            println!("{}", list.families.join("  "));
        }
    }

    Ok(())
}
