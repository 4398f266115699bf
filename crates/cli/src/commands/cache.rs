//! Cache inspection commands

use advisor_lib::advisor::CacheReport;
use anyhow::Result;
use colored::Colorize;

use crate::client::{ApiClient, RefreshResult};
use crate::output::{print_json, print_success, OutputFormat};

/// Show cache counters
pub async fn show_stats(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let report: CacheReport = client.get("api/v1/cache").await?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => {
            let lookups = report.stats.hits + report.stats.misses;
            let hit_rate = if lookups == 0 {
                0.0
            } else {
                report.stats.hits as f64 / lookups as f64 * 100.0
            };

            println!("{}", "Advisor Cache".bold());
            println!("{}", "=".repeat(40));
            println!("Items:        {}", report.stats.items);
            println!("Hits:         {}", report.stats.hits.to_string().green());
            println!("Misses:       {}", report.stats.misses.to_string().yellow());
            println!("Hit rate:     {:.1}%", hit_rate);
            println!("TTL:          {}s", report.ttl_seconds);
            println!(
                "Last refresh: {}",
                report.last_refresh.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
    }

    Ok(())
}

/// Drop expired cache entries
pub async fn refresh(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let result: RefreshResult = client
        .post("api/v1/cache/refresh", &serde_json::json!({}))
        .await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            print_success(&format!("Removed {} cached entries", result.removed));
        }
    }

    Ok(())
}
