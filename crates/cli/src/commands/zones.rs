//! Availability zone ranking command

use advisor_lib::AzRecommendation;
use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::{ApiClient, ZoneQuery};
use crate::output::{
    color_confidence, color_score, color_status, format_percent, format_price, print_json,
    print_warning, render_table, wire_label, OutputFormat,
};

#[derive(Tabled)]
struct ZoneRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Zone")]
    zone: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Avg Price")]
    avg_price: String,
    #[tabled(rename = "Stability")]
    stability: String,
    #[tabled(rename = "Interruption")]
    interruption: String,
    #[tabled(rename = "Available")]
    available: String,
}

/// Build the zone query from command flags
pub fn zone_query(region: Option<String>, profile: Option<String>, plain: bool) -> ZoneQuery {
    ZoneQuery {
        region,
        smart: plain.then_some(false),
        profile: if plain { None } else { profile },
    }
}

/// Rank availability zones for an instance type
pub async fn zones(
    client: &ApiClient,
    instance_type: &str,
    query: ZoneQuery,
    format: OutputFormat,
) -> Result<()> {
    let path = format!("api/v1/zones/{}", instance_type);
    let recommendation: AzRecommendation = client.get_with_query(&path, &query).await?;

    match format {
        OutputFormat::Json => print_json(&recommendation)?,
        OutputFormat::Table => print_recommendation(&recommendation),
    }

    Ok(())
}

fn print_recommendation(recommendation: &AzRecommendation) {
    println!("{}", "Availability Zone Ranking".bold());
    println!("{}", "=".repeat(60));
    println!("Instance:   {}", recommendation.instance_type.cyan());
    println!("Region:     {}", recommendation.region.cyan());
    println!(
        "Method:     {}",
        color_status(&wire_label(&recommendation.method))
    );
    println!("Confidence: {}", color_confidence(recommendation.confidence));
    println!();

    if recommendation.zones.is_empty() {
        print_warning("No zones could be ranked");
        return;
    }

    let rows: Vec<ZoneRow> = recommendation
        .zones
        .iter()
        .map(|zone| ZoneRow {
            rank: zone.rank,
            zone: zone.zone.clone(),
            score: color_score(zone.combined_score),
            avg_price: if zone.price_predicted {
                format!("{} (est.)", format_price(zone.avg_price))
            } else {
                format_price(zone.avg_price)
            },
            stability: color_status(zone.stability.as_str()),
            interruption: format_percent(zone.interruption_rate),
            available: if zone.available { "yes" } else { "no" }.to_string(),
        })
        .collect();

    println!("{}", render_table(rows));

    if let Some(best) = &recommendation.best_zone {
        println!("\nBest zone: {}", best.green().bold());
    }
    if let Some(next) = &recommendation.next_best_zone {
        println!(
            "Next best: {} ({} price difference)",
            next,
            format_percent(recommendation.price_differential_percent)
        );
    }
    if !recommendation.data_sources.is_empty() {
        println!("Sources:   {}", recommendation.data_sources.join(", "));
    }
    for insight in &recommendation.insights {
        println!("  {} {}", "•".blue(), insight);
    }
}
