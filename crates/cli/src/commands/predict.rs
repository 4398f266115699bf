//! Price forecast command

use advisor_lib::PricePrediction;
use anyhow::Result;
use colored::Colorize;

use crate::client::{ApiClient, RegionQuery};
use crate::output::{
    color_confidence, color_status, format_price, print_json, print_warning, wire_label,
    OutputFormat,
};

/// Forecast the spot price of an instance type
pub async fn predict(
    client: &ApiClient,
    instance_type: &str,
    region: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let path = format!("api/v1/predictions/{}", instance_type);
    let prediction: PricePrediction = client.get_with_query(&path, &RegionQuery { region }).await?;

    match format {
        OutputFormat::Json => print_json(&prediction)?,
        OutputFormat::Table => {
            println!("{}", "Spot Price Forecast".bold());
            println!("{}", "=".repeat(60));
            println!("Instance:  {}", prediction.instance_type.cyan());
            println!("Region:    {}", prediction.region.cyan());
            println!("Method:    {}", prediction.method);
            println!();
            println!("Current:   {}", format_price(prediction.current_price));
            println!("In 1h:     {}", format_price(prediction.predicted_1h));
            println!("In 6h:     {}", format_price(prediction.predicted_6h));
            println!("In 24h:    {}", format_price(prediction.predicted_24h));
            println!();
            println!("Trend:       {}", color_status(&wire_label(&prediction.trend)));
            println!(
                "Volatility:  {}",
                color_status(&wire_label(&prediction.volatility_risk))
            );
            println!("Confidence:  {}", color_confidence(prediction.confidence));
            println!("Launch:      {}", prediction.optimal_launch_window);

            if prediction.data_points == 0 {
                print_warning("No price history available, forecast is a heuristic estimate");
            } else {
                println!("\nBased on {} price points", prediction.data_points);
            }
        }
    }

    Ok(())
}
