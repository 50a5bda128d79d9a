use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use irving_core::cost_model::{self, CostModelParams};

use crate::input;

/// Arguments for a single-listing margin breakdown
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct MarginArgs {
    /// Sale price of one unit
    #[arg(long)]
    pub unit_price: Option<Decimal>,

    /// Seller's cost for one unit (omit to model an unset cost)
    #[arg(long)]
    pub unit_cost: Option<Decimal>,

    /// Tax percentage on the 0..100 scale
    #[arg(long, default_value = "0")]
    pub tax_percent: Decimal,

    /// Destination country code
    #[arg(long, default_value = "BR")]
    pub country: String,

    /// Marketplace-reported commission for one unit (overrides the flat rate)
    #[arg(long)]
    pub commission: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Deserialize)]
struct MarginInput {
    unit_price: Decimal,
    #[serde(default)]
    unit_cost: Option<Decimal>,
    #[serde(default)]
    tax_percent: Decimal,
    #[serde(default = "default_country")]
    destination_country: String,
    #[serde(default)]
    reported_commission: Option<Decimal>,
}

fn default_country() -> String {
    "BR".to_string()
}

pub fn run_margin(args: MarginArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let margin_input: MarginInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        MarginInput {
            unit_price: args
                .unit_price
                .ok_or("--unit-price is required (or provide --input)")?,
            unit_cost: args.unit_cost,
            tax_percent: args.tax_percent,
            destination_country: args.country.clone(),
            reported_commission: args.commission,
        }
    };

    let breakdown = cost_model::unit_cost_breakdown(
        &CostModelParams::default(),
        margin_input.unit_price,
        margin_input.unit_cost,
        &margin_input.destination_country,
        margin_input.reported_commission,
        margin_input.tax_percent,
    );

    Ok(serde_json::to_value(breakdown)?)
}
