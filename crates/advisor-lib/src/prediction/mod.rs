//! Price forecasting and availability zone ranking
//!
//! - `analysis`: statistics over raw price history
//! - `price`: short-horizon forecasts and launch windows
//! - `zones`: price-only zone ranking (real or simulated samples)
//! - `smart`: weighted multi-factor zone ranking
//! - `engine`: region-bound engine tying providers to the above

pub mod analysis;
pub mod engine;
pub mod price;
pub mod smart;
pub mod zones;

pub use analysis::{analyze_prices, linear_regression_slope};
pub use engine::{PredictionConfig, PredictionEngine, DEFAULT_CALL_TIMEOUT, DEFAULT_LOOKBACK_DAYS};
pub use price::{heuristic_prediction, predict_from_analysis, HEURISTIC_CONFIDENCE, REGRESSION_METHOD};
pub use smart::WeightProfile;
pub use zones::{rank_zones, AzScore, ZoneStats};
