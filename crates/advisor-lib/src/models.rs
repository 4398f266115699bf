//! Core data models for spot instance analysis

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::AdvisorError;

/// Cloud provider an instance type or zone belongs to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudProvider {
    #[default]
    Aws,
    Azure,
    Gcp,
}

impl CloudProvider {
    /// Parse a provider name, defaulting to AWS for anything unrecognised
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "azure" => CloudProvider::Azure,
            "gcp" => CloudProvider::Gcp,
            _ => CloudProvider::Aws,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CloudProvider::Aws => "aws",
            CloudProvider::Azure => "azure",
            CloudProvider::Gcp => "gcp",
        }
    }

    pub fn default_region(&self) -> &'static str {
        match self {
            CloudProvider::Aws => "us-east-1",
            CloudProvider::Azure => "eastus",
            CloudProvider::Gcp => "us-central1",
        }
    }
}

impl fmt::Display for CloudProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatingSystem {
    #[default]
    Linux,
    Windows,
}

impl OperatingSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperatingSystem::Linux => "Linux",
            OperatingSystem::Windows => "Windows",
        }
    }
}

/// CPU architecture
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Architecture {
    #[default]
    #[serde(rename = "x86_64")]
    X86_64,
    #[serde(rename = "arm64")]
    Arm64,
}

/// Broad instance category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceCategory {
    #[default]
    GeneralPurpose,
    ComputeOptimized,
    MemoryOptimized,
    StorageOptimized,
    AcceleratedComputing,
    HighPerformance,
}

/// Hardware generation, newest first
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceGeneration {
    #[default]
    Current,
    Previous,
    Legacy,
    Deprecated,
}

/// Advisory interruption-frequency bucket (0 = <5% ... 4 = >20%)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum InterruptionFrequency {
    #[default]
    VeryLow = 0,
    Low = 1,
    Medium = 2,
    High = 3,
    VeryHigh = 4,
}

impl InterruptionFrequency {
    pub fn bucket(&self) -> u8 {
        *self as u8
    }

    /// Human-readable interruption band
    pub fn label(&self) -> &'static str {
        match self {
            InterruptionFrequency::VeryLow => "<5%",
            InterruptionFrequency::Low => "5-10%",
            InterruptionFrequency::Medium => "10-15%",
            InterruptionFrequency::High => "15-20%",
            InterruptionFrequency::VeryHigh => ">20%",
        }
    }
}

impl TryFrom<u8> for InterruptionFrequency {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(InterruptionFrequency::VeryLow),
            1 => Ok(InterruptionFrequency::Low),
            2 => Ok(InterruptionFrequency::Medium),
            3 => Ok(InterruptionFrequency::High),
            4 => Ok(InterruptionFrequency::VeryHigh),
            other => Err(format!("interruption frequency bucket {} out of range 0-4", other)),
        }
    }
}

impl From<InterruptionFrequency> for u8 {
    fn from(value: InterruptionFrequency) -> Self {
        value.bucket()
    }
}

/// Static hardware description of an instance type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceSpecs {
    pub instance_type: String,
    pub vcpu: u32,
    pub memory_gb: f64,
    #[serde(default)]
    pub architecture: Architecture,
    #[serde(default)]
    pub category: InstanceCategory,
    #[serde(default)]
    pub generation: InstanceGeneration,
    #[serde(default)]
    pub has_gpu: bool,
    #[serde(default)]
    pub gpu_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu_type: Option<String>,
    #[serde(default)]
    pub storage_gb: f64,
    #[serde(default)]
    pub is_burstable: bool,
    #[serde(default)]
    pub is_bare_metal: bool,
    #[serde(default)]
    pub is_deprecated: bool,
    #[serde(default)]
    pub cloud: CloudProvider,
}

impl InstanceSpecs {
    /// Minimal specs for an instance type; remaining fields take their defaults
    pub fn new(instance_type: impl Into<String>, vcpu: u32, memory_gb: f64) -> Self {
        Self {
            instance_type: instance_type.into(),
            vcpu,
            memory_gb,
            architecture: Architecture::default(),
            category: InstanceCategory::default(),
            generation: InstanceGeneration::default(),
            has_gpu: false,
            gpu_count: 0,
            gpu_type: None,
            storage_gb: 0.0,
            is_burstable: false,
            is_bare_metal: false,
            is_deprecated: false,
            cloud: CloudProvider::default(),
        }
    }
}

/// Advisory spot data: typical savings and interruption band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotAdvisory {
    pub savings_percent: u32,
    pub interruption: InterruptionFrequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spot_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_demand_price: Option<f64>,
}

/// An instance type eligible for ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceCandidate {
    pub specs: InstanceSpecs,
    pub advisory: SpotAdvisory,
}

impl InstanceCandidate {
    pub fn new(specs: InstanceSpecs, savings_percent: u32, interruption: InterruptionFrequency) -> Self {
        Self {
            specs,
            advisory: SpotAdvisory {
                savings_percent,
                interruption,
                spot_price: None,
                on_demand_price: None,
            },
        }
    }

    pub fn instance_type(&self) -> &str {
        &self.specs.instance_type
    }
}

/// What the caller needs from an instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageRequirements {
    pub min_vcpu: u32,
    pub max_vcpu: Option<u32>,
    pub min_memory_gb: Option<f64>,
    pub max_memory_gb: Option<f64>,
    pub architecture: Option<Architecture>,
    pub region: String,
    pub os: OperatingSystem,
    pub max_interruption: InterruptionFrequency,
    pub preferred_category: Option<InstanceCategory>,
    pub families: Vec<String>,
    pub allow_burstable: bool,
    pub allow_bare_metal: bool,
    pub requires_gpu: bool,
    pub min_gpu_count: u32,
    pub gpu_type: Option<String>,
    pub min_storage_gb: Option<f64>,
    pub min_savings_percent: u32,
    pub top_n: usize,
}

impl Default for UsageRequirements {
    fn default() -> Self {
        Self {
            min_vcpu: 2,
            max_vcpu: None,
            min_memory_gb: None,
            max_memory_gb: None,
            architecture: None,
            region: CloudProvider::Aws.default_region().to_string(),
            os: OperatingSystem::Linux,
            max_interruption: InterruptionFrequency::Medium,
            preferred_category: None,
            families: Vec::new(),
            allow_burstable: false,
            allow_bare_metal: false,
            requires_gpu: false,
            min_gpu_count: 0,
            gpu_type: None,
            min_storage_gb: None,
            min_savings_percent: 0,
            top_n: 10,
        }
    }
}

impl UsageRequirements {
    /// Reject requirement sets no instance could satisfy
    pub fn validate(&self) -> Result<(), AdvisorError> {
        if self.min_vcpu == 0 {
            return Err(AdvisorError::invalid("min_vcpu", "must be greater than 0"));
        }
        if self.region.trim().is_empty() {
            return Err(AdvisorError::invalid("region", "must be specified"));
        }
        if let Some(max) = self.max_vcpu {
            if max < self.min_vcpu {
                return Err(AdvisorError::invalid("max_vcpu", "must be >= min_vcpu"));
            }
        }
        if let (Some(min), Some(max)) = (self.min_memory_gb, self.max_memory_gb) {
            if max < min {
                return Err(AdvisorError::invalid("max_memory_gb", "must be >= min_memory_gb"));
            }
        }
        Ok(())
    }
}

/// Components of the advisory-only baseline score
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BaselineBreakdown {
    pub savings: f64,
    pub stability: f64,
    pub fitness: f64,
    pub value: f64,
    pub generation_penalty: f64,
    pub burstable_penalty: f64,
}

/// Whether a strategy used live telemetry or instance-spec heuristics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Historical,
    Heuristic,
}

/// Normalized sub-scores produced by one scoring strategy for one candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreFactors {
    pub volatility: f64,
    pub trend: f64,
    pub capacity: f64,
    pub time_pattern: f64,
    pub popularity: f64,
    pub combined: f64,
    pub data_source: DataSource,
    pub insights: Vec<String>,
}

/// A candidate after scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedInstance {
    pub candidate: InstanceCandidate,
    pub rank: usize,
    pub baseline_score: f64,
    pub baseline: BaselineBreakdown,
    pub strategy_scores: BTreeMap<String, ScoreFactors>,
    pub final_score: f64,
    pub insights: Vec<String>,
    pub recommendation: String,
    pub warnings: Vec<String>,
}

impl RankedInstance {
    pub fn instance_type(&self) -> &str {
        self.candidate.instance_type()
    }
}

/// Result of a ranking request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingOutcome {
    pub instances: Vec<RankedInstance>,
    /// Strategies that were applied
    pub strategies: Vec<String>,
    /// Candidates whose enhancement finished before the deadline
    pub enhanced: usize,
    /// Strategy computations skipped because they failed or timed out
    pub skipped_strategies: usize,
    pub deadline_exceeded: bool,
}

/// Report returned by a full recommendation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub requirements: UsageRequirements,
    pub region: String,
    pub cloud: CloudProvider,
    pub total_analyzed: usize,
    pub filtered_out: usize,
    pub strategies: Vec<String>,
    pub deadline_exceeded: bool,
    pub top_instances: Vec<RankedInstance>,
    pub summary: String,
    pub analyzed_at: DateTime<Utc>,
}

/// A single observed spot price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
}

/// Price statistics for one availability zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneAnalysis {
    pub zone: String,
    pub avg_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub volatility: f64,
    pub current_price: f64,
    pub data_points: usize,
}

/// Statistics derived from an instance type's price history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAnalysis {
    pub instance_type: String,
    pub region: String,
    pub avg_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub std_dev: f64,
    /// Coefficient of variation (std_dev / avg_price)
    pub volatility: f64,
    /// OLS slope over the sample index, in price units per sample
    pub trend_slope: f64,
    /// Slope normalized to [-1, 1]
    pub trend_score: f64,
    pub current_price: f64,
    pub data_points: usize,
    pub time_span_hours: f64,
    /// Hour of day (UTC) to mean price
    pub hourly_pattern: BTreeMap<u32, f64>,
    /// Days from Monday to mean price
    pub weekday_pattern: BTreeMap<u32, f64>,
    pub zones: BTreeMap<String, ZoneAnalysis>,
    pub best_zone: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Rising,
    Falling,
    Stable,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolatilityRisk {
    Low,
    Medium,
    High,
    Unknown,
}

/// Short-horizon price forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePrediction {
    pub instance_type: String,
    pub region: String,
    pub current_price: f64,
    pub predicted_1h: f64,
    pub predicted_6h: f64,
    pub predicted_24h: f64,
    pub trend: TrendDirection,
    pub volatility_risk: VolatilityRisk,
    pub confidence: f64,
    pub optimal_launch_window: String,
    pub method: String,
    pub data_points: usize,
}

/// Qualitative zone price stability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StabilityLabel {
    #[serde(rename = "Very Stable")]
    VeryStable,
    #[serde(rename = "Stable")]
    Stable,
    #[serde(rename = "Moderate")]
    Moderate,
    #[serde(rename = "High Volatility")]
    HighVolatility,
}

impl StabilityLabel {
    pub fn from_volatility(volatility: f64) -> Self {
        if volatility < 0.05 {
            StabilityLabel::VeryStable
        } else if volatility < 0.1 {
            StabilityLabel::Stable
        } else if volatility < 0.2 {
            StabilityLabel::Moderate
        } else {
            StabilityLabel::HighVolatility
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StabilityLabel::VeryStable => "Very Stable",
            StabilityLabel::Stable => "Stable",
            StabilityLabel::Moderate => "Moderate",
            StabilityLabel::HighVolatility => "High Volatility",
        }
    }
}

/// Zone as reported by a zone provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneInfo {
    pub zone: String,
    pub available: bool,
    #[serde(default)]
    pub restricted: bool,
    /// Capacity signal 0-100
    pub capacity: f64,
}

/// One ranked availability zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneRanking {
    pub zone: String,
    pub rank: usize,
    /// Weighted blend of the sub-scores, 0-100
    pub combined_score: f64,
    pub price_score: f64,
    pub capacity_score: f64,
    pub availability_score: f64,
    pub stability_score: f64,
    pub avg_price: f64,
    /// Latest observed price; `None` when no live tick exists
    pub current_price: Option<f64>,
    /// The price fields are estimates rather than observations
    pub price_predicted: bool,
    pub volatility: f64,
    /// Estimated interruption rate in percent
    pub interruption_rate: f64,
    pub stability: StabilityLabel,
    pub available: bool,
    #[serde(default)]
    pub explanation: String,
}

/// How a zone recommendation was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMethod {
    Smart,
    Plain,
    /// Smart ranking failed and the plain path answered instead
    PlainFallback,
}

/// Ranked availability zones for one instance type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AzRecommendation {
    pub instance_type: String,
    pub region: String,
    pub method: RankingMethod,
    pub zones: Vec<ZoneRanking>,
    pub best_zone: Option<String>,
    pub next_best_zone: Option<String>,
    pub price_differential_percent: f64,
    pub confidence: f64,
    pub data_sources: Vec<String>,
    pub insights: Vec<String>,
    pub generated_at: DateTime<Utc>,
}
