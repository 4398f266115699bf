//! File-backed providers
//!
//! `StaticCatalog` serves advisory spot data and specs from a JSON catalog
//! (or a small built-in sample). `RecordedPriceHistory` replays recorded
//! price points and zone listings for one region.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use crate::models::{
    Architecture, CloudProvider, InstanceCandidate, InstanceCategory, InstanceGeneration,
    InstanceSpecs, InterruptionFrequency, PriceAnalysis, PricePoint, UsageRequirements, ZoneInfo,
};
use crate::prediction::analyze_prices;
use crate::providers::{InstanceSpecsProvider, PriceHistoryProvider, SpotDataProvider, ZoneProvider};

/// On-disk catalog layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub cloud: CloudProvider,
    pub instances: Vec<InstanceCandidate>,
}

/// Advisory data and specs held in memory
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    cloud: CloudProvider,
    instances: Vec<InstanceCandidate>,
}

impl StaticCatalog {
    pub fn new(cloud: CloudProvider, instances: Vec<InstanceCandidate>) -> Self {
        Self { cloud, instances }
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read catalog {}", path.display()))?;
        let file: CatalogFile = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse catalog {}", path.display()))?;
        info!(path = %path.display(), instances = file.instances.len(), "Loaded instance catalog");
        Ok(Self::new(file.cloud, file.instances))
    }

    pub fn cloud(&self) -> CloudProvider {
        self.cloud
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn instance_types(&self) -> impl Iterator<Item = &str> {
        self.instances.iter().map(|candidate| candidate.instance_type())
    }

    /// Small AWS catalog so the service runs without any data files
    pub fn builtin() -> Self {
        use Architecture::{Arm64, X86_64};
        use InstanceCategory::*;
        use InstanceGeneration::{Current, Previous};
        use InterruptionFrequency::*;

        #[rustfmt::skip]
        let rows: &[(&str, u32, f64, InstanceCategory, Architecture, InstanceGeneration, u32, InterruptionFrequency)] = &[
            ("m5.large",     2,   8.0, GeneralPurpose,   X86_64, Previous, 58, Low),
            ("m5.xlarge",    4,  16.0, GeneralPurpose,   X86_64, Previous, 60, Low),
            ("m5.2xlarge",   8,  32.0, GeneralPurpose,   X86_64, Previous, 62, Medium),
            ("m6i.large",    2,   8.0, GeneralPurpose,   X86_64, Current,  64, VeryLow),
            ("m6i.xlarge",   4,  16.0, GeneralPurpose,   X86_64, Current,  66, VeryLow),
            ("m6i.2xlarge",  8,  32.0, GeneralPurpose,   X86_64, Current,  65, Low),
            ("m6g.large",    2,   8.0, GeneralPurpose,   Arm64,  Current,  70, VeryLow),
            ("m6g.xlarge",   4,  16.0, GeneralPurpose,   Arm64,  Current,  71, VeryLow),
            ("m7i.xlarge",   4,  16.0, GeneralPurpose,   X86_64, Current,  55, Low),
            ("c5.large",     2,   4.0, ComputeOptimized, X86_64, Previous, 60, Medium),
            ("c5.xlarge",    4,   8.0, ComputeOptimized, X86_64, Previous, 62, Medium),
            ("c6i.large",    2,   4.0, ComputeOptimized, X86_64, Current,  63, Low),
            ("c6i.xlarge",   4,   8.0, ComputeOptimized, X86_64, Current,  66, Low),
            ("c6i.2xlarge",  8,  16.0, ComputeOptimized, X86_64, Current,  68, Medium),
            ("c7g.xlarge",   4,   8.0, ComputeOptimized, Arm64,  Current,  72, VeryLow),
            ("r5.large",     2,  16.0, MemoryOptimized,  X86_64, Previous, 67, Low),
            ("r6i.large",    2,  16.0, MemoryOptimized,  X86_64, Current,  69, VeryLow),
            ("r6i.xlarge",   4,  32.0, MemoryOptimized,  X86_64, Current,  70, Low),
            ("r6g.xlarge",   4,  32.0, MemoryOptimized,  Arm64,  Current,  74, VeryLow),
            ("i3.xlarge",    4,  30.5, StorageOptimized, X86_64, Previous, 70, Medium),
            ("i4i.xlarge",   4,  32.0, StorageOptimized, X86_64, Current,  66, Low),
        ];

        let mut instances: Vec<InstanceCandidate> = rows
            .iter()
            .map(|&(name, vcpu, memory, category, arch, generation, savings, interruption)| {
                let mut specs = InstanceSpecs::new(name, vcpu, memory);
                specs.category = category;
                specs.architecture = arch;
                specs.generation = generation;
                InstanceCandidate::new(specs, savings, interruption)
            })
            .collect();

        let mut burstable = InstanceSpecs::new("t3.large", 2, 8.0);
        burstable.is_burstable = true;
        instances.push(InstanceCandidate::new(burstable, 70, Low));

        let mut gpu = InstanceSpecs::new("g5.xlarge", 4, 16.0);
        gpu.category = AcceleratedComputing;
        gpu.has_gpu = true;
        gpu.gpu_count = 1;
        gpu.gpu_type = Some("NVIDIA A10G".to_string());
        instances.push(InstanceCandidate::new(gpu, 65, High));

        for candidate in &mut instances {
            let storage_gb = match candidate.instance_type() {
                "i3.xlarge" => 950.0,
                "i4i.xlarge" => 937.0,
                _ => continue,
            };
            candidate.specs.storage_gb = storage_gb;
        }

        Self::new(CloudProvider::Aws, instances)
    }
}

#[async_trait]
impl SpotDataProvider for StaticCatalog {
    async fn get_spot_data(&self, _requirements: &UsageRequirements) -> Result<Vec<InstanceCandidate>> {
        Ok(self
            .instances
            .iter()
            .cloned()
            .map(|mut candidate| {
                candidate.specs.cloud = self.cloud;
                candidate
            })
            .collect())
    }
}

#[async_trait]
impl InstanceSpecsProvider for StaticCatalog {
    async fn get_all_instance_specs(&self) -> Result<Vec<InstanceSpecs>> {
        Ok(self.instances.iter().map(|candidate| candidate.specs.clone()).collect())
    }
}

/// On-disk recorded history layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordedHistoryFile {
    pub region: String,
    #[serde(default)]
    pub series: HashMap<String, Vec<PricePoint>>,
    #[serde(default)]
    pub zones: HashMap<String, Vec<ZoneInfo>>,
}

/// Price history and zone listings replayed from recorded data
#[derive(Debug, Clone)]
pub struct RecordedPriceHistory {
    region: String,
    series: HashMap<String, Vec<PricePoint>>,
    zones: HashMap<String, Vec<ZoneInfo>>,
}

impl RecordedPriceHistory {
    pub fn new(region: impl Into<String>, series: HashMap<String, Vec<PricePoint>>) -> Self {
        Self {
            region: region.into(),
            series,
            zones: HashMap::new(),
        }
    }

    pub fn with_zones(mut self, zones: HashMap<String, Vec<ZoneInfo>>) -> Self {
        self.zones = zones;
        self
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read price history {}", path.display()))?;
        let file: RecordedHistoryFile = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse price history {}", path.display()))?;
        info!(
            path = %path.display(),
            region = %file.region,
            instance_types = file.series.len(),
            "Loaded recorded price history"
        );
        Ok(Self::new(file.region, file.series).with_zones(file.zones))
    }

    pub fn instance_types(&self) -> usize {
        self.series.len()
    }

    /// Points within `lookback_days` of the newest observation
    fn window(&self, instance_type: &str, lookback_days: u32) -> Option<Vec<PricePoint>> {
        let points = self.series.get(instance_type)?;
        let newest = points.iter().map(|point| point.timestamp).max()?;
        let cutoff = newest - ChronoDuration::days(i64::from(lookback_days));
        Some(
            points
                .iter()
                .filter(|point| point.timestamp >= cutoff)
                .cloned()
                .collect(),
        )
    }
}

#[async_trait]
impl PriceHistoryProvider for RecordedPriceHistory {
    fn is_available(&self) -> bool {
        !self.series.is_empty()
    }

    fn region(&self) -> &str {
        &self.region
    }

    async fn get_price_analysis(
        &self,
        instance_type: &str,
        lookback_days: u32,
    ) -> Result<Option<PriceAnalysis>> {
        Ok(self
            .window(instance_type, lookback_days)
            .and_then(|points| analyze_prices(instance_type, &self.region, &points)))
    }
}

#[async_trait]
impl ZoneProvider for RecordedPriceHistory {
    fn is_available(&self) -> bool {
        !self.zones.is_empty()
    }

    async fn get_zones(&self, instance_type: &str) -> Result<Vec<ZoneInfo>> {
        Ok(self.zones.get(instance_type).cloned().unwrap_or_default())
    }
}
