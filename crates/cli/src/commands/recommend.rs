//! Instance recommendation command

use advisor_lib::{
    AnalysisReport, Architecture, InstanceCategory, InterruptionFrequency, OperatingSystem,
    UsageRequirements,
};
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{color_score, format_percent, print_json, print_warning, render_table, OutputFormat};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ArchArg {
    #[value(name = "x86_64")]
    X86_64,
    Arm64,
}

impl From<ArchArg> for Architecture {
    fn from(arch: ArchArg) -> Self {
        match arch {
            ArchArg::X86_64 => Architecture::X86_64,
            ArchArg::Arm64 => Architecture::Arm64,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OsArg {
    Linux,
    Windows,
}

impl From<OsArg> for OperatingSystem {
    fn from(os: OsArg) -> Self {
        match os {
            OsArg::Linux => OperatingSystem::Linux,
            OsArg::Windows => OperatingSystem::Windows,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CategoryArg {
    General,
    Compute,
    Memory,
    Storage,
    Accelerated,
    Hpc,
}

impl From<CategoryArg> for InstanceCategory {
    fn from(category: CategoryArg) -> Self {
        match category {
            CategoryArg::General => InstanceCategory::GeneralPurpose,
            CategoryArg::Compute => InstanceCategory::ComputeOptimized,
            CategoryArg::Memory => InstanceCategory::MemoryOptimized,
            CategoryArg::Storage => InstanceCategory::StorageOptimized,
            CategoryArg::Accelerated => InstanceCategory::AcceleratedComputing,
            CategoryArg::Hpc => InstanceCategory::HighPerformance,
        }
    }
}

/// Workload requirements for `spotctl recommend`
#[derive(Debug, Args)]
pub struct RecommendArgs {
    /// Minimum vCPUs
    #[arg(long, default_value_t = 2)]
    pub vcpu: u32,

    /// Minimum memory in GiB
    #[arg(long)]
    pub memory: Option<f64>,

    #[arg(long)]
    pub max_vcpu: Option<u32>,

    #[arg(long)]
    pub max_memory: Option<f64>,

    #[arg(long, value_enum)]
    pub arch: Option<ArchArg>,

    #[arg(long, value_enum)]
    pub category: Option<CategoryArg>,

    /// Region to rank in (defaults to the configured region)
    #[arg(long, short)]
    pub region: Option<String>,

    #[arg(long, value_enum, default_value = "linux")]
    pub os: OsArg,

    /// Highest acceptable interruption bucket (0 = <5% ... 4 = >20%)
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(0..=4))]
    pub max_interruption: u8,

    /// Restrict to instance families (repeatable, e.g. --family m --family c)
    #[arg(long = "family")]
    pub families: Vec<String>,

    #[arg(long)]
    pub allow_burstable: bool,

    #[arg(long)]
    pub allow_bare_metal: bool,

    /// Require a GPU
    #[arg(long)]
    pub gpu: bool,

    /// Minimum spot savings percent
    #[arg(long, default_value_t = 0)]
    pub min_savings: u32,

    /// Number of results (0 returns every eligible instance)
    #[arg(long, short = 'n', default_value_t = 10)]
    pub top: usize,
}

impl RecommendArgs {
    pub fn into_requirements(self, default_region: Option<&str>) -> Result<UsageRequirements> {
        let mut requirements = UsageRequirements {
            min_vcpu: self.vcpu,
            max_vcpu: self.max_vcpu,
            min_memory_gb: self.memory,
            max_memory_gb: self.max_memory,
            architecture: self.arch.map(Into::into),
            os: self.os.into(),
            max_interruption: InterruptionFrequency::try_from(self.max_interruption)
                .map_err(anyhow::Error::msg)
                .context("Invalid --max-interruption")?,
            preferred_category: self.category.map(Into::into),
            families: self.families,
            allow_burstable: self.allow_burstable,
            allow_bare_metal: self.allow_bare_metal,
            requires_gpu: self.gpu,
            min_savings_percent: self.min_savings,
            top_n: self.top,
            ..Default::default()
        };
        if let Some(region) = self.region.as_deref().or(default_region) {
            requirements.region = region.to_string();
        }
        Ok(requirements)
    }
}

/// Row for the ranking table
#[derive(Tabled)]
struct RankingRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Instance")]
    instance_type: String,
    #[tabled(rename = "vCPU")]
    vcpu: u32,
    #[tabled(rename = "Memory")]
    memory: String,
    #[tabled(rename = "Savings")]
    savings: String,
    #[tabled(rename = "Interruption")]
    interruption: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Recommendation")]
    recommendation: String,
}

/// Rank spot instances for a workload
pub async fn recommend(
    client: &ApiClient,
    requirements: UsageRequirements,
    format: OutputFormat,
) -> Result<()> {
    let report: AnalysisReport = client
        .post("api/v1/recommendations", &requirements)
        .await?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => print_report(&report),
    }

    Ok(())
}

fn print_report(report: &AnalysisReport) {
    println!("{}", "Spot Instance Recommendations".bold());
    println!("{}", "=".repeat(60));
    println!(
        "Region: {}  Cloud: {}  Strategies: {}",
        report.region.cyan(),
        report.cloud.to_string().cyan(),
        if report.strategies.is_empty() {
            "none".to_string()
        } else {
            report.strategies.join(", ")
        }
    );
    println!();

    if report.deadline_exceeded {
        print_warning("Deadline exceeded, results are partial");
    }

    if report.top_instances.is_empty() {
        print_warning("No instances matched the requirements");
        return;
    }

    let rows: Vec<RankingRow> = report
        .top_instances
        .iter()
        .map(|ranked| RankingRow {
            rank: ranked.rank,
            instance_type: ranked.candidate.specs.instance_type.clone(),
            vcpu: ranked.candidate.specs.vcpu,
            memory: format!("{:.1} GiB", ranked.candidate.specs.memory_gb),
            savings: format_percent(ranked.candidate.advisory.savings_percent as f64),
            interruption: ranked.candidate.advisory.interruption.label().to_string(),
            score: color_score(ranked.final_score),
            recommendation: ranked.recommendation.clone(),
        })
        .collect();

    println!("{}", render_table(rows));
    println!("\n{}", report.summary);

    if let Some(top) = report.top_instances.first() {
        for insight in &top.insights {
            println!("  {} {}", "•".blue(), insight);
        }
        for warning in &top.warnings {
            print_warning(warning);
        }
    }
}
