//! Hard eligibility rules applied before ranking

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::family::family_allowed;
use crate::models::{CloudProvider, InstanceCandidate, UsageRequirements};

/// Why a candidate was excluded
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    Deprecated,
    InsufficientVcpu,
    ExceedsMaxVcpu,
    InsufficientMemory,
    ExceedsMaxMemory,
    GpuNotNeeded,
    GpuRequired,
    InsufficientGpuCount,
    GpuTypeMismatch,
    BurstableNotAllowed,
    BareMetalNotAllowed,
    FamilyNotAllowed,
    ArchitectureMismatch,
    InsufficientStorage,
    InterruptionTooHigh,
    SavingsBelowMinimum,
    NoSavingsData,
}

impl Rejection {
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::Deprecated => "instance type is deprecated",
            Rejection::InsufficientVcpu => "insufficient vCPU",
            Rejection::ExceedsMaxVcpu => "exceeds maximum vCPU",
            Rejection::InsufficientMemory => "insufficient memory",
            Rejection::ExceedsMaxMemory => "exceeds maximum memory",
            Rejection::GpuNotNeeded => "GPU instance not needed for non-GPU workload",
            Rejection::GpuRequired => "GPU required but instance has no GPU",
            Rejection::InsufficientGpuCount => "insufficient GPU count",
            Rejection::GpuTypeMismatch => "GPU type mismatch",
            Rejection::BurstableNotAllowed => "burstable instances not allowed",
            Rejection::BareMetalNotAllowed => "bare metal instances not allowed",
            Rejection::FamilyNotAllowed => "instance family not in allowed list",
            Rejection::ArchitectureMismatch => "architecture mismatch",
            Rejection::InsufficientStorage => "insufficient storage",
            Rejection::InterruptionTooHigh => "interruption frequency too high",
            Rejection::SavingsBelowMinimum => "savings below minimum threshold",
            Rejection::NoSavingsData => "no savings data available",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// Result of filtering a candidate list
#[derive(Debug, Default)]
pub struct FilterOutcome {
    pub eligible: Vec<InstanceCandidate>,
    pub rejected: Vec<(String, Rejection)>,
}

impl FilterOutcome {
    /// Rejection counts keyed by reason
    pub fn rejection_counts(&self) -> BTreeMap<Rejection, usize> {
        let mut counts = BTreeMap::new();
        for (_, rejection) in &self.rejected {
            *counts.entry(*rejection).or_insert(0) += 1;
        }
        counts
    }
}

/// Requirement-driven candidate filter for one cloud
#[derive(Debug, Clone, Copy, Default)]
pub struct EligibilityFilter {
    cloud: CloudProvider,
}

impl EligibilityFilter {
    pub fn new(cloud: CloudProvider) -> Self {
        Self { cloud }
    }

    /// First rule the candidate breaks, if any
    pub fn check(&self, candidate: &InstanceCandidate, req: &UsageRequirements) -> Result<(), Rejection> {
        let specs = &candidate.specs;
        let advisory = &candidate.advisory;

        if specs.is_deprecated {
            return Err(Rejection::Deprecated);
        }

        if specs.vcpu < req.min_vcpu {
            return Err(Rejection::InsufficientVcpu);
        }
        if req.max_vcpu.is_some_and(|max| max > 0 && specs.vcpu > max) {
            return Err(Rejection::ExceedsMaxVcpu);
        }

        if req.min_memory_gb.is_some_and(|min| min > 0.0 && specs.memory_gb < min) {
            return Err(Rejection::InsufficientMemory);
        }
        if req.max_memory_gb.is_some_and(|max| max > 0.0 && specs.memory_gb > max) {
            return Err(Rejection::ExceedsMaxMemory);
        }

        if !req.requires_gpu && specs.has_gpu {
            return Err(Rejection::GpuNotNeeded);
        }
        if req.requires_gpu && !specs.has_gpu {
            return Err(Rejection::GpuRequired);
        }
        if req.requires_gpu && req.min_gpu_count > 0 && specs.gpu_count < req.min_gpu_count {
            return Err(Rejection::InsufficientGpuCount);
        }
        if let Some(wanted) = req.gpu_type.as_deref().filter(|t| !t.is_empty()) {
            if specs.has_gpu {
                let actual = specs.gpu_type.as_deref().unwrap_or_default().to_ascii_lowercase();
                if !actual.contains(&wanted.to_ascii_lowercase()) {
                    return Err(Rejection::GpuTypeMismatch);
                }
            }
        }

        if specs.is_burstable && !req.allow_burstable {
            return Err(Rejection::BurstableNotAllowed);
        }
        if specs.is_bare_metal && !req.allow_bare_metal {
            return Err(Rejection::BareMetalNotAllowed);
        }

        if !family_allowed(&req.families, &specs.instance_type, self.cloud) {
            return Err(Rejection::FamilyNotAllowed);
        }

        if req.architecture.is_some_and(|arch| arch != specs.architecture) {
            return Err(Rejection::ArchitectureMismatch);
        }

        if req.min_storage_gb.is_some_and(|min| min > 0.0 && specs.storage_gb < min) {
            return Err(Rejection::InsufficientStorage);
        }

        if advisory.interruption > req.max_interruption {
            return Err(Rejection::InterruptionTooHigh);
        }
        if req.min_savings_percent > 0 && advisory.savings_percent < req.min_savings_percent {
            return Err(Rejection::SavingsBelowMinimum);
        }
        if advisory.savings_percent == 0 {
            return Err(Rejection::NoSavingsData);
        }

        Ok(())
    }

    pub fn filter(&self, candidates: Vec<InstanceCandidate>, req: &UsageRequirements) -> FilterOutcome {
        let mut outcome = FilterOutcome::default();
        for candidate in candidates {
            match self.check(&candidate, req) {
                Ok(()) => outcome.eligible.push(candidate),
                Err(rejection) => outcome
                    .rejected
                    .push((candidate.instance_type().to_string(), rejection)),
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Architecture, InstanceSpecs, InterruptionFrequency};

    fn candidate(instance_type: &str, vcpu: u32, memory: f64) -> InstanceCandidate {
        InstanceCandidate::new(
            InstanceSpecs::new(instance_type, vcpu, memory),
            60,
            InterruptionFrequency::Low,
        )
    }

    fn check(candidate: &InstanceCandidate, req: &UsageRequirements) -> Result<(), Rejection> {
        EligibilityFilter::new(CloudProvider::Aws).check(candidate, req)
    }

    #[test]
    fn test_eligible_candidate_passes() {
        assert_eq!(check(&candidate("m5.large", 2, 8.0), &UsageRequirements::default()), Ok(()));
    }

    #[test]
    fn test_size_bounds() {
        let req = UsageRequirements {
            min_vcpu: 4,
            max_vcpu: Some(8),
            min_memory_gb: Some(16.0),
            ..Default::default()
        };
        assert_eq!(check(&candidate("m5.large", 2, 8.0), &req), Err(Rejection::InsufficientVcpu));
        assert_eq!(check(&candidate("m5.4xlarge", 16, 64.0), &req), Err(Rejection::ExceedsMaxVcpu));
        assert_eq!(check(&candidate("c5.xlarge", 4, 8.0), &req), Err(Rejection::InsufficientMemory));
        assert_eq!(check(&candidate("m5.xlarge", 4, 16.0), &req), Ok(()));
    }

    #[test]
    fn test_gpu_rules() {
        let mut gpu = candidate("g5.xlarge", 4, 16.0);
        gpu.specs.has_gpu = true;
        gpu.specs.gpu_count = 1;
        gpu.specs.gpu_type = Some("NVIDIA A10G".to_string());

        assert_eq!(check(&gpu, &UsageRequirements::default()), Err(Rejection::GpuNotNeeded));

        let wants_gpu = UsageRequirements {
            requires_gpu: true,
            gpu_type: Some("a10g".to_string()),
            ..Default::default()
        };
        assert_eq!(check(&gpu, &wants_gpu), Ok(()));
        assert_eq!(check(&candidate("m5.xlarge", 4, 16.0), &wants_gpu), Err(Rejection::GpuRequired));

        let wants_two = UsageRequirements {
            requires_gpu: true,
            min_gpu_count: 2,
            ..Default::default()
        };
        assert_eq!(check(&gpu, &wants_two), Err(Rejection::InsufficientGpuCount));

        let wants_v100 = UsageRequirements {
            requires_gpu: true,
            gpu_type: Some("V100".to_string()),
            ..Default::default()
        };
        assert_eq!(check(&gpu, &wants_v100), Err(Rejection::GpuTypeMismatch));
    }

    #[test]
    fn test_flags_family_and_architecture() {
        let mut burst = candidate("t3.large", 2, 8.0);
        burst.specs.is_burstable = true;
        assert_eq!(check(&burst, &UsageRequirements::default()), Err(Rejection::BurstableNotAllowed));

        let families = UsageRequirements {
            families: vec!["C".to_string()],
            ..Default::default()
        };
        assert_eq!(check(&candidate("m5.large", 2, 8.0), &families), Err(Rejection::FamilyNotAllowed));
        assert_eq!(check(&candidate("c6i.large", 2, 4.0), &families), Ok(()));

        let arm = UsageRequirements {
            architecture: Some(Architecture::Arm64),
            ..Default::default()
        };
        assert_eq!(check(&candidate("m5.large", 2, 8.0), &arm), Err(Rejection::ArchitectureMismatch));
    }

    #[test]
    fn test_advisory_rules() {
        let mut risky = candidate("m5.large", 2, 8.0);
        risky.advisory.interruption = InterruptionFrequency::VeryHigh;
        assert_eq!(check(&risky, &UsageRequirements::default()), Err(Rejection::InterruptionTooHigh));

        let mut no_savings = candidate("m5.large", 2, 8.0);
        no_savings.advisory.savings_percent = 0;
        assert_eq!(check(&no_savings, &UsageRequirements::default()), Err(Rejection::NoSavingsData));

        let picky = UsageRequirements {
            min_savings_percent: 70,
            ..Default::default()
        };
        assert_eq!(check(&candidate("m5.large", 2, 8.0), &picky), Err(Rejection::SavingsBelowMinimum));
    }

    #[test]
    fn test_filter_collects_reasons() {
        let mut deprecated = candidate("m1.large", 2, 7.5);
        deprecated.specs.is_deprecated = true;

        let outcome = EligibilityFilter::new(CloudProvider::Aws).filter(
            vec![candidate("m5.large", 2, 8.0), deprecated, candidate("t3.micro", 1, 1.0)],
            &UsageRequirements::default(),
        );

        assert_eq!(outcome.eligible.len(), 1);
        assert_eq!(outcome.rejected.len(), 2);
        assert_eq!(outcome.rejected[0], ("m1.large".to_string(), Rejection::Deprecated));
        assert_eq!(outcome.rejection_counts()[&Rejection::InsufficientVcpu], 1);
        assert_eq!(Rejection::Deprecated.to_string(), "instance type is deprecated");
    }
}
