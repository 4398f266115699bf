//! Baseline score from static advisory data and specs
//!
//! Pure and infallible: no provider is consulted.

use crate::models::{
    BaselineBreakdown, InstanceCandidate, InstanceGeneration, InstanceSpecs, InterruptionFrequency,
    SpotAdvisory, UsageRequirements,
};

pub const SAVINGS_WEIGHT: f64 = 0.30;
pub const STABILITY_WEIGHT: f64 = 0.25;
pub const FITNESS_WEIGHT: f64 = 0.25;
pub const VALUE_WEIGHT: f64 = 0.20;

/// Penalty applied to deprecated hardware; older generations get a fraction
pub const GENERATION_PENALTY_MAX: f64 = 0.15;

pub const BURSTABLE_PENALTY: f64 = 0.10;

/// Savings treated as the realistic ceiling
const MAX_REALISTIC_SAVINGS: f64 = 90.0;

/// Score a candidate in [0, 1] and return the per-factor breakdown
pub fn baseline_score(
    candidate: &InstanceCandidate,
    requirements: &UsageRequirements,
) -> (f64, BaselineBreakdown) {
    let specs = &candidate.specs;
    let advisory = &candidate.advisory;

    let mut breakdown = BaselineBreakdown {
        savings: (f64::from(advisory.savings_percent) / MAX_REALISTIC_SAVINGS).min(1.0),
        stability: stability_score(advisory.interruption),
        fitness: fitness_score(specs, requirements),
        value: value_score(specs, advisory, requirements),
        generation_penalty: generation_penalty(specs.generation),
        burstable_penalty: 0.0,
    };

    if specs.is_burstable && !requirements.allow_burstable {
        breakdown.burstable_penalty = BURSTABLE_PENALTY;
    }

    let total = breakdown.savings * SAVINGS_WEIGHT
        + breakdown.stability * STABILITY_WEIGHT
        + breakdown.fitness * FITNESS_WEIGHT
        + breakdown.value * VALUE_WEIGHT
        - breakdown.generation_penalty
        - breakdown.burstable_penalty;

    (total.clamp(0.0, 1.0), breakdown)
}

pub fn stability_score(interruption: InterruptionFrequency) -> f64 {
    match interruption {
        InterruptionFrequency::VeryLow => 1.0,
        InterruptionFrequency::Low => 0.8,
        InterruptionFrequency::Medium => 0.6,
        InterruptionFrequency::High => 0.4,
        InterruptionFrequency::VeryHigh => 0.2,
    }
}

/// How well the hardware matches the requested shape
pub fn fitness_score(specs: &InstanceSpecs, requirements: &UsageRequirements) -> f64 {
    let mut score: f64 = 1.0;

    if requirements.min_vcpu > 0 {
        let ratio = f64::from(specs.vcpu) / f64::from(requirements.min_vcpu);
        score *= if ratio < 1.0 {
            ratio * 0.5
        } else if ratio <= 1.5 {
            1.0
        } else if ratio <= 2.0 {
            0.9
        } else {
            0.8 / ratio.log2()
        };
    }

    if let Some(max_vcpu) = requirements.max_vcpu {
        if max_vcpu > 0 && specs.vcpu > max_vcpu {
            score *= 0.5;
        }
    }

    if let Some(min_memory) = requirements.min_memory_gb.filter(|m| *m > 0.0) {
        let ratio = specs.memory_gb / min_memory;
        score *= if ratio < 1.0 {
            ratio * 0.5
        } else if ratio <= 2.0 {
            1.0
        } else {
            0.9
        };
    }

    if requirements.preferred_category == Some(specs.category) {
        score *= 1.1;
    }

    if let Some(arch) = requirements.architecture {
        if specs.architecture != arch {
            score *= 0.7;
        }
    }

    if requirements.requires_gpu {
        if !specs.has_gpu {
            return 0.0;
        }
        if requirements.min_gpu_count > 0 && specs.gpu_count < requirements.min_gpu_count {
            score *= f64::from(specs.gpu_count) / f64::from(requirements.min_gpu_count);
        }
    }

    score.clamp(0.0, 1.0)
}

/// Size and savings per unit of requested capacity, log-scaled on vCPU
pub fn value_score(specs: &InstanceSpecs, advisory: &SpotAdvisory, requirements: &UsageRequirements) -> f64 {
    let min_vcpu = requirements.min_vcpu.max(1);
    let vcpu_factor = (f64::from(specs.vcpu) + 1.0).log2() / (f64::from(min_vcpu) + 1.0).log2();
    let savings_factor = f64::from(advisory.savings_percent) / 100.0;
    let memory_factor = match requirements.min_memory_gb.filter(|m| *m > 0.0) {
        Some(min_memory) => (specs.memory_gb / min_memory).min(2.0) / 2.0,
        None => 1.0,
    };

    (vcpu_factor * 0.4 + savings_factor * 0.4 + memory_factor * 0.2).clamp(0.0, 1.0)
}

pub fn generation_penalty(generation: InstanceGeneration) -> f64 {
    match generation {
        InstanceGeneration::Current => 0.0,
        InstanceGeneration::Previous => GENERATION_PENALTY_MAX * 0.3,
        InstanceGeneration::Legacy => GENERATION_PENALTY_MAX * 0.7,
        InstanceGeneration::Deprecated => GENERATION_PENALTY_MAX,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Architecture, InstanceCategory};

    fn candidate(vcpu: u32, memory: f64, savings: u32, interruption: InterruptionFrequency) -> InstanceCandidate {
        InstanceCandidate::new(InstanceSpecs::new("m5.large", vcpu, memory), savings, interruption)
    }

    #[test]
    fn test_higher_savings_and_stability_score_higher() {
        let req = UsageRequirements::default();
        let (good, _) = baseline_score(&candidate(2, 8.0, 80, InterruptionFrequency::VeryLow), &req);
        let (bad, _) = baseline_score(&candidate(2, 8.0, 40, InterruptionFrequency::VeryHigh), &req);
        assert!(good > bad);
        assert!((0.0..=1.0).contains(&good));
    }

    #[test]
    fn test_breakdown_values() {
        let req = UsageRequirements::default();
        let (score, breakdown) =
            baseline_score(&candidate(2, 8.0, 90, InterruptionFrequency::VeryLow), &req);
        assert_eq!(breakdown.savings, 1.0);
        assert_eq!(breakdown.stability, 1.0);
        assert_eq!(breakdown.fitness, 1.0);
        // 0.4 * 1 + 0.4 * 0.9 + 0.2 * 1
        assert!((breakdown.value - 0.96).abs() < 1e-12);
        assert!((score - (0.30 + 0.25 + 0.25 + 0.2 * 0.96)).abs() < 1e-12);
    }

    #[test]
    fn test_fitness_penalties() {
        let req = UsageRequirements {
            min_vcpu: 4,
            ..Default::default()
        };
        assert!((fitness_score(&InstanceSpecs::new("a", 2, 4.0), &req) - 0.25).abs() < 1e-12);
        assert!((fitness_score(&InstanceSpecs::new("a", 8, 4.0), &req) - 0.9).abs() < 1e-12);
        assert!((fitness_score(&InstanceSpecs::new("a", 16, 4.0), &req) - 0.4).abs() < 1e-12);

        let arm = UsageRequirements {
            architecture: Some(Architecture::Arm64),
            ..Default::default()
        };
        assert!((fitness_score(&InstanceSpecs::new("a", 2, 4.0), &arm) - 0.7).abs() < 1e-12);

        let gpu = UsageRequirements {
            requires_gpu: true,
            ..Default::default()
        };
        assert_eq!(fitness_score(&InstanceSpecs::new("a", 2, 4.0), &gpu), 0.0);
    }

    #[test]
    fn test_category_bonus_is_clamped() {
        let req = UsageRequirements {
            preferred_category: Some(InstanceCategory::ComputeOptimized),
            ..Default::default()
        };
        let mut specs = InstanceSpecs::new("c5.large", 2, 4.0);
        specs.category = InstanceCategory::ComputeOptimized;
        assert_eq!(fitness_score(&specs, &req), 1.0);
    }

    #[test]
    fn test_penalties_reduce_score() {
        let req = UsageRequirements::default();
        let base = candidate(2, 8.0, 70, InterruptionFrequency::Low);
        let (current, _) = baseline_score(&base, &req);

        let mut legacy = base.clone();
        legacy.specs.generation = InstanceGeneration::Legacy;
        let (legacy_score, breakdown) = baseline_score(&legacy, &req);
        assert!((breakdown.generation_penalty - 0.105).abs() < 1e-12);
        assert!((current - legacy_score - 0.105).abs() < 1e-12);

        let mut burstable = base.clone();
        burstable.specs.is_burstable = true;
        let (burst_score, breakdown) = baseline_score(&burstable, &req);
        assert_eq!(breakdown.burstable_penalty, BURSTABLE_PENALTY);
        assert!((current - burst_score - BURSTABLE_PENALTY).abs() < 1e-12);
    }

    #[test]
    fn test_zero_min_vcpu_does_not_divide_by_zero() {
        let req = UsageRequirements {
            min_vcpu: 0,
            ..Default::default()
        };
        let (score, breakdown) =
            baseline_score(&candidate(4, 16.0, 60, InterruptionFrequency::Low), &req);
        assert!(score.is_finite());
        assert!(breakdown.value.is_finite());
    }
}
