//! Recommendation sentences and warnings for ranked instances

use crate::models::{
    Architecture, BaselineBreakdown, InstanceCandidate, InstanceGeneration, InterruptionFrequency,
    UsageRequirements,
};

/// One-line verdict: a score band followed by notable traits
pub fn recommendation_text(
    score: f64,
    candidate: &InstanceCandidate,
    breakdown: &BaselineBreakdown,
    requirements: &UsageRequirements,
) -> String {
    let verdict = if score >= 0.85 {
        "Excellent choice"
    } else if score >= 0.70 {
        "Good choice"
    } else if score >= 0.55 {
        "Reasonable choice"
    } else if score >= 0.40 {
        "Acceptable"
    } else {
        "Consider alternatives"
    };

    let traits = traits(candidate, breakdown, requirements);
    if traits.is_empty() {
        verdict.to_string()
    } else {
        format!("{} - {}", verdict, traits.join("; "))
    }
}

fn traits(
    candidate: &InstanceCandidate,
    breakdown: &BaselineBreakdown,
    requirements: &UsageRequirements,
) -> Vec<String> {
    let specs = &candidate.specs;
    let savings = candidate.advisory.savings_percent;
    let mut traits = Vec::new();

    if savings >= 80 {
        traits.push(format!("exceptional savings of {}%", savings));
    } else if savings >= 60 {
        traits.push(format!("good savings of {}%", savings));
    }

    match candidate.advisory.interruption {
        InterruptionFrequency::VeryLow => traits.push("very stable (<5% interruption)".to_string()),
        InterruptionFrequency::Low => traits.push("stable (5-10% interruption)".to_string()),
        InterruptionFrequency::Medium => {
            traits.push("moderate stability (10-15% interruption)".to_string())
        }
        _ => {}
    }

    if specs.generation == InstanceGeneration::Current {
        traits.push("current generation hardware".to_string());
    }

    if specs.architecture == Architecture::Arm64 {
        traits.push("ARM-based with strong price/performance".to_string());
    }

    if requirements.preferred_category == Some(specs.category) {
        traits.push("matches preferred category".to_string());
    }

    if breakdown.value >= 0.8 {
        traits.push("excellent value".to_string());
    }

    if let Some(ratio) = vcpu_ratio(specs.vcpu, requirements.min_vcpu) {
        if (1.0..=1.25).contains(&ratio) {
            traits.push("optimal sizing".to_string());
        } else if ratio > 2.0 {
            traits.push("over-provisioned, consider a smaller size".to_string());
        }
    }

    traits
}

/// Risks worth surfacing next to a recommendation
pub fn warnings(candidate: &InstanceCandidate, requirements: &UsageRequirements) -> Vec<String> {
    let specs = &candidate.specs;
    let advisory = &candidate.advisory;
    let mut warnings = Vec::new();

    if advisory.interruption >= InterruptionFrequency::High {
        warnings.push(format!(
            "High interruption frequency ({}), design for fault tolerance",
            advisory.interruption.label()
        ));
    }

    if advisory.savings_percent < 30 {
        warnings.push(format!(
            "Low savings ({}%), on-demand may be more predictable",
            advisory.savings_percent
        ));
    }

    match specs.generation {
        InstanceGeneration::Previous => warnings
            .push("Previous generation instance, newer options may perform better".to_string()),
        InstanceGeneration::Legacy => warnings
            .push("Legacy generation instance, consider a current generation type".to_string()),
        _ => {}
    }

    if specs.is_burstable {
        warnings.push("Burstable instance, sustained load may be throttled".to_string());
    }

    if let Some(ratio) = vcpu_ratio(specs.vcpu, requirements.min_vcpu) {
        if ratio > 3.0 {
            warnings.push(format!(
                "Significantly over-provisioned ({:.1}x required vCPU)",
                ratio
            ));
        }
    }

    if let Some(min_memory) = requirements.min_memory_gb.filter(|m| *m > 0.0) {
        let ratio = specs.memory_gb / min_memory;
        if ratio > 4.0 {
            warnings.push("Significant memory over-provisioning".to_string());
        } else if (1.0..1.5).contains(&ratio) {
            warnings.push("Memory headroom is tight, consider the next size up".to_string());
        }
    }

    if specs.architecture == Architecture::Arm64 && requirements.architecture.is_none() {
        warnings.push("ARM64 architecture, verify application compatibility".to_string());
    }

    if specs.is_bare_metal {
        warnings.push("Bare metal instance, expect longer provisioning".to_string());
    }

    warnings
}

fn vcpu_ratio(vcpu: u32, min_vcpu: u32) -> Option<f64> {
    (min_vcpu > 0).then(|| f64::from(vcpu) / f64::from(min_vcpu))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InstanceSpecs;

    fn candidate(vcpu: u32, savings: u32, interruption: InterruptionFrequency) -> InstanceCandidate {
        InstanceCandidate::new(InstanceSpecs::new("m6i.large", vcpu, 8.0), savings, interruption)
    }

    #[test]
    fn test_recommendation_bands() {
        let req = UsageRequirements::default();
        let breakdown = BaselineBreakdown::default();
        let c = candidate(2, 85, InterruptionFrequency::VeryLow);

        let text = recommendation_text(0.9, &c, &breakdown, &req);
        assert!(text.starts_with("Excellent choice - exceptional savings of 85%"));
        assert!(text.contains("optimal sizing"));

        let weak = candidate(2, 10, InterruptionFrequency::VeryHigh);
        let mut old = weak.clone();
        old.specs.generation = InstanceGeneration::Legacy;
        assert_eq!(
            recommendation_text(0.2, &old, &breakdown, &req),
            "Consider alternatives - optimal sizing"
        );
    }

    #[test]
    fn test_warnings() {
        let req = UsageRequirements {
            min_vcpu: 2,
            min_memory_gb: Some(7.0),
            ..Default::default()
        };
        let mut c = candidate(8, 20, InterruptionFrequency::High);
        c.specs.is_burstable = true;
        c.specs.architecture = Architecture::Arm64;
        c.specs.generation = InstanceGeneration::Previous;

        let warnings = warnings(&c, &req);
        assert!(warnings[0].starts_with("High interruption frequency (15-20%)"));
        assert!(warnings.iter().any(|w| w.starts_with("Low savings (20%)")));
        assert!(warnings.iter().any(|w| w.starts_with("Previous generation")));
        assert!(warnings.iter().any(|w| w.starts_with("Burstable")));
        assert!(warnings.iter().any(|w| w.contains("4.0x required vCPU")));
        assert!(warnings.iter().any(|w| w.starts_with("Memory headroom is tight")));
        assert!(warnings.iter().any(|w| w.starts_with("ARM64")));
    }

    #[test]
    fn test_clean_candidate_has_no_warnings() {
        let c = candidate(2, 70, InterruptionFrequency::Low);
        assert!(warnings(&c, &UsageRequirements::default()).is_empty());
    }
}
