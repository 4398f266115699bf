//! Instance naming helpers: family extraction and size-based estimates

use crate::models::CloudProvider;
use std::collections::BTreeSet;

const AZURE_PREFIX: &str = "Standard_";

/// Family used for allow-list filtering.
///
/// AWS: letters before the first digit (`m5.large` -> `m`).
/// Azure: series letters after `Standard_`, upper-cased (`Standard_D2s_v5` -> `D`).
/// GCP: first dash-separated segment (`n2-standard-4` -> `n2`).
pub fn extract_family(instance_type: &str, cloud: CloudProvider) -> String {
    match cloud {
        CloudProvider::Aws => leading_letters(instance_type).to_string(),
        CloudProvider::Azure => {
            let name = instance_type.strip_prefix(AZURE_PREFIX).unwrap_or(instance_type);
            leading_letters(name).to_ascii_uppercase()
        }
        CloudProvider::Gcp => instance_type
            .split('-')
            .next()
            .unwrap_or(instance_type)
            .to_ascii_lowercase(),
    }
}

/// Generation-qualified family (`m6i.xlarge` -> `m6i`)
pub fn generation_family(instance_type: &str) -> &str {
    instance_type
        .split_once('.')
        .map(|(family, _)| family)
        .unwrap_or(instance_type)
}

/// Case-insensitive family allow-list check
pub fn family_allowed(families: &[String], instance_type: &str, cloud: CloudProvider) -> bool {
    if families.is_empty() {
        return true;
    }
    let family = extract_family(instance_type, cloud);
    families.iter().any(|allowed| allowed.eq_ignore_ascii_case(&family))
}

/// Distinct families present in a set of instance types
pub fn available_families<'a>(
    instance_types: impl IntoIterator<Item = &'a str>,
    cloud: CloudProvider,
) -> Vec<String> {
    instance_types
        .into_iter()
        .map(|instance_type| extract_family(instance_type, cloud))
        .filter(|family| !family.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Rough vCPU count derived from the size part of the name
pub fn estimate_vcpus(instance_type: &str, cloud: CloudProvider) -> u32 {
    match cloud {
        CloudProvider::Aws => {
            let size = instance_type
                .split_once('.')
                .map(|(_, size)| size)
                .unwrap_or(instance_type)
                .to_ascii_lowercase();
            if size.contains("metal") {
                96
            } else if let Some(multiplier) = size.strip_suffix("xlarge") {
                4 * multiplier.parse::<u32>().unwrap_or(1).max(1)
            } else if size == "large" {
                2
            } else {
                1
            }
        }
        CloudProvider::Azure => {
            let name = instance_type.strip_prefix(AZURE_PREFIX).unwrap_or(instance_type);
            first_number(name).filter(|n| (1..=512).contains(n)).unwrap_or(2)
        }
        CloudProvider::Gcp => instance_type
            .rsplit('-')
            .next()
            .and_then(|last| last.parse::<u32>().ok())
            .filter(|n| (1..=512).contains(n))
            .unwrap_or(2),
    }
}

/// Hourly spot price estimate from the family and size alone
pub fn estimate_base_price(instance_type: &str, cloud: CloudProvider) -> f64 {
    let family = extract_family(instance_type, cloud).to_ascii_lowercase();
    let per_vcpu = match cloud {
        CloudProvider::Azure => {
            if family.starts_with('n') {
                0.15
            } else if family.starts_with('m') {
                0.03
            } else if family.starts_with('f') {
                0.015
            } else if family.starts_with('l') {
                0.025
            } else {
                0.01
            }
        }
        CloudProvider::Aws | CloudProvider::Gcp => {
            if family.starts_with('p') || family.starts_with('g') || family.starts_with("inf") {
                0.12
            } else if family.starts_with('r') || family.starts_with('x') {
                0.025
            } else if family.starts_with('c') {
                0.012
            } else if family.starts_with('i') || family.starts_with('d') {
                0.02
            } else {
                0.008
            }
        }
    };
    per_vcpu * f64::from(estimate_vcpus(instance_type, cloud))
}

fn leading_letters(name: &str) -> &str {
    let end = name
        .char_indices()
        .find(|(_, c)| c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(name.len());
    &name[..end]
}

fn first_number(name: &str) -> Option<u32> {
    let start = name.find(|c: char| c.is_ascii_digit())?;
    let digits: String = name[start..].chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}
