//! Ranking pipeline: baseline, bounded enhancement, final sort

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};

use super::baseline::baseline_score;
use super::insights::{recommendation_text, warnings};
use super::{blend_final_score, ScoringStrategy};
use crate::error::{AdvisorError, Result};
use crate::fanout::{run_bounded, DEFAULT_MAX_WORKERS};
use crate::models::{
    InstanceCandidate, RankedInstance, RankingOutcome, ScoreFactors, UsageRequirements,
};

/// Default bound on a single strategy call
pub const DEFAULT_STRATEGY_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct ScoringConfig {
    pub max_workers: usize,
    pub strategy_timeout: Duration,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            strategy_timeout: DEFAULT_STRATEGY_TIMEOUT,
        }
    }
}

/// Strategy results for one candidate
struct Enhancement {
    scores: BTreeMap<String, ScoreFactors>,
    /// One note per strategy that failed or timed out
    skipped: Vec<String>,
}

pub struct ScoringEngine {
    strategies: Arc<Vec<Arc<dyn ScoringStrategy>>>,
    config: ScoringConfig,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl ScoringEngine {
    pub fn new(strategies: Vec<Arc<dyn ScoringStrategy>>) -> Self {
        Self {
            strategies: Arc::new(strategies),
            config: ScoringConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ScoringConfig) -> Self {
        self.config = config;
        self
    }

    pub fn strategy_names(&self) -> Vec<String> {
        self.strategies.iter().map(|s| s.name().to_string()).collect()
    }

    /// Rank candidates by final score.
    ///
    /// Every candidate is returned. Candidates whose enhancement misses the
    /// deadline keep their baseline score; if none finished the call fails
    /// with [`AdvisorError::DeadlineExceeded`].
    pub async fn rank(
        &self,
        requirements: &UsageRequirements,
        candidates: Vec<InstanceCandidate>,
        deadline: Option<Instant>,
    ) -> Result<RankingOutcome> {
        if candidates.is_empty() {
            return Err(AdvisorError::NoCandidates);
        }

        let mut ranked: Vec<RankedInstance> = candidates
            .into_iter()
            .map(|candidate| {
                let (score, breakdown) = baseline_score(&candidate, requirements);
                RankedInstance {
                    candidate,
                    rank: 0,
                    baseline_score: score,
                    baseline: breakdown,
                    strategy_scores: BTreeMap::new(),
                    final_score: score,
                    insights: Vec::new(),
                    recommendation: String::new(),
                    warnings: Vec::new(),
                }
            })
            .collect();

        let mut enhanced = 0;
        let mut skipped_strategies = 0;
        let mut deadline_exceeded = false;

        if !self.strategies.is_empty() {
            let total = ranked.len();
            let requirements = Arc::new(requirements.clone());
            let strategies = Arc::clone(&self.strategies);
            let strategy_timeout = self.config.strategy_timeout;

            let work: Vec<InstanceCandidate> = ranked.iter().map(|r| r.candidate.clone()).collect();
            let result = run_bounded(work, self.config.max_workers, deadline, move |candidate| {
                let requirements = Arc::clone(&requirements);
                let strategies = Arc::clone(&strategies);
                async move {
                    enhance(&candidate, &requirements, &strategies, strategy_timeout).await
                }
            })
            .await;

            deadline_exceeded = result.deadline_exceeded;
            if deadline_exceeded && result.completed.is_empty() {
                warn!(total = total, "Ranking deadline passed before any candidate finished");
                return Err(AdvisorError::DeadlineExceeded {
                    completed: 0,
                    total,
                });
            }

            for (index, enhancement) in result.completed {
                let entry = &mut ranked[index];
                entry.final_score = blend_final_score(entry.baseline_score, &enhancement.scores);
                entry.insights = enhancement
                    .scores
                    .values()
                    .flat_map(|factors| factors.insights.iter().cloned())
                    .chain(enhancement.skipped.iter().cloned())
                    .collect();
                entry.strategy_scores = enhancement.scores;
                skipped_strategies += enhancement.skipped.len();
                enhanced += 1;
            }

            if deadline_exceeded {
                warn!(
                    completed = enhanced,
                    total = total,
                    "Ranking deadline passed, unfinished candidates keep baseline scores"
                );
            }
        }

        for entry in ranked.iter_mut() {
            entry.recommendation = recommendation_text(
                entry.final_score,
                &entry.candidate,
                &entry.baseline,
                requirements,
            );
            entry.warnings = warnings(&entry.candidate, requirements);
        }

        // Stable sort keeps input order among equal scores
        ranked.sort_by(|a, b| {
            b.final_score
                .partial_cmp(&a.final_score)
                .unwrap_or(Ordering::Equal)
        });
        for (i, entry) in ranked.iter_mut().enumerate() {
            entry.rank = i + 1;
        }

        info!(
            candidates = ranked.len(),
            enhanced = enhanced,
            skipped_strategies = skipped_strategies,
            deadline_exceeded = deadline_exceeded,
            "Ranking complete"
        );

        Ok(RankingOutcome {
            instances: ranked,
            strategies: self.strategy_names(),
            enhanced,
            skipped_strategies,
            deadline_exceeded,
        })
    }
}

async fn enhance(
    candidate: &InstanceCandidate,
    requirements: &UsageRequirements,
    strategies: &[Arc<dyn ScoringStrategy>],
    strategy_timeout: Duration,
) -> Enhancement {
    let mut scores = BTreeMap::new();
    let mut skipped = Vec::new();

    for strategy in strategies {
        match timeout(strategy_timeout, strategy.compute(candidate, requirements)).await {
            Ok(Ok(factors)) => {
                scores.insert(strategy.name().to_string(), factors);
            }
            Ok(Err(e)) => {
                skipped.push(format!("{} skipped: {}", strategy.name(), e));
                warn!(
                    instance_type = %candidate.instance_type(),
                    strategy = %strategy.name(),
                    error = %e,
                    "Scoring strategy failed, skipping"
                );
            }
            Err(_) => {
                skipped.push(format!("{} skipped: timed out", strategy.name()));
                warn!(
                    instance_type = %candidate.instance_type(),
                    strategy = %strategy.name(),
                    "Scoring strategy timed out, skipping"
                );
            }
        }
    }

    debug!(
        instance_type = %candidate.instance_type(),
        strategies = scores.len(),
        skipped = skipped.len(),
        "Candidate enhanced"
    );
    Enhancement { scores, skipped }
}
