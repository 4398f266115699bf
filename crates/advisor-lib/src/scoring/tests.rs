//! Ranking pipeline tests
//!
//! Strategies here are in-memory fakes so that ordering, timeouts and the
//! deadline path can be exercised without a price source.

#[cfg(test)]
mod ranking_tests {
    use crate::error::AdvisorError;
    use crate::models::{
        DataSource, InstanceCandidate, InstanceSpecs, InterruptionFrequency, ScoreFactors,
        UsageRequirements,
    };
    use crate::scoring::{
        blend_final_score, HistoricalPriceStrategy, ScoringConfig, ScoringEngine, ScoringStrategy,
    };
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;

    fn factors(combined: f64) -> ScoreFactors {
        ScoreFactors {
            volatility: combined,
            trend: combined,
            capacity: combined,
            time_pattern: combined,
            popularity: combined,
            combined,
            data_source: DataSource::Heuristic,
            insights: vec![format!("fixed {}", combined)],
        }
    }

    /// Returns a fixed combined score per instance type
    struct Fixed {
        name: &'static str,
        scores: BTreeMap<&'static str, f64>,
    }

    #[async_trait]
    impl ScoringStrategy for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        async fn compute(
            &self,
            candidate: &InstanceCandidate,
            _requirements: &UsageRequirements,
        ) -> anyhow::Result<ScoreFactors> {
            Ok(factors(
                self.scores
                    .get(candidate.instance_type())
                    .copied()
                    .unwrap_or(0.5),
            ))
        }
    }

    struct Failing;

    #[async_trait]
    impl ScoringStrategy for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn compute(
            &self,
            _candidate: &InstanceCandidate,
            _requirements: &UsageRequirements,
        ) -> anyhow::Result<ScoreFactors> {
            anyhow::bail!("upstream unavailable")
        }
    }

    /// Sleeps longer for instance types whose name contains "slow"
    struct Sleepy;

    #[async_trait]
    impl ScoringStrategy for Sleepy {
        fn name(&self) -> &str {
            "sleepy"
        }

        async fn compute(
            &self,
            candidate: &InstanceCandidate,
            _requirements: &UsageRequirements,
        ) -> anyhow::Result<ScoreFactors> {
            let delay = if candidate.instance_type().contains("slow") {
                Duration::from_secs(30)
            } else {
                Duration::from_millis(10)
            };
            tokio::time::sleep(delay).await;
            Ok(factors(1.0))
        }
    }

    fn candidates() -> Vec<InstanceCandidate> {
        let savings = [80, 70, 60, 50, 40];
        let interruption = [
            InterruptionFrequency::VeryLow,
            InterruptionFrequency::Low,
            InterruptionFrequency::Medium,
            InterruptionFrequency::High,
            InterruptionFrequency::VeryHigh,
        ];
        savings
            .iter()
            .zip(interruption)
            .enumerate()
            .map(|(i, (&savings, interruption))| {
                InstanceCandidate::new(
                    InstanceSpecs::new(format!("m5.type{}", i), 2, 8.0),
                    savings,
                    interruption,
                )
            })
            .collect()
    }

    fn assert_dense_and_sorted(outcome: &crate::models::RankingOutcome) {
        for (i, instance) in outcome.instances.iter().enumerate() {
            assert_eq!(instance.rank, i + 1);
        }
        for pair in outcome.instances.windows(2) {
            assert!(pair[0].final_score >= pair[1].final_score);
        }
    }

    #[tokio::test]
    async fn test_baseline_only_preserves_advisory_order() {
        let engine = ScoringEngine::default();
        let outcome = engine
            .rank(&UsageRequirements::default(), candidates(), None)
            .await
            .unwrap();

        let order: Vec<&str> = outcome.instances.iter().map(|r| r.instance_type()).collect();
        assert_eq!(order, vec!["m5.type0", "m5.type1", "m5.type2", "m5.type3", "m5.type4"]);
        assert!(outcome.instances[0].final_score > outcome.instances[4].final_score);
        assert_eq!(outcome.enhanced, 0);
        assert!(outcome.strategies.is_empty());
        assert_dense_and_sorted(&outcome);

        for instance in &outcome.instances {
            assert_eq!(instance.final_score, instance.baseline_score);
            assert!(!instance.recommendation.is_empty());
        }
    }

    #[tokio::test]
    async fn test_heuristic_strategy_keeps_order_and_enhances_all() {
        let engine = ScoringEngine::new(vec![Arc::new(HistoricalPriceStrategy::heuristic())]);
        let outcome = engine
            .rank(&UsageRequirements::default(), candidates(), None)
            .await
            .unwrap();

        assert_eq!(outcome.instances.len(), 5);
        assert_eq!(outcome.enhanced, 5);
        assert_eq!(outcome.strategies, vec!["historical_price_analysis".to_string()]);
        assert_eq!(outcome.instances[0].instance_type(), "m5.type0");
        assert_eq!(outcome.instances[4].instance_type(), "m5.type4");
        assert_dense_and_sorted(&outcome);
    }

    #[tokio::test]
    async fn test_strategies_can_reorder() {
        let mut scores = BTreeMap::new();
        scores.insert("m5.type0", 0.0);
        scores.insert("m5.type1", 1.0);
        let engine = ScoringEngine::new(vec![Arc::new(Fixed {
            name: "fixed",
            scores,
        })]);

        let outcome = engine
            .rank(&UsageRequirements::default(), candidates(), None)
            .await
            .unwrap();

        assert_eq!(outcome.instances[0].instance_type(), "m5.type1");
        let top = &outcome.instances[0];
        assert!(
            (top.final_score - blend_final_score(top.baseline_score, &top.strategy_scores)).abs()
                < 1e-12
        );
        assert_eq!(top.insights, vec!["fixed 1".to_string()]);
    }

    #[tokio::test]
    async fn test_failing_strategy_is_skipped_not_fatal() {
        let engine = ScoringEngine::new(vec![
            Arc::new(Failing),
            Arc::new(Fixed {
                name: "fixed",
                scores: BTreeMap::new(),
            }),
        ]);
        let outcome = engine
            .rank(&UsageRequirements::default(), candidates(), None)
            .await
            .unwrap();

        assert_eq!(outcome.skipped_strategies, 5);
        assert_eq!(outcome.enhanced, 5);
        for instance in &outcome.instances {
            assert_eq!(instance.strategy_scores.len(), 1);
            assert!(instance.strategy_scores.contains_key("fixed"));
            assert_eq!(
                instance.insights,
                vec![
                    "fixed 0.5".to_string(),
                    "failing skipped: upstream unavailable".to_string()
                ]
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_strategy_timeout_falls_back_to_baseline() {
        let engine = ScoringEngine::new(vec![Arc::new(Sleepy)]).with_config(ScoringConfig {
            max_workers: 2,
            strategy_timeout: Duration::from_secs(1),
        });
        let mut input = candidates();
        input[0].specs.instance_type = "slow.large".to_string();

        let outcome = engine
            .rank(&UsageRequirements::default(), input, None)
            .await
            .unwrap();

        assert!(!outcome.deadline_exceeded);
        assert_eq!(outcome.skipped_strategies, 1);
        let slow = outcome
            .instances
            .iter()
            .find(|r| r.instance_type() == "slow.large")
            .unwrap();
        assert!(slow.strategy_scores.is_empty());
        assert_eq!(slow.final_score, slow.baseline_score);
        assert_eq!(slow.insights, vec!["sleepy skipped: timed out".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_returns_partial_results() {
        let engine = ScoringEngine::new(vec![Arc::new(Sleepy)]).with_config(ScoringConfig {
            max_workers: 10,
            strategy_timeout: Duration::from_secs(60),
        });
        let mut input = candidates();
        input[2].specs.instance_type = "slow.xlarge".to_string();

        let deadline = Instant::now() + Duration::from_secs(1);
        let outcome = engine
            .rank(&UsageRequirements::default(), input, Some(deadline))
            .await
            .unwrap();

        assert!(outcome.deadline_exceeded);
        assert_eq!(outcome.enhanced, 4);
        assert_eq!(outcome.instances.len(), 5);
        assert_dense_and_sorted(&outcome);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_with_nothing_finished_is_an_error() {
        let engine = ScoringEngine::new(vec![Arc::new(Sleepy)]).with_config(ScoringConfig {
            max_workers: 10,
            strategy_timeout: Duration::from_secs(60),
        });
        let input: Vec<InstanceCandidate> = candidates()
            .into_iter()
            .map(|mut c| {
                c.specs.instance_type = format!("slow.{}", c.specs.instance_type);
                c
            })
            .collect();

        let deadline = Instant::now() + Duration::from_secs(1);
        let err = engine
            .rank(&UsageRequirements::default(), input, Some(deadline))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AdvisorError::DeadlineExceeded { completed: 0, total: 5 }
        ));
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected() {
        let err = ScoringEngine::default()
            .rank(&UsageRequirements::default(), Vec::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AdvisorError::NoCandidates));
    }

    #[tokio::test]
    async fn test_ranking_is_idempotent() {
        let engine = ScoringEngine::new(vec![Arc::new(HistoricalPriceStrategy::heuristic())]);
        let req = UsageRequirements::default();
        let first = engine.rank(&req, candidates(), None).await.unwrap();
        let second = engine.rank(&req, candidates(), None).await.unwrap();
        assert_eq!(first.instances, second.instances);
    }
}
