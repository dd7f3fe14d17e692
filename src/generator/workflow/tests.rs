#[cfg(test)]
mod tests {
    use crate::config::{Config, PipelineVariant};
    use crate::crew::mock::ScriptedEngine;
    use crate::crew::{CrewError, CrewOutput, KickoffOutput, TaskOutput};
    use crate::generator::context::GeneratorContext;
    use crate::generator::recovery::DELEGATION_GUIDANCE;
    use crate::generator::types::ReportError;
    use crate::generator::workflow::{TimingKeys, TimingScope, cached_report, generate_report};
    use crate::i18n::TargetLanguage;
    use std::sync::Arc;

    fn create_test_context(engine: Arc<ScriptedEngine>) -> GeneratorContext {
        GeneratorContext::with_engine(Config::default(), engine)
    }

    fn schema_error() -> CrewError {
        CrewError::DelegationSchema {
            agent: "Content Synthesizer".to_string(),
            details: "`context` must be a plain string, got an object".to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_input_warns_without_engine_call() {
        let engine = Arc::new(ScriptedEngine::with_raw("report"));
        let context = create_test_context(engine.clone());

        for (topic, subtopics) in [("", "Ethics, Jobs"), ("AI", ""), ("", "")] {
            let result = generate_report(&context, topic, subtopics).await;
            match result {
                Err(ReportError::InvalidInput(message)) => {
                    assert_eq!(message, TargetLanguage::English.missing_input_warning());
                }
                other => panic!("unexpected result: {:?}", other),
            }
        }

        assert_eq!(engine.call_count(), 0);
    }

    #[tokio::test]
    async fn test_single_kickoff_with_topic_in_every_task() {
        let engine = Arc::new(ScriptedEngine::with_raw("report"));
        let context = create_test_context(engine.clone());

        generate_report(&context, "AI", "Ethics, Jobs").await.unwrap();

        assert_eq!(engine.call_count(), 1);
        let (crew, inputs) = engine.calls().remove(0);
        assert_eq!(inputs.main_topic, "AI");
        assert_eq!(inputs.subtopics, vec!["Ethics", "Jobs"]);
        assert_eq!(crew.agents.len(), 3);
        assert_eq!(crew.tasks.len(), 3);
        assert_eq!(crew.max_rpm, 10);
        assert!(crew.memory);
        for task in &crew.tasks {
            assert!(task.description.contains("AI"));
            assert!(task.description.contains("Ethics"));
            assert!(task.description.contains("Jobs"));
        }
    }

    #[tokio::test]
    async fn test_raw_text_is_used_verbatim() {
        let raw = "# AI\n\n## Ethics\nFairness matters.\n\n## Jobs\nAutomation.";
        let output = KickoffOutput::Crew(CrewOutput {
            raw: Some(raw.to_string()),
            tasks_output: vec![TaskOutput {
                description: "Write".to_string(),
                agent: "Report Writer".to_string(),
                raw: "ignored".to_string(),
            }],
        });
        let engine = Arc::new(ScriptedEngine::returning(output));
        let context = create_test_context(engine);

        let artifact = generate_report(&context, "AI", "Ethics, Jobs").await.unwrap();

        assert_eq!(artifact.text, raw);
        assert_eq!(artifact.file_name, "analysis_report_AI.txt");
        assert!(!artifact.cached);
    }

    #[tokio::test]
    async fn test_plain_output_is_surfaced_unchanged() {
        let engine = Arc::new(ScriptedEngine::returning(KickoffOutput::Plain(
            "  plain report  ".to_string(),
        )));
        let context = create_test_context(engine);

        let artifact = generate_report(&context, "AI", "Ethics").await.unwrap();

        assert_eq!(artifact.text, "  plain report  ");
    }

    #[tokio::test]
    async fn test_output_without_raw_is_rendered_whole() {
        let output = KickoffOutput::Crew(CrewOutput {
            raw: None,
            tasks_output: vec![
                TaskOutput {
                    description: "Research".to_string(),
                    agent: "Research Analyst".to_string(),
                    raw: "sources".to_string(),
                },
                TaskOutput {
                    description: "Write".to_string(),
                    agent: "Report Writer".to_string(),
                    raw: "report".to_string(),
                },
            ],
        });
        let engine = Arc::new(ScriptedEngine::returning(output));
        let context = create_test_context(engine);

        let artifact = generate_report(&context, "AI", "Ethics").await.unwrap();

        assert_eq!(
            artifact.text,
            "## Research Analyst\nsources\n\n## Report Writer\nreport\n"
        );
    }

    #[tokio::test]
    async fn test_identical_request_is_served_from_cache() {
        let engine = Arc::new(ScriptedEngine::with_raw("report"));
        let context = create_test_context(engine.clone());

        let first = generate_report(&context, "AI", "Ethics, Jobs").await.unwrap();
        let second = generate_report(&context, " AI ", "Ethics ,Jobs").await.unwrap();

        assert_eq!(engine.call_count(), 1);
        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(second.text, first.text);

        let report = context.cache.generate_performance_report();
        assert_eq!(report.cache_hits, 1);
        assert_eq!(report.cache_writes, 1);
    }

    #[tokio::test]
    async fn test_cached_report_never_runs_the_crew() {
        let engine = Arc::new(ScriptedEngine::with_raw("report"));
        let context = create_test_context(engine.clone());

        assert!(cached_report(&context, "AI", "Ethics").await.unwrap().is_none());
        assert_eq!(engine.call_count(), 0);

        generate_report(&context, "AI", "Ethics").await.unwrap();
        let artifact = cached_report(&context, "AI", "Ethics").await.unwrap().unwrap();

        assert!(artifact.cached);
        assert_eq!(artifact.text, "report");
        assert_eq!(engine.call_count(), 1);

        let error = cached_report(&context, "AI", "").await.unwrap_err();
        assert_eq!(error.error_type(), "InvalidInput");
    }

    #[tokio::test]
    async fn test_different_subtopics_miss_the_cache() {
        let engine = Arc::new(ScriptedEngine::with_raw("report"));
        let context = create_test_context(engine.clone());

        generate_report(&context, "AI", "Ethics, Jobs").await.unwrap();
        generate_report(&context, "AI", "Jobs, Ethics").await.unwrap();

        assert_eq!(engine.call_count(), 2);
    }

    #[tokio::test]
    async fn test_disabled_cache_runs_every_time() {
        let engine = Arc::new(ScriptedEngine::with_raw("report"));
        let mut config = Config::default();
        config.cache.enabled = false;
        let context = GeneratorContext::with_engine(config, engine.clone());

        generate_report(&context, "AI", "Ethics").await.unwrap();
        generate_report(&context, "AI", "Ethics").await.unwrap();

        assert_eq!(engine.call_count(), 2);
    }

    #[tokio::test]
    async fn test_delegation_failure_retries_exactly_once() {
        let engine = Arc::new(
            ScriptedEngine::with_raw("recovered report").then(Err(schema_error())),
        );
        let context = create_test_context(engine.clone());

        let artifact = generate_report(&context, "AI", "Ethics").await.unwrap();

        assert_eq!(artifact.text, "recovered report");
        assert_eq!(engine.call_count(), 2);
        let (retried_crew, _) = engine.calls().remove(1);
        assert!(
            retried_crew
                .agents
                .iter()
                .all(|a| a.tool_guidance.contains(&DELEGATION_GUIDANCE.to_string()))
        );
    }

    #[tokio::test]
    async fn test_second_delegation_failure_is_surfaced_and_not_cached() {
        let engine = Arc::new(
            ScriptedEngine::with_raw("later report")
                .then(Err(schema_error()))
                .then(Err(schema_error())),
        );
        let context = create_test_context(engine.clone());

        let error = generate_report(&context, "AI", "Ethics").await.unwrap_err();

        assert_eq!(engine.call_count(), 2);
        assert_eq!(error.error_type(), "DelegationSchema");
        assert!(error.to_string().contains("DelegateWorkToolSchema"));
        assert!(context.cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_reviewed_variant_runs_four_tasks() {
        let engine = Arc::new(ScriptedEngine::with_raw("report"));
        let mut config = Config::default();
        config.crew.variant = PipelineVariant::Reviewed;
        let context = GeneratorContext::with_engine(config, engine.clone());

        generate_report(&context, "AI", "Ethics").await.unwrap();

        let (crew, _) = engine.calls().remove(0);
        assert_eq!(crew.tasks.len(), 4);
    }

    #[test]
    fn test_timing_scope_records_phases_in_order() {
        let mut timing = TimingScope::new();

        timing.start_phase(TimingKeys::VALIDATE);
        timing.start_phase(TimingKeys::KICKOFF);
        assert!(timing.end_phase(TimingKeys::VALIDATE).is_some());
        assert!(timing.end_phase(TimingKeys::KICKOFF).is_some());
        assert!(timing.end_phase(TimingKeys::CACHE_LOOKUP).is_none());

        let phases: Vec<&str> = timing
            .get_phase_durations()
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(phases, vec!["validate", "kickoff"]);

        let report = timing.generate_timing_report();
        assert!(report.starts_with("total: "));
        assert!(report.contains("validate: "));
    }
}
