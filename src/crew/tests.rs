#[cfg(test)]
mod tests {
    use crate::crew::{
        AgentSpec, Crew, CrewError, CrewOutput, KickoffOutput, TaskOutput, TaskSpec, ToolKind,
    };

    fn sample_crew() -> Crew {
        let agents = vec![
            AgentSpec::new("Researcher", "find sources", "seasoned researcher")
                .with_tools(vec![ToolKind::WebSearch])
                .allow_delegation(true),
            AgentSpec::new("Writer", "write", "professional writer"),
        ];
        let tasks = vec![
            TaskSpec::new("research", "sources", 0),
            TaskSpec::new("write", "report", 1),
        ];
        Crew::new(agents, tasks).max_rpm(10).memory(true)
    }

    #[test]
    fn test_validate_accepts_well_formed_crew() {
        assert!(sample_crew().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_agent() {
        let mut crew = sample_crew();
        crew.tasks.push(TaskSpec::new("review", "notes", 7));

        match crew.validate() {
            Err(CrewError::UnknownAgent { task, agent }) => {
                assert_eq!(task, 2);
                assert_eq!(agent, 7);
            }
            other => panic!("unexpected validation result: {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_empty_crew() {
        let crew = Crew::new(Vec::new(), Vec::new());
        assert!(matches!(crew.validate(), Err(CrewError::EmptyCrew)));
    }

    #[test]
    fn test_amend_tool_guidance_touches_every_agent() {
        let mut crew = sample_crew();
        crew.amend_tool_guidance("pass plain strings");

        assert!(
            crew.agents
                .iter()
                .all(|agent| agent.tool_guidance == vec!["pass plain strings".to_string()])
        );
    }

    #[test]
    fn test_coworkers_exclude_self() {
        let crew = sample_crew();
        let coworkers: Vec<&str> = crew
            .coworkers_of(0)
            .iter()
            .map(|agent| agent.role.as_str())
            .collect();
        assert_eq!(coworkers, vec!["Writer"]);
    }

    #[test]
    fn test_into_text_prefers_raw() {
        let output = KickoffOutput::Crew(CrewOutput {
            raw: Some("final report".to_string()),
            tasks_output: vec![TaskOutput {
                description: "write".to_string(),
                agent: "Writer".to_string(),
                raw: "draft".to_string(),
            }],
        });

        assert_eq!(output.raw(), Some("final report"));
        assert_eq!(output.into_text(), "final report");
    }

    #[test]
    fn test_into_text_without_raw_renders_whole_output() {
        let output = KickoffOutput::Crew(CrewOutput {
            raw: None,
            tasks_output: vec![
                TaskOutput {
                    description: "research".to_string(),
                    agent: "Researcher".to_string(),
                    raw: "sources".to_string(),
                },
                TaskOutput {
                    description: "write".to_string(),
                    agent: "Writer".to_string(),
                    raw: "report".to_string(),
                },
            ],
        });

        assert_eq!(output.raw(), None);
        assert_eq!(
            output.into_text(),
            "## Researcher\nsources\n\n## Writer\nreport\n"
        );
    }

    #[test]
    fn test_plain_output_is_unchanged() {
        let output = KickoffOutput::Plain("  just text\n".to_string());
        assert_eq!(output.raw(), None);
        assert_eq!(output.into_text(), "  just text\n");
    }

    #[test]
    fn test_delegation_schema_error_names_the_schema() {
        let error = CrewError::DelegationSchema {
            agent: "Researcher".to_string(),
            details: "`task` must be a string".to_string(),
        };

        assert!(error.is_delegation_schema());
        assert!(!error.is_transient());
        assert_eq!(error.kind(), "DelegationSchema");
        assert!(error.to_string().contains("DelegateWorkToolSchema"));
    }

    #[test]
    fn test_only_provider_errors_are_transient() {
        assert!(CrewError::Provider("503".to_string()).is_transient());
        assert!(!CrewError::EmptyCrew.is_transient());
    }
}
