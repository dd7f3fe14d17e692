//! 固定的agent阵容与任务顺序

use crate::config::{Config, CrewConfig, PipelineVariant};
use crate::crew::{AgentSpec, Crew, TaskSpec, ToolKind};
use crate::generator::types::TopicRequest;

pub const RESEARCH_ANALYST: usize = 0;
pub const CONTENT_SYNTHESIZER: usize = 1;
pub const REPORT_WRITER: usize = 2;

/// 创建三个agent：调研分析、内容综合、报告撰写
pub fn create_agents(request: &TopicRequest, crew_config: &CrewConfig) -> Vec<AgentSpec> {
    let topic = &request.main_topic;
    let subtopics = request.subtopics_label();

    vec![
        AgentSpec::new(
            "Research Analyst",
            format!("Analyse in depth the topic: {} and {}", topic, subtopics),
            format!(
                "Expert in the in-depth analysis of complex subjects, specialised in {} and {}",
                topic, subtopics
            ),
        )
        .with_tools(vec![ToolKind::WebSearch, ToolKind::WebsiteReader])
        .allow_delegation(true)
        .temperature(0.3)
        .max_iter(crew_config.max_iter),
        AgentSpec::new(
            "Content Synthesizer",
            format!(
                "Synthesize the information collected on {} and {}",
                topic, subtopics
            ),
            "Expert in turning raw information into structured, understandable insights",
        )
        .allow_delegation(true)
        .temperature(0.2)
        .max_iter(crew_config.max_iter),
        AgentSpec::new(
            "Report Writer",
            format!(
                "Write a detailed and accessible report on {} and {}",
                topic, subtopics
            ),
            "Professional writer able to turn complex analyses into clear and engaging content",
        )
        .allow_delegation(true)
        .temperature(0.4)
        .max_iter(crew_config.max_iter),
    ]
}

/// 按变体创建任务，任务按声明顺序执行
pub fn create_tasks(request: &TopicRequest, variant: PipelineVariant) -> Vec<TaskSpec> {
    let topic = &request.main_topic;
    let subtopics = request.subtopics_label();

    let mut tasks = vec![
        TaskSpec::new(
            format!("Research information about {} and {}", topic, subtopics),
            "A structured list of reliable and recent sources",
            RESEARCH_ANALYST,
        ),
        TaskSpec::new(
            format!(
                "Analyse in detail the data found about {} and {}",
                topic, subtopics
            ),
            format!(
                "An analytical, structured summary of the key aspects of the research on {} and {}",
                topic, subtopics
            ),
            CONTENT_SYNTHESIZER,
        ),
        TaskSpec::new(
            format!("Write a complete final report on {} and {}", topic, subtopics),
            "A detailed report of 1500-2000 words",
            REPORT_WRITER,
        ),
    ];

    if variant == PipelineVariant::Reviewed {
        tasks.push(TaskSpec::new(
            format!(
                "Proof-read the report on {} and {}: check the facts against the analysis, fix structure and style, and deliver the final version",
                topic, subtopics
            ),
            "The final, polished report of 1500-2000 words, complete and ready to publish",
            REPORT_WRITER,
        ));
    }

    tasks
}

/// 按配置组装crew
pub fn build_crew(request: &TopicRequest, config: &Config) -> Crew {
    let crew_config = &config.crew;
    Crew::new(
        create_agents(request, crew_config),
        create_tasks(request, crew_config.variant),
    )
    .max_rpm(crew_config.max_rpm)
    .memory(crew_config.memory)
    .verbose(crew_config.verbose)
}
