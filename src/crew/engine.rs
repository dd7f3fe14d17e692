//! 基于rig的顺序执行引擎

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::config::Config;
use crate::crew::{
    AgentSpec, Crew, CrewEngine, CrewError, CrewOutput, KickoffInputs, KickoffOutput, RpmLimiter,
    TaskOutput, TaskSpec, ToolKind,
};
use crate::i18n::TargetLanguage;
use crate::llm::client::{AgentToolbox, ProviderClient, TaskExecutor, retry_with_backoff};
use crate::llm::tools::delegate::{AskQuestionTool, CoworkerDesk, DelegateWorkTool, DelegationLog};
use crate::llm::tools::search::SerperSearchTool;
use crate::llm::tools::website::WebsiteReaderTool;
use crate::memory::CrewMemory;

/// 构建agent的系统提示词
pub fn agent_preamble(agent: &AgentSpec, coworker_roles: &[&str], language: TargetLanguage) -> String {
    let mut preamble = format!(
        "You are {}.\n{}\n\nYour personal goal is: {}\n",
        agent.role,
        agent.backstory.trim(),
        agent.goal.trim()
    );

    if !coworker_roles.is_empty() {
        preamble.push_str("\n## Coworkers\n");
        preamble.push_str(&format!(
            "You can delegate work or ask questions to the following coworkers: {}.\n",
            coworker_roles.join(", ")
        ));
    }

    if !agent.tool_guidance.is_empty() {
        preamble.push_str("\n## Tool usage guidance\n");
        for guidance in &agent.tool_guidance {
            preamble.push_str(&format!("- {}\n", guidance));
        }
    }

    preamble.push('\n');
    preamble.push_str(language.prompt_instruction());
    preamble
}

/// 构建任务的用户提示词
pub fn build_task_prompt(inputs: &KickoffInputs, task: &TaskSpec, context: Option<String>) -> String {
    let mut prompt = String::from("## Request\n");
    prompt.push_str(&format!("Main topic: {}\n", inputs.main_topic));
    prompt.push_str(&format!("Sub-topics: {}\n\n", inputs.subtopics.join(", ")));

    prompt.push_str("## Current task\n");
    prompt.push_str(task.description.trim());
    prompt.push_str("\n\n");
    prompt.push_str(&format!(
        "This is the expected criteria for your final answer: {}\n",
        task.expected_output.trim()
    ));
    prompt.push_str(
        "You MUST return the actual complete content as the final answer, not a summary.\n",
    );

    if let Some(context) = context {
        prompt.push_str("\n## Context from previous tasks\n");
        prompt.push_str(&context);
    }

    prompt
}

/// 归类一次任务尝试的结果
///
/// 失败前出现过被拒绝的委派调用时，非provider错误改记为 `DelegationSchema`，
/// 原始错误附在 details 中；provider错误保持原样以便继续重试。
pub fn classify_failure(
    agent: &str,
    result: Result<String, CrewError>,
    violations: Vec<String>,
) -> Result<String, CrewError> {
    match result {
        Err(e) if !violations.is_empty() && !e.is_transient() => {
            tracing::debug!(agent = %agent, error = %e, "task failed after invalid delegation");
            Err(CrewError::DelegationSchema {
                agent: agent.to_string(),
                details: format!("{} (task failed with: {})", violations.join("; "), e),
            })
        }
        other => other,
    }
}

/// 基于rig agent逐个执行任务的引擎
pub struct RigCrewEngine {
    config: Config,
    client: ProviderClient,
    http: reqwest::Client,
    serper_api_key: Option<String>,
}

impl RigCrewEngine {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client =
            ProviderClient::new(&config.llm, &config.llm_api_key(), &config.llm_base_url())?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.llm.timeout_seconds))
            .user_agent(concat!("trend-crew/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let serper_api_key = config.serper_api_key();
        if serper_api_key.is_none() {
            tracing::warn!("SERPER_API_KEY is not set, the web search tool is disabled");
        }

        Ok(Self {
            config: config.clone(),
            client,
            http,
            serper_api_key,
        })
    }

    /// 检查模型连接是否正常
    pub async fn check_connection(&self) -> anyhow::Result<()> {
        tracing::info!(
            provider = %self.config.llm.provider,
            model = %self.config.llm.model,
            "checking model connection"
        );
        let agent = self.client.create_agent(
            &self.config.llm.model,
            "You are a helpful assistant.",
            0.0,
            16,
            AgentToolbox::default(),
        );
        agent.prompt("Hello").await?;
        tracing::info!("model connection ok");
        Ok(())
    }

    /// 为指定agent装配工具
    fn toolbox_for(
        &self,
        crew: &Crew,
        agent_index: usize,
        limiter: &Arc<RpmLimiter>,
        log: &DelegationLog,
    ) -> AgentToolbox {
        let agent = &crew.agents[agent_index];
        let mut toolbox = AgentToolbox::default();

        for tool in &agent.tools {
            match tool {
                ToolKind::WebSearch => match &self.serper_api_key {
                    Some(api_key) => {
                        toolbox.search = Some(SerperSearchTool::new(
                            self.http.clone(),
                            &self.config.search,
                            api_key.clone(),
                        ));
                    }
                    None => {
                        tracing::debug!(agent = %agent.role, "web search skipped, no api key");
                    }
                },
                ToolKind::WebsiteReader => {
                    toolbox.website = Some(WebsiteReaderTool::new(
                        self.http.clone(),
                        self.config.search.max_page_chars,
                    ));
                }
            }
        }

        let coworkers: Vec<AgentSpec> = crew
            .coworkers_of(agent_index)
            .into_iter()
            .cloned()
            .collect();
        if agent.allow_delegation && !coworkers.is_empty() {
            let desk = Arc::new(CoworkerDesk::new(
                self.client.clone(),
                self.config.llm.model.clone(),
                self.config.llm.max_tokens,
                self.config.target_language,
                coworkers,
                Arc::clone(limiter),
                log.clone(),
            ));
            toolbox.delegate = Some(DelegateWorkTool::new(Arc::clone(&desk)));
            toolbox.ask = Some(AskQuestionTool::new(desk));
        }

        toolbox
    }

    /// 执行单个任务，失败前若出现过不合规的委派调用则报告为 DelegationSchema
    #[allow(clippy::too_many_arguments)]
    async fn run_task(
        &self,
        crew: &Crew,
        index: usize,
        task: &TaskSpec,
        inputs: &KickoffInputs,
        memory: &CrewMemory,
        limiter: &Arc<RpmLimiter>,
        log: &DelegationLog,
    ) -> Result<String, CrewError> {
        let agent = &crew.agents[task.agent];
        let coworker_roles: Vec<&str> = if agent.allow_delegation {
            crew.coworkers_of(task.agent)
                .into_iter()
                .map(|c| c.role.as_str())
                .collect()
        } else {
            Vec::new()
        };

        let toolbox = self.toolbox_for(crew, task.agent, limiter, log);
        let system_prompt = agent_preamble(agent, &coworker_roles, self.config.target_language);
        let user_prompt = build_task_prompt(inputs, task, memory.render_context(crew.memory));

        tracing::info!(
            task = index + 1,
            agent = %agent.role,
            tools = ?toolbox.tool_names(),
            "starting task"
        );

        let provider_agent = self.client.create_agent(
            &self.config.llm.model,
            &system_prompt,
            agent.temperature,
            self.config.llm.max_tokens,
            toolbox,
        );

        retry_with_backoff(&self.config.llm, || async {
            limiter.acquire().await;
            let result =
                TaskExecutor::execute(&provider_agent, &agent.role, &user_prompt, agent.max_iter)
                    .await;
            classify_failure(&agent.role, result, log.take())
        })
        .await
    }
}

#[async_trait]
impl CrewEngine for RigCrewEngine {
    async fn kickoff(&self, crew: &Crew, inputs: &KickoffInputs) -> Result<KickoffOutput, CrewError> {
        crew.validate()?;

        let run_id = Uuid::new_v4();
        let limiter = Arc::new(RpmLimiter::new(crew.max_rpm));
        let log = DelegationLog::default();
        let mut memory = CrewMemory::new();
        let mut tasks_output = Vec::with_capacity(crew.tasks.len());

        tracing::info!(
            %run_id,
            agents = crew.agents.len(),
            tasks = crew.tasks.len(),
            max_rpm = crew.max_rpm,
            memory = crew.memory,
            "crew kickoff"
        );

        for (index, task) in crew.tasks.iter().enumerate() {
            let agent = &crew.agents[task.agent];
            let started = Instant::now();

            let raw = self
                .run_task(crew, index, task, inputs, &memory, &limiter, &log)
                .await?;

            if crew.verbose {
                tracing::info!(
                    %run_id,
                    task = index + 1,
                    agent = %agent.role,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    output_chars = raw.len(),
                    "task finished"
                );
            }

            memory.remember(index, &agent.role, &raw);
            tasks_output.push(TaskOutput {
                description: task.description.clone(),
                agent: agent.role.clone(),
                raw,
            });
        }

        tracing::info!(%run_id, memory_bytes = memory.total_size(), "crew finished");

        let raw = tasks_output.last().map(|output| output.raw.clone());
        Ok(KickoffOutput::Crew(CrewOutput { raw, tasks_output }))
    }
}
