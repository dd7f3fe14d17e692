//! Crew数据模型 - agent、任务与执行引擎的抽象

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod engine;
pub mod rate_limit;

#[cfg(test)]
pub(crate) mod mock;

pub use engine::RigCrewEngine;
pub use rate_limit::RpmLimiter;

/// agent可以使用的内置工具
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolKind {
    /// Serper网页搜索
    WebSearch,
    /// 读取网页正文
    WebsiteReader,
}

/// agent描述：角色、目标、背景与工具
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub role: String,
    pub goal: String,
    pub backstory: String,
    pub tools: Vec<ToolKind>,
    pub allow_delegation: bool,
    pub temperature: f64,
    /// 单次任务的最大推理轮次
    pub max_iter: usize,
    /// 追加在系统提示词中的工具使用说明
    pub tool_guidance: Vec<String>,
}

impl AgentSpec {
    pub fn new(role: impl Into<String>, goal: impl Into<String>, backstory: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            tools: Vec::new(),
            allow_delegation: false,
            temperature: 0.1,
            max_iter: 8,
            tool_guidance: Vec::new(),
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolKind>) -> Self {
        self.tools = tools;
        self
    }

    pub fn allow_delegation(mut self, allow: bool) -> Self {
        self.allow_delegation = allow;
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }
}

/// 任务描述，`agent` 为crew中agent的下标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub description: String,
    pub expected_output: String,
    pub agent: usize,
}

impl TaskSpec {
    pub fn new(description: impl Into<String>, expected_output: impl Into<String>, agent: usize) -> Self {
        Self {
            description: description.into(),
            expected_output: expected_output.into(),
            agent,
        }
    }
}

/// Crew：agent、按声明顺序执行的任务，以及执行参数
#[derive(Debug, Clone, PartialEq)]
pub struct Crew {
    pub agents: Vec<AgentSpec>,
    pub tasks: Vec<TaskSpec>,
    /// 每分钟最多发起的模型调用次数，0表示不限制
    pub max_rpm: u32,
    /// 为真时每个任务可见此前全部产出
    pub memory: bool,
    pub verbose: bool,
}

impl Crew {
    pub fn new(agents: Vec<AgentSpec>, tasks: Vec<TaskSpec>) -> Self {
        Self {
            agents,
            tasks,
            max_rpm: 0,
            memory: false,
            verbose: false,
        }
    }

    pub fn max_rpm(mut self, max_rpm: u32) -> Self {
        self.max_rpm = max_rpm;
        self
    }

    pub fn memory(mut self, memory: bool) -> Self {
        self.memory = memory;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// 向每个agent的工具使用说明追加一段指令
    pub fn amend_tool_guidance(&mut self, guidance: &str) {
        for agent in &mut self.agents {
            agent.tool_guidance.push(guidance.to_string());
        }
    }

    /// 检查任务是否都指向存在的agent
    pub fn validate(&self) -> Result<(), CrewError> {
        if self.tasks.is_empty() {
            return Err(CrewError::EmptyCrew);
        }
        for (index, task) in self.tasks.iter().enumerate() {
            if task.agent >= self.agents.len() {
                return Err(CrewError::UnknownAgent {
                    task: index,
                    agent: task.agent,
                });
            }
        }
        Ok(())
    }

    /// 除指定agent外的所有角色名
    pub fn coworkers_of(&self, agent_index: usize) -> Vec<&AgentSpec> {
        self.agents
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != agent_index)
            .map(|(_, agent)| agent)
            .collect()
    }
}

/// kickoff的输入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KickoffInputs {
    pub main_topic: String,
    pub subtopics: Vec<String>,
}

/// 单个任务的产出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutput {
    pub description: String,
    pub agent: String,
    pub raw: String,
}

/// 一次完整kickoff的产出
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CrewOutput {
    /// 最终文本；引擎未给出时为 None
    pub raw: Option<String>,
    pub tasks_output: Vec<TaskOutput>,
}

impl std::fmt::Display for CrewOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(raw) = &self.raw {
            return write!(f, "{}", raw);
        }
        for (index, output) in self.tasks_output.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            writeln!(f, "## {}", output.agent)?;
            writeln!(f, "{}", output.raw)?;
        }
        Ok(())
    }
}

/// 引擎返回值：结构化产出或纯文本
#[derive(Debug, Clone, PartialEq)]
pub enum KickoffOutput {
    Crew(CrewOutput),
    Plain(String),
}

impl KickoffOutput {
    /// 结构化产出中的原始文本
    pub fn raw(&self) -> Option<&str> {
        match self {
            KickoffOutput::Crew(output) => output.raw.as_deref(),
            KickoffOutput::Plain(_) => None,
        }
    }

    /// 归一化为报告文本：有原始文本用原始文本，否则整体转为文本
    pub fn into_text(self) -> String {
        match self {
            KickoffOutput::Crew(CrewOutput { raw: Some(raw), .. }) => raw,
            KickoffOutput::Crew(output) => output.to_string(),
            KickoffOutput::Plain(text) => text,
        }
    }
}

impl std::fmt::Display for KickoffOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KickoffOutput::Crew(output) => write!(f, "{}", output),
            KickoffOutput::Plain(text) => write!(f, "{}", text),
        }
    }
}

/// Crew执行错误
#[derive(Debug, Error)]
pub enum CrewError {
    /// 委派工具的参数不符合 DelegateWorkToolSchema
    #[error("DelegateWorkToolSchema validation failed for agent `{agent}`: {details}")]
    DelegationSchema { agent: String, details: String },

    #[error("agent `{agent}` reached {max_iter} iterations without an answer")]
    MaxIterations { agent: String, max_iter: usize },

    #[error("task #{task} is assigned to unknown agent #{agent}")]
    UnknownAgent { task: usize, agent: usize },

    #[error("the crew has no tasks")]
    EmptyCrew,

    #[error("model provider error: {0}")]
    Provider(String),
}

impl CrewError {
    /// 错误类型名，展示给用户用于诊断
    pub fn kind(&self) -> &'static str {
        match self {
            CrewError::DelegationSchema { .. } => "DelegationSchema",
            CrewError::MaxIterations { .. } => "MaxIterations",
            CrewError::UnknownAgent { .. } => "UnknownAgent",
            CrewError::EmptyCrew => "EmptyCrew",
            CrewError::Provider(_) => "Provider",
        }
    }

    pub fn is_delegation_schema(&self) -> bool {
        matches!(self, CrewError::DelegationSchema { .. })
    }

    /// 只有provider错误值得原样重试
    pub fn is_transient(&self) -> bool {
        matches!(self, CrewError::Provider(_))
    }
}

/// 顺序执行crew的引擎
#[async_trait]
pub trait CrewEngine: Send + Sync {
    /// 执行全部任务并返回最终产出
    async fn kickoff(&self, crew: &Crew, inputs: &KickoffInputs) -> Result<KickoffOutput, CrewError>;
}

#[cfg(test)]
mod tests;
