//! 同事协作工具 - 委派工作与提问

use rig::tool::Tool;
use serde::Deserialize;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::crew::engine::agent_preamble;
use crate::crew::{AgentSpec, RpmLimiter};
use crate::i18n::TargetLanguage;
use crate::llm::client::providers::{AgentToolbox, ProviderClient};

/// 记录不符合参数约束的委派调用
#[derive(Debug, Clone, Default)]
pub struct DelegationLog {
    violations: Arc<Mutex<Vec<String>>>,
}

impl DelegationLog {
    pub fn record(&self, violation: String) {
        if let Ok(mut violations) = self.violations.lock() {
            violations.push(violation);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.violations
            .lock()
            .map(|violations| violations.is_empty())
            .unwrap_or(true)
    }

    /// 取出并清空所有记录
    pub fn take(&self) -> Vec<String> {
        self.violations
            .lock()
            .map(|mut violations| std::mem::take(&mut *violations))
            .unwrap_or_default()
    }
}

/// 协作工具错误
#[derive(Debug, Error)]
pub enum DelegationError {
    #[error("DelegateWorkToolSchema: {0}")]
    Schema(String),
    #[error("coworker `{requested}` not found, choose one of: {available}")]
    UnknownCoworker { requested: String, available: String },
    #[error("coworker `{coworker}` failed: {reason}")]
    Coworker { coworker: String, reason: String },
}

/// 校验后的协作请求
#[derive(Debug, Clone, PartialEq)]
pub struct DelegationRequest {
    pub request: String,
    pub context: String,
    pub coworker: String,
}

impl DelegationRequest {
    /// 校验参数，所有字段必须是纯字符串
    fn validate(
        request_field: &str,
        request: &Value,
        context: &Value,
        coworker: &Value,
    ) -> Result<Self, String> {
        let mut problems = Vec::new();

        let request = plain_text(request_field, request, false).map_err(|p| problems.push(p));
        let context = plain_text("context", context, true).map_err(|p| problems.push(p));
        let coworker = plain_text("coworker", coworker, false).map_err(|p| problems.push(p));

        match (request, context, coworker) {
            (Ok(request), Ok(context), Ok(coworker)) => Ok(Self {
                request,
                context,
                coworker,
            }),
            _ => Err(problems.join("; ")),
        }
    }
}

fn plain_text(field: &str, value: &Value, allow_empty: bool) -> Result<String, String> {
    match value {
        Value::String(text) if allow_empty || !text.trim().is_empty() => {
            Ok(text.trim().to_string())
        }
        Value::String(_) => Err(format!("`{}` must not be empty", field)),
        Value::Null => Err(format!("`{}` is required", field)),
        Value::Object(_) => Err(format!("`{}` must be a plain string, got an object", field)),
        Value::Array(_) => Err(format!("`{}` must be a plain string, got a list", field)),
        Value::Bool(_) | Value::Number(_) => {
            Err(format!("`{}` must be a plain string, got {}", field, value))
        }
    }
}

/// 协作台：持有同事列表，负责运行被委派的同事
pub struct CoworkerDesk {
    client: ProviderClient,
    model: String,
    max_tokens: u32,
    language: TargetLanguage,
    coworkers: Vec<AgentSpec>,
    limiter: Arc<RpmLimiter>,
    log: DelegationLog,
}

impl CoworkerDesk {
    pub fn new(
        client: ProviderClient,
        model: String,
        max_tokens: u32,
        language: TargetLanguage,
        coworkers: Vec<AgentSpec>,
        limiter: Arc<RpmLimiter>,
        log: DelegationLog,
    ) -> Self {
        Self {
            client,
            model,
            max_tokens,
            language,
            coworkers,
            limiter,
            log,
        }
    }

    pub fn coworker_roles(&self) -> Vec<&str> {
        self.coworkers.iter().map(|c| c.role.as_str()).collect()
    }

    /// 按角色名查找同事，忽略大小写与两端引号
    fn find(&self, role: &str) -> Option<&AgentSpec> {
        let wanted = role.trim().trim_matches(|c| c == '"' || c == '\'').to_lowercase();
        self.coworkers
            .iter()
            .find(|c| c.role.to_lowercase() == wanted)
    }

    /// 校验参数，不合规时记录到日志
    fn accept(
        &self,
        request_field: &str,
        request: &Value,
        context: &Value,
        coworker: &Value,
    ) -> Result<DelegationRequest, DelegationError> {
        DelegationRequest::validate(request_field, request, context, coworker).map_err(|details| {
            tracing::warn!(details = %details, "delegation arguments rejected");
            self.log.record(details.clone());
            DelegationError::Schema(details)
        })
    }

    /// 让同事完成请求并返回其答复
    pub async fn consult(&self, request: DelegationRequest) -> Result<String, DelegationError> {
        let Some(coworker) = self.find(&request.coworker) else {
            return Err(DelegationError::UnknownCoworker {
                requested: request.coworker,
                available: self.coworker_roles().join(", "),
            });
        };

        tracing::info!(coworker = %coworker.role, "delegating to coworker");

        let preamble = agent_preamble(coworker, &[], self.language);
        let prompt = format!(
            "{}\n\n## Context\n{}\n\nThis is the expected criteria for your final answer: your best complete answer to the request above.",
            request.request, request.context
        );

        self.limiter.acquire().await;
        let agent = self.client.create_agent(
            &self.model,
            &preamble,
            coworker.temperature,
            self.max_tokens,
            AgentToolbox::default(),
        );

        agent
            .prompt(&prompt)
            .await
            .map_err(|e| DelegationError::Coworker {
                coworker: coworker.role.clone(),
                reason: e.to_string(),
            })
    }
}

/// 委派工作参数；字段保持宽松以便记录不合规的调用
#[derive(Debug, Deserialize)]
pub struct DelegateWorkArgs {
    #[serde(default)]
    pub task: Value,
    #[serde(default)]
    pub context: Value,
    #[serde(default)]
    pub coworker: Value,
}

/// 提问参数
#[derive(Debug, Deserialize)]
pub struct AskQuestionArgs {
    #[serde(default)]
    pub question: Value,
    #[serde(default)]
    pub context: Value,
    #[serde(default)]
    pub coworker: Value,
}

fn delegation_parameters(request_field: &str, request_description: &str) -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            request_field: {
                "type": "string",
                "description": request_description
            },
            "context": {
                "type": "string",
                "description": "All the context needed, as a plain string: coworkers know nothing about your task"
            },
            "coworker": {
                "type": "string",
                "description": "The exact role name of the coworker"
            }
        },
        "required": [request_field, "context", "coworker"]
    })
}

/// 委派工作给同事
#[derive(Clone)]
pub struct DelegateWorkTool {
    desk: Arc<CoworkerDesk>,
}

impl DelegateWorkTool {
    pub fn new(desk: Arc<CoworkerDesk>) -> Self {
        Self { desk }
    }
}

impl Tool for DelegateWorkTool {
    const NAME: &'static str = "delegate_work_to_coworker";

    type Error = DelegationError;
    type Args = DelegateWorkArgs;
    type Output = String;

    async fn definition(&self, _prompt: String) -> rig::completion::ToolDefinition {
        rig::completion::ToolDefinition {
            name: Self::NAME.to_string(),
            description: format!(
                "Delegate a specific task to one of the following coworkers: {}",
                self.desk.coworker_roles().join(", ")
            ),
            parameters: delegation_parameters("task", "The task to delegate, as a plain string"),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        let request = self
            .desk
            .accept("task", &args.task, &args.context, &args.coworker)?;
        self.desk.consult(request).await
    }
}

/// 向同事提问
#[derive(Clone)]
pub struct AskQuestionTool {
    desk: Arc<CoworkerDesk>,
}

impl AskQuestionTool {
    pub fn new(desk: Arc<CoworkerDesk>) -> Self {
        Self { desk }
    }
}

impl Tool for AskQuestionTool {
    const NAME: &'static str = "ask_question_to_coworker";

    type Error = DelegationError;
    type Args = AskQuestionArgs;
    type Output = String;

    async fn definition(&self, _prompt: String) -> rig::completion::ToolDefinition {
        rig::completion::ToolDefinition {
            name: Self::NAME.to_string(),
            description: format!(
                "Ask a specific question to one of the following coworkers: {}",
                self.desk.coworker_roles().join(", ")
            ),
            parameters: delegation_parameters(
                "question",
                "The question to ask, as a plain string",
            ),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        let request =
            self.desk
                .accept("question", &args.question, &args.context, &args.coworker)?;
        self.desk.consult(request).await
    }
}
