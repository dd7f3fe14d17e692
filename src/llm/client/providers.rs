//! LLM Provider支持模块

use anyhow::Result;
use rig::{
    agent::{Agent, AgentBuilder},
    client::CompletionClient,
    completion::{CompletionModel, Prompt, PromptError},
    tool::server::ToolServer,
};

use crate::config::{LLMConfig, LLMProvider};
use crate::llm::tools::{
    delegate::{AskQuestionTool, DelegateWorkTool},
    search::SerperSearchTool,
    website::WebsiteReaderTool,
};

/// 统一的Provider客户端枚举
#[derive(Clone)]
pub enum ProviderClient {
    OpenAI(rig::providers::openai::Client),
    Anthropic(rig::providers::anthropic::Client),
    DeepSeek(rig::providers::deepseek::Client),
    Mistral(rig::providers::mistral::Client),
    OpenRouter(rig::providers::openrouter::Client),
    Ollama(rig::providers::ollama::Client),
}

/// 为某个agent装配的工具
#[derive(Clone, Default)]
pub struct AgentToolbox {
    pub search: Option<SerperSearchTool>,
    pub website: Option<WebsiteReaderTool>,
    pub delegate: Option<DelegateWorkTool>,
    pub ask: Option<AskQuestionTool>,
}

impl AgentToolbox {
    pub fn is_empty(&self) -> bool {
        self.search.is_none() && self.website.is_none() && self.delegate.is_none() && self.ask.is_none()
    }

    /// 工具名列表，用于日志
    pub fn tool_names(&self) -> Vec<&'static str> {
        use rig::tool::Tool;

        let mut names = Vec::new();
        if self.search.is_some() {
            names.push(SerperSearchTool::NAME);
        }
        if self.website.is_some() {
            names.push(WebsiteReaderTool::NAME);
        }
        if self.delegate.is_some() {
            names.push(DelegateWorkTool::NAME);
        }
        if self.ask.is_some() {
            names.push(AskQuestionTool::NAME);
        }
        names
    }

    /// 把已装配的工具放进rig的ToolServer
    pub fn into_tool_server(self) -> ToolServer {
        let mut server = ToolServer::new();
        if let Some(search) = self.search {
            server = server.tool(search);
        }
        if let Some(website) = self.website {
            server = server.tool(website);
        }
        if let Some(delegate) = self.delegate {
            server = server.tool(delegate);
        }
        if let Some(ask) = self.ask {
            server = server.tool(ask);
        }
        server
    }

    /// 用系统提示词、采样参数和工具完成agent的构建
    ///
    /// 工具集合随agent变化，因此通过ToolServer句柄挂载，需在tokio运行时内调用。
    fn equip<M: CompletionModel>(
        self,
        builder: AgentBuilder<M>,
        system_prompt: &str,
        temperature: f64,
        max_tokens: Option<u64>,
    ) -> Agent<M> {
        let mut builder = builder.preamble(system_prompt).temperature(temperature);
        if let Some(max_tokens) = max_tokens {
            builder = builder.max_tokens(max_tokens);
        }
        builder
            .tool_server_handle(self.into_tool_server().run())
            .build()
    }
}

impl ProviderClient {
    /// 根据配置创建相应的provider客户端
    pub fn new(config: &LLMConfig, api_key: &str, api_base_url: &str) -> Result<Self> {
        match config.provider {
            LLMProvider::OpenAI => {
                let client = rig::providers::openai::Client::builder(api_key)
                    .base_url(api_base_url)
                    .build();
                Ok(ProviderClient::OpenAI(client))
            }
            LLMProvider::Anthropic => {
                let client = rig::providers::anthropic::ClientBuilder::new(api_key).build()?;
                Ok(ProviderClient::Anthropic(client))
            }
            LLMProvider::DeepSeek => {
                let client = rig::providers::deepseek::Client::builder(api_key)
                    .base_url(api_base_url)
                    .build();
                Ok(ProviderClient::DeepSeek(client))
            }
            LLMProvider::Mistral => {
                let client = rig::providers::mistral::Client::builder(api_key).build();
                Ok(ProviderClient::Mistral(client))
            }
            LLMProvider::OpenRouter => {
                let client = rig::providers::openrouter::Client::builder(api_key).build();
                Ok(ProviderClient::OpenRouter(client))
            }
            LLMProvider::Ollama => {
                let client = rig::providers::ollama::Client::builder().build();
                Ok(ProviderClient::Ollama(client))
            }
        }
    }

    /// 创建Agent，`toolbox` 为空时即为无工具agent
    pub fn create_agent(
        &self,
        model: &str,
        system_prompt: &str,
        temperature: f64,
        max_tokens: u32,
        toolbox: AgentToolbox,
    ) -> ProviderAgent {
        let max_tokens = Some(u64::from(max_tokens));

        match self {
            ProviderClient::OpenAI(client) => {
                let builder = client
                    .completion_model(model)
                    .completions_api()
                    .into_agent_builder();
                ProviderAgent::OpenAI(toolbox.equip(builder, system_prompt, temperature, max_tokens))
            }
            ProviderClient::Anthropic(client) => ProviderAgent::Anthropic(toolbox.equip(
                client.agent(model),
                system_prompt,
                temperature,
                max_tokens,
            )),
            ProviderClient::DeepSeek(client) => ProviderAgent::DeepSeek(toolbox.equip(
                client.agent(model),
                system_prompt,
                temperature,
                max_tokens,
            )),
            // Mistral与OpenRouter沿用服务端的默认max_tokens
            ProviderClient::Mistral(client) => ProviderAgent::Mistral(toolbox.equip(
                client.agent(model),
                system_prompt,
                temperature,
                None,
            )),
            ProviderClient::OpenRouter(client) => ProviderAgent::OpenRouter(toolbox.equip(
                client.agent(model),
                system_prompt,
                temperature,
                None,
            )),
            ProviderClient::Ollama(client) => ProviderAgent::Ollama(toolbox.equip(
                client.agent(model),
                system_prompt,
                temperature,
                max_tokens,
            )),
        }
    }
}

/// 统一的Agent枚举
pub enum ProviderAgent {
    OpenAI(Agent<rig::providers::openai::CompletionModel>),
    Anthropic(Agent<rig::providers::anthropic::completion::CompletionModel>),
    DeepSeek(Agent<rig::providers::deepseek::CompletionModel>),
    Mistral(Agent<rig::providers::mistral::CompletionModel>),
    OpenRouter(Agent<rig::providers::openrouter::CompletionModel>),
    Ollama(Agent<rig::providers::ollama::CompletionModel<reqwest::Client>>),
}

impl ProviderAgent {
    /// 执行单轮prompt
    pub async fn prompt(&self, prompt: &str) -> Result<String> {
        match self {
            ProviderAgent::OpenAI(agent) => agent.prompt(prompt).await.map_err(|e| e.into()),
            ProviderAgent::Anthropic(agent) => agent.prompt(prompt).await.map_err(|e| e.into()),
            ProviderAgent::DeepSeek(agent) => agent.prompt(prompt).await.map_err(|e| e.into()),
            ProviderAgent::Mistral(agent) => agent.prompt(prompt).await.map_err(|e| e.into()),
            ProviderAgent::OpenRouter(agent) => agent.prompt(prompt).await.map_err(|e| e.into()),
            ProviderAgent::Ollama(agent) => agent.prompt(prompt).await.map_err(|e| e.into()),
        }
    }

    /// 执行多轮对话（允许工具调用）
    pub async fn multi_turn(
        &self,
        prompt: &str,
        max_iterations: usize,
    ) -> Result<String, PromptError> {
        match self {
            ProviderAgent::OpenAI(agent) => agent.prompt(prompt).multi_turn(max_iterations).await,
            ProviderAgent::Anthropic(agent) => {
                agent.prompt(prompt).multi_turn(max_iterations).await
            }
            ProviderAgent::DeepSeek(agent) => agent.prompt(prompt).multi_turn(max_iterations).await,
            ProviderAgent::Mistral(agent) => agent.prompt(prompt).multi_turn(max_iterations).await,
            ProviderAgent::OpenRouter(agent) => {
                agent.prompt(prompt).multi_turn(max_iterations).await
            }
            ProviderAgent::Ollama(agent) => agent.prompt(prompt).multi_turn(max_iterations).await,
        }
    }
}
