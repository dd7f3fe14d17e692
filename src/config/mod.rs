use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::i18n::TargetLanguage;

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "trend-crew.toml";

/// LLM Provider类型
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum LLMProvider {
    #[serde(rename = "openai")]
    #[default]
    OpenAI,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "deepseek")]
    DeepSeek,
    #[serde(rename = "mistral")]
    Mistral,
    #[serde(rename = "openrouter")]
    OpenRouter,
    #[serde(rename = "ollama")]
    Ollama,
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::Anthropic => write!(f, "anthropic"),
            LLMProvider::DeepSeek => write!(f, "deepseek"),
            LLMProvider::Mistral => write!(f, "mistral"),
            LLMProvider::OpenRouter => write!(f, "openrouter"),
            LLMProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(LLMProvider::OpenAI),
            "anthropic" => Ok(LLMProvider::Anthropic),
            "deepseek" => Ok(LLMProvider::DeepSeek),
            "mistral" => Ok(LLMProvider::Mistral),
            "openrouter" => Ok(LLMProvider::OpenRouter),
            "ollama" => Ok(LLMProvider::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

impl LLMProvider {
    /// 该provider的API KEY在secrets/环境变量中的名称
    pub fn api_key_name(&self) -> &'static str {
        match self {
            LLMProvider::OpenAI => "OPENAI_API_KEY",
            LLMProvider::Anthropic => "ANTHROPIC_API_KEY",
            LLMProvider::DeepSeek => "DEEPSEEK_API_KEY",
            LLMProvider::Mistral => "MISTRAL_API_KEY",
            LLMProvider::OpenRouter => "OPENROUTER_API_KEY",
            LLMProvider::Ollama => "OLLAMA_API_KEY",
        }
    }

    /// provider的默认API基地址
    pub fn default_base_url(&self) -> &'static str {
        match self {
            LLMProvider::OpenAI => "https://api.openai.com/v1",
            LLMProvider::Anthropic => "https://api.anthropic.com",
            LLMProvider::DeepSeek => "https://api.deepseek.com",
            LLMProvider::Mistral => "https://api.mistral.ai",
            LLMProvider::OpenRouter => "https://openrouter.ai/api/v1",
            LLMProvider::Ollama => "http://localhost:11434",
        }
    }
}

/// 任务编排的变体
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineVariant {
    /// 调研 -> 分析 -> 撰写
    #[serde(rename = "standard")]
    #[default]
    Standard,
    /// 在标准流程后追加一次审校
    #[serde(rename = "reviewed")]
    Reviewed,
}

impl std::fmt::Display for PipelineVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineVariant::Standard => write!(f, "standard"),
            PipelineVariant::Reviewed => write!(f, "reviewed"),
        }
    }
}

impl std::str::FromStr for PipelineVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(PipelineVariant::Standard),
            "reviewed" | "review" => Ok(PipelineVariant::Reviewed),
            _ => Err(format!("Unknown pipeline variant: {}", s)),
        }
    }
}

/// 应用程序配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Config {
    /// 报告目标语言
    pub target_language: TargetLanguage,

    /// secrets文件路径（扁平的 KEY = "value" 形式）
    pub secrets_path: PathBuf,

    /// `run` 子命令的报告输出目录
    pub output_path: PathBuf,

    /// Web服务配置
    pub server: ServerConfig,

    /// LLM模型配置
    pub llm: LLMConfig,

    /// 搜索工具配置
    pub search: SearchConfig,

    /// Crew执行参数
    pub crew: CrewConfig,

    /// 缓存配置
    pub cache: CacheConfig,

    /// 是否启用详细日志
    pub verbose: bool,
}

/// Web服务配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// LLM模型配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LLMConfig {
    /// LLM Provider类型
    pub provider: LLMProvider,

    /// LLM API KEY，为空时从secrets或环境变量中读取
    pub api_key: String,

    /// LLM API基地址，为空时使用provider的默认地址
    pub api_base_url: String,

    /// 所有agent共用的模型
    pub model: String,

    /// 最大tokens
    pub max_tokens: u32,

    /// 重试次数
    pub retry_attempts: u32,

    /// 重试间隔（毫秒）
    pub retry_delay_ms: u64,

    /// 超时时间（秒）
    pub timeout_seconds: u64,
}

/// 搜索工具配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    /// Serper API KEY，为空时从secrets或环境变量 SERPER_API_KEY 中读取
    pub serper_api_key: String,

    pub serper_endpoint: String,

    /// 每次搜索返回的结果数
    pub results_per_query: usize,

    /// 网页阅读工具返回的最大字符数
    pub max_page_chars: usize,
}

/// Crew执行参数
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CrewConfig {
    pub variant: PipelineVariant,

    /// 每分钟最多发起的模型调用次数，0表示不限制
    pub max_rpm: u32,

    /// 是否让每个任务看到此前所有任务的产出
    pub memory: bool,

    /// 单个agent的最大推理轮次
    pub max_iter: usize,

    pub verbose: bool,
}

/// 缓存配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CacheConfig {
    /// 是否启用缓存
    pub enabled: bool,

    /// 缓存过期时间（秒）
    pub ttl_seconds: u64,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut file =
            File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// 解析LLM API KEY：显式配置 > secrets文件 > 环境变量
    pub fn llm_api_key(&self) -> String {
        if !self.llm.api_key.trim().is_empty() {
            return self.llm.api_key.clone();
        }
        self.secret(self.llm.provider.api_key_name())
            .unwrap_or_default()
    }

    /// 解析Serper API KEY
    pub fn serper_api_key(&self) -> Option<String> {
        if !self.search.serper_api_key.trim().is_empty() {
            return Some(self.search.serper_api_key.clone());
        }
        self.secret("SERPER_API_KEY")
    }

    /// 解析LLM API基地址
    pub fn llm_base_url(&self) -> String {
        if self.llm.api_base_url.trim().is_empty() {
            self.llm.provider.default_base_url().to_string()
        } else {
            self.llm.api_base_url.clone()
        }
    }

    /// 先查secrets文件，再查进程环境变量
    pub fn secret(&self, key_name: &str) -> Option<String> {
        load_secrets(&self.secrets_path)
            .remove(key_name)
            .or_else(|| std::env::var(key_name).ok())
            .filter(|value| !value.trim().is_empty())
    }
}

/// 读取secrets文件，文件不存在或无法解析时返回空表
fn load_secrets(path: &Path) -> HashMap<String, String> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return HashMap::new();
    };

    match toml::from_str::<toml::Table>(&content) {
        Ok(table) => table
            .into_iter()
            .filter_map(|(key, value)| match value {
                toml::Value::String(s) => Some((key, s)),
                _ => None,
            })
            .collect(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable secrets file");
            HashMap::new()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_language: TargetLanguage::default(),
            secrets_path: PathBuf::from("secrets.toml"),
            output_path: PathBuf::from("./reports"),
            server: ServerConfig::default(),
            llm: LLMConfig::default(),
            search: SearchConfig::default(),
            crew: CrewConfig::default(),
            cache: CacheConfig::default(),
            verbose: false,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("127.0.0.1"),
            port: 8501,
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::default(),
            api_key: String::new(),
            api_base_url: String::new(),
            model: String::from("gpt-4o-mini"),
            max_tokens: 4096,
            retry_attempts: 3,
            retry_delay_ms: 2000,
            timeout_seconds: 300,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            serper_api_key: String::new(),
            serper_endpoint: String::from("https://google.serper.dev/search"),
            results_per_query: 8,
            max_page_chars: 12_000,
        }
    }
}

impl Default for CrewConfig {
    fn default() -> Self {
        Self {
            variant: PipelineVariant::default(),
            max_rpm: 10,
            memory: true,
            max_iter: 8,
            verbose: true,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: 3600,
        }
    }
}
