use crate::config::{Config, DEFAULT_CONFIG_FILE, LLMProvider, PipelineVariant};
use crate::i18n::TargetLanguage;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// trend-crew - 由多个LLM agent协作完成的主题趋势分析
#[derive(Parser, Debug)]
#[command(name = "trend-crew")]
#[command(
    about = "Runs a sequential crew of LLM agents (researcher, synthesizer, writer) over a topic and its sub-topics, and serves the resulting analysis report."
)]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// 配置文件路径
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// 是否启用详细日志
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// LLM Provider (openai, anthropic, deepseek, mistral, openrouter, ollama)
    #[arg(long, global = true)]
    pub llm_provider: Option<String>,

    /// LLM API基地址
    #[arg(long, global = true)]
    pub llm_api_base_url: Option<String>,

    /// LLM API KEY
    #[arg(long, global = true)]
    pub llm_api_key: Option<String>,

    /// 所有agent共用的模型
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// 最大tokens数
    #[arg(long, global = true)]
    pub max_tokens: Option<u32>,

    /// 报告语言 (en, fr, de, es, zh)
    #[arg(long, global = true)]
    pub target_language: Option<String>,

    /// 流水线变体 (standard, reviewed)
    #[arg(long, global = true)]
    pub variant: Option<String>,

    /// 每分钟最多的模型调用次数，0表示不限制
    #[arg(long, global = true)]
    pub max_rpm: Option<u32>,

    /// 每个任务只看到上一个任务的产出
    #[arg(long, global = true)]
    pub no_memory: bool,

    /// 是否禁用缓存
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// 缓存过期时间（秒）
    #[arg(long, global = true)]
    pub cache_ttl: Option<u64>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// 启动Web服务（默认）
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// 在命令行生成一份报告并保存
    Run {
        /// 主题
        #[arg(short, long)]
        topic: String,
        /// 逗号分隔的子主题
        #[arg(short, long)]
        subtopics: String,
        /// 输出目录
        #[arg(short, long)]
        output_path: Option<PathBuf>,
    },
}

impl Args {
    /// 要执行的子命令，未指定时启动Web服务
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve {
            host: None,
            port: None,
        })
    }

    /// 将CLI参数转换为配置
    pub fn into_config(self) -> Result<Config> {
        let mut config = if let Some(config_path) = &self.config {
            // 显式指定的配置文件必须可读
            Config::from_file(config_path)
                .with_context(|| format!("failed to load config file {}", config_path.display()))?
        } else {
            let default_config_path = std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(DEFAULT_CONFIG_FILE);

            if default_config_path.exists() {
                Config::from_file(&default_config_path).with_context(|| {
                    format!(
                        "failed to load default config file {}",
                        default_config_path.display()
                    )
                })?
            } else {
                Config::default()
            }
        };

        // 覆盖LLM配置
        if let Some(provider_str) = self.llm_provider {
            match provider_str.parse::<LLMProvider>() {
                Ok(provider) => config.llm.provider = provider,
                Err(_) => tracing::warn!(
                    provider = %provider_str,
                    fallback = %config.llm.provider,
                    "unknown provider, keeping the configured one"
                ),
            }
        }
        if let Some(llm_api_base_url) = self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url;
        }
        if let Some(llm_api_key) = self.llm_api_key {
            config.llm.api_key = llm_api_key;
        }
        if let Some(model) = self.model {
            config.llm.model = model;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.llm.max_tokens = max_tokens;
        }

        // 目标语言配置
        if let Some(target_language_str) = self.target_language {
            match target_language_str.parse::<TargetLanguage>() {
                Ok(target_language) => config.target_language = target_language,
                Err(_) => tracing::warn!(
                    language = %target_language_str,
                    fallback = %config.target_language,
                    "unknown target language, keeping the configured one"
                ),
            }
        }

        // crew配置
        if let Some(variant_str) = self.variant {
            match variant_str.parse::<PipelineVariant>() {
                Ok(variant) => config.crew.variant = variant,
                Err(_) => tracing::warn!(
                    variant = %variant_str,
                    fallback = %config.crew.variant,
                    "unknown pipeline variant, keeping the configured one"
                ),
            }
        }
        if let Some(max_rpm) = self.max_rpm {
            config.crew.max_rpm = max_rpm;
        }
        if self.no_memory {
            config.crew.memory = false;
        }

        // 缓存配置
        if self.no_cache {
            config.cache.enabled = false;
        }
        if let Some(cache_ttl) = self.cache_ttl {
            config.cache.ttl_seconds = cache_ttl;
        }

        // 子命令配置
        match self.command {
            Some(Command::Serve { host, port }) => {
                if let Some(host) = host {
                    config.server.host = host;
                }
                if let Some(port) = port {
                    config.server.port = port;
                }
            }
            Some(Command::Run {
                output_path: Some(output_path),
                ..
            }) => {
                config.output_path = output_path;
            }
            _ => {}
        }

        config.verbose = self.verbose || config.verbose;

        Ok(config)
    }
}
