//! LLM客户端 - provider封装、任务执行与重试

use std::future::Future;
use std::time::Duration;

use crate::config::LLMConfig;
use crate::crew::CrewError;

pub mod providers;
pub mod task_executor;

pub use providers::{AgentToolbox, ProviderAgent, ProviderClient};
pub use task_executor::TaskExecutor;

/// 通用重试逻辑：仅对瞬时错误按固定间隔重试
pub async fn retry_with_backoff<T, F, Fut>(llm_config: &LLMConfig, operation: F) -> Result<T, CrewError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, CrewError>>,
{
    let max_retries = llm_config.retry_attempts.max(1);
    let retry_delay_ms = llm_config.retry_delay_ms;
    let mut retries = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(err) if !err.is_transient() => return Err(err),
            Err(err) => {
                retries += 1;
                tracing::warn!(
                    attempt = retries,
                    max_attempts = max_retries,
                    error = %err,
                    "model call failed"
                );
                if retries >= max_retries {
                    return Err(err);
                }
                tokio::time::sleep(Duration::from_millis(retry_delay_ms)).await;
            }
        }
    }
}
