//! 任务执行器 - 以多轮对话执行单个任务

use rig::completion::{AssistantContent, Message, PromptError};

use super::providers::ProviderAgent;
use crate::crew::CrewError;

/// 任务执行器
pub struct TaskExecutor;

impl TaskExecutor {
    /// 以最多 `max_iterations` 轮对话执行任务
    ///
    /// 达到最大轮次时，若历史中已有助手文本，则以该文本作为部分结果返回。
    pub async fn execute(
        agent: &ProviderAgent,
        role: &str,
        user_prompt: &str,
        max_iterations: usize,
    ) -> Result<String, CrewError> {
        tracing::debug!(agent = %role, max_iterations, "running task");

        match agent.multi_turn(user_prompt, max_iterations).await {
            Ok(response) => Ok(response),
            Err(PromptError::MaxDepthError {
                max_depth,
                chat_history,
                ..
            }) => {
                tracing::warn!(agent = %role, max_depth, "task reached the iteration limit");

                match Self::extract_partial_result(&chat_history) {
                    Some(content) => Ok(format!(
                        "{}\n\n[Note: stopped after reaching the iteration limit ({})]",
                        content, max_depth
                    )),
                    None => Err(CrewError::MaxIterations {
                        agent: role.to_string(),
                        max_iter: max_depth,
                    }),
                }
            }
            Err(e) => {
                tracing::debug!(agent = %role, error = ?e, "task failed");
                Err(CrewError::Provider(e.to_string()))
            }
        }
    }

    /// 从聊天历史中提取最后一段助手文本
    fn extract_partial_result(chat_history: &[Message]) -> Option<String> {
        chat_history.iter().rev().find_map(|msg| {
            if let Message::Assistant { content, .. } = msg {
                let text_content = content
                    .iter()
                    .filter_map(|c| {
                        if let AssistantContent::Text(text) = c {
                            Some(text.text.clone())
                        } else {
                            None
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("\n");

                if !text_content.trim().is_empty() {
                    Some(text_content)
                } else {
                    None
                }
            } else {
                None
            }
        })
    }
}
