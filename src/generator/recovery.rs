//! kickoff失败后的恢复策略

use crate::crew::{Crew, CrewEngine, CrewError, KickoffInputs, KickoffOutput};

/// 委派工具参数被拒绝后追加给每个agent的说明
pub const DELEGATION_GUIDANCE: &str = "When you call delegate_work_to_coworker or ask_question_to_coworker, \
pass `task` (or `question`), `context` and `coworker` as plain strings. \
Never pass a JSON object or a list as a value: write the whole context out as text \
and use the exact role name of the coworker.";

/// 执行kickoff；遇到委派参数校验失败时修正工具说明并重试一次
///
/// 其他错误原样返回，重试后的任何错误也原样返回。
pub async fn kickoff_with_recovery(
    engine: &dyn CrewEngine,
    crew: &mut Crew,
    inputs: &KickoffInputs,
) -> Result<KickoffOutput, CrewError> {
    match engine.kickoff(crew, inputs).await {
        Err(e) if e.is_delegation_schema() => {
            tracing::warn!(error = %e, "delegation arguments rejected, retrying once with amended tool guidance");
            crew.amend_tool_guidance(DELEGATION_GUIDANCE);
            engine.kickoff(crew, inputs).await
        }
        other => other,
    }
}
