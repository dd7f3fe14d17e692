//! 测试用的脚本化引擎

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::{Crew, CrewEngine, CrewError, CrewOutput, KickoffInputs, KickoffOutput};

/// 按脚本依次返回结果，脚本用完后返回 `fallback`，并记录每次调用
pub struct ScriptedEngine {
    script: Mutex<VecDeque<Result<KickoffOutput, CrewError>>>,
    fallback: KickoffOutput,
    calls: Mutex<Vec<(Crew, KickoffInputs)>>,
}

impl ScriptedEngine {
    pub fn returning(fallback: KickoffOutput) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// 返回带原始文本的crew产出
    pub fn with_raw(raw: &str) -> Self {
        Self::returning(KickoffOutput::Crew(CrewOutput {
            raw: Some(raw.to_string()),
            tasks_output: Vec::new(),
        }))
    }

    pub fn then(self, result: Result<KickoffOutput, CrewError>) -> Self {
        self.script.lock().unwrap().push_back(result);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<(Crew, KickoffInputs)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CrewEngine for ScriptedEngine {
    async fn kickoff(&self, crew: &Crew, inputs: &KickoffInputs) -> Result<KickoffOutput, CrewError> {
        self.calls
            .lock()
            .unwrap()
            .push((crew.clone(), inputs.clone()));
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}
