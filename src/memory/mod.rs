use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 一条任务产出记忆
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub task_index: usize,
    pub agent: String,
    pub content: String,
    pub stored_at: DateTime<Utc>,
}

/// Crew在一次kickoff期间的短期记忆
#[derive(Debug, Default)]
pub struct CrewMemory {
    entries: Vec<MemoryEntry>,
    total_size: usize,
}

impl CrewMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记住某个任务的产出
    pub fn remember(&mut self, task_index: usize, agent: &str, content: &str) {
        self.total_size += content.len();
        self.entries.push(MemoryEntry {
            task_index,
            agent: agent.to_string(),
            content: content.to_string(),
            stored_at: Utc::now(),
        });
    }

    pub fn entries(&self) -> &[MemoryEntry] {
        &self.entries
    }

    pub fn latest(&self) -> Option<&MemoryEntry> {
        self.entries.last()
    }

    pub fn total_size(&self) -> usize {
        self.total_size
    }

    /// 渲染下一个任务可见的上下文
    ///
    /// `recall_all` 为真时返回全部记忆，否则只返回上一个任务的产出。
    pub fn render_context(&self, recall_all: bool) -> Option<String> {
        let visible: &[MemoryEntry] = if recall_all {
            &self.entries
        } else {
            match self.entries.len() {
                0 => &[],
                n => &self.entries[n - 1..],
            }
        };

        if visible.is_empty() {
            return None;
        }

        let mut context = String::new();
        for entry in visible {
            context.push_str(&format!(
                "### Output of {} (task {})\n{}\n\n",
                entry.agent,
                entry.task_index + 1,
                entry.content.trim()
            ));
        }
        Some(context)
    }
}
