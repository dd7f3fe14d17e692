use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crew::{CrewError, KickoffInputs};

/// 一次分析请求：主题与子主题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRequest {
    pub main_topic: String,
    pub subtopics: Vec<String>,
}

impl TopicRequest {
    /// 解析用户输入，子主题以逗号分隔
    ///
    /// 任一部分为空时返回 `ReportError::InvalidInput`，`warning` 为展示给用户的提示。
    pub fn parse(main_topic: &str, subtopics_input: &str, warning: &str) -> Result<Self, ReportError> {
        let main_topic = main_topic.trim();
        let subtopics: Vec<String> = subtopics_input
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if main_topic.is_empty() || subtopics.is_empty() {
            return Err(ReportError::InvalidInput(warning.to_string()));
        }

        Ok(Self {
            main_topic: main_topic.to_string(),
            subtopics,
        })
    }

    /// 子主题以 `, ` 连接
    pub fn subtopics_label(&self) -> String {
        self.subtopics.join(", ")
    }

    pub fn kickoff_inputs(&self) -> KickoffInputs {
        KickoffInputs {
            main_topic: self.main_topic.clone(),
            subtopics: self.subtopics.clone(),
        }
    }
}

/// 报告生成错误
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Crew(#[from] CrewError),
}

impl ReportError {
    pub fn error_type(&self) -> &'static str {
        match self {
            ReportError::InvalidInput(_) => "InvalidInput",
            ReportError::Crew(e) => e.kind(),
        }
    }

    /// 诊断信息：调试输出加上完整的错误链
    pub fn details(&self) -> String {
        let mut lines = vec![format!("{:?}", self)];
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            lines.push(format!("caused by: {}", cause));
            source = cause.source();
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WARNING: &str = "Please enter a main topic and sub-topics.";

    #[test]
    fn test_parse_trims_and_splits() {
        let request = TopicRequest::parse("  AI ", "Ethics,  Jobs ,", WARNING).unwrap();

        assert_eq!(request.main_topic, "AI");
        assert_eq!(request.subtopics, vec!["Ethics", "Jobs"]);
        assert_eq!(request.subtopics_label(), "Ethics, Jobs");
    }

    #[test]
    fn test_parse_rejects_missing_parts() {
        for (topic, subtopics) in [("", "Ethics"), ("AI", ""), ("   ", "Ethics"), ("AI", " , ,")] {
            match TopicRequest::parse(topic, subtopics, WARNING) {
                Err(ReportError::InvalidInput(message)) => assert_eq!(message, WARNING),
                other => panic!("unexpected result for {:?}/{:?}: {:?}", topic, subtopics, other),
            }
        }
    }

    #[test]
    fn test_error_type_and_details() {
        let error = ReportError::from(CrewError::Provider("rate limited".to_string()));

        assert_eq!(error.error_type(), "Provider");
        assert_eq!(error.to_string(), "model provider error: rate limited");
        assert!(error.details().contains("Provider(\"rate limited\")"));
        assert_eq!(ReportError::InvalidInput(WARNING.into()).error_type(), "InvalidInput");
    }
}
