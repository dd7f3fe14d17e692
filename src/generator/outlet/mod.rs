use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;

use crate::generator::context::GeneratorContext;
use crate::generator::types::TopicRequest;
use crate::i18n::TargetLanguage;

/// 生成好的报告，用于展示和下载
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportArtifact {
    pub main_topic: String,
    pub subtopics: Vec<String>,
    pub text: String,
    pub file_name: String,
    /// 是否来自缓存
    pub cached: bool,
}

impl ReportArtifact {
    pub fn new(request: &TopicRequest, text: String, cached: bool, language: TargetLanguage) -> Self {
        Self {
            main_topic: request.main_topic.clone(),
            subtopics: request.subtopics.clone(),
            text,
            file_name: report_file_name(&request.main_topic, language),
            cached,
        }
    }
}

/// 下载文件名：`{前缀}_{主题}.txt`，主题中的空格替换为下划线
///
/// 路径分隔符和双引号同样替换，保证文件名可以直接落盘并放进响应头。
pub fn report_file_name(main_topic: &str, language: TargetLanguage) -> String {
    let topic: String = main_topic
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' | '"' => '_',
            other => other,
        })
        .collect();
    format!("{}_{}.txt", language.report_file_prefix(), topic)
}

/// 保存报告
pub async fn save(context: &GeneratorContext, artifact: &ReportArtifact) -> Result<PathBuf> {
    let outlet = DiskOutlet::new(context.config.output_path.clone());
    outlet.save(artifact).await
}

pub trait Outlet {
    async fn save(&self, artifact: &ReportArtifact) -> Result<PathBuf>;
}

pub struct DiskOutlet {
    output_dir: PathBuf,
}

impl DiskOutlet {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }
}

impl Outlet for DiskOutlet {
    async fn save(&self, artifact: &ReportArtifact) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("failed to create output directory {}", self.output_dir.display()))?;

        let output_file_path = self.output_dir.join(&artifact.file_name);
        tokio::fs::write(&output_file_path, &artifact.text)
            .await
            .with_context(|| format!("failed to write report {}", output_file_path.display()))?;

        tracing::info!(path = %output_file_path.display(), bytes = artifact.text.len(), "report saved");
        Ok(output_file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn request(topic: &str) -> TopicRequest {
        TopicRequest {
            main_topic: topic.to_string(),
            subtopics: vec!["Ethics".to_string()],
        }
    }

    #[test]
    fn test_report_file_name_is_localized() {
        assert_eq!(
            report_file_name("Artificial Intelligence", TargetLanguage::French),
            "rapport_analyse_Artificial_Intelligence.txt"
        );
        assert_eq!(
            report_file_name("AI", TargetLanguage::English),
            "analysis_report_AI.txt"
        );
        assert_eq!(
            report_file_name("TCP/IP \"stack\"", TargetLanguage::English),
            "analysis_report_TCP_IP__stack_.txt"
        );
    }

    #[tokio::test]
    async fn test_disk_outlet_writes_report() {
        let temp_dir = TempDir::new().unwrap();
        let outlet = DiskOutlet::new(temp_dir.path().join("reports"));
        let artifact = ReportArtifact::new(
            &request("Climate Change"),
            "# Report\n\nbody".to_string(),
            false,
            TargetLanguage::English,
        );

        let path = outlet.save(&artifact).await.unwrap();

        assert_eq!(
            path,
            temp_dir.path().join("reports").join("analysis_report_Climate_Change.txt")
        );
        assert_eq!(std::fs::read_to_string(path).unwrap(), "# Report\n\nbody");
    }
}
