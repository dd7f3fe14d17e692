use crate::config::Config;
use crate::crew::RigCrewEngine;
use crate::generator::context::GeneratorContext;
use crate::generator::outlet::{self, ReportArtifact};
use crate::generator::recovery::kickoff_with_recovery;
use crate::generator::roster::build_crew;
use crate::generator::types::{ReportError, TopicRequest};

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 时间跟踪作用域
pub struct TimingScope {
    start_time: Instant,
    phase_start_times: Vec<(String, Instant)>,
    phase_durations: Vec<(String, Duration)>,
}

impl Default for TimingScope {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingScope {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            phase_start_times: Vec::new(),
            phase_durations: Vec::new(),
        }
    }

    /// 开始一个新的阶段计时
    pub fn start_phase(&mut self, phase_name: &str) {
        self.phase_start_times
            .push((phase_name.to_string(), Instant::now()));
    }

    /// 结束一个阶段的计时
    pub fn end_phase(&mut self, phase_name: &str) -> Option<Duration> {
        let position = self
            .phase_start_times
            .iter()
            .position(|(name, _)| name == phase_name)?;
        let (name, start_time) = self.phase_start_times.remove(position);
        let duration = start_time.elapsed();
        tracing::debug!(phase = %name, elapsed_ms = duration.as_millis() as u64, "phase finished");
        self.phase_durations.push((name, duration));
        Some(duration)
    }

    /// 获取总执行时间
    pub fn get_total_duration(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// 按结束顺序排列的各阶段时间
    pub fn get_phase_durations(&self) -> &[(String, Duration)] {
        &self.phase_durations
    }

    /// 获取格式化的执行时间报告
    pub fn generate_timing_report(&self) -> String {
        let mut report = format!(
            "total: {:.2}s",
            self.get_total_duration().as_secs_f64()
        );
        for (phase, duration) in &self.phase_durations {
            report.push_str(&format!(", {}: {:.3}s", phase, duration.as_secs_f64()));
        }
        report
    }
}

/// 时间跟踪常量
pub struct TimingKeys;

impl TimingKeys {
    pub const VALIDATE: &'static str = "validate";
    pub const CACHE_LOOKUP: &'static str = "cache_lookup";
    pub const CREW_SETUP: &'static str = "crew_setup";
    pub const KICKOFF: &'static str = "kickoff";
}

/// 生成一份报告：校验输入、查缓存、执行crew、归一化结果并写入缓存
///
/// 输入缺失时返回 `ReportError::InvalidInput`，不会调用引擎。
pub async fn generate_report(
    context: &GeneratorContext,
    main_topic: &str,
    subtopics_input: &str,
) -> Result<ReportArtifact, ReportError> {
    let mut timing = TimingScope::new();
    let language = context.config.target_language;

    timing.start_phase(TimingKeys::VALIDATE);
    let request = TopicRequest::parse(main_topic, subtopics_input, language.missing_input_warning())
        .inspect_err(|e| tracing::warn!(error = %e, "incomplete request, nothing to run"))?;
    timing.end_phase(TimingKeys::VALIDATE);

    timing.start_phase(TimingKeys::CACHE_LOOKUP);
    let cached = context
        .cache
        .get(&request.main_topic, &request.subtopics)
        .await;
    timing.end_phase(TimingKeys::CACHE_LOOKUP);

    if let Some(text) = cached {
        tracing::info!(
            topic = %request.main_topic,
            subtopics = %request.subtopics_label(),
            "report served from cache"
        );
        return Ok(ReportArtifact::new(&request, text, true, language));
    }

    timing.start_phase(TimingKeys::CREW_SETUP);
    let mut crew = build_crew(&request, &context.config);
    let inputs = request.kickoff_inputs();
    timing.end_phase(TimingKeys::CREW_SETUP);

    tracing::info!(
        topic = %request.main_topic,
        subtopics = %request.subtopics_label(),
        variant = %context.config.crew.variant,
        tasks = crew.tasks.len(),
        "launching crew"
    );

    timing.start_phase(TimingKeys::KICKOFF);
    let output = kickoff_with_recovery(context.engine.as_ref(), &mut crew, &inputs)
        .await
        .inspect_err(|e| tracing::error!(error = %e, error_type = e.kind(), "crew failed"))?;
    let run_time = timing.end_phase(TimingKeys::KICKOFF).unwrap_or_default();

    let text = output.into_text();
    context
        .cache
        .set(&request.main_topic, &request.subtopics, text.clone(), run_time)
        .await;

    tracing::info!(timing = %timing.generate_timing_report(), "report generated");

    Ok(ReportArtifact::new(&request, text, false, language))
}

/// 只从缓存取报告，不运行crew；未命中或已过期时返回 `None`
pub async fn cached_report(
    context: &GeneratorContext,
    main_topic: &str,
    subtopics_input: &str,
) -> Result<Option<ReportArtifact>, ReportError> {
    let language = context.config.target_language;
    let request =
        TopicRequest::parse(main_topic, subtopics_input, language.missing_input_warning())?;

    Ok(context
        .cache
        .get(&request.main_topic, &request.subtopics)
        .await
        .map(|text| ReportArtifact::new(&request, text, true, language)))
}

/// 命令行模式：检查模型连接，生成一份报告并保存到输出目录
pub async fn launch(
    config: &Config,
    main_topic: &str,
    subtopics_input: &str,
) -> Result<(ReportArtifact, PathBuf)> {
    let engine = Arc::new(RigCrewEngine::new(config)?);

    // 启动时检查模型连接
    engine.check_connection().await?;

    let context = GeneratorContext::with_engine(config.clone(), engine);
    let artifact = generate_report(&context, main_topic, subtopics_input).await?;
    let path = outlet::save(&context, &artifact).await?;

    Ok((artifact, path))
}

#[cfg(test)]
mod tests;
