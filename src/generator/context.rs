use std::sync::Arc;

use anyhow::Result;

use crate::cache::ReportCache;
use crate::config::Config;
use crate::crew::{CrewEngine, RigCrewEngine};

#[derive(Clone)]
pub struct GeneratorContext {
    /// 配置
    pub config: Config,
    /// crew执行引擎
    pub engine: Arc<dyn CrewEngine>,
    /// 报告缓存，在所有请求间共享
    pub cache: Arc<ReportCache>,
}

impl GeneratorContext {
    /// 使用基于rig的引擎创建生成器上下文
    pub fn new(config: Config) -> Result<Self> {
        let engine = Arc::new(RigCrewEngine::new(&config)?);
        Ok(Self::with_engine(config, engine))
    }

    /// 使用指定的引擎创建生成器上下文
    pub fn with_engine(config: Config, engine: Arc<dyn CrewEngine>) -> Self {
        let cache = Arc::new(ReportCache::new(config.cache.clone()));
        Self {
            config,
            engine,
            cache,
        }
    }
}
