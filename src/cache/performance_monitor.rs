use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// 缓存性能监控器
#[derive(Clone)]
pub struct CachePerformanceMonitor {
    metrics: Arc<CacheMetrics>,
}

/// 缓存指标
#[derive(Default)]
pub struct CacheMetrics {
    /// 缓存命中次数
    pub cache_hits: AtomicUsize,
    /// 缓存未命中次数（含过期）
    pub cache_misses: AtomicUsize,
    /// 缓存写入次数
    pub cache_writes: AtomicUsize,
    /// 因过期被清除的条目数
    pub cache_expirations: AtomicUsize,
    /// 命中时省下的crew运行时间（毫秒）
    pub total_run_time_saved: AtomicU64,
}

/// 缓存性能报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachePerformanceReport {
    /// 缓存命中率
    pub hit_rate: f64,
    /// 总查询次数
    pub total_operations: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub cache_writes: usize,
    pub cache_expirations: usize,
    /// 节省的crew运行时间（秒）
    pub run_time_saved: f64,
}

impl CachePerformanceMonitor {
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(CacheMetrics::default()),
        }
    }

    /// 记录缓存命中
    pub fn record_cache_hit(&self, key_hash: &str, run_time_saved: Duration) {
        self.metrics.cache_hits.fetch_add(1, Ordering::Relaxed);
        self.metrics
            .total_run_time_saved
            .fetch_add(run_time_saved.as_millis() as u64, Ordering::Relaxed);

        tracing::info!(
            key = %key_hash,
            saved_secs = run_time_saved.as_secs_f64(),
            "report cache hit"
        );
    }

    /// 记录缓存未命中
    pub fn record_cache_miss(&self, key_hash: &str) {
        self.metrics.cache_misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(key = %key_hash, "report cache miss, the crew has to run");
    }

    /// 记录过期条目被清除
    pub fn record_cache_expiration(&self, key_hash: &str) {
        self.metrics
            .cache_expirations
            .fetch_add(1, Ordering::Relaxed);
        tracing::debug!(key = %key_hash, "report cache entry expired");
    }

    /// 记录缓存写入
    pub fn record_cache_write(&self, key_hash: &str) {
        self.metrics.cache_writes.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(key = %key_hash, "report cached");
    }

    /// 生成性能报告
    pub fn generate_report(&self) -> CachePerformanceReport {
        let hits = self.metrics.cache_hits.load(Ordering::Relaxed);
        let misses = self.metrics.cache_misses.load(Ordering::Relaxed);
        let writes = self.metrics.cache_writes.load(Ordering::Relaxed);
        let expirations = self.metrics.cache_expirations.load(Ordering::Relaxed);
        let total_operations = hits + misses;

        let hit_rate = if total_operations > 0 {
            hits as f64 / total_operations as f64
        } else {
            0.0
        };

        let run_time_saved =
            self.metrics.total_run_time_saved.load(Ordering::Relaxed) as f64 / 1000.0; // 转换为秒

        CachePerformanceReport {
            hit_rate,
            total_operations,
            cache_hits: hits,
            cache_misses: misses,
            cache_writes: writes,
            cache_expirations: expirations,
            run_time_saved,
        }
    }
}

impl Default for CachePerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}
