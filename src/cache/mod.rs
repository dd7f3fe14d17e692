use md5::{Digest, Md5};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::config::CacheConfig;

pub mod performance_monitor;
pub use performance_monitor::{CachePerformanceMonitor, CachePerformanceReport};

/// 报告缓存：以 (主题, 子主题列表) 为键的进程内限时缓存
pub struct ReportCache {
    config: CacheConfig,
    entries: RwLock<HashMap<String, CacheEntry<String>>>,
    performance_monitor: CachePerformanceMonitor,
}

/// 缓存条目
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub data: T,
    pub stored_at: Instant,
    /// 生成这份数据所花的时间，命中时计为节省的时间
    pub run_time: Duration,
}

impl ReportCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: RwLock::new(HashMap::new()),
            performance_monitor: CachePerformanceMonitor::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.config.ttl_seconds)
    }

    /// 生成请求的MD5键，子主题的顺序参与计算
    pub fn cache_key(main_topic: &str, subtopics: &[String]) -> String {
        let mut hasher = Md5::new();
        hasher.update(main_topic.as_bytes());
        for subtopic in subtopics {
            // 单元分隔符，避免 ["a,b"] 与 ["a", "b"] 冲突
            hasher.update(b"\x1f");
            hasher.update(subtopic.as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }

    /// 检查缓存是否过期
    fn is_expired(&self, stored_at: Instant) -> bool {
        stored_at.elapsed() >= self.ttl()
    }

    /// 获取缓存的报告
    pub async fn get(&self, main_topic: &str, subtopics: &[String]) -> Option<String> {
        if !self.config.enabled {
            return None;
        }

        let hash = Self::cache_key(main_topic, subtopics);

        {
            let entries = self.entries.read().await;
            match entries.get(&hash) {
                None => {
                    self.performance_monitor.record_cache_miss(&hash);
                    return None;
                }
                Some(entry) if !self.is_expired(entry.stored_at) => {
                    self.performance_monitor
                        .record_cache_hit(&hash, entry.run_time);
                    return Some(entry.data.clone());
                }
                Some(_) => {}
            }
        }

        // 删除过期缓存
        let mut entries = self.entries.write().await;
        if entries
            .get(&hash)
            .is_some_and(|entry| self.is_expired(entry.stored_at))
        {
            entries.remove(&hash);
            self.performance_monitor.record_cache_expiration(&hash);
        }
        self.performance_monitor.record_cache_miss(&hash);
        None
    }

    /// 写入报告
    pub async fn set(&self, main_topic: &str, subtopics: &[String], data: String, run_time: Duration) {
        if !self.config.enabled {
            return;
        }

        let hash = Self::cache_key(main_topic, subtopics);
        let entry = CacheEntry {
            data,
            stored_at: Instant::now(),
            run_time,
        };

        self.entries.write().await.insert(hash.clone(), entry);
        self.performance_monitor.record_cache_write(&hash);
    }

    /// 清除所有过期条目，返回清除数量
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| self.is_expired(entry.stored_at))
            .map(|(hash, _)| hash.clone())
            .collect();

        for hash in &expired {
            entries.remove(hash);
            self.performance_monitor.record_cache_expiration(hash);
        }
        expired.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// 生成性能报告
    pub fn generate_performance_report(&self) -> CachePerformanceReport {
        self.performance_monitor.generate_report()
    }
}
