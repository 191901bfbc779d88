use chrono::{DateTime, Utc};

/// 时间源。所有播放状态的计算都从这里取 `now`，测试中可以替换为手动时钟。
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
