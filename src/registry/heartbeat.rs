//! TTL 心跳任务
//!
//! TTL 检查需要服务自己定期上报 passing 状态，否则 Consul 会把实例标记为 critical。
//! 任务启动后立即上报一次，之后每 `TTL - 1s` 上报一次，直到被取消。

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::client::ConsulApi;
use crate::health::{HealthStatus, MIN_TTL};

/// 心跳上报附带的输出
pub const HEARTBEAT_OUTPUT: &str = "online";

/// 心跳间隔：TTL 减去一秒
pub fn heartbeat_period(ttl: Duration) -> Duration {
    ttl.saturating_sub(MIN_TTL).max(Duration::from_millis(100))
}

/// 正在运行的 TTL 心跳任务
///
/// `stop` 会等待任务退出；直接 drop 只发出取消信号
pub struct TtlHeartbeat {
    check_id: String,
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl TtlHeartbeat {
    /// 启动心跳任务
    pub fn spawn(client: Arc<dyn ConsulApi>, check_id: impl Into<String>, ttl: Duration) -> Self {
        let check_id = check_id.into();
        let token = CancellationToken::new();
        let period = heartbeat_period(ttl);

        let handle = tokio::spawn(run(client, check_id.clone(), period, token.clone()));
        info!(check_id = %check_id, period_ms = period.as_millis() as u64, "TTL heartbeat started");

        Self {
            check_id,
            token,
            handle: Some(handle),
        }
    }

    pub fn check_id(&self) -> &str {
        &self.check_id
    }

    /// 停止心跳并等待任务退出，可重复调用
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(check_id = %self.check_id, error = %e, "TTL heartbeat task ended abnormally");
            }
        }
        info!(check_id = %self.check_id, "TTL heartbeat stopped");
    }
}

impl Drop for TtlHeartbeat {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn run(client: Arc<dyn ConsulApi>, check_id: String, period: Duration, token: CancellationToken) {
    beat(client.as_ref(), &check_id, &token).await;

    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => beat(client.as_ref(), &check_id, &token).await,
        }
    }
}

/// 上报一次 passing，取消时放弃正在进行的请求
async fn beat(client: &dyn ConsulApi, check_id: &str, token: &CancellationToken) {
    tokio::select! {
        biased;
        _ = token.cancelled() => {}
        result = client.update_ttl(check_id, HEARTBEAT_OUTPUT, HealthStatus::Passing) => {
            match result {
                Ok(()) => debug!(check_id = %check_id, "TTL heartbeat sent"),
                Err(e) => error!(check_id = %check_id, error = %e, "Failed to update TTL check"),
            }
        }
    }
}
