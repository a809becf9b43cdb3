//! Consul 服务注册实现

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use super::heartbeat::TtlHeartbeat;
use super::trait_def::{Registry, RegistryInfo};
use crate::client::{
    AgentServiceCheck, AgentServiceRegistration, AgentWeights, ConsulApi, ConsulClient,
};
use crate::config::ConsulConfig;
use crate::discovery::normalize_weight;
use crate::error::{ConsulError, Result};
use crate::health::{CheckSpec, parse_ttl};
use crate::utils::{encode_tags, join_host_port, parse_addr, service_id};

/// 注册选项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryOptions {
    /// 健康检查，`None` 表示不附带检查
    pub check: Option<AgentServiceCheck>,
    /// 注册模板，注册时在此基础上填充 ID、地址、标签等字段
    pub registration: Option<AgentServiceRegistration>,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            check: Some(CheckSpec::default().into()),
            registration: None,
        }
    }
}

impl RegistryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置健康检查
    pub fn with_check(mut self, check: Option<AgentServiceCheck>) -> Self {
        self.check = check;
        self
    }

    /// 使用类型化的检查描述
    pub fn with_check_spec(mut self, spec: CheckSpec) -> Self {
        self.check = Some(spec.into());
        self
    }

    /// 设置注册模板
    pub fn with_registration(mut self, registration: AgentServiceRegistration) -> Self {
        self.registration = Some(registration);
        self
    }
}

/// Consul 服务注册器
///
/// 使用 TTL 检查时，每个注册器同一时刻最多运行一个心跳任务
pub struct ConsulRegistry {
    client: Arc<dyn ConsulApi>,
    opts: RwLock<RegistryOptions>,
    heartbeat: Mutex<Option<TtlHeartbeat>>,
}

impl ConsulRegistry {
    /// 使用 agent 地址和默认选项创建注册器
    pub fn new(address: impl Into<String>) -> Result<Self> {
        Self::with_config(ConsulConfig::new(address), RegistryOptions::default())
    }

    /// 使用完整配置创建注册器
    pub fn with_config(config: ConsulConfig, opts: RegistryOptions) -> Result<Self> {
        let client = ConsulClient::with_config(config)?;
        Ok(Self::with_client(Arc::new(client), opts))
    }

    /// 使用外部构建好的客户端创建注册器
    pub fn with_client(client: Arc<dyn ConsulApi>, opts: RegistryOptions) -> Self {
        Self {
            client,
            opts: RwLock::new(opts),
            heartbeat: Mutex::new(None),
        }
    }

    /// 替换后续注册使用的健康检查
    pub async fn customize_check(&self, check: Option<AgentServiceCheck>) {
        self.opts.write().await.check = check;
    }

    /// 替换后续注册使用的注册模板
    pub async fn customize_registration(&self, registration: AgentServiceRegistration) {
        self.opts.write().await.registration = Some(registration);
    }

    /// 计算服务在 Consul 中的 ID（`服务名:host:port`）
    pub fn service_id(info: &RegistryInfo) -> Result<String> {
        let (name, host, port) = resolve_endpoint(info)?;
        Ok(service_id(name, &host, port))
    }

    /// 当前正在上报的 TTL 检查 ID，没有运行中的心跳时返回 `None`
    ///
    /// 可用于运维排查：注册使用 TTL 检查后应为 `Some`，注销或改用其他检查后为 `None`
    pub async fn heartbeat_check_id(&self) -> Option<String> {
        self.heartbeat
            .lock()
            .await
            .as_ref()
            .map(|hb| hb.check_id().to_string())
    }

    /// 停止当前心跳（等待任务退出），再按需启动新的心跳
    ///
    /// 新任务只在旧任务退出之后启动，任意时刻最多一个心跳在运行
    async fn restart_heartbeat(&self, next: Option<(String, Duration)>) {
        let previous = self.heartbeat.lock().await.take();
        if let Some(previous) = previous {
            previous.stop().await;
        }

        if let Some((check_id, ttl)) = next {
            let heartbeat = TtlHeartbeat::spawn(self.client.clone(), check_id, ttl);
            // 并发注册时可能已有其他任务放入槽位
            let displaced = self.heartbeat.lock().await.replace(heartbeat);
            if let Some(displaced) = displaced {
                displaced.stop().await;
            }
        }
    }
}

/// 校验注册信息，返回 (服务名, host, port)
fn resolve_endpoint(info: &RegistryInfo) -> Result<(&str, String, u16)> {
    if info.service_name.is_empty() {
        return Err(ConsulError::validation("missing service name in consul register"));
    }
    let addr = info
        .addr
        .as_ref()
        .ok_or_else(|| ConsulError::validation("missing addr in consul register"))?;
    let (host, port) = parse_addr(addr)?;
    Ok((info.service_name.as_str(), host, port))
}

#[async_trait]
impl Registry for ConsulRegistry {
    async fn register(&self, info: &RegistryInfo) -> Result<()> {
        let (name, host, port) = resolve_endpoint(info)?;
        let id = service_id(name, &host, port);
        let tags = encode_tags(&info.tags)?;
        let weight = normalize_weight(info.weight) as i32;

        let (check, template) = {
            let opts = self.opts.read().await;
            (opts.check.clone(), opts.registration.clone())
        };

        let mut ttl = None;
        let check = match check {
            Some(mut check) if check.is_ttl() => {
                ttl = Some(parse_ttl(check.ttl.as_deref().unwrap_or_default())?);
                check.tcp = None;
                Some(check)
            }
            Some(mut check) => {
                if !check.has_target() {
                    check.tcp = Some(join_host_port(&host, port));
                }
                Some(check)
            }
            None => None,
        };
        let check_id = check.as_ref().and_then(|c| c.check_id.clone());

        let mut registration = template.unwrap_or_default();
        registration.id = Some(id.clone());
        registration.name = Some(name.to_string());
        registration.address = Some(host.clone());
        registration.port = Some(port);
        registration.tags.extend(tags);
        registration.weights = Some(AgentWeights {
            passing: weight,
            warning: weight,
        });
        registration.check = check;

        debug!(service_id = %id, registration = ?registration, "Registering service with Consul");
        self.client.service_register(&registration).await?;

        info!(
            service = %name,
            service_id = %id,
            address = %join_host_port(&host, port),
            weight = weight,
            "Service registered with Consul"
        );

        // 新记录覆盖了旧的检查，旧心跳无论如何都要停掉
        let next = ttl.map(|ttl| (check_id.unwrap_or_else(|| format!("service:{}", id)), ttl));
        self.restart_heartbeat(next).await;

        Ok(())
    }

    async fn deregister(&self, info: &RegistryInfo) -> Result<()> {
        let (name, host, port) = resolve_endpoint(info)?;
        let id = service_id(name, &host, port);

        // 注销失败时记录仍在 Consul 中，心跳需要继续
        self.client.service_deregister(&id).await?;
        self.restart_heartbeat(None).await;

        info!(service = %name, service_id = %id, "Service deregistered from Consul");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ServiceEntry;
    use crate::health::HealthStatus;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{OnceLock, Weak};

    /// 记录每次心跳时持有客户端的对象数量（注册器 + 测试 + 存活的心跳任务）
    #[derive(Default)]
    struct HolderCountingClient {
        me: OnceLock<Weak<HolderCountingClient>>,
        max_holders: AtomicUsize,
        updates: AtomicUsize,
    }

    #[async_trait]
    impl ConsulApi for HolderCountingClient {
        async fn service_register(&self, _registration: &AgentServiceRegistration) -> Result<()> {
            Ok(())
        }

        async fn service_deregister(&self, _service_id: &str) -> Result<()> {
            Ok(())
        }

        async fn update_ttl(&self, _check_id: &str, _output: &str, _status: HealthStatus) -> Result<()> {
            if let Some(me) = self.me.get().and_then(Weak::upgrade) {
                // 减去这里临时升级出的引用
                let holders = Arc::strong_count(&me) - 1;
                self.max_holders.fetch_max(holders, Ordering::SeqCst);
            }
            self.updates.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn health_service(&self, _service: &str, _passing_only: bool) -> Result<Vec<ServiceEntry>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_reregister_never_runs_two_heartbeats() {
        let client = Arc::new(HolderCountingClient::default());
        let _ = client.me.set(Arc::downgrade(&client));
        let registry = ConsulRegistry::with_client(
            client.clone(),
            RegistryOptions::default().with_check_spec(CheckSpec::ttl(Duration::from_secs(3))),
        );
        let info = RegistryInfo::new("product", "10.0.0.8:9999".parse().unwrap());

        registry.register(&info).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        registry.register(&info).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(client.updates.load(Ordering::SeqCst), 2);
        // 注册器、测试本身、唯一的心跳任务
        assert_eq!(client.max_holders.load(Ordering::SeqCst), 3);

        registry.deregister(&info).await.unwrap();
    }

    #[test]
    fn test_default_options_use_tcp_check() {
        let opts = RegistryOptions::default();
        let check = opts.check.unwrap();
        assert_eq!(check.interval.as_deref(), Some("5s"));
        assert!(!check.is_ttl());
        assert!(opts.registration.is_none());
    }

    #[test]
    fn test_service_id() {
        let info = RegistryInfo::new("product", "10.0.0.8:9999".parse().unwrap());
        assert_eq!(ConsulRegistry::service_id(&info).unwrap(), "product:10.0.0.8:9999");
    }

    #[test]
    fn test_resolve_endpoint_validation() {
        let missing_name = RegistryInfo::new("", "10.0.0.8:9999".parse().unwrap());
        assert!(matches!(
            resolve_endpoint(&missing_name),
            Err(ConsulError::Validation(_))
        ));

        let missing_addr = RegistryInfo {
            service_name: "product".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            resolve_endpoint(&missing_addr),
            Err(ConsulError::Validation(_))
        ));

        let zero_port = RegistryInfo::new("product", "10.0.0.8:0".parse().unwrap());
        assert!(matches!(
            resolve_endpoint(&zero_port),
            Err(ConsulError::Validation(_))
        ));
    }
}
