//! 测试用的内存 Consul
//!
//! 只模拟注册器和解析器用到的四个接口：注册、注销、TTL 更新、健康查询

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use flare_registry_consul::client::{AgentService, AgentServiceRegistration, ServiceEntry};
use flare_registry_consul::{ConsulApi, ConsulError, HealthStatus, Result};

#[derive(Debug, Clone)]
struct Record {
    registration: AgentServiceRegistration,
    status: HealthStatus,
}

/// 内存中的 Consul agent
#[derive(Default)]
pub struct MemoryConsul {
    services: Mutex<BTreeMap<String, Record>>,
    ttl_updates: Mutex<Vec<String>>,
    calls: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemoryConsul {
    pub fn new() -> Self {
        Self::default()
    }

    /// 网络调用总次数
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// 已收到的 TTL 更新（检查 ID）
    pub fn ttl_updates(&self) -> Vec<String> {
        self.ttl_updates.lock().unwrap().clone()
    }

    pub fn registration(&self, id: &str) -> Option<AgentServiceRegistration> {
        self.services
            .lock()
            .unwrap()
            .get(id)
            .map(|r| r.registration.clone())
    }

    pub fn service_ids(&self) -> Vec<String> {
        self.services.lock().unwrap().keys().cloned().collect()
    }

    /// 模拟 agent 不可用，之后所有请求返回 500
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn enter(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ConsulError::backend(
                Some(500),
                "Unexpected response code: 500 (agent unavailable)",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ConsulApi for MemoryConsul {
    async fn service_register(&self, registration: &AgentServiceRegistration) -> Result<()> {
        self.enter()?;
        let id = registration
            .id
            .clone()
            .or_else(|| registration.name.clone())
            .unwrap_or_default();
        // TTL 检查在第一次上报之前处于 critical
        let status = match &registration.check {
            Some(check) if check.is_ttl() => HealthStatus::Critical,
            _ => HealthStatus::Passing,
        };
        self.services.lock().unwrap().insert(
            id,
            Record {
                registration: registration.clone(),
                status,
            },
        );
        Ok(())
    }

    async fn service_deregister(&self, service_id: &str) -> Result<()> {
        self.enter()?;
        self.services.lock().unwrap().remove(service_id);
        Ok(())
    }

    async fn update_ttl(&self, check_id: &str, _output: &str, status: HealthStatus) -> Result<()> {
        self.enter()?;
        self.ttl_updates.lock().unwrap().push(check_id.to_string());

        let mut services = self.services.lock().unwrap();
        for (id, record) in services.iter_mut() {
            let configured = record
                .registration
                .check
                .as_ref()
                .and_then(|c| c.check_id.clone())
                .unwrap_or_else(|| format!("service:{}", id));
            if configured == check_id {
                record.status = status;
                return Ok(());
            }
        }
        Err(ConsulError::backend(
            Some(404),
            format!("Unexpected response code: 404 (Unknown check ID \"{}\")", check_id),
        ))
    }

    async fn health_service(&self, service: &str, passing_only: bool) -> Result<Vec<ServiceEntry>> {
        self.enter()?;
        let services = self.services.lock().unwrap();
        Ok(services
            .values()
            .filter(|r| r.registration.name.as_deref() == Some(service))
            .filter(|r| !passing_only || r.status == HealthStatus::Passing)
            .map(|r| {
                let reg = &r.registration;
                ServiceEntry {
                    service: Some(AgentService {
                        id: reg.id.clone().unwrap_or_default(),
                        service: service.to_string(),
                        tags: reg.tags.clone(),
                        meta: reg.meta.clone(),
                        address: reg.address.clone().unwrap_or_default(),
                        port: reg.port.unwrap_or_default(),
                        weights: reg.weights.unwrap_or_default(),
                    }),
                    ..Default::default()
                }
            })
            .collect())
    }
}
