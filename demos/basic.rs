//! 注册并解析一个服务
//!
//! ```bash
//! CONSUL_HTTP_ADDR=127.0.0.1:8500 RUST_LOG=debug cargo run --example basic
//! ```

use std::time::Duration;

use anyhow::Result;
use flare_registry_consul::utils::parse_listen_addr;
use flare_registry_consul::{
    CheckSpec, ConsulConfig, ConsulRegistry, ConsulResolver, EndpointInfo, Registry, RegistryInfo,
    RegistryOptions, Resolver,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ConsulConfig::from_env();
    info!(address = %config.base_url(), "Using Consul agent");

    let opts = RegistryOptions::default().with_check_spec(CheckSpec::ttl(Duration::from_secs(10)));
    let registry = ConsulRegistry::with_config(config.clone(), opts)?;
    let resolver = ConsulResolver::with_config(config)?;

    let service = RegistryInfo::new("product", parse_listen_addr(":9999")?)
        .with_weight(777)
        .with_tag("group", "blue")
        .with_tag("idc", "hd1");
    registry.register(&service).await?;

    tokio::time::sleep(Duration::from_secs(1)).await;

    let desc = resolver.target(&EndpointInfo::new("product"));
    let result = resolver.resolve(&desc).await?;
    for instance in &result.instances {
        info!(
            network = %instance.network(),
            address = %instance.address(),
            weight = instance.weight(),
            tags = ?instance.tags(),
            "Resolved instance"
        );
    }

    tokio::signal::ctrl_c().await?;
    registry.deregister(&service).await?;
    Ok(())
}
