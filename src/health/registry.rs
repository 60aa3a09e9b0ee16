//! 探针注册表
//!
//! 进程启动时构建的固定探针集合，名称唯一。

use crate::client::BinderClient;
use crate::config::Config;
use crate::error::{ConfigError, Result};
use crate::health::build::BuildProbe;
use crate::health::deploy::DeployProbe;
use crate::health::probe::Probe;
use std::sync::Arc;

/// 探针注册表
#[derive(Clone, Default)]
pub struct ProbeRegistry {
    probes: Vec<Arc<dyn Probe>>,
}

impl ProbeRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册探针，名称重复时报错
    pub fn register(&mut self, probe: Arc<dyn Probe>) -> std::result::Result<(), ConfigError> {
        if self.contains(probe.name()) {
            return Err(ConfigError::DuplicateProbe {
                name: probe.name().to_string(),
            });
        }
        self.probes.push(probe);
        Ok(())
    }

    /// 链式注册
    pub fn with_probe(mut self, probe: Arc<dyn Probe>) -> std::result::Result<Self, ConfigError> {
        self.register(probe)?;
        Ok(self)
    }

    /// 构建标准探针集合：部署探针和构建探针
    ///
    /// # 参数
    /// * `config` - 代理配置
    pub fn standard(config: &Config) -> Result<Self> {
        let timeout = config.probes.request_timeout();
        let deploy_client = Arc::new(BinderClient::new(
            &config.deploy,
            config.api_key.clone(),
            timeout,
        )?);
        let build_client = Arc::new(BinderClient::new(
            &config.build,
            config.api_key.clone(),
            timeout,
        )?);

        let registry = Self::new()
            .with_probe(Arc::new(DeployProbe::from_config(
                deploy_client,
                &config.probes,
            )))?
            .with_probe(Arc::new(BuildProbe::from_config(
                build_client,
                &config.probes,
            )))?;

        Ok(registry)
    }

    /// 是否已注册该名称
    pub fn contains(&self, name: &str) -> bool {
        self.probes.iter().any(|p| p.name() == name)
    }

    /// 全部探针名称
    pub fn names(&self) -> Vec<&str> {
        self.probes.iter().map(|p| p.name()).collect()
    }

    /// 全部探针
    pub fn probes(&self) -> &[Arc<dyn Probe>] {
        &self.probes
    }

    /// 探针数量
    pub fn len(&self) -> usize {
        self.probes.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }
}

impl std::fmt::Debug for ProbeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeRegistry")
            .field("probes", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use crate::health::result::Outcome;
    use async_trait::async_trait;

    struct NamedProbe(&'static str);

    #[async_trait]
    impl Probe for NamedProbe {
        fn name(&self) -> &str {
            self.0
        }

        async fn execute(&self) -> std::result::Result<Outcome, ProbeError> {
            Ok(Outcome::Pass)
        }
    }

    #[test]
    fn test_standard_registry() {
        let registry = ProbeRegistry::standard(&Config::default()).unwrap();
        assert_eq!(registry.names(), vec!["deploy", "build"]);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = ProbeRegistry::new();
        registry.register(Arc::new(NamedProbe("a"))).unwrap();

        let err = registry.register(Arc::new(NamedProbe("a"))).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateProbe { ref name } if name == "a"));
        assert_eq!(registry.len(), 1);
    }
}
