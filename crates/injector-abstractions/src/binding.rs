//! 绑定定义
//!
//! 绑定是实例键到实例提供者的映射，注入器配置完成后不可变。

use crate::provider::Provider;
use chrono::{DateTime, Utc};
use injector_common::{BindingDescriptor, Key};
use std::sync::Arc;

/// 绑定
///
/// 键与提供者的配对，每个注册目标一条。克隆是浅拷贝，
/// 提供者以 `Arc` 共享。
#[derive(Clone)]
pub struct Binding {
    key: Key,
    provider: Arc<dyn Provider>,
    registered_at: DateTime<Utc>,
}

impl Binding {
    /// 创建新绑定
    pub fn new(key: Key, provider: Arc<dyn Provider>) -> Self {
        Self {
            key,
            provider,
            registered_at: Utc::now(),
        }
    }

    /// 绑定的实例键
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// 绑定的提供者
    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// 生成只读描述符
    ///
    /// 作用域绑定报告被装饰的供给提供者种类以及作用域标识。
    pub fn descriptor(&self) -> BindingDescriptor {
        let (provider_kind, scope) = match self.provider.as_scoped() {
            Some(scoped) => (
                scoped.provisioning_provider().kind().to_string(),
                Some(scoped.scope_id().to_string()),
            ),
            None => (self.provider.kind().to_string(), None),
        };

        BindingDescriptor {
            key: self.key.to_string(),
            provider_kind,
            scope,
            registered_at: self.registered_at,
        }
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("key", &self.key.to_string())
            .field("provider", &self.provider.kind())
            .field("registered_at", &self.registered_at)
            .finish()
    }
}
