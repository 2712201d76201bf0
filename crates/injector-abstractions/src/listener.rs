//! 供给事件监听抽象接口
//!
//! 每次成功创建实例后，注入器按注册顺序同步通知所有监听器。

use crate::provider::{Instance, Provider};
use injector_common::Key;
use std::sync::Arc;

/// 供给事件
///
/// 携带被解析的键、产生实例的提供者和实例本身。
#[derive(Clone)]
pub struct ProvisionEvent {
    key: Key,
    provider: Arc<dyn Provider>,
    instance: Instance,
}

impl ProvisionEvent {
    /// 创建供给事件
    pub fn new(key: Key, provider: Arc<dyn Provider>, instance: Instance) -> Self {
        Self {
            key,
            provider,
            instance,
        }
    }

    /// 被解析的键
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// 产生实例的提供者
    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// 类型擦除的实例
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// 以具体类型取出实例
    pub fn typed_instance<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.instance.clone().downcast::<T>().ok()
    }
}

impl std::fmt::Debug for ProvisionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisionEvent")
            .field("key", &self.key.to_string())
            .field("provider", &self.provider.kind())
            .finish()
    }
}

/// 供给事件监听器 trait
///
/// 通知在解析调用内同步执行，监听器失败会中断本次解析并向
/// 调用方传播。
pub trait ProvisionListener: Send + Sync {
    /// 实例创建后回调
    fn on_provision(
        &self,
        event: &ProvisionEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
