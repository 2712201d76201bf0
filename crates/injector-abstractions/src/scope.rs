//! 作用域抽象接口
//!
//! 作用域是一族缓存策略，以装饰器形式套在供给提供者之上。
//! 供给提供者每次调用都创建新实例，作用域提供者决定实例复用。

use crate::binding::Binding;
use crate::provider::{Instance, Provider};
use injector_common::ConfigurationError;
use std::sync::Arc;

/// 作用域提供者 trait
///
/// 包装一个供给提供者并持有实例缓存。缓存未命中时恰好调用一次
/// 被包装的提供者并发布结果；命中时直接返回缓存实例。
///
/// 不变量：作用域提供者永远不装饰另一个作用域提供者。
pub trait ScopedProvider: Provider {
    /// 所属作用域标识
    fn scope_id(&self) -> &str;

    /// 被装饰的供给提供者
    fn provisioning_provider(&self) -> &Arc<dyn Provider>;

    /// 当前缓存槽中的实例
    ///
    /// 缓存槽语义由作用域决定，例如单例作用域是注入器生命周期内的
    /// 唯一槽，线程作用域是调用线程各自的槽。
    fn cached_instance(&self) -> Option<Instance>;
}

/// 作用域工厂 trait
///
/// 按作用域标识注册到注入器，在绑定配置时为供给绑定生产
/// 作用域提供者。
pub trait ScopeFactory: Send + Sync {
    /// 工厂负责的作用域标识
    fn scope_id(&self) -> &str;

    /// 装饰给定的供给绑定
    ///
    /// 若供给绑定的提供者已经是作用域提供者，必须以
    /// [`ConfigurationError::NestedScope`] 拒绝。
    fn scoped_provider(&self, binding: &Binding) -> Result<Arc<dyn Provider>, ConfigurationError>;
}

/// 作用域工厂查询接口
///
/// 模块配置阶段通过它查找已注册的作用域工厂，由注入器实现。
/// 作用域工厂表在注入器整个生命周期内可变。
pub trait ScopeRegistry: Send + Sync {
    /// 按标识查找作用域工厂
    fn scope_factory(&self, scope_id: &str) -> Option<Arc<dyn ScopeFactory>>;
}
