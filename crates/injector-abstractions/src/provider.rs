//! 实例提供者抽象接口
//!
//! 提供者是一个零参数工厂能力："在不额外输入的情况下生产一个实例"。

use crate::resolver::{InstanceResolver, ResolveContext};
use crate::scope::ScopedProvider;
use injector_common::{Key, ProvisionError};
use std::any::Any;
use std::sync::Arc;

/// 类型擦除的实例
///
/// 绑定表内部统一以 `Arc<dyn Any>` 传递实例，类型化表面在解析出口
/// 通过 downcast 还原具体类型。
pub type Instance = Arc<dyn Any + Send + Sync>;

/// 实例提供者 trait
///
/// 每个绑定恰好激活一种提供者策略。供给型提供者每次调用都创建
/// 新实例；作用域提供者作为装饰器在其上增加缓存。
pub trait Provider: Send + Sync {
    /// 生产一个实例
    ///
    /// `resolver` 用于递归解析依赖，`ctx` 携带当前解析链，
    /// 用于循环依赖检测。
    fn provide(
        &self,
        resolver: &dyn InstanceResolver,
        ctx: &mut ResolveContext,
    ) -> Result<Instance, ProvisionError>;

    /// 提供者种类标识
    fn kind(&self) -> &'static str;

    /// 本提供者静态声明的依赖键
    ///
    /// 类型构造提供者返回其有序依赖列表，作用域提供者转发被包装
    /// 提供者的声明，其余策略没有静态依赖。注入器在配置时据此
    /// 检查绑定图中的循环。
    fn dependency_keys(&self) -> &[Key] {
        &[]
    }

    /// 若本提供者是作用域装饰器，返回其作用域视图
    ///
    /// 用于禁止作用域嵌套：任何试图装饰一个已返回 `Some` 的
    /// 提供者的作用域工厂都必须拒绝。
    fn as_scoped(&self) -> Option<&dyn ScopedProvider> {
        None
    }
}
