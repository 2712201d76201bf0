//! 配置模块抽象接口
//!
//! 模块是一组有序绑定的贡献单元，在注入器配置阶段调用一次，
//! 之后无状态。

use crate::binding::Binding;
use crate::scope::ScopeRegistry;
use injector_common::ConfigurationError;

/// 配置模块 trait
///
/// 注入器配置时先调用 [`Module::configure`] 生命周期钩子，
/// 再通过 [`Module::bindings`] 收集贡献的绑定。
pub trait Module: Send + Sync {
    /// 模块名称，用于配置失败诊断
    fn name(&self) -> &str;

    /// 配置钩子
    ///
    /// `scopes` 是发起配置的注入器的作用域工厂视图，模块可据此
    /// 将绑定包装进某个作用域。
    fn configure(&mut self, scopes: &dyn ScopeRegistry) -> Result<(), ConfigurationError>;

    /// 本模块贡献的绑定，按声明顺序
    fn bindings(&self) -> Vec<Binding>;
}

/// 闭包模块
///
/// 以闭包表达配置逻辑的便捷模块实现。
pub struct LambdaModule<F>
where
    F: Fn(&dyn ScopeRegistry) -> Result<Vec<Binding>, ConfigurationError> + Send + Sync,
{
    name: String,
    configure_fn: F,
    bindings: Vec<Binding>,
}

impl<F> LambdaModule<F>
where
    F: Fn(&dyn ScopeRegistry) -> Result<Vec<Binding>, ConfigurationError> + Send + Sync,
{
    /// 创建闭包模块
    pub fn new(name: impl Into<String>, configure_fn: F) -> Self {
        Self {
            name: name.into(),
            configure_fn,
            bindings: Vec::new(),
        }
    }
}

impl<F> Module for LambdaModule<F>
where
    F: Fn(&dyn ScopeRegistry) -> Result<Vec<Binding>, ConfigurationError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn configure(&mut self, scopes: &dyn ScopeRegistry) -> Result<(), ConfigurationError> {
        self.bindings = (self.configure_fn)(scopes)?;
        tracing::debug!(module = %self.name, count = self.bindings.len(), "模块配置完成");
        Ok(())
    }

    fn bindings(&self) -> Vec<Binding> {
        self.bindings.clone()
    }
}
