//! 绑定构建器
//!
//! 链式收集绑定参数：限定符、提供者策略、作用域。构建器是
//! 消耗型的，`into_binding` 冻结后不存在可变路径。

use crate::providers::{
    ClassProvider, DelegatingProvider, InstanceProvider, RemoteProvider, ResolvedDependencies,
    ServiceProvider,
};
use injector_abstractions::{Binding, Provider, ScopeRegistry};
use injector_common::{ConfigurationError, Key, ProvisionError, Qualifier, TypeInfo};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// 绑定构建器
///
/// 从 [`BindingBuilder::bind`] 开始，恰好以一个提供者选择调用
/// 结束（`to` / `instance` / `provider` / `service` / `on`）。
/// 在同一构建器上做第二次提供者选择会被拒绝而不是静默覆盖。
pub struct BindingBuilder<T: Send + Sync + 'static> {
    type_info: TypeInfo,
    qualifier: Option<Qualifier>,
    provider: Option<Arc<dyn Provider>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> BindingBuilder<T> {
    /// 为类型 `T` 开始一个新绑定
    pub fn bind() -> Self {
        Self {
            type_info: TypeInfo::of::<T>(),
            qualifier: None,
            provider: None,
            _marker: PhantomData,
        }
    }

    /// 附加命名限定符
    pub fn named(self, name: impl Into<String>) -> Self {
        self.with(Qualifier::named(name))
    }

    /// 附加限定符
    ///
    /// 省略限定符意味着"未限定"，它本身是一个独立有效的键空间。
    pub fn with(mut self, qualifier: Qualifier) -> Self {
        self.qualifier = Some(qualifier);
        self
    }

    /// 构建器当前对应的键
    pub fn key(&self) -> Key {
        Key::from_parts(self.type_info.clone(), self.qualifier.clone())
    }

    fn set_provider(mut self, provider: Arc<dyn Provider>) -> Result<Self, ConfigurationError> {
        if self.provider.is_some() {
            return Err(ConfigurationError::ProviderAlreadySet {
                key: self.key().to_string(),
            });
        }
        self.provider = Some(provider);
        Ok(self)
    }

    /// 选择类型构造提供者
    ///
    /// `dependencies` 是按构造参数顺序声明的依赖键，解析时通过
    /// 注入器递归解析后传给 `constructor`。
    pub fn to<F>(self, dependencies: Vec<Key>, constructor: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(ResolvedDependencies) -> Result<T, ProvisionError> + Send + Sync + 'static,
    {
        let provider = ClassProvider::new(dependencies, constructor);
        self.set_provider(Arc::new(provider))
    }

    /// 选择固定实例提供者
    pub fn instance(self, value: T) -> Result<Self, ConfigurationError> {
        self.set_provider(Arc::new(InstanceProvider::new(value)))
    }

    /// 选择固定实例提供者（已共享实例）
    pub fn instance_arc(self, value: Arc<T>) -> Result<Self, ConfigurationError> {
        self.set_provider(Arc::new(InstanceProvider::from_arc(value)))
    }

    /// 选择委托提供者
    pub fn provider<F>(self, factory: F) -> Result<Self, ConfigurationError>
    where
        F: Fn() -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.set_provider(Arc::new(DelegatingProvider::new(factory)))
    }

    /// 选择服务提供者，服务名默认为绑定类型名
    pub fn service(self) -> Result<Self, ConfigurationError> {
        let name = self.type_info.to_string();
        self.set_provider(Arc::new(ServiceProvider::new::<T>(name)))
    }

    /// 选择服务提供者，显式指定服务名
    pub fn service_named(self, name: impl Into<String>) -> Result<Self, ConfigurationError> {
        self.set_provider(Arc::new(ServiceProvider::new::<T>(name)))
    }

    /// 选择远程提供者
    pub fn on(self, target: &str) -> Result<Self, ConfigurationError> {
        let url = Url::parse(target).map_err(|_| ConfigurationError::InvalidRemoteTarget {
            key: self.key().to_string(),
            target: target.to_string(),
        })?;
        self.on_url(url)
    }

    /// 选择远程提供者（已解析地址）
    pub fn on_url(self, target: Url) -> Result<Self, ConfigurationError> {
        self.set_provider(Arc::new(RemoteProvider::new::<T>(target)))
    }

    /// 将当前提供者包装进指定作用域
    ///
    /// 前置条件：已做过提供者选择；作用域标识已注册；当前提供者
    /// 不是作用域提供者。违反任何一条都是配置错误。
    pub fn in_scope(
        self,
        scopes: &dyn ScopeRegistry,
        scope_id: &str,
    ) -> Result<Self, ConfigurationError> {
        let key = self.key();
        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| ConfigurationError::MissingProvider {
                key: key.to_string(),
            })?;

        if provider.as_scoped().is_some() {
            return Err(ConfigurationError::NestedScope {
                scope: scope_id.to_string(),
            });
        }

        let factory =
            scopes
                .scope_factory(scope_id)
                .ok_or_else(|| ConfigurationError::UnknownScope {
                    scope: scope_id.to_string(),
                })?;

        let provisioning = Binding::new(key.clone(), provider.clone());
        let scoped = factory.scoped_provider(&provisioning)?;
        debug!(key = %key, scope = scope_id, "绑定限定作用域");

        let mut builder = self;
        builder.provider = Some(scoped);
        Ok(builder)
    }

    /// 冻结为不可变绑定
    ///
    /// 构建器被消耗，冻结后不存在进一步可变操作。
    pub fn into_binding(self) -> Result<Binding, ConfigurationError> {
        let key = self.key();
        let provider = self
            .provider
            .ok_or_else(|| ConfigurationError::MissingProvider {
                key: key.to_string(),
            })?;
        Ok(Binding::new(key, provider))
    }
}

impl<T: Send + Sync + 'static> std::fmt::Debug for BindingBuilder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingBuilder")
            .field("key", &self.key().to_string())
            .field("provider", &self.provider.as_ref().map(|provider| provider.kind()))
            .finish()
    }
}
