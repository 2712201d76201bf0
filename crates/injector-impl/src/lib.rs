//! # 注入器运行时实现
//!
//! 提供绑定表、作用域工厂表、监听器注册与按键解析的中心运行时
//! 对象 [`Injector`]，以及绑定构建器和提供者策略实现。
//!
//! ## 生命周期
//!
//! 空构造 → [`Injector::configure`] 恰好调用一次 → 绑定表冻结，
//! 之后可被任意多个并发调用方只读共享。作用域工厂表和监听器
//! 集合在整个生命周期内保持可变，且对并发解析安全。

pub mod builder;
pub mod providers;
pub mod scopes;

pub use builder::BindingBuilder;
pub use providers::{
    ClassProvider, ConstructorFn, DelegatingProvider, InstanceProvider, RemoteProvider,
    ResolvedDependencies, ServiceProvider,
};
pub use scopes::{
    SingletonScopeFactory, ThreadScopeFactory, SINGLETON_SCOPE, THREAD_SCOPE,
};

use dashmap::DashMap;
use injector_abstractions::{
    Binding, Instance, InstanceResolver, Module, Provider, ProvisionEvent, ProvisionListener,
    ResolveContext, ScopeFactory, ScopeRegistry,
};
use injector_common::{
    diagnostics, BindingDescriptor, ConfigurationError, Key, ProvisionError, UsageError,
};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

/// 服务工厂函数类型
pub type ServiceFactoryFn = Arc<dyn Fn() -> anyhow::Result<Instance> + Send + Sync>;

/// 远程加载器函数类型
pub type RemoteLoaderFn = Arc<dyn Fn(&Url) -> anyhow::Result<Instance> + Send + Sync>;

/// 注入器
///
/// 绑定配置、实例创建与供给事件的中心对象。配置完成后绑定表
/// 只读，解析不加锁。
pub struct Injector {
    /// 注入器实例标识，用于日志
    id: Uuid,
    /// 绑定表，配置时一次性发布
    bindings: OnceCell<HashMap<Key, Binding>>,
    /// 作用域工厂表，按作用域标识索引
    scope_factories: DashMap<String, Arc<dyn ScopeFactory>>,
    /// 供给事件监听器，按注册顺序通知
    listeners: RwLock<Vec<Arc<dyn ProvisionListener>>>,
    /// 服务注册表，名称到工厂
    services: DashMap<String, ServiceFactoryFn>,
    /// 远程加载器表，URL 协议到加载器
    remote_loaders: DashMap<String, RemoteLoaderFn>,
}

impl Injector {
    /// 创建未配置的注入器
    ///
    /// 内置的 `singleton` 和 `thread` 作用域工厂已预注册。
    pub fn new() -> Self {
        let injector = Self {
            id: Uuid::new_v4(),
            bindings: OnceCell::new(),
            scope_factories: DashMap::new(),
            listeners: RwLock::new(Vec::new()),
            services: DashMap::new(),
            remote_loaders: DashMap::new(),
        };
        injector.bind_scope_factory(Arc::new(SingletonScopeFactory));
        injector.bind_scope_factory(Arc::new(ThreadScopeFactory));
        debug!(injector = %injector.id, "创建注入器");
        injector
    }

    /// 从模块配置注入器绑定
    ///
    /// 对每个模块先调用其 `configure` 钩子，再收集贡献的绑定。
    /// 跨全部模块的重复键立即失败。配置是一次性的：对已配置的
    /// 注入器再次调用以 [`ConfigurationError::AlreadyConfigured`]
    /// 失败，原有绑定保持不变。配置失败不会发布部分绑定表。
    pub fn configure(&self, modules: &mut [Box<dyn Module>]) -> Result<(), ConfigurationError> {
        if self.bindings.get().is_some() {
            return Err(ConfigurationError::AlreadyConfigured);
        }

        let mut table = HashMap::new();
        for module in modules.iter_mut() {
            info!(injector = %self.id, module = module.name(), "配置模块");
            module.configure(self)?;

            for binding in module.bindings() {
                if table.contains_key(binding.key()) {
                    return Err(ConfigurationError::DuplicateBinding {
                        key: binding.key().to_string(),
                    });
                }
                debug!(key = %binding.key(), "注册绑定");
                table.insert(binding.key().clone(), binding);
            }
        }

        check_dependency_cycles(&table)?;

        let count = table.len();
        self.bindings
            .set(table)
            .map_err(|_| ConfigurationError::AlreadyConfigured)?;
        info!(injector = %self.id, bindings = count, "注入器配置完成");
        Ok(())
    }

    /// 注入器是否已配置
    pub fn is_configured(&self) -> bool {
        self.bindings.get().is_some()
    }

    fn binding_table(&self) -> Result<&HashMap<Key, Binding>, ProvisionError> {
        self.bindings
            .get()
            .ok_or_else(|| UsageError::NotConfigured.into())
    }

    /// 按未限定键获取实例
    pub fn get_instance<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ProvisionError> {
        self.get_instance_by_key(&Key::of::<T>())
    }

    /// 按命名限定键获取实例
    pub fn get_instance_named<T: Send + Sync + 'static>(
        &self,
        name: impl Into<String>,
    ) -> Result<Arc<T>, ProvisionError> {
        self.get_instance_by_key(&Key::named::<T>(name))
    }

    /// 按键获取实例
    ///
    /// 取决于绑定声明，返回的实例可能是新创建的，也可能来自某个
    /// 作用域缓存。请求的键必须存在绑定，否则以携带类型和限定符
    /// 的供给错误失败。
    pub fn get_instance_by_key<T: Send + Sync + 'static>(
        &self,
        key: &Key,
    ) -> Result<Arc<T>, ProvisionError> {
        let instance = self.resolve_key(key, &mut ResolveContext::new())?;
        instance
            .downcast::<T>()
            .map_err(|_| ProvisionError::TypeMismatch {
                key: key.to_string(),
                expected: std::any::type_name::<T>().to_string(),
            })
    }

    /// 按未限定键获取原始提供者，不触发实例化
    pub fn get_provider<T: Send + Sync + 'static>(
        &self,
    ) -> Result<Arc<dyn Provider>, ProvisionError> {
        self.get_provider_by_key(&Key::of::<T>())
    }

    /// 按键获取原始提供者，不触发实例化
    pub fn get_provider_by_key(&self, key: &Key) -> Result<Arc<dyn Provider>, ProvisionError> {
        let bindings = self.binding_table()?;
        bindings
            .get(key)
            .map(|binding| binding.provider().clone())
            .ok_or_else(|| ProvisionError::NoBinding {
                key: key.to_string(),
            })
    }

    /// 获取类型化的延迟提供者
    ///
    /// 绑定存在性在此验证，实例化推迟到 [`TypedProvider::get`]。
    pub fn typed_provider<T: Send + Sync + 'static>(
        self: &Arc<Self>,
    ) -> Result<TypedProvider<T>, ProvisionError> {
        self.typed_provider_by_key(&Key::of::<T>())
    }

    /// 按键获取类型化的延迟提供者
    pub fn typed_provider_by_key<T: Send + Sync + 'static>(
        self: &Arc<Self>,
        key: &Key,
    ) -> Result<TypedProvider<T>, ProvisionError> {
        self.get_provider_by_key(key)?;
        Ok(TypedProvider {
            injector: Arc::clone(self),
            key: key.clone(),
            _marker: PhantomData,
        })
    }

    /// 是否存在指定类型的未限定绑定
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.contains_key(&Key::of::<T>())
    }

    /// 是否存在指定键的绑定
    pub fn contains_key(&self, key: &Key) -> bool {
        self.bindings
            .get()
            .is_some_and(|table| table.contains_key(key))
    }

    /// 已注册绑定数量
    pub fn binding_count(&self) -> usize {
        self.bindings.get().map_or(0, HashMap::len)
    }

    /// 全部绑定的只读描述符
    pub fn binding_descriptors(&self) -> Vec<BindingDescriptor> {
        self.bindings.get().map_or_else(Vec::new, |table| {
            table.values().map(Binding::descriptor).collect()
        })
    }

    /// 注册作用域工厂，按其作用域标识索引
    ///
    /// 作用域工厂表与冻结的绑定表正交，配置完成后注册仍被允许。
    pub fn bind_scope_factory(&self, factory: Arc<dyn ScopeFactory>) {
        let scope_id = factory.scope_id().to_string();
        debug!(injector = %self.id, scope = %scope_id, "注册作用域工厂");
        self.scope_factories.insert(scope_id, factory);
    }

    /// 注册供给事件监听器
    pub fn bind_listener(&self, listener: Arc<dyn ProvisionListener>) {
        self.listeners.write().push(listener);
    }

    /// 注销供给事件监听器，按指针标识匹配
    pub fn unbind_listener(&self, listener: &Arc<dyn ProvisionListener>) {
        self.listeners
            .write()
            .retain(|registered| !Arc::ptr_eq(registered, listener));
    }

    /// 同步通知所有监听器
    ///
    /// 通知使用触发时刻的监听器快照，解析期间并发的注册或注销
    /// 不会让监听器收到部分或重复通知。监听器失败向调用方传播。
    pub fn fire_event(&self, event: &ProvisionEvent) -> Result<(), ProvisionError> {
        let snapshot: Vec<_> = self.listeners.read().clone();
        for listener in snapshot {
            listener
                .on_provision(event)
                .map_err(|source| ProvisionError::ListenerFailed {
                    key: event.key().to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    /// 注册服务工厂
    ///
    /// 显式的名称到工厂注册表，在启动期填充，替代环境级服务发现。
    pub fn register_service<T, F>(&self, name: impl Into<String>, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn() -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let name = name.into();
        info!(injector = %self.id, service = %name, "注册服务工厂");
        self.services.insert(
            name,
            Arc::new(move || factory().map(|value| Arc::new(value) as Instance)),
        );
    }

    /// 注册远程加载器，按 URL 协议索引
    pub fn register_remote_loader<F>(&self, scheme: impl Into<String>, loader: F)
    where
        F: Fn(&Url) -> anyhow::Result<Instance> + Send + Sync + 'static,
    {
        let scheme = scheme.into();
        info!(injector = %self.id, scheme = %scheme, "注册远程加载器");
        self.remote_loaders.insert(scheme, Arc::new(loader));
    }
}

impl Default for Injector {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeRegistry for Injector {
    fn scope_factory(&self, scope_id: &str) -> Option<Arc<dyn ScopeFactory>> {
        self.scope_factories
            .get(scope_id)
            .map(|entry| entry.value().clone())
    }
}

impl InstanceResolver for Injector {
    fn resolve_key(&self, key: &Key, ctx: &mut ResolveContext)
        -> Result<Instance, ProvisionError> {
        let bindings = self.binding_table()?;
        let binding = bindings.get(key).ok_or_else(|| {
            warn!(injector = %self.id, key = %key, "请求的键没有绑定");
            ProvisionError::NoBinding {
                key: key.to_string(),
            }
        })?;

        ctx.push_key(key)?;
        let provider = binding.provider();
        // 作用域命中返回缓存实例，没有发生创建，不触发供给事件。
        // 命中与否由作用域提供者持锁写到解析上下文上；嵌套解析也会
        // 改写标记，所以只对作用域提供者读取它。
        ctx.set_from_cache(false);
        let result = provider.provide(self, ctx);
        let cache_hit = provider.as_scoped().is_some() && ctx.from_cache();
        ctx.pop_key();

        let instance = result.map_err(|error| {
            warn!(
                injector = %self.id,
                key = %key,
                error = %diagnostics::error_trace(&error),
                "实例供给失败"
            );
            error
        })?;

        if !cache_hit {
            self.fire_event(&ProvisionEvent::new(
                key.clone(),
                provider.clone(),
                instance.clone(),
            ))?;
        }
        Ok(instance)
    }

    fn service_instance(&self, name: &str) -> Result<Instance, ProvisionError> {
        let factory = self
            .services
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ProvisionError::ServiceNotRegistered {
                name: name.to_string(),
            })?;

        factory().map_err(|error| ProvisionError::CreationFailed {
            key: name.to_string(),
            source: error.into(),
        })
    }

    fn remote_instance(&self, target: &Url) -> Result<Instance, ProvisionError> {
        let loader = self
            .remote_loaders
            .get(target.scheme())
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ProvisionError::RemoteLoaderNotRegistered {
                scheme: target.scheme().to_string(),
            })?;

        loader(target).map_err(|error| ProvisionError::CreationFailed {
            key: target.to_string(),
            source: error.into(),
        })
    }
}

#[derive(Clone, Copy, PartialEq)]
enum VisitMark {
    InProgress,
    Done,
}

/// 检查绑定图的声明依赖是否存在循环
///
/// 类型构造提供者在绑定时静态声明依赖键，据此在配置时深度优先
/// 遍历整张绑定图。配置时拒绝循环使得无论作用域和线程交错如何，
/// 解析都不可能沿循环图递归或互相等锁。不在表中的依赖键不算边，
/// 留给解析时报告缺失绑定。
fn check_dependency_cycles(table: &HashMap<Key, Binding>) -> Result<(), ConfigurationError> {
    let mut marks = HashMap::new();
    let mut chain = Vec::new();
    for key in table.keys() {
        visit_binding(key, table, &mut marks, &mut chain)?;
    }
    Ok(())
}

fn visit_binding(
    key: &Key,
    table: &HashMap<Key, Binding>,
    marks: &mut HashMap<Key, VisitMark>,
    chain: &mut Vec<Key>,
) -> Result<(), ConfigurationError> {
    match marks.get(key).copied() {
        Some(VisitMark::Done) => return Ok(()),
        Some(VisitMark::InProgress) => {
            chain.push(key.clone());
            return Err(ConfigurationError::DependencyCycle {
                dependency_chain: diagnostics::dependency_chain(chain),
            });
        }
        None => {}
    }

    let binding = match table.get(key) {
        Some(binding) => binding,
        None => return Ok(()),
    };

    marks.insert(key.clone(), VisitMark::InProgress);
    chain.push(key.clone());
    for dependency in binding.provider().dependency_keys() {
        visit_binding(dependency, table, marks, chain)?;
    }
    chain.pop();
    marks.insert(key.clone(), VisitMark::Done);
    Ok(())
}

/// 类型化的延迟提供者
///
/// 持有注入器和键，允许调用方推迟实例化时机。
pub struct TypedProvider<T: Send + Sync + 'static> {
    injector: Arc<Injector>,
    key: Key,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> TypedProvider<T> {
    /// 解析实例
    pub fn get(&self) -> Result<Arc<T>, ProvisionError> {
        self.injector.get_instance_by_key::<T>(&self.key)
    }

    /// 提供者对应的键
    pub fn key(&self) -> &Key {
        &self.key
    }
}

impl<T: Send + Sync + 'static> Clone for TypedProvider<T> {
    fn clone(&self) -> Self {
        Self {
            injector: Arc::clone(&self.injector),
            key: self.key.clone(),
            _marker: PhantomData,
        }
    }
}
