//! 作用域工厂实现
//!
//! 内置两族作用域：单例（注入器生命周期内唯一缓存槽）和线程
//! （每个调用线程各自一个缓存槽）。两者都保证并发首次访问下
//! 每槽至多创建一次。

use dashmap::DashMap;
use injector_abstractions::{
    Binding, Instance, InstanceResolver, Provider, ResolveContext, ScopeFactory, ScopedProvider,
};
use injector_common::{ConfigurationError, Key, ProvisionError};
use parking_lot::RwLock;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::debug;

/// 单例作用域标识
pub const SINGLETON_SCOPE: &str = "singleton";

/// 线程作用域标识
pub const THREAD_SCOPE: &str = "thread";

fn reject_nested(binding: &Binding, scope: &str) -> Result<(), ConfigurationError> {
    if binding.provider().as_scoped().is_some() {
        return Err(ConfigurationError::NestedScope {
            scope: scope.to_string(),
        });
    }
    Ok(())
}

/// 单例作用域工厂
pub struct SingletonScopeFactory;

impl ScopeFactory for SingletonScopeFactory {
    fn scope_id(&self) -> &str {
        SINGLETON_SCOPE
    }

    fn scoped_provider(&self, binding: &Binding) -> Result<Arc<dyn Provider>, ConfigurationError> {
        reject_nested(binding, SINGLETON_SCOPE)?;
        Ok(Arc::new(SingletonProvider {
            key: binding.key().clone(),
            provisioning: binding.provider().clone(),
            cache: RwLock::new(None),
        }))
    }
}

/// 单例作用域提供者
///
/// 双重检查的唯一缓存槽：读锁快路径命中缓存；未命中时持有写锁
/// 调用供给提供者，竞争首次解析的线程观察到同一个实例，供给
/// 提供者至多被调用一次。
pub struct SingletonProvider {
    key: Key,
    provisioning: Arc<dyn Provider>,
    cache: RwLock<Option<Instance>>,
}

impl Provider for SingletonProvider {
    fn provide(
        &self,
        resolver: &dyn InstanceResolver,
        ctx: &mut ResolveContext,
    ) -> Result<Instance, ProvisionError> {
        if let Some(instance) = self.cache.read().clone() {
            ctx.set_from_cache(true);
            debug!(key = %self.key, scope = SINGLETON_SCOPE, "作用域缓存命中");
            return Ok(instance);
        }

        let mut slot = self.cache.write();
        if let Some(instance) = slot.clone() {
            // 在等待写锁期间由竞争线程发布，对本线程是缓存命中
            ctx.set_from_cache(true);
            return Ok(instance);
        }

        let instance = self.provisioning.provide(resolver, ctx)?;
        *slot = Some(instance.clone());
        // 供给期间的嵌套解析可能改写过标记，创建方最后写 false
        ctx.set_from_cache(false);
        debug!(key = %self.key, scope = SINGLETON_SCOPE, "作用域缓存发布");
        Ok(instance)
    }

    fn kind(&self) -> &'static str {
        "scoped"
    }

    fn dependency_keys(&self) -> &[Key] {
        self.provisioning.dependency_keys()
    }

    fn as_scoped(&self) -> Option<&dyn ScopedProvider> {
        Some(self)
    }
}

impl ScopedProvider for SingletonProvider {
    fn scope_id(&self) -> &str {
        SINGLETON_SCOPE
    }

    fn provisioning_provider(&self) -> &Arc<dyn Provider> {
        &self.provisioning
    }

    fn cached_instance(&self) -> Option<Instance> {
        self.cache.read().clone()
    }
}

/// 线程作用域工厂
pub struct ThreadScopeFactory;

impl ScopeFactory for ThreadScopeFactory {
    fn scope_id(&self) -> &str {
        THREAD_SCOPE
    }

    fn scoped_provider(&self, binding: &Binding) -> Result<Arc<dyn Provider>, ConfigurationError> {
        reject_nested(binding, THREAD_SCOPE)?;
        Ok(Arc::new(ThreadScopedProvider {
            key: binding.key().clone(),
            provisioning: binding.provider().clone(),
            cache: DashMap::new(),
        }))
    }
}

/// 线程作用域提供者
///
/// 每个调用线程一个缓存槽。槽的生存期由外部边界决定，本引擎只
/// 维护缓存契约。
pub struct ThreadScopedProvider {
    key: Key,
    provisioning: Arc<dyn Provider>,
    cache: DashMap<ThreadId, Instance>,
}

impl Provider for ThreadScopedProvider {
    fn provide(
        &self,
        resolver: &dyn InstanceResolver,
        ctx: &mut ResolveContext,
    ) -> Result<Instance, ProvisionError> {
        let thread_id = thread::current().id();

        // 槽只被所属线程填充，entry 占位即保证至多创建一次
        match self.cache.entry(thread_id) {
            dashmap::mapref::entry::Entry::Occupied(entry) => {
                ctx.set_from_cache(true);
                debug!(key = %self.key, scope = THREAD_SCOPE, "作用域缓存命中");
                Ok(entry.get().clone())
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                let instance = self.provisioning.provide(resolver, ctx)?;
                entry.insert(instance.clone());
                ctx.set_from_cache(false);
                debug!(key = %self.key, scope = THREAD_SCOPE, "作用域缓存发布");
                Ok(instance)
            }
        }
    }

    fn kind(&self) -> &'static str {
        "scoped"
    }

    fn dependency_keys(&self) -> &[Key] {
        self.provisioning.dependency_keys()
    }

    fn as_scoped(&self) -> Option<&dyn ScopedProvider> {
        Some(self)
    }
}

impl ScopedProvider for ThreadScopedProvider {
    fn scope_id(&self) -> &str {
        THREAD_SCOPE
    }

    fn provisioning_provider(&self) -> &Arc<dyn Provider> {
        &self.provisioning
    }

    fn cached_instance(&self) -> Option<Instance> {
        self.cache
            .get(&thread::current().id())
            .map(|entry| entry.value().clone())
    }
}
