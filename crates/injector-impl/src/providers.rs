//! 提供者策略实现
//!
//! 每个绑定恰好激活其中一种：固定实例、依赖描述符构造、
//! 委托工厂、服务注册表查找、远程加载。

use injector_abstractions::{Instance, InstanceResolver, Provider, ResolveContext};
use injector_common::{Key, ProvisionError, TypeInfo};
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// 固定实例提供者
///
/// 始终返回绑定时给定的同一个实例，绑定之后不再发生构造。
pub struct InstanceProvider {
    type_info: TypeInfo,
    instance: Instance,
}

impl InstanceProvider {
    /// 从值创建固定实例提供者
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self {
            type_info: TypeInfo::of::<T>(),
            instance: Arc::new(value),
        }
    }

    /// 从已共享的实例创建固定实例提供者
    pub fn from_arc<T: Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self {
            type_info: TypeInfo::of::<T>(),
            instance: value,
        }
    }

    /// 提供者持有的类型信息
    pub fn type_info(&self) -> &TypeInfo {
        &self.type_info
    }
}

impl Provider for InstanceProvider {
    fn provide(
        &self,
        _resolver: &dyn InstanceResolver,
        _ctx: &mut ResolveContext,
    ) -> Result<Instance, ProvisionError> {
        Ok(self.instance.clone())
    }

    fn kind(&self) -> &'static str {
        "instance"
    }
}

/// 已解析的构造依赖
///
/// 按绑定时声明的顺序携带依赖实例，构造闭包以下标和具体类型取用。
pub struct ResolvedDependencies {
    keys: Vec<Key>,
    instances: Vec<Instance>,
}

impl ResolvedDependencies {
    /// 以具体类型取出第 `index` 个依赖
    pub fn get<T: Send + Sync + 'static>(&self, index: usize) -> Result<Arc<T>, ProvisionError> {
        let instance = self
            .instances
            .get(index)
            .ok_or_else(|| ProvisionError::TypeMismatch {
                key: format!("依赖下标越界: {index}"),
                expected: std::any::type_name::<T>().to_string(),
            })?;

        instance
            .clone()
            .downcast::<T>()
            .map_err(|_| ProvisionError::TypeMismatch {
                key: self.keys[index].to_string(),
                expected: std::any::type_name::<T>().to_string(),
            })
    }

    /// 依赖数量
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// 是否没有依赖
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// 构造闭包类型
pub type ConstructorFn =
    Arc<dyn Fn(ResolvedDependencies) -> Result<Instance, ProvisionError> + Send + Sync>;

/// 类型构造提供者
///
/// 携带显式有序的依赖键列表和构造闭包。每次供给先深度优先解析
/// 全部依赖，再调用构造闭包，等价于原始的反射构造但依赖在绑定时
/// 静态声明。
pub struct ClassProvider {
    type_info: TypeInfo,
    dependencies: Vec<Key>,
    constructor: ConstructorFn,
}

impl ClassProvider {
    /// 创建类型构造提供者
    pub fn new<T, F>(dependencies: Vec<Key>, constructor: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(ResolvedDependencies) -> Result<T, ProvisionError> + Send + Sync + 'static,
    {
        Self {
            type_info: TypeInfo::of::<T>(),
            dependencies,
            constructor: Arc::new(move |deps| {
                constructor(deps).map(|value| Arc::new(value) as Instance)
            }),
        }
    }

    /// 声明的依赖键
    pub fn dependencies(&self) -> &[Key] {
        &self.dependencies
    }
}

impl Provider for ClassProvider {
    fn provide(
        &self,
        resolver: &dyn InstanceResolver,
        ctx: &mut ResolveContext,
    ) -> Result<Instance, ProvisionError> {
        debug!(
            type_name = %self.type_info,
            dependencies = self.dependencies.len(),
            "构造实例"
        );

        let mut instances = Vec::with_capacity(self.dependencies.len());
        for dependency in &self.dependencies {
            instances.push(resolver.resolve_key(dependency, ctx)?);
        }

        (self.constructor)(ResolvedDependencies {
            keys: self.dependencies.clone(),
            instances,
        })
    }

    fn kind(&self) -> &'static str {
        "class"
    }

    fn dependency_keys(&self) -> &[Key] {
        &self.dependencies
    }
}

/// 委托提供者
///
/// 包装调用方提供的零参数工厂，工厂失败被包装并保留原因。
pub struct DelegatingProvider {
    type_info: TypeInfo,
    factory: Arc<dyn Fn() -> anyhow::Result<Instance> + Send + Sync>,
}

impl DelegatingProvider {
    /// 从类型化工厂创建委托提供者
    pub fn new<T, F>(factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self {
            type_info: TypeInfo::of::<T>(),
            factory: Arc::new(move || factory().map(|value| Arc::new(value) as Instance)),
        }
    }
}

impl Provider for DelegatingProvider {
    fn provide(
        &self,
        _resolver: &dyn InstanceResolver,
        _ctx: &mut ResolveContext,
    ) -> Result<Instance, ProvisionError> {
        (self.factory)().map_err(|error| ProvisionError::CreationFailed {
            key: self.type_info.to_string(),
            source: error.into(),
        })
    }

    fn kind(&self) -> &'static str {
        "delegating"
    }
}

/// 服务提供者
///
/// 通过注入器的显式服务注册表（名称到工厂）解析实例，
/// 替代环境级的服务发现机制。
pub struct ServiceProvider {
    type_info: TypeInfo,
    service_name: String,
}

impl ServiceProvider {
    /// 创建服务提供者
    pub fn new<T: ?Sized + 'static>(service_name: impl Into<String>) -> Self {
        Self {
            type_info: TypeInfo::of::<T>(),
            service_name: service_name.into(),
        }
    }

    /// 服务名称
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

impl Provider for ServiceProvider {
    fn provide(
        &self,
        resolver: &dyn InstanceResolver,
        _ctx: &mut ResolveContext,
    ) -> Result<Instance, ProvisionError> {
        debug!(type_name = %self.type_info, service = %self.service_name, "服务查找");
        resolver.service_instance(&self.service_name)
    }

    fn kind(&self) -> &'static str {
        "service"
    }
}

/// 远程提供者
///
/// 按声明的地址通过注入器的远程加载器表（URL 协议到加载器）
/// 解析实例，发现步骤对本引擎是黑盒。
pub struct RemoteProvider {
    type_info: TypeInfo,
    target: Url,
}

impl RemoteProvider {
    /// 创建远程提供者
    pub fn new<T: ?Sized + 'static>(target: Url) -> Self {
        Self {
            type_info: TypeInfo::of::<T>(),
            target,
        }
    }

    /// 远程目标地址
    pub fn target(&self) -> &Url {
        &self.target
    }
}

impl Provider for RemoteProvider {
    fn provide(
        &self,
        resolver: &dyn InstanceResolver,
        _ctx: &mut ResolveContext,
    ) -> Result<Instance, ProvisionError> {
        debug!(type_name = %self.type_info, target = %self.target, "远程加载");
        resolver.remote_instance(&self.target)
    }

    fn kind(&self) -> &'static str {
        "remote"
    }
}
