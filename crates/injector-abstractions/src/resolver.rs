//! 实例解析抽象接口
//!
//! 解析上下文与解析入口。注入器实现 [`InstanceResolver`]，
//! 提供者通过它递归解析自身依赖。

use crate::provider::Instance;
use injector_common::{diagnostics, Key, ProvisionError};
use url::Url;

/// 实例解析入口 trait
///
/// 解析在调用线程上同步运行至完成，没有内部调度器。
pub trait InstanceResolver: Send + Sync {
    /// 按键解析实例
    fn resolve_key(&self, key: &Key, ctx: &mut ResolveContext)
        -> Result<Instance, ProvisionError>;

    /// 从服务注册表获取实例
    fn service_instance(&self, name: &str) -> Result<Instance, ProvisionError>;

    /// 从远程加载器获取实例
    fn remote_instance(&self, target: &Url) -> Result<Instance, ProvisionError>;
}

/// 解析上下文
///
/// 每次顶层解析创建一个，随递归向下传递。
#[derive(Debug, Clone)]
pub struct ResolveContext {
    /// 当前解析链，用于检测循环依赖
    resolution_chain: Vec<Key>,
    /// 最大递归深度
    max_depth: usize,
    /// 最近一次提供是否命中作用域缓存
    from_cache: bool,
}

impl ResolveContext {
    /// 默认最大解析深度
    pub const DEFAULT_MAX_DEPTH: usize = 100;

    /// 创建新的解析上下文
    pub fn new() -> Self {
        Self::with_max_depth(Self::DEFAULT_MAX_DEPTH)
    }

    /// 创建指定深度上限的解析上下文
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            resolution_chain: Vec::new(),
            max_depth,
            from_cache: false,
        }
    }

    /// 添加键到解析链
    ///
    /// 同一键在当前调用栈上重入视为循环依赖，立即失败而不是
    /// 让调用栈溢出。
    pub fn push_key(&mut self, key: &Key) -> Result<(), ProvisionError> {
        if self.resolution_chain.contains(key) {
            let mut chain = self.resolution_chain.clone();
            chain.push(key.clone());
            return Err(ProvisionError::CircularDependency {
                dependency_chain: diagnostics::dependency_chain(&chain),
            });
        }
        if self.resolution_chain.len() >= self.max_depth {
            return Err(ProvisionError::MaxDepthExceeded {
                depth: self.max_depth,
            });
        }
        self.resolution_chain.push(key.clone());
        Ok(())
    }

    /// 从解析链中移除最近的键
    pub fn pop_key(&mut self) {
        self.resolution_chain.pop();
    }

    /// 标记最近一次提供是否命中作用域缓存
    ///
    /// 由作用域提供者在持有自身缓存锁时写入，创建方写 `false`，
    /// 命中方写 `true`。注入器据此决定是否触发供给事件。
    pub fn set_from_cache(&mut self, from_cache: bool) {
        self.from_cache = from_cache;
    }

    /// 最近一次提供是否命中作用域缓存
    pub fn from_cache(&self) -> bool {
        self.from_cache
    }

    /// 当前解析链
    pub fn resolution_chain(&self) -> &[Key] {
        &self.resolution_chain
    }

    /// 当前解析深度
    pub fn depth(&self) -> usize {
        self.resolution_chain.len()
    }
}

impl Default for ResolveContext {
    fn default() -> Self {
        Self::new()
    }
}
