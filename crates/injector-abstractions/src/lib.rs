//! # Injector Abstractions
//!
//! 注入器运行时的抽象层，定义绑定、提供者、作用域与模块的核心接口。
//!
//! ## 核心接口
//!
//! - [`Provider`] - 实例提供者接口
//! - [`Binding`] - 键到提供者的映射
//! - [`ScopeFactory`] / [`ScopedProvider`] - 作用域缓存装饰器
//! - [`Module`] - 配置单元接口
//! - [`ProvisionListener`] - 供给事件监听器接口
//! - [`InstanceResolver`] - 解析入口，由注入器实现

pub mod binding;
pub mod listener;
pub mod module;
pub mod provider;
pub mod resolver;
pub mod scope;

pub use binding::*;
pub use listener::*;
pub use module::*;
pub use provider::*;
pub use resolver::*;
pub use scope::*;
