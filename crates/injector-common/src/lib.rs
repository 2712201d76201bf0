//! # Injector Common
//!
//! 注入器运行时的公共类型层。
//!
//! ## 核心类型
//!
//! - [`Key`] - 实例键，由类型和可选限定符组成
//! - [`Qualifier`] - 不透明的限定符值
//! - [`TypeInfo`] - 类型元数据
//! - [`ConfigurationError`] / [`ProvisionError`] / [`UsageError`] - 错误分类
//!
//! ## 设计原则
//!
//! - 键的相等性基于值语义，而非引用语义
//! - 每个错误携带足够的键/作用域/模块标识用于诊断
//! - 诊断辅助函数是纯函数，不依赖进程状态

pub mod diagnostics;
pub mod errors;
pub mod key;
pub mod metadata;

pub use errors::*;
pub use key::*;
pub use metadata::*;
