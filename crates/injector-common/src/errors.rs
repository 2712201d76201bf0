//! 错误类型定义

use thiserror::Error;

/// 配置错误类型
///
/// 绑定配置阶段的失败。配置错误永远快速失败，不延迟到解析时。
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("重复的绑定键: {key}")]
    DuplicateBinding { key: String },

    #[error("注入器已配置，不允许重复配置")]
    AlreadyConfigured,

    #[error("绑定缺少提供者: {key}")]
    MissingProvider { key: String },

    #[error("绑定提供者已设置，不允许再次选择提供者: {key}")]
    ProviderAlreadySet { key: String },

    #[error("未注册的作用域标识: {scope}")]
    UnknownScope { scope: String },

    #[error("不允许嵌套作用域提供者: {scope}")]
    NestedScope { scope: String },

    #[error("绑定依赖图存在循环: {dependency_chain}")]
    DependencyCycle { dependency_chain: String },

    #[error("无效的远程地址: {key}, 地址: {target}")]
    InvalidRemoteTarget { key: String, target: String },

    #[error("模块配置失败: {module}, 原因: {message}")]
    ModuleError { module: String, message: String },
}

/// 供给错误类型
///
/// 按键请求实例时的失败。每个变体携带出错的键、服务名或作用域标识。
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("请求的键没有绑定: {key}")]
    NoBinding { key: String },

    #[error("检测到循环依赖: {dependency_chain}")]
    CircularDependency { dependency_chain: String },

    #[error("超过最大解析深度: {depth}")]
    MaxDepthExceeded { depth: usize },

    #[error("实例创建失败: {key}, 原因: {source}")]
    CreationFailed {
        key: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("实例类型转换失败: {key}, 期望类型: {expected}")]
    TypeMismatch { key: String, expected: String },

    #[error("服务未注册: {name}")]
    ServiceNotRegistered { name: String },

    #[error("远程加载器未注册: {scheme}")]
    RemoteLoaderNotRegistered { scheme: String },

    #[error("供给监听器通知失败: {key}, 原因: {source}")]
    ListenerFailed {
        key: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    Usage(#[from] UsageError),
}

/// 使用错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    #[error("注入器尚未配置")]
    NotConfigured,
}
