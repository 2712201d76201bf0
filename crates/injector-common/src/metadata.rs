//! 类型与绑定元数据
//!
//! 提供类型标识和绑定描述符信息

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::any::TypeId;

/// 类型信息
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    /// 类型名称（不含模块路径）
    pub name: String,
    /// 类型ID
    pub id: TypeId,
    /// 完整模块路径
    pub module_path: String,
}

impl TypeInfo {
    /// 从类型获取类型信息
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            name: std::any::type_name::<T>()
                .split("::")
                .last()
                .unwrap_or("Unknown")
                .to_string(),
            id: TypeId::of::<T>(),
            module_path: std::any::type_name::<T>().to_string(),
        }
    }

    /// 获取简短的类型名称
    pub fn short_name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.module_path)
    }
}

/// 绑定描述符
///
/// 注入器对外暴露的只读绑定信息，用于诊断和工具输出。
#[derive(Debug, Clone, Serialize)]
pub struct BindingDescriptor {
    /// 实例键的文本形式
    pub key: String,
    /// 提供者种类（instance/class/delegating/service/remote）
    pub provider_kind: String,
    /// 作用域标识，未限定作用域时为 None
    pub scope: Option<String>,
    /// 绑定注册时间
    pub registered_at: DateTime<Utc>,
}
