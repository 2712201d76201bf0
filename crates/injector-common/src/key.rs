//! 实例键定义
//!
//! 实例键由类型和可选限定符组成，是绑定表的唯一索引

use crate::metadata::TypeInfo;
use serde::Serialize;
use std::any::TypeId;
use std::fmt;

/// 限定符值
///
/// 引擎不解释限定符内容，只按值比较。同一类型可以通过不同限定符
/// 注册多个绑定；未限定本身是一个独立有效的键空间。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Qualifier {
    /// 命名限定符
    Named(String),
    /// 标记限定符，限定符类型本身作为值
    Marker(&'static str),
}

impl Qualifier {
    /// 创建命名限定符
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// 从标记类型创建限定符
    pub fn marker<M: ?Sized + 'static>() -> Self {
        Self::Marker(std::any::type_name::<M>())
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{name}"),
            Self::Marker(marker) => write!(f, "{marker}"),
        }
    }
}

/// 实例键
///
/// 两个键相等当且仅当类型和限定符都相等。构造后不可变。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    type_info: TypeInfo,
    qualifier: Option<Qualifier>,
}

impl Key {
    /// 创建未限定的键
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_info: TypeInfo::of::<T>(),
            qualifier: None,
        }
    }

    /// 创建命名限定的键
    pub fn named<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self::qualified::<T>(Qualifier::named(name))
    }

    /// 创建带限定符的键
    pub fn qualified<T: ?Sized + 'static>(qualifier: Qualifier) -> Self {
        Self {
            type_info: TypeInfo::of::<T>(),
            qualifier: Some(qualifier),
        }
    }

    /// 从已有部件组装键
    pub fn from_parts(type_info: TypeInfo, qualifier: Option<Qualifier>) -> Self {
        Self {
            type_info,
            qualifier,
        }
    }

    /// 键的类型信息
    pub fn type_info(&self) -> &TypeInfo {
        &self.type_info
    }

    /// 键的类型ID
    pub fn type_id(&self) -> TypeId {
        self.type_info.id
    }

    /// 键的限定符
    pub fn qualifier(&self) -> Option<&Qualifier> {
        self.qualifier.as_ref()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            None => write!(f, "{}", self.type_info),
            Some(qualifier) => write!(f, "{}:{}", self.type_info, qualifier),
        }
    }
}
