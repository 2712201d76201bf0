//! 诊断格式化辅助
//!
//! 纯函数，输入为出错的键链或错误因果链，不携带进程状态。

use crate::key::Key;
use std::fmt::Write;

/// 因果链最大展开深度
const MAX_CAUSE_DEPTH: usize = 8;

/// 以冒号连接多个片段，空输入返回空字符串
pub fn join(parts: &[&str]) -> String {
    parts.join(":")
}

/// 格式化依赖解析链，形如 `A -> B -> A`
pub fn dependency_chain(chain: &[Key]) -> String {
    let mut text = String::new();
    for (index, key) in chain.iter().enumerate() {
        if index > 0 {
            text.push_str(" -> ");
        }
        let _ = write!(text, "{key}");
    }
    text
}

/// 展开错误因果链为单行文本
///
/// 从错误本身沿 `source()` 逐层展开，最多 8 层，超出以 `...` 截断。
pub fn error_trace(error: &(dyn std::error::Error + 'static)) -> String {
    let mut text = error.to_string();
    let mut cause = error.source();
    let mut depth = 1;

    while let Some(current) = cause {
        if depth == MAX_CAUSE_DEPTH {
            text.push_str(": ...");
            break;
        }
        let _ = write!(text, ": {current}");
        cause = current.source();
        depth += 1;
    }
    text
}
