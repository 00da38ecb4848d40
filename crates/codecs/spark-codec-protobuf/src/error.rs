//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 集中定义写入器对外暴露的错误语义，供调用方通过 `?` 直接传播；
//! - 每个变体映射到 [`codes`] 中的稳定错误码，便于日志检索与聚合。
//!
//! ## 设计要求（What）
//! - 标量写入在取值合法时不会失败，错误只出现在 64 位规范化、显式作用域校验与配置构建三处；
//! - 分配失败视为致命错误，由全局分配器直接终止进程，不在此建模。

use alloc::{borrow::Cow, string::String};

use thiserror::Error;

/// 写入器错误码集合，遵循 `<领域>.<语义>` 命名约定。
pub mod codes {
    /// 64 位输入无法规范化为 `LongBits`，或线类型取值越界。
    pub const PROTOBUF_INVALID_VALUE: &str = "protobuf.invalid_value";
    /// `finish_scope`/`reset_scope`/`try_finish` 发现 fork 嵌套失衡。
    pub const PROTOBUF_FORK_IMBALANCE: &str = "protobuf.fork_imbalance";
    /// 写入器配置非法，例如块大小为 0。
    pub const PROTOBUF_INVALID_CONFIG: &str = "protobuf.invalid_config";
}

/// 写入器错误域。
///
/// # 契约说明（What）
/// - 所有变体均为 `Send + Sync + 'static`，可跨线程传递；
/// - 返回错误时写入器状态保持调用前的样子，调用方可以修正后继续使用同一实例。
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WireError {
    /// 输入无法规范化为 64 位表示（非有限浮点、越界数值、无法解析的十进制文本等）。
    #[error("invalid value: {detail}")]
    InvalidValue {
        /// 面向排障的描述，包含原始输入。
        detail: Cow<'static, str>,
    },

    /// 显式作用域与当前嵌套深度不一致。
    ///
    /// `expected` 为调用方持有的作用域深度，`actual` 为写入器当前深度。
    #[error("fork imbalance: scope expects depth {expected}, writer is at depth {actual}")]
    ForkImbalance {
        /// 调用方声明的深度。
        expected: usize,
        /// 写入器实际深度。
        actual: usize,
    },

    /// 配置校验失败。
    #[error("invalid writer configuration: {detail}")]
    InvalidConfig {
        /// 失败原因。
        detail: String,
    },
}

impl WireError {
    /// 构造 [`WireError::InvalidValue`]。
    pub fn invalid_value(detail: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidValue {
            detail: detail.into(),
        }
    }

    /// 返回稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidValue { .. } => codes::PROTOBUF_INVALID_VALUE,
            Self::ForkImbalance { .. } => codes::PROTOBUF_FORK_IMBALANCE,
            Self::InvalidConfig { .. } => codes::PROTOBUF_INVALID_CONFIG,
        }
    }
}

/// crate 统一的 `Result` 别名。
pub type Result<T, E = WireError> = core::result::Result<T, E>;
