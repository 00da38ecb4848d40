use alloc::format;

use crate::error::{Result, WireError};

/// 默认块大小（字节）。
///
/// 写入器在容量不足时按 `max(请求长度, chunk_size)` 分配新缓冲，
/// 多数字段写入只需几个字节，1 KiB 能把分配次数压到很低。
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// 写入器配置。
///
/// # 契约说明（What）
/// - `chunk_size`：增长原语的最小分配单位，必须大于 0；
/// - 配置按实例持有，不同调优参数的写入器可以共存而互不影响；
/// - 块大小只影响内部分块边界，`finish` 返回的字节与其无关。
///
/// # 示例
/// ```rust
/// use spark_codec_protobuf::WriterConfig;
///
/// let config = WriterConfig::default().with_chunk_size(64).expect("64 是合法块大小");
/// assert_eq!(config.chunk_size(), 64);
/// assert!(WriterConfig::default().with_chunk_size(0).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawWriterConfig"))]
pub struct WriterConfig {
    chunk_size: usize,
}

/// 反序列化中间形态：缺省字段取默认值，随后复用 `with_chunk_size` 的校验。
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
#[serde(default)]
struct RawWriterConfig {
    chunk_size: usize,
}

#[cfg(feature = "serde")]
impl Default for RawWriterConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

#[cfg(feature = "serde")]
impl TryFrom<RawWriterConfig> for WriterConfig {
    type Error = WireError;

    fn try_from(raw: RawWriterConfig) -> Result<Self> {
        Self::new().with_chunk_size(raw.chunk_size)
    }
}

impl WriterConfig {
    /// 以默认块大小构造配置。
    pub const fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// 返回调整块大小后的配置；`0` 返回 [`WireError::InvalidConfig`]。
    pub fn with_chunk_size(self, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(WireError::InvalidConfig {
                detail: format!("chunk_size must be positive, got {chunk_size}"),
            });
        }
        Ok(Self { chunk_size })
    }

    /// 当前块大小。
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self::new()
    }
}
