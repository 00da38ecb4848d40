use core::ops::Deref;

use bytes::Bytes;

/// 已封存的只读字节段。
///
/// 一旦进入写入器的块列表便不再修改，直到 `finish` 将其拼接进最终结果。
/// 内部以 [`Bytes`] 持有，克隆只增加引用计数。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Chunk(Bytes);

impl Chunk {
    /// 字节数。
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 是否为空。
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 借出底层字节。
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// 取出底层 [`Bytes`]，不复制。
    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl From<Bytes> for Chunk {
    fn from(bytes: Bytes) -> Self {
        Self(bytes)
    }
}

impl Deref for Chunk {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Chunk {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
