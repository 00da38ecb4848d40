use alloc::vec::Vec;
use core::{fmt, marker::PhantomData, mem};

use bytes::Bytes;
use tracing::{debug, trace};

use crate::{
    chunk::Chunk,
    config::WriterConfig,
    error::{Result, WireError},
    long_bits::{LongBits, LongValue},
    strategy::{BufferStrategy, DefaultStrategy},
    utf8, varint,
    wire::{self, WireType},
};

/// Protocol Buffers 线格式写入器。
///
/// # 结构（How）
/// - `head`/`pos`：当前活动缓冲与写游标，`head` 为空时容量视为 0；
/// - `chunks`：当前（最内层）作用域已封存的块，按写入顺序排列；
/// - `stack`：每个打开的 fork 层级保存一份父作用域的块列表，栈深即嵌套深度。
///
/// 任意时刻 `chunks` 依次拼接再接上 `head[..pos]`，恰为当前作用域已写入的全部字节。
///
/// # 契约说明（What）
/// - 标量写入先向增长原语申请确切字节数，再直接写入活动缓冲，返回 `&mut Self` 便于链式调用；
/// - `fork` 打开嵌套作用域，`finish`/`reset` 关闭一层（`*_all` 关闭全部），关闭后的写入器可复用；
/// - `fork` 与 `finish`/`reset` 的配对由调用方负责：多余的 `finish` 会静默返回外层或空作用域的数据。
///   需要校验时使用 [`open_scope`](Self::open_scope)、[`finish_scope`](Self::finish_scope)、
///   [`try_finish`](Self::try_finish)；
/// - 写入器独占持有全部缓冲，不做内部同步，并发编码需使用各自的实例。
///
/// # 示例
/// ```rust
/// use spark_codec_protobuf::{WireType, Writer};
///
/// let mut writer: Writer = Writer::new();
/// writer.tag(1, WireType::LengthDelimited).uint32(150);
/// assert_eq!(&writer.finish()[..], &[0x0A, 0x96, 0x01]);
/// ```
pub struct Writer<S: BufferStrategy = DefaultStrategy> {
    head: Option<S::Buf>,
    pos: usize,
    chunks: Vec<Chunk>,
    stack: Vec<Vec<Chunk>>,
    config: WriterConfig,
    _strategy: PhantomData<fn() -> S>,
}

/// [`Writer::open_scope`] 返回的作用域凭据，记录打开后的嵌套深度。
///
/// 校验方法以引用接收凭据：深度不符时凭据仍在调用方手里，关闭内层后可以再次交还。
#[must_use = "作用域需要交还给 finish_scope 或 reset_scope"]
#[derive(Debug, PartialEq, Eq)]
pub struct ForkScope {
    depth: usize,
}

impl ForkScope {
    /// 该作用域所在的嵌套深度（从 1 开始）。
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl<S: BufferStrategy> Writer<S> {
    /// 以默认配置创建空写入器，首次写入时才分配缓冲。
    pub fn new() -> Self {
        Self::with_config(WriterConfig::default())
    }

    /// 以给定配置创建空写入器。
    pub fn with_config(config: WriterConfig) -> Self {
        Self {
            head: None,
            pos: 0,
            chunks: Vec::new(),
            stack: Vec::new(),
            config,
            _strategy: PhantomData,
        }
    }

    /// 当前配置。
    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// 活动缓冲大小，没有活动缓冲时为 0。
    pub fn capacity(&self) -> usize {
        self.head.as_ref().map_or(0, |buf| buf.as_ref().len())
    }

    /// 活动缓冲内的写游标。
    pub fn position(&self) -> usize {
        self.pos
    }

    /// 当前嵌套深度，等于 fork 栈长度。
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// 当前作用域已封存的块数。
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// 当前作用域已写入的字节数。
    pub fn len(&self) -> usize {
        self.chunks.iter().map(Chunk::len).sum::<usize>() + self.pos
    }

    /// 当前作用域是否尚未写入任何字节。
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remaining(&self) -> usize {
        self.capacity() - self.pos
    }

    /// 保证从 `pos` 起至少有 `len` 字节空闲。
    ///
    /// 容量不足时先把已写前缀封存为块，再按 `max(len, chunk_size)` 分配新缓冲。
    fn ensure_capacity(&mut self, len: usize) {
        if self.remaining() >= len {
            return;
        }
        let sealed = self.pos;
        if let Some(buf) = self.head.take() {
            if sealed > 0 {
                self.chunks.push(S::seal(buf, sealed));
            }
        }
        let size = len.max(self.config.chunk_size());
        trace!(
            strategy = S::NAME,
            sealed,
            allocated = size,
            depth = self.stack.len(),
            "writer buffer grown"
        );
        self.head = Some(S::alloc(size));
        self.pos = 0;
    }

    /// 预留 `len` 字节并推进游标，返回待填充的切片。
    fn slot(&mut self, len: usize) -> &mut [u8] {
        self.ensure_capacity(len);
        let start = self.pos;
        self.pos += len;
        match self.head.as_mut() {
            Some(buf) => &mut buf.as_mut()[start..start + len],
            // 仅在 len == 0 且尚未分配时到达。
            None => &mut [],
        }
    }

    /// 写入单字节标签 `field << 3 | wire_type`。
    ///
    /// 只适用于字段号 1..=15；更大的字段号会被截断为一个字节，需改用 [`field_key`](Self::field_key)。
    pub fn tag(&mut self, field: u32, wire_type: WireType) -> &mut Self {
        self.slot(1)[0] = wire::tag_byte(field, wire_type);
        self
    }

    /// 以 varint 写入完整字段键，任意字段号均符合标准线格式。
    pub fn field_key(&mut self, field: u32, wire_type: WireType) -> &mut Self {
        self.uint32(wire::field_key(field, wire_type))
    }

    /// 无符号 32 位 varint。
    pub fn uint32(&mut self, value: u32) -> &mut Self {
        let len = varint::encoded_len_u32(value);
        varint::write_u32(value, self.slot(len));
        self
    }

    /// 有符号 32 位 varint，负数按补码位型写成 5 字节。
    pub fn int32(&mut self, value: i32) -> &mut Self {
        self.uint32(value as u32)
    }

    /// zigzag 编码后的 32 位 varint。
    pub fn sint32(&mut self, value: i32) -> &mut Self {
        self.uint32(varint::zigzag32(value))
    }

    /// 布尔值，单字节 1 或 0。
    pub fn bool(&mut self, value: bool) -> &mut Self {
        self.slot(1)[0] = u8::from(value);
        self
    }

    /// 4 字节小端无符号整数。
    pub fn fixed32(&mut self, value: u32) -> &mut Self {
        self.slot(4).copy_from_slice(&value.to_le_bytes());
        self
    }

    /// 先 zigzag 再按 4 字节小端写入。
    ///
    /// 注意：标准 `sfixed32` 是不经 zigzag 的补码，此处输出与标准解码器的理解不同。
    pub fn sfixed32(&mut self, value: i32) -> &mut Self {
        self.fixed32(varint::zigzag32(value))
    }

    /// 4 字节小端 IEEE-754 单精度。
    pub fn float(&mut self, value: f32) -> &mut Self {
        S::write_f32(self.slot(4), value);
        self
    }

    /// 8 字节小端 IEEE-754 双精度。
    pub fn double(&mut self, value: f64) -> &mut Self {
        S::write_f64(self.slot(8), value);
        self
    }

    /// 无符号 64 位 varint。
    pub fn uint64<'a>(&mut self, value: impl Into<LongValue<'a>>) -> Result<&mut Self> {
        let bits = value.into().normalize()?;
        Ok(self.long_varint(bits))
    }

    /// 有符号 64 位 varint，负数写成 10 字节。
    pub fn int64<'a>(&mut self, value: impl Into<LongValue<'a>>) -> Result<&mut Self> {
        let bits = value.into().normalize()?;
        Ok(self.long_varint(bits))
    }

    /// zigzag 编码后的 64 位 varint。
    pub fn sint64<'a>(&mut self, value: impl Into<LongValue<'a>>) -> Result<&mut Self> {
        let bits = value.into().normalize()?;
        Ok(self.long_varint(bits.zz_encode()))
    }

    /// 8 字节小端无符号整数。
    pub fn fixed64<'a>(&mut self, value: impl Into<LongValue<'a>>) -> Result<&mut Self> {
        let bits = value.into().normalize()?;
        Ok(self.long_fixed(bits))
    }

    /// 先 zigzag 再按 8 字节小端写入，与 [`sfixed32`](Self::sfixed32) 有同样的标准差异。
    pub fn sfixed64<'a>(&mut self, value: impl Into<LongValue<'a>>) -> Result<&mut Self> {
        let bits = value.into().normalize()?;
        Ok(self.long_fixed(bits.zz_encode()))
    }

    fn long_varint(&mut self, bits: LongBits) -> &mut Self {
        let len = bits.varint_len();
        bits.write_varint(self.slot(len));
        self
    }

    fn long_fixed(&mut self, bits: LongBits) -> &mut Self {
        bits.write_fixed(self.slot(8));
        self
    }

    fn length_prefix(&mut self, len: usize) -> &mut Self {
        match u32::try_from(len) {
            Ok(len) => self.uint32(len),
            Err(_) => self.long_varint(LongBits::from_u64(len as u64)),
        }
    }

    /// 长度前缀加原始字节。
    pub fn bytes(&mut self, value: &[u8]) -> &mut Self {
        self.length_prefix(value.len());
        S::write_bytes(self.slot(value.len()), value);
        self
    }

    /// 长度前缀加 UTF-8 字节。
    pub fn string(&mut self, value: &str) -> &mut Self {
        let len = utf8::length(value);
        self.length_prefix(len);
        S::write_str(self.slot(len), value);
        self
    }

    /// 打开嵌套作用域。
    ///
    /// 已写前缀封存进当前块列表，活动缓冲剩余的未写容量直接交给内层作用域继续使用；
    /// 没有剩余容量时内层从无缓冲开始。随后当前块列表入栈，内层以空列表起步。
    pub fn fork(&mut self) -> &mut Self {
        let mut reused = 0;
        if let Some(mut buf) = self.head.take() {
            if self.pos > 0 {
                self.chunks.push(S::split_written(&mut buf, self.pos));
            }
            reused = buf.as_ref().len();
            if reused > 0 {
                self.head = Some(buf);
            }
        }
        self.pos = 0;
        let parent = mem::take(&mut self.chunks);
        self.stack.push(parent);
        trace!(
            strategy = S::NAME,
            depth = self.stack.len(),
            reused,
            "writer forked"
        );
        self
    }

    /// 丢弃当前作用域并回到父作用域；已处于最外层时仅清空。
    pub fn reset(&mut self) -> &mut Self {
        self.close(false);
        self
    }

    /// 丢弃所有作用域，回到无嵌套的空状态。
    pub fn reset_all(&mut self) -> &mut Self {
        self.close(true);
        self
    }

    /// 取出当前作用域的全部字节，随后按 [`reset`](Self::reset) 回到父作用域。
    pub fn finish(&mut self) -> Bytes {
        self.take_scope(false)
    }

    /// 取出当前作用域的全部字节，随后按 [`reset_all`](Self::reset_all) 清空所有作用域。
    pub fn finish_all(&mut self) -> Bytes {
        self.take_scope(true)
    }

    fn take_scope(&mut self, clear_all: bool) -> Bytes {
        let tail = match self.head.take() {
            Some(buf) => S::seal(buf, self.pos),
            None => Chunk::default(),
        };
        let chunks = mem::take(&mut self.chunks);
        let out = S::concat(chunks, tail);
        self.close(clear_all);
        out
    }

    fn close(&mut self, clear_all: bool) {
        self.head = None;
        self.pos = 0;
        if clear_all {
            if !self.stack.is_empty() {
                debug!(
                    strategy = S::NAME,
                    depth = self.stack.len(),
                    "writer discarded open fork levels"
                );
                self.stack.clear();
            }
            self.chunks.clear();
        } else {
            match self.stack.pop() {
                Some(parent) => self.chunks = parent,
                None => self.chunks.clear(),
            }
        }
    }

    /// 打开嵌套作用域并返回凭据，配合 [`finish_scope`](Self::finish_scope) 校验配对。
    pub fn open_scope(&mut self) -> ForkScope {
        self.fork();
        ForkScope {
            depth: self.depth(),
        }
    }

    fn check_depth(&self, expected: usize) -> Result<()> {
        let actual = self.depth();
        if actual == expected {
            Ok(())
        } else {
            Err(WireError::ForkImbalance { expected, actual })
        }
    }

    /// 校验深度后关闭 `scope` 并返回其字节；深度不符时返回 [`WireError::ForkImbalance`]，写入器保持不变。
    pub fn finish_scope(&mut self, scope: &ForkScope) -> Result<Bytes> {
        self.check_depth(scope.depth)?;
        Ok(self.finish())
    }

    /// 校验深度后丢弃 `scope`。
    pub fn reset_scope(&mut self, scope: &ForkScope) -> Result<()> {
        self.check_depth(scope.depth)?;
        self.reset();
        Ok(())
    }

    /// 要求没有未关闭的 fork，再取出最外层作用域的字节。
    pub fn try_finish(&mut self) -> Result<Bytes> {
        self.check_depth(0)?;
        Ok(self.finish())
    }

    /// 写入长度前缀的嵌套消息。
    ///
    /// 先在独立作用域中执行 `encode`，成功后向外层写入 `tag(field, LengthDelimited)`、长度与消息体。
    /// `encode` 失败，或返回时留下未关闭的 fork，子作用域及其内部打开的所有层级一并丢弃，
    /// 写入器回到调用前的深度，外层不会留下半截字段。
    ///
    /// ```rust
    /// use spark_codec_protobuf::{WireType, Writer};
    ///
    /// let mut writer: Writer = Writer::new();
    /// writer
    ///     .message(3, |inner| {
    ///         inner.tag(1, WireType::Varint).uint32(150);
    ///         Ok(())
    ///     })
    ///     .expect("嵌套写入不会失败");
    /// assert_eq!(&writer.finish()[..], &[0x1A, 0x03, 0x08, 0x96, 0x01]);
    /// ```
    pub fn message<F>(&mut self, field: u32, encode: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let scope = self.open_scope();
        let outcome = encode(self).and_then(|()| self.finish_scope(&scope));
        match outcome {
            Ok(body) => Ok(self.tag(field, WireType::LengthDelimited).bytes(&body)),
            Err(err) => {
                self.unwind(&scope);
                Err(err)
            }
        }
    }

    /// 丢弃 `scope` 及其内部仍打开的层级；`scope` 已被关闭时不动外层。
    fn unwind(&mut self, scope: &ForkScope) {
        while self.depth() >= scope.depth {
            self.reset();
        }
    }

    /// 写入 packed 重复字段；`items` 为空时不输出任何字节。
    pub fn packed<T, F>(&mut self, field: u32, items: &[T], mut write: F) -> Result<&mut Self>
    where
        F: FnMut(&mut Self, &T) -> Result<()>,
    {
        if items.is_empty() {
            return Ok(self);
        }
        self.message(field, |inner| {
            for item in items {
                write(inner, item)?;
            }
            Ok(())
        })
    }
}

impl<S: BufferStrategy> Default for Writer<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: BufferStrategy> fmt::Debug for Writer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Writer")
            .field("strategy", &S::NAME)
            .field("position", &self.pos)
            .field("capacity", &self.capacity())
            .field("chunks", &self.chunks.len())
            .field("depth", &self.stack.len())
            .field("chunk_size", &self.config.chunk_size())
            .finish()
    }
}
