use alloc::{vec, vec::Vec};
use core::{fmt, iter, mem};

use bytes::{BufMut, Bytes, BytesMut};

use crate::{chunk::Chunk, float, utf8};

/// `BufferStrategy` 描述写入器活动缓冲的分配与封存方式。
///
/// # 设计概要（How）
/// - 必选方法负责分配（`alloc`）与封存（`seal`/`split_written`），两者决定缓冲类型；
/// - 提供方法覆盖浮点、字节串、字符串的写入以及 `finish` 阶段的拼接，默认实现走手工路径，
///   原生缓冲策略可以改写为 `bytes` 提供的等价原语；
/// - 策略在编译期通过 `Writer<S>` 的类型参数选定，运行期没有能力探测。
///
/// # 契约说明（What）
/// - `alloc(size)` 返回长度恰为 `size` 的已初始化缓冲，写入器按下标直接写入；
/// - `seal(buf, written)` 冻结 `[0, written)` 并丢弃其余容量；
/// - `split_written(buf, written)` 冻结 `[0, written)`，`buf` 就地变为剩余的未写区域；
/// - 所有写入方法的 `dst` 长度都恰好等于将要写入的字节数；
/// - 任意策略对同一调用序列必须产出逐字节相同的结果。
pub trait BufferStrategy: Sized + 'static {
    /// 活动缓冲类型。
    type Buf: AsRef<[u8]> + AsMut<[u8]> + fmt::Debug + Send;

    /// 策略名，用于日志字段。
    const NAME: &'static str;

    /// 分配 `size` 字节的活动缓冲。
    fn alloc(size: usize) -> Self::Buf;

    /// 冻结已写前缀并释放剩余容量。
    fn seal(buf: Self::Buf, written: usize) -> Chunk;

    /// 冻结已写前缀，保留剩余容量作为新的活动缓冲。
    fn split_written(buf: &mut Self::Buf, written: usize) -> Chunk;

    /// 写入 4 字节小端 IEEE-754。
    fn write_f32(dst: &mut [u8], value: f32) {
        float::write_f32_le(value, dst);
    }

    /// 写入 8 字节小端 IEEE-754。
    fn write_f64(dst: &mut [u8], value: f64) {
        float::write_f64_le(value, dst);
    }

    /// 拷贝原始字节。
    fn write_bytes(dst: &mut [u8], src: &[u8]) {
        dst.copy_from_slice(src);
    }

    /// 写入 UTF-8 文本。
    fn write_str(dst: &mut [u8], text: &str) {
        utf8::write(text, dst);
    }

    /// 按顺序拼接已封存块与尾部，得到最终结果。
    fn concat(chunks: Vec<Chunk>, tail: Chunk) -> Bytes {
        let total = chunks.iter().map(Chunk::len).sum::<usize>() + tail.len();
        let mut out = Vec::with_capacity(total);
        for chunk in chunks.iter().chain(iter::once(&tail)) {
            out.extend_from_slice(chunk);
        }
        Bytes::from(out)
    }
}

/// 通用数组策略：活动缓冲为零填充的 `Vec<u8>`，全部使用手工默认实现。
///
/// `split_written` 需要把未写尾部搬到新的 `Vec`，fork 时会产生一次尾部拷贝。
#[derive(Clone, Copy, Debug, Default)]
pub struct ArrayBuffer;

impl BufferStrategy for ArrayBuffer {
    type Buf = Vec<u8>;

    const NAME: &'static str = "array";

    fn alloc(size: usize) -> Vec<u8> {
        vec![0; size]
    }

    fn seal(mut buf: Vec<u8>, written: usize) -> Chunk {
        buf.truncate(written);
        Chunk::from(Bytes::from(buf))
    }

    fn split_written(buf: &mut Vec<u8>, written: usize) -> Chunk {
        let tail = buf.split_off(written);
        let head = mem::replace(buf, tail);
        Chunk::from(Bytes::from(head))
    }
}

/// 原生缓冲策略：活动缓冲为零填充的 [`BytesMut`]。
///
/// # 与默认实现的差异（How）
/// - `split_written` 借助 `BytesMut::split_to` 在同一块内存上切分，前缀冻结为 `Bytes`，
///   尾部继续可写，不发生拷贝；
/// - 浮点与字节写入改用 [`BufMut`] 的 `put_*` 原语；
/// - `concat` 在只有一个非空区段时直接返回该区段，不复制。
#[derive(Clone, Copy, Debug, Default)]
pub struct NativeBuffer;

impl BufferStrategy for NativeBuffer {
    type Buf = BytesMut;

    const NAME: &'static str = "native";

    fn alloc(size: usize) -> BytesMut {
        BytesMut::zeroed(size)
    }

    fn seal(mut buf: BytesMut, written: usize) -> Chunk {
        buf.truncate(written);
        Chunk::from(buf.freeze())
    }

    fn split_written(buf: &mut BytesMut, written: usize) -> Chunk {
        Chunk::from(buf.split_to(written).freeze())
    }

    fn write_f32(mut dst: &mut [u8], value: f32) {
        dst.put_f32_le(f32::from_bits(float::f32_bits(value)));
    }

    fn write_f64(mut dst: &mut [u8], value: f64) {
        dst.put_f64_le(f64::from_bits(float::f64_bits(value)));
    }

    fn write_bytes(mut dst: &mut [u8], src: &[u8]) {
        dst.put_slice(src);
    }

    fn write_str(mut dst: &mut [u8], text: &str) {
        dst.put_slice(text.as_bytes());
    }

    fn concat(chunks: Vec<Chunk>, tail: Chunk) -> Bytes {
        let total = chunks.iter().map(Chunk::len).sum::<usize>() + tail.len();
        let mut parts = chunks
            .into_iter()
            .chain(iter::once(tail))
            .filter(|chunk| !chunk.is_empty());
        let Some(first) = parts.next() else {
            return Bytes::new();
        };
        let Some(second) = parts.next() else {
            return first.into_bytes();
        };
        let mut out = BytesMut::with_capacity(total);
        out.put(first.into_bytes());
        out.put(second.into_bytes());
        for chunk in parts {
            out.put(chunk.into_bytes());
        }
        out.freeze()
    }
}

/// 由 `native-buffer` 特性选定的默认策略。
#[cfg(feature = "native-buffer")]
pub type DefaultStrategy = NativeBuffer;

/// 由 `native-buffer` 特性选定的默认策略。
#[cfg(not(feature = "native-buffer"))]
pub type DefaultStrategy = ArrayBuffer;
