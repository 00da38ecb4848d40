use bytes::Bytes;

use crate::{
    error::Result,
    strategy::{BufferStrategy, DefaultStrategy},
    writer::Writer,
};

/// 可写为 Protocol Buffers 消息体的类型。
///
/// # 契约说明（What）
/// - `encode` 只写字段，不写外层标签与长度；嵌套时由 [`Writer::message`] 负责包裹；
/// - 实现不得遗留未关闭的 fork，否则 [`encode_to_bytes`](Self::encode_to_bytes) 会返回
///   [`WireError::ForkImbalance`](crate::WireError::ForkImbalance)；
/// - 同一值多次编码必须得到相同字节。
///
/// # 示例
/// ```rust
/// use spark_codec_protobuf::{BufferStrategy, Encode, Result, WireType, Writer};
///
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl Encode for Point {
///     fn encode<S: BufferStrategy>(&self, writer: &mut Writer<S>) -> Result<()> {
///         writer.tag(1, WireType::Varint).sint32(self.x);
///         writer.tag(2, WireType::Varint).sint32(self.y);
///         Ok(())
///     }
/// }
///
/// let bytes = Point { x: -1, y: 2 }.encode_to_bytes().expect("点坐标总能编码");
/// assert_eq!(&bytes[..], &[0x08, 0x01, 0x10, 0x04]);
/// ```
pub trait Encode {
    /// 将字段写入 `writer` 的当前作用域。
    fn encode<S: BufferStrategy>(&self, writer: &mut Writer<S>) -> Result<()>;

    /// 用一次性的默认策略写入器编码为独立字节。
    fn encode_to_bytes(&self) -> Result<Bytes> {
        let mut writer: Writer<DefaultStrategy> = Writer::new();
        self.encode(&mut writer)?;
        writer.try_finish()
    }

    /// 编码为带 varint 长度前缀的字节，适用于流式分帧。
    fn encode_length_delimited(&self) -> Result<Bytes> {
        let body = self.encode_to_bytes()?;
        let mut writer: Writer<DefaultStrategy> = Writer::new();
        writer.bytes(&body);
        writer.try_finish()
    }
}
