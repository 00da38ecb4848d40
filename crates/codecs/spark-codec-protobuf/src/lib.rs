#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

//! `spark-codec-protobuf` 提供 Protocol Buffers 线格式的写入端。
//!
//! # 模块定位（Why）
//! - 为消息序列化提供低层写入原语：varint、zigzag、定长整数、浮点、字节串与字符串，
//!   64 位取值经由 [`LongBits`] 收敛多种输入表示；
//! - 嵌套消息在写完之前无法得知长度，写入器以 fork 栈惰性处理长度前缀，避免预先计算或回填。
//!
//! # 设计概要（How）
//! - [`Writer`] 持有一块活动缓冲与已封存的 [`Chunk`] 列表，空间不足时按
//!   `max(请求长度, chunk_size)` 分配新缓冲，已写前缀冻结为块；
//! - `fork` 把当前块列表压栈并开启空作用域，`finish` 拼接当前作用域并回到父作用域；
//! - 缓冲的分配、封存与拼接由 [`BufferStrategy`] 决定：[`NativeBuffer`] 基于 `bytes::BytesMut`，
//!   [`ArrayBuffer`] 基于 `Vec<u8>`，`native-buffer` 特性决定 [`DefaultStrategy`]；
//! - [`WriterPool`] 以自由链表复用写入器，[`Encode`] 描述可写为消息体的类型。
//!
//! # 契约说明（What）
//! - 输出为标准 Protocol Buffers 线格式，以下两处与标准有意不同：
//!   `sfixed32`/`sfixed64` 先 zigzag 再定长写入；`tag` 只写一个字节，字段号大于 15 时需改用 `field_key`；
//! - 同一调用序列在任意策略与任意块大小下产出逐字节相同的结果；
//! - 写入器不做内部同步，一个实例同一时刻只应由一个线程使用。
//!
//! # 示例
//! ```rust
//! use spark_codec_protobuf::{WireType, Writer};
//!
//! let mut writer: Writer = Writer::new();
//! writer.tag(1, WireType::Varint).uint32(1);
//! writer
//!     .message(2, |inner| {
//!         inner.tag(1, WireType::LengthDelimited).string("a");
//!         Ok(())
//!     })
//!     .expect("嵌套写入不会失败");
//! assert_eq!(&writer.finish()[..], &[0x08, 0x01, 0x12, 0x03, 0x0A, 0x01, b'a']);
//! ```

extern crate alloc;

mod chunk;
mod config;
mod error;
mod float;
mod long_bits;
mod message;
mod pool;
mod strategy;
pub mod utf8;
pub mod varint;
mod wire;
mod writer;

pub use chunk::Chunk;
pub use config::{DEFAULT_CHUNK_SIZE, WriterConfig};
pub use error::{Result, WireError, codes};
pub use float::{CANONICAL_NAN_F32_BITS, CANONICAL_NAN_F64_BITS};
pub use long_bits::{LongBits, LongValue, MAX_VARINT64_LEN};
pub use message::Encode;
pub use pool::{DEFAULT_MAX_IDLE, PoolStats, PooledWriter, WriterPool};
pub use strategy::{ArrayBuffer, BufferStrategy, DefaultStrategy, NativeBuffer};
pub use wire::{WireType, field_key, tag_byte};
pub use writer::{ForkScope, Writer};
