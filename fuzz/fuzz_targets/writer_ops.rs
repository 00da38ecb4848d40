#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use spark_codec_protobuf::{
    ArrayBuffer, BufferStrategy, NativeBuffer, WireType, Writer, WriterConfig,
};

/// Fuzz 指令：描述一次写入器调用序列。
///
/// - **Why**：块边界、fork 复用剩余容量与拼接路径的组合很多，手写用例难以覆盖；
/// - **How**：同一指令流同时驱动三个写入器，分别使用数组策略与原生策略、不同块大小；
/// - **What**：任意时刻三者的长度、深度以及每次 `finish` 的输出都必须逐字节一致。
#[derive(Debug, Arbitrary)]
struct WriterCase {
    chunk_size: u8,
    ops: Vec<WriterOp>,
}

#[derive(Debug, Arbitrary)]
enum WriterOp {
    Tag { field: u8, wire_type: u8 },
    Uint32(u32),
    Int32(i32),
    Sint32(i32),
    Bool(bool),
    Fixed32(u32),
    Sfixed32(i32),
    Float(f32),
    Double(f64),
    Uint64(u64),
    Int64(i64),
    Sint64(i64),
    Fixed64(u64),
    Sfixed64(i64),
    Bytes(Vec<u8>),
    Text(String),
    Fork,
    Reset,
    Finish,
    FinishAll,
}

fn apply<S: BufferStrategy>(writer: &mut Writer<S>, op: &WriterOp) -> Option<Vec<u8>> {
    let long = "64 位整数总能规范化";
    match op {
        WriterOp::Tag { field, wire_type } => {
            let wire_type = WireType::try_from(wire_type % 6).unwrap_or(WireType::Varint);
            writer.tag(u32::from(*field), wire_type);
        }
        WriterOp::Uint32(value) => {
            writer.uint32(*value);
        }
        WriterOp::Int32(value) => {
            writer.int32(*value);
        }
        WriterOp::Sint32(value) => {
            writer.sint32(*value);
        }
        WriterOp::Bool(value) => {
            writer.bool(*value);
        }
        WriterOp::Fixed32(value) => {
            writer.fixed32(*value);
        }
        WriterOp::Sfixed32(value) => {
            writer.sfixed32(*value);
        }
        WriterOp::Float(value) => {
            writer.float(*value);
        }
        WriterOp::Double(value) => {
            writer.double(*value);
        }
        WriterOp::Uint64(value) => {
            writer.uint64(*value).expect(long);
        }
        WriterOp::Int64(value) => {
            writer.int64(*value).expect(long);
        }
        WriterOp::Sint64(value) => {
            writer.sint64(*value).expect(long);
        }
        WriterOp::Fixed64(value) => {
            writer.fixed64(*value).expect(long);
        }
        WriterOp::Sfixed64(value) => {
            writer.sfixed64(*value).expect(long);
        }
        WriterOp::Bytes(value) => {
            writer.bytes(value);
        }
        WriterOp::Text(value) => {
            writer.string(value);
        }
        WriterOp::Fork => {
            writer.fork();
        }
        WriterOp::Reset => {
            writer.reset();
        }
        WriterOp::Finish => return Some(writer.finish().to_vec()),
        WriterOp::FinishAll => return Some(writer.finish_all().to_vec()),
    }
    None
}

fuzz_target!(|case: WriterCase| {
    let chunk_size = usize::from(case.chunk_size).max(1);
    let config = WriterConfig::new()
        .with_chunk_size(chunk_size)
        .expect("块大小已保证为正");
    let mut array: Writer<ArrayBuffer> = Writer::with_config(config);
    let mut native: Writer<NativeBuffer> = Writer::with_config(config);
    let mut reference: Writer<NativeBuffer> = Writer::new();

    for op in &case.ops {
        let a = apply(&mut array, op);
        let n = apply(&mut native, op);
        let r = apply(&mut reference, op);
        assert_eq!(a, n, "策略之间输出不一致：{op:?}");
        assert_eq!(n, r, "块大小之间输出不一致：{op:?}");
        assert_eq!(array.len(), reference.len());
        assert_eq!(array.depth(), reference.depth());
        assert!(native.position() <= native.capacity());
    }

    assert_eq!(array.finish_all(), reference.finish_all());
});
