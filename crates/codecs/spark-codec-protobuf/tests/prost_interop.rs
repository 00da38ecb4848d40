//! `prost_interop` 集成测试：以 `prost` 作为标准解码器验证线格式兼容性。
//!
//! # 测试目标（Why）
//! - 写入器的输出必须能被任意符合标准的解码器读取，`prost` 是生态中最常用的实现；
//! - 同一消息由两侧编码时应逐字节一致，说明字段顺序、长度前缀与浮点位型完全对齐；
//! - `sfixed32`/`sfixed64` 的 zigzag 差异在此以标准解码结果的形式固定下来；
//! - 随机生成的消息在两种策略、任意块大小下都必须被 `prost` 原样读回，NaN 读回为规范位型。

use prost::Message;
use proptest::{collection::vec, option, prelude::*};
use spark_codec_protobuf::{
    ArrayBuffer, BufferStrategy, CANONICAL_NAN_F32_BITS, CANONICAL_NAN_F64_BITS, Encode,
    NativeBuffer, Result, WireType, Writer, WriterConfig,
};

#[derive(Clone, PartialEq, prost::Message)]
struct Child {
    #[prost(string, tag = "1")]
    label: String,
    #[prost(sint64, tag = "2")]
    weight: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
struct Sample {
    #[prost(uint32, tag = "1")]
    id: u32,
    #[prost(int32, tag = "2")]
    delta: i32,
    #[prost(sint32, tag = "3")]
    offset: i32,
    #[prost(bool, tag = "4")]
    flag: bool,
    #[prost(fixed32, tag = "5")]
    checksum: u32,
    #[prost(float, tag = "6")]
    ratio: f32,
    #[prost(double, tag = "7")]
    precise: f64,
    #[prost(uint64, tag = "8")]
    big: u64,
    #[prost(int64, tag = "9")]
    signed_big: i64,
    #[prost(sint64, tag = "10")]
    zz_big: i64,
    #[prost(fixed64, tag = "11")]
    stamp: u64,
    #[prost(bytes = "vec", tag = "12")]
    payload: Vec<u8>,
    #[prost(string, tag = "13")]
    name: String,
    #[prost(message, optional, tag = "14")]
    child: Option<Child>,
    #[prost(uint32, repeated, packed = "true", tag = "15")]
    samples: Vec<u32>,
}

impl Encode for Child {
    fn encode<S: BufferStrategy>(&self, writer: &mut Writer<S>) -> Result<()> {
        writer.tag(1, WireType::LengthDelimited).string(&self.label);
        writer.tag(2, WireType::Varint).sint64(self.weight)?;
        Ok(())
    }
}

impl Encode for Sample {
    fn encode<S: BufferStrategy>(&self, writer: &mut Writer<S>) -> Result<()> {
        writer.tag(1, WireType::Varint).uint32(self.id);
        writer.tag(2, WireType::Varint).int32(self.delta);
        writer.tag(3, WireType::Varint).sint32(self.offset);
        writer.tag(4, WireType::Varint).bool(self.flag);
        writer.tag(5, WireType::Fixed32).fixed32(self.checksum);
        writer.tag(6, WireType::Fixed32).float(self.ratio);
        writer.tag(7, WireType::Fixed64).double(self.precise);
        writer.tag(8, WireType::Varint).uint64(self.big)?;
        writer.tag(9, WireType::Varint).int64(self.signed_big)?;
        writer.tag(10, WireType::Varint).sint64(self.zz_big)?;
        writer.tag(11, WireType::Fixed64).fixed64(self.stamp)?;
        writer.tag(12, WireType::LengthDelimited).bytes(&self.payload);
        writer.tag(13, WireType::LengthDelimited).string(&self.name);
        if let Some(child) = &self.child {
            writer.message(14, |inner| Encode::encode(child, inner))?;
        }
        writer.packed(15, &self.samples, |inner, value| {
            inner.uint32(*value);
            Ok(())
        })?;
        Ok(())
    }
}

fn sample() -> Sample {
    Sample {
        id: 150,
        delta: 42,
        offset: -300,
        flag: true,
        checksum: 0xDEAD_BEEF,
        ratio: 0.25,
        precise: -1234.5678,
        big: u64::MAX - 7,
        signed_big: i64::MIN + 1,
        zz_big: -9_876_543_210,
        stamp: 1_700_000_000_123,
        payload: (0..=255).collect(),
        name: "spark ✨ protobuf".to_owned(),
        child: Some(Child {
            label: "nested".to_owned(),
            weight: -1,
        }),
        samples: vec![0, 1, 127, 128, 16_384, u32::MAX],
    }
}

fn encode_with<S: BufferStrategy>(value: &Sample, chunk_size: usize) -> Vec<u8> {
    let config = WriterConfig::new()
        .with_chunk_size(chunk_size)
        .expect("块大小为正");
    let mut writer: Writer<S> = Writer::with_config(config);
    Encode::encode(value, &mut writer).expect("样例总能编码");
    writer.try_finish().expect("编码后没有未关闭作用域").to_vec()
}

#[test]
fn prost_decodes_writer_output() {
    let expected = sample();
    let bytes = Encode::encode_to_bytes(&expected).expect("样例总能编码");
    let decoded = Sample::decode(bytes).expect("prost 应能解码");
    assert_eq!(decoded, expected);
}

#[test]
fn writer_matches_prost_byte_for_byte() {
    let value = sample();
    let reference = value.encode_to_vec();
    for chunk_size in [1, 3, 16, 1024] {
        assert_eq!(encode_with::<ArrayBuffer>(&value, chunk_size), reference);
        assert_eq!(encode_with::<NativeBuffer>(&value, chunk_size), reference);
    }
}

#[test]
fn length_delimited_frames_decode() {
    let value = sample();
    let framed = Encode::encode_length_delimited(&value).expect("样例总能编码");
    let decoded = Sample::decode_length_delimited(framed).expect("prost 应能解码帧");
    assert_eq!(decoded, value);
}

#[derive(Clone, PartialEq, prost::Message)]
struct HighField {
    #[prost(uint32, tag = "100")]
    value: u32,
}

#[test]
fn field_key_supports_large_field_numbers() {
    let mut writer: Writer = Writer::new();
    writer.field_key(100, WireType::Varint).uint32(9);
    let decoded = HighField::decode(writer.finish()).expect("多字节键应可解码");
    assert_eq!(decoded.value, 9);
}

/// 负 `int32` 写成 5 字节补码，`prost` 自身写 10 字节，但两者解码结果一致。
#[test]
fn negative_int32_decodes_from_five_bytes() {
    let value = Sample {
        delta: -42,
        ..sample()
    };
    let bytes = Encode::encode_to_bytes(&value).expect("样例总能编码");
    assert_eq!(bytes.len() + 5, value.encode_to_vec().len());
    let decoded = Sample::decode(bytes).expect("prost 应能解码");
    assert_eq!(decoded.delta, -42);
}

#[derive(Clone, PartialEq, prost::Message)]
struct SignedFixed {
    #[prost(sfixed32, tag = "1")]
    small: i32,
    #[prost(sfixed64, tag = "2")]
    large: i64,
}

/// 标准解码器把 zigzag 后的定长值按补码读取：-1 读成 1，1 读成 2。
#[test]
fn signed_fixed_width_reads_back_zigzagged() {
    let mut writer: Writer = Writer::new();
    writer.tag(1, WireType::Fixed32).sfixed32(-1);
    writer
        .tag(2, WireType::Fixed64)
        .sfixed64(1_i64)
        .expect("i64 总能规范化");
    let decoded = SignedFixed::decode(writer.finish()).expect("仍是合法线格式");
    assert_eq!(decoded.small, 1);
    assert_eq!(decoded.large, 2);
}

#[test]
fn nan_round_trips_as_canonical_nan() {
    let value = Sample {
        ratio: f32::from_bits(0x7F80_0001),
        precise: f64::from_bits(0xFFF0_0000_0000_0042),
        ..Sample::default()
    };
    let bytes = Encode::encode_to_bytes(&value).expect("样例总能编码");
    let decoded = Sample::decode(bytes).expect("prost 应能解码");
    assert_eq!(decoded.ratio.to_bits(), 0x7FC0_0000);
    assert_eq!(decoded.precise.to_bits(), 0x7FF8_0000_0000_0000);
}

fn child_strategy() -> impl Strategy<Value = Child> {
    (any::<String>(), any::<i64>()).prop_map(|(label, weight)| Child { label, weight })
}

fn sample_strategy() -> impl Strategy<Value = Sample> {
    let scalars = (
        any::<u32>(),
        any::<i32>(),
        any::<i32>(),
        any::<bool>(),
        any::<u32>(),
        any::<f32>(),
        any::<f64>(),
    );
    let longs = (any::<u64>(), any::<i64>(), any::<i64>(), any::<u64>());
    let runs = (
        vec(any::<u8>(), 0..64),
        any::<String>(),
        option::of(child_strategy()),
        vec(any::<u32>(), 0..16),
    );
    (scalars, longs, runs).prop_map(
        |(
            (id, delta, offset, flag, checksum, ratio, precise),
            (big, signed_big, zz_big, stamp),
            (payload, name, child, samples),
        )| Sample {
            id,
            delta,
            offset,
            flag,
            checksum,
            ratio,
            precise,
            big,
            signed_big,
            zz_big,
            stamp,
            payload,
            name,
            child,
            samples,
        },
    )
}

fn f32_bits(value: f32) -> u32 {
    if value.is_nan() {
        CANONICAL_NAN_F32_BITS
    } else {
        value.to_bits()
    }
}

fn f64_bits(value: f64) -> u64 {
    if value.is_nan() {
        CANONICAL_NAN_F64_BITS
    } else {
        value.to_bits()
    }
}

/// 浮点字段按位型单独比较，其余字段交给 `PartialEq`。
fn without_floats(value: Sample) -> Sample {
    Sample {
        ratio: 0.0,
        precise: 0.0,
        ..value
    }
}

proptest! {
    #[test]
    fn prost_reads_arbitrary_samples(value in sample_strategy(), chunk_size in 1usize..64) {
        let outputs = [
            encode_with::<ArrayBuffer>(&value, chunk_size),
            encode_with::<NativeBuffer>(&value, chunk_size),
        ];
        prop_assert_eq!(&outputs[0], &outputs[1]);
        for bytes in outputs {
            let decoded = Sample::decode(&bytes[..]).expect("prost 应能解码");
            prop_assert_eq!(decoded.ratio.to_bits(), f32_bits(value.ratio));
            prop_assert_eq!(decoded.precise.to_bits(), f64_bits(value.precise));
            prop_assert_eq!(without_floats(decoded), without_floats(value.clone()));
        }
    }
}
