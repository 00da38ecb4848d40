//! 线类型与字段键。
//!
//! 字段键由 `field_number << 3 | wire_type` 组成。[`tag_byte`] 只产出一个字节，
//! 字段号超过 15 时高位被截断；需要符合标准的多字节键时使用 [`field_key`] 配合 varint 写入。

use alloc::format;

use crate::error::WireError;

/// 3 bit 线类型，决定字段值在线上的编码类别。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    /// 变长整数：`int32/int64/uint32/uint64/sint32/sint64/bool/enum`。
    Varint = 0,
    /// 8 字节定长：`fixed64/sfixed64/double`。
    Fixed64 = 1,
    /// 长度前缀：`string/bytes`、嵌套消息与 packed 重复字段。
    LengthDelimited = 2,
    /// 组开始（已废弃，仅为兼容保留）。
    StartGroup = 3,
    /// 组结束（已废弃，仅为兼容保留）。
    EndGroup = 4,
    /// 4 字节定长：`fixed32/sfixed32/float`。
    Fixed32 = 5,
}

impl WireType {
    /// 线类型的 3 bit 数值。
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

impl From<WireType> for u8 {
    fn from(value: WireType) -> Self {
        value.bits()
    }
}

impl TryFrom<u8> for WireType {
    type Error = WireError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Varint),
            1 => Ok(Self::Fixed64),
            2 => Ok(Self::LengthDelimited),
            3 => Ok(Self::StartGroup),
            4 => Ok(Self::EndGroup),
            5 => Ok(Self::Fixed32),
            other => Err(WireError::invalid_value(format!(
                "wire type {other} is not defined"
            ))),
        }
    }
}

/// 单字节标签：`(field << 3 | wire_type & 7)` 截断为 `u8`。
///
/// 调用方负责保证结果落在一个字节内（字段号 1..=15）。
pub const fn tag_byte(field: u32, wire_type: WireType) -> u8 {
    (field.wrapping_shl(3) | (wire_type.bits() as u32 & 7)) as u8
}

/// 完整字段键：`field << 3 | wire_type`，以 varint 写出即为标准标签。
pub const fn field_key(field: u32, wire_type: WireType) -> u32 {
    field.wrapping_shl(3) | (wire_type.bits() as u32 & 7)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_byte_packs_field_and_type() {
        assert_eq!(tag_byte(1, WireType::LengthDelimited), 0x0A);
        assert_eq!(tag_byte(1, WireType::Varint), 0x08);
        assert_eq!(tag_byte(15, WireType::Fixed32), 0x7D);
    }

    #[test]
    fn tag_byte_truncates_large_fields() {
        // 16 << 3 = 128，低 8 位为 0x80，与多字节键的首字节一致但缺少后续字节。
        assert_eq!(tag_byte(16, WireType::Varint), 0x80);
        assert_eq!(field_key(16, WireType::Varint), 128);
    }

    #[test]
    fn wire_type_round_trips_through_bits() {
        for bits in 0..=5u8 {
            let ty = WireType::try_from(bits).expect("0..=5 均为合法线类型");
            assert_eq!(u8::from(ty), bits);
        }
        assert!(WireType::try_from(6).is_err());
    }
}
