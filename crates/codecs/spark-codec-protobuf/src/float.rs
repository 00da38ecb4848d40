//! IEEE-754 写入辅助：小端字节序，NaN 统一为静默 NaN 的规范位型。
//!
//! 正负无穷与 `-0.0` 的位型本身唯一，原样保留。

/// `f32` 规范 NaN 位型。
pub const CANONICAL_NAN_F32_BITS: u32 = 0x7FC0_0000;
/// `f64` 规范 NaN 位型。
pub const CANONICAL_NAN_F64_BITS: u64 = 0x7FF8_0000_0000_0000;

/// 返回 `value` 的规范化位型。
pub fn f32_bits(value: f32) -> u32 {
    if value.is_nan() {
        CANONICAL_NAN_F32_BITS
    } else {
        value.to_bits()
    }
}

/// 返回 `value` 的规范化位型。
pub fn f64_bits(value: f64) -> u64 {
    if value.is_nan() {
        CANONICAL_NAN_F64_BITS
    } else {
        value.to_bits()
    }
}

/// 写入 4 个小端字节。
pub fn write_f32_le(value: f32, dst: &mut [u8]) {
    dst[..4].copy_from_slice(&f32_bits(value).to_le_bytes());
}

/// 写入 8 个小端字节。
pub fn write_f64_le(value: f64, dst: &mut [u8]) {
    dst[..8].copy_from_slice(&f64_bits(value).to_le_bytes());
}
