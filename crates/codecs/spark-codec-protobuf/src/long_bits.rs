//! 64 位数值辅助。
//!
//! # 模块定位（What）
//! - [`LongValue`] 收敛调用方可能持有的几种 64 位表示：原生整数、浮点数、高低位对、十进制文本；
//! - [`LongBits`] 是规范化后的高/低 32 位对，负责 64 位 zigzag、varint（最长 10 字节）与 8 字节定长编码；
//! - 规范化失败返回 [`WireError::InvalidValue`]，由写入器原样上抛。
//!
//! # 规范化规则（How）
//! - 有符号输入按二进制补码落位，`-1` 对应 `0xFFFF_FFFF_FFFF_FFFF`；
//! - 浮点数向零截断，必须有限且落在 `[i64::MIN, u64::MAX]` 区间内；
//! - 文本以 `-` 开头时按 `i64` 解析，否则按 `u64` 解析，两端空白会被忽略。

use alloc::format;

use crate::error::{Result, WireError};

/// 最长 64 位 varint 的字节数。
pub const MAX_VARINT64_LEN: usize = 10;

/// 以高/低 32 位保存的 64 位值。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LongBits {
    /// 低 32 位。
    pub lo: u32,
    /// 高 32 位。
    pub hi: u32,
}

impl LongBits {
    /// 零值。
    pub const ZERO: Self = Self { lo: 0, hi: 0 };

    /// 由低、高 32 位构造。
    pub const fn new(lo: u32, hi: u32) -> Self {
        Self { lo, hi }
    }

    /// 由无符号 64 位整数构造。
    pub const fn from_u64(value: u64) -> Self {
        Self {
            lo: value as u32,
            hi: (value >> 32) as u32,
        }
    }

    /// 由有符号 64 位整数构造，保留二进制补码位型。
    pub const fn from_i64(value: i64) -> Self {
        Self::from_u64(value as u64)
    }

    /// 由浮点数构造，小数部分向零截断。
    pub fn from_f64(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(WireError::invalid_value(format!(
                "{value} is not a finite number"
            )));
        }
        // `as` 转换本身向零截断；两个边界都是整数，截断前后比较结果相同。
        if value >= 0.0 {
            // 2^64
            if value >= 18_446_744_073_709_551_616.0 {
                return Err(WireError::invalid_value(format!(
                    "{value} exceeds the unsigned 64-bit range"
                )));
            }
            Ok(Self::from_u64(value as u64))
        } else {
            // -2^63
            if value < -9_223_372_036_854_775_808.0 {
                return Err(WireError::invalid_value(format!(
                    "{value} is below the signed 64-bit range"
                )));
            }
            Ok(Self::from_i64(value as i64))
        }
    }

    /// 由十进制文本构造。
    pub fn from_decimal(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let parsed = if trimmed.starts_with('-') {
            trimmed.parse::<i64>().map(Self::from_i64)
        } else {
            trimmed.parse::<u64>().map(Self::from_u64)
        };
        parsed.map_err(|err| {
            WireError::invalid_value(format!("`{text}` is not a 64-bit integer: {err}"))
        })
    }

    /// 还原为无符号 64 位整数。
    pub const fn to_u64(self) -> u64 {
        ((self.hi as u64) << 32) | self.lo as u64
    }

    /// 还原为有符号 64 位整数。
    pub const fn to_i64(self) -> i64 {
        self.to_u64() as i64
    }

    /// 64 位 zigzag：`(v << 1) ^ (v >> 63)`。
    pub const fn zz_encode(self) -> Self {
        let value = self.to_i64();
        Self::from_u64(((value << 1) ^ (value >> 63)) as u64)
    }

    /// [`zz_encode`](Self::zz_encode) 的逆映射。
    pub const fn zz_decode(self) -> Self {
        let value = self.to_u64();
        Self::from_u64((value >> 1) ^ (value & 1).wrapping_neg())
    }

    /// varint 编码长度（1..=10）。
    pub const fn varint_len(self) -> usize {
        let value = self.to_u64();
        if value == 0 {
            1
        } else {
            (64 - value.leading_zeros() as usize).div_ceil(7)
        }
    }

    /// 以 varint 写入 `dst` 开头，返回写入字节数。
    pub fn write_varint(self, dst: &mut [u8]) -> usize {
        let mut value = self.to_u64();
        let mut index = 0;
        while value > 0x7F {
            dst[index] = (value as u8 & 0x7F) | 0x80;
            value >>= 7;
            index += 1;
        }
        dst[index] = value as u8;
        index + 1
    }

    /// 先低后高写入 8 个小端字节。
    pub fn write_fixed(self, dst: &mut [u8]) {
        dst[..4].copy_from_slice(&self.lo.to_le_bytes());
        dst[4..8].copy_from_slice(&self.hi.to_le_bytes());
    }
}

impl From<u64> for LongBits {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl From<i64> for LongBits {
    fn from(value: i64) -> Self {
        Self::from_i64(value)
    }
}

/// 写入器 64 位方法接受的输入形态。
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LongValue<'a> {
    /// 已经落位的高/低位对。
    Bits(LongBits),
    /// 原生数值，可能带小数或越界。
    Number(f64),
    /// 十进制文本。
    Text(&'a str),
}

impl LongValue<'_> {
    /// 规范化为 [`LongBits`]。
    pub fn normalize(self) -> Result<LongBits> {
        match self {
            Self::Bits(bits) => Ok(bits),
            Self::Number(number) => LongBits::from_f64(number),
            Self::Text(text) => LongBits::from_decimal(text),
        }
    }
}

impl From<LongBits> for LongValue<'_> {
    fn from(value: LongBits) -> Self {
        Self::Bits(value)
    }
}

impl From<u64> for LongValue<'_> {
    fn from(value: u64) -> Self {
        Self::Bits(LongBits::from_u64(value))
    }
}

impl From<i64> for LongValue<'_> {
    fn from(value: i64) -> Self {
        Self::Bits(LongBits::from_i64(value))
    }
}

impl From<u32> for LongValue<'_> {
    fn from(value: u32) -> Self {
        Self::Bits(LongBits::from_u64(value as u64))
    }
}

impl From<i32> for LongValue<'_> {
    fn from(value: i32) -> Self {
        Self::Bits(LongBits::from_i64(value as i64))
    }
}

impl From<f64> for LongValue<'_> {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl<'a> From<&'a str> for LongValue<'a> {
    fn from(value: &'a str) -> Self {
        Self::Text(value)
    }
}

impl TryFrom<LongValue<'_>> for LongBits {
    type Error = WireError;

    fn try_from(value: LongValue<'_>) -> Result<Self> {
        value.normalize()
    }
}
