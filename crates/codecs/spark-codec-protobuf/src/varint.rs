//! 32 位 varint 与 zigzag。
//!
//! varint 采用 base-128、低位在前，除最后一个字节外均置 `0x80` 续位。
//! 字节数由数值区间直接给出，写入方只需做一次容量检查。

/// 最长 32 位 varint 的字节数。
pub const MAX_VARINT32_LEN: usize = 5;

/// `value` 编码后的字节数（1..=5）。
pub const fn encoded_len_u32(value: u32) -> usize {
    if value < 1 << 7 {
        1
    } else if value < 1 << 14 {
        2
    } else if value < 1 << 21 {
        3
    } else if value < 1 << 28 {
        4
    } else {
        MAX_VARINT32_LEN
    }
}

/// 将 `value` 写入 `dst` 开头，返回写入字节数。
///
/// `dst` 至少需要 [`encoded_len_u32`] 个字节，否则 panic。
pub fn write_u32(mut value: u32, dst: &mut [u8]) -> usize {
    let mut index = 0;
    while value > 0x7F {
        dst[index] = (value as u8 & 0x7F) | 0x80;
        value >>= 7;
        index += 1;
    }
    dst[index] = value as u8;
    index + 1
}

/// zigzag 映射：`(v << 1) ^ (v >> 31)`，小绝对值映射为小无符号数。
pub const fn zigzag32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

/// [`zigzag32`] 的逆映射。
pub const fn unzigzag32(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_thresholds_match_boundaries() {
        let cases = [
            (0, 1),
            (127, 1),
            (128, 2),
            (16_383, 2),
            (16_384, 3),
            (2_097_151, 3),
            (2_097_152, 4),
            (268_435_455, 4),
            (268_435_456, 5),
            (u32::MAX, 5),
        ];
        for (value, len) in cases {
            assert_eq!(encoded_len_u32(value), len, "value {value}");
        }
    }

    #[test]
    fn writes_little_end_first() {
        let mut buf = [0u8; MAX_VARINT32_LEN];
        assert_eq!(write_u32(150, &mut buf), 2);
        assert_eq!(&buf[..2], &[0x96, 0x01]);

        assert_eq!(write_u32(u32::MAX, &mut buf), 5);
        assert_eq!(buf, [0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
    }

    #[test]
    fn zigzag_maps_small_magnitudes() {
        assert_eq!(zigzag32(0), 0);
        assert_eq!(zigzag32(-1), 1);
        assert_eq!(zigzag32(1), 2);
        assert_eq!(zigzag32(-2), 3);
        assert_eq!(zigzag32(i32::MAX), u32::MAX - 1);
        assert_eq!(zigzag32(i32::MIN), u32::MAX);
        assert_eq!(unzigzag32(u32::MAX), i32::MIN);
    }
}
