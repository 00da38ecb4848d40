//! UTF-8 辅助。
//!
//! `&str` 已保证是合法 UTF-8，这里提供逐字符的手工写入路径，供不依赖原生缓冲拷贝的策略使用。

/// 编码后的字节长度。
pub fn length(text: &str) -> usize {
    text.len()
}

/// 将 `text` 逐字符编码进 `dst` 开头，返回写入字节数。
///
/// `dst` 至少需要 [`length`] 个字节，否则 panic。
pub fn write(text: &str, dst: &mut [u8]) -> usize {
    let mut offset = 0;
    for ch in text.chars() {
        offset += ch.encode_utf8(&mut dst[offset..]).len();
    }
    offset
}
