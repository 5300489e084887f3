//! 密钥数据模型

use crate::utils::{KeyGenError, KeyGenResult};

/// 密钥最大长度
pub const MAX_KEY_LENGTH: usize = 1152;
/// 显示时每组的位数
pub const KEY_GROUP_SIZE: usize = 4;
/// 密钥字符集
pub const KEY_ALPHABET: &[u8] = b"0123456789";
/// 生成总时间上限（秒），一天
pub const MAX_TOTAL_TIME_SECS: u64 = 86_400;

/// 解析密钥长度输入
pub fn parse_key_length(input: &str) -> KeyGenResult<usize> {
    let length: i64 = input.trim().parse().map_err(|_| KeyGenError::NotANumber)?;
    if length <= 0 || length > MAX_KEY_LENGTH as i64 {
        return Err(KeyGenError::InvalidLength { max: MAX_KEY_LENGTH });
    }
    Ok(length as usize)
}

/// 解析设置窗口中的生成时间（整数秒，1 到一天）
pub fn parse_total_time_secs(input: &str) -> KeyGenResult<u64> {
    let secs: i64 = input.trim().parse().map_err(|_| KeyGenError::NotANumber)?;
    if secs <= 0 {
        return Err(KeyGenError::InvalidDuration);
    }
    let secs = secs as u64;
    if secs > MAX_TOTAL_TIME_SECS {
        return Err(KeyGenError::DurationTooLong { max: MAX_TOTAL_TIME_SECS });
    }
    Ok(secs)
}

/// 按每 4 位一组、空格分隔格式化密钥
pub fn format_key(key: &str) -> String {
    key.as_bytes()
        .chunks(KEY_GROUP_SIZE)
        .map(|chunk| String::from_utf8_lossy(chunk))
        .collect::<Vec<_>>()
        .join(" ")
}
