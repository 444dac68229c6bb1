//! 参数文本子格式
//!
//! 参数文本是按固定顺序排列、以逗号分隔的 `key=value` 列表，例如
//! `keylen=20,iterations=2000,hmac=SHA1`。
//!
//! 解析规则：
//!
//! - 键必须按声明顺序逐个出现，不允许缺失、重排或多余的键；
//! - 最后一个值吞掉剩余的全部文本，因此自由文本（如哈希函数名）只能放在最后；
//! - 参数文本中不得出现记录分隔符 `$`。

use std::str::FromStr;

use crate::error::{Error, Result};

use super::record::SEPARATOR;

/// 按顺序拼接参数
pub fn format_params(pairs: &[(&str, String)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(",")
}

/// 按给定的键顺序拆分参数文本，返回与键一一对应的值
///
/// # Example
///
/// ```rust
/// use mcf::encoder::params::split_params;
///
/// let values = split_params("keylen=20,iterations=2000,hmac=SHA1", &["keylen", "iterations", "hmac"]).unwrap();
/// assert_eq!(values, vec!["20", "2000", "SHA1"]);
/// ```
pub fn split_params<'a>(text: &'a str, keys: &[&str]) -> Result<Vec<&'a str>> {
    if text.contains(SEPARATOR) {
        return Err(Error::invalid_params("params contain the record separator"));
    }

    let Some((last, leading)) = keys.split_last() else {
        return Err(Error::invalid_params("no params declared"));
    };

    let mut values = Vec::with_capacity(keys.len());
    let mut rest = text;

    for key in leading {
        let (value, remainder) = strip_key(rest, key)?
            .split_once(',')
            .ok_or_else(|| Error::invalid_params(format!("missing value after '{}'", key)))?;
        values.push(value);
        rest = remainder;
    }

    values.push(strip_key(rest, last)?);
    Ok(values)
}

fn strip_key<'a>(text: &'a str, key: &str) -> Result<&'a str> {
    text.strip_prefix(key)
        .and_then(|r| r.strip_prefix('='))
        .ok_or_else(|| Error::invalid_params(format!("expected key '{}'", key)))
}

/// 解析一个数值参数
pub fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    // 拒绝 "+8" 之类的写法，保证参数文本是规范形式
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::invalid_params(format!(
            "'{}' is not a number: {:?}",
            key, value
        )));
    }
    value
        .parse()
        .map_err(|_| Error::invalid_params(format!("'{}' is out of range: {}", key, value)))
}
