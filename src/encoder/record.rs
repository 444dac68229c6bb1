//! 存储记录编解码
//!
//! 记录格式：`$<id>$<params>$<salt>$<digest>`
//!
//! - `id` 与 `params` 是纯文本，均不得包含分隔符 `$`；
//! - `salt` 与 `digest` 使用不带填充的标准 base64 编码（严格解码，拒绝非规范编码）。
//!
//! 这个格式一旦有记录落盘就不能再变化。

use std::fmt;
use std::str::FromStr;

use base64::{Engine, engine::general_purpose::STANDARD_NO_PAD};

use crate::error::{Error, ParseError, Result};

/// 记录字段分隔符
pub const SEPARATOR: char = '$';

/// 记录中的字段数（不含开头的空字段）
const FIELD_COUNT: usize = 4;

/// 一条已编码的密码记录
#[derive(Clone, PartialEq, Eq)]
pub struct Record {
    /// 算法标识
    pub algorithm_id: String,
    /// 算法参数文本
    pub params: String,
    /// 盐值
    pub salt: Vec<u8>,
    /// 摘要
    pub digest: Vec<u8>,
}

impl Record {
    /// 创建新的记录
    pub fn new(
        algorithm_id: impl Into<String>,
        params: impl Into<String>,
        salt: Vec<u8>,
        digest: Vec<u8>,
    ) -> Self {
        Self {
            algorithm_id: algorithm_id.into(),
            params: params.into(),
            salt,
            digest,
        }
    }

    /// 解析记录文本
    ///
    /// # Errors
    ///
    /// - 不以 `$` 开头：[`ParseError::MissingSeparator`]
    /// - 字段数不是 4：[`ParseError::FieldCount`]
    /// - 算法标识为空：[`ParseError::InvalidAlgorithmId`]
    /// - 盐值或摘要无法解码：[`ParseError::InvalidBase64`]
    ///
    /// # Example
    ///
    /// ```rust
    /// use mcf::encoder::Record;
    ///
    /// let record = Record::parse("$pbkdf2$keylen=20,iterations=2000,hmac=SHA1$c2FsdA$ZGlnZXN0").unwrap();
    /// assert_eq!(record.algorithm_id, "pbkdf2");
    /// assert_eq!(record.salt, b"salt");
    /// assert_eq!(record.digest, b"digest");
    /// ```
    pub fn parse(encoded: &str) -> Result<Self> {
        let body = encoded
            .strip_prefix(SEPARATOR)
            .ok_or(ParseError::MissingSeparator)?;

        let fields: Vec<&str> = body.split(SEPARATOR).collect();
        if fields.len() != FIELD_COUNT {
            return Err(ParseError::FieldCount {
                expected: FIELD_COUNT,
                found: fields.len(),
            }
            .into());
        }

        let algorithm_id = fields[0];
        validate_algorithm_id(algorithm_id)?;

        Ok(Self {
            algorithm_id: algorithm_id.to_string(),
            params: fields[1].to_string(),
            salt: decode_field("salt", fields[2])?,
            digest: decode_field("digest", fields[3])?,
        })
    }

    /// 编码为记录文本
    ///
    /// 参数文本包含分隔符时返回错误，因为这样的记录无法再被解析。
    pub fn encode(&self) -> Result<String> {
        validate_algorithm_id(&self.algorithm_id)?;
        if self.params.contains(SEPARATOR) {
            return Err(Error::invalid_params("params contain the record separator"));
        }
        Ok(self.to_string())
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{sep}{}{sep}{}{sep}{}{sep}{}",
            self.algorithm_id,
            self.params,
            STANDARD_NO_PAD.encode(&self.salt),
            STANDARD_NO_PAD.encode(&self.digest),
            sep = SEPARATOR
        )
    }
}

// 不输出盐值和摘要
impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("algorithm_id", &self.algorithm_id)
            .field("params", &self.params)
            .field("salt_len", &self.salt.len())
            .field("digest_len", &self.digest.len())
            .finish()
    }
}

impl FromStr for Record {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// 检查算法标识：非空且不含分隔符
pub fn validate_algorithm_id(id: &str) -> Result<()> {
    if id.is_empty() || id.contains(SEPARATOR) {
        return Err(ParseError::InvalidAlgorithmId(id.to_string()).into());
    }
    Ok(())
}

fn decode_field(field: &'static str, text: &str) -> Result<Vec<u8>> {
    STANDARD_NO_PAD.decode(text).map_err(|e| {
        ParseError::InvalidBase64 {
            field,
            message: e.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Record {
        Record::new(
            "argon2",
            "KeyLen=32,I=8,M=1024,P=4",
            b"saltsaltsaltsalt".to_vec(),
            vec![0u8, 1, 2, 254, 255],
        )
    }

    #[test]
    fn test_encode_layout() {
        let encoded = sample().encode().unwrap();
        assert_eq!(
            encoded,
            "$argon2$KeyLen=32,I=8,M=1024,P=4$c2FsdHNhbHRzYWx0c2FsdA$AAEC/v8"
        );
        assert_eq!(Record::parse(&encoded).unwrap(), sample());
    }

    #[test]
    fn test_from_str() {
        let encoded = sample().to_string();
        let record: Record = encoded.parse().unwrap();
        assert_eq!(record.algorithm_id, "argon2");
    }

    #[test]
    fn test_missing_leading_separator() {
        let result = Record::parse("argon2$p$c2FsdA$ZGlnZXN0");
        assert!(matches!(
            result,
            Err(Error::Parse(ParseError::MissingSeparator))
        ));
    }

    #[test]
    fn test_wrong_field_count() {
        let result = Record::parse("$argon2$p$c2FsdA");
        assert!(matches!(
            result,
            Err(Error::Parse(ParseError::FieldCount {
                expected: 4,
                found: 3
            }))
        ));

        let result = Record::parse("$argon2$p$c2FsdA$ZGlnZXN0$extra");
        assert!(matches!(
            result,
            Err(Error::Parse(ParseError::FieldCount { found: 5, .. }))
        ));
    }

    #[test]
    fn test_empty_algorithm_id() {
        let result = Record::parse("$$p$c2FsdA$ZGlnZXN0");
        assert!(matches!(
            result,
            Err(Error::Parse(ParseError::InvalidAlgorithmId(_)))
        ));
    }

    #[test]
    fn test_invalid_base64() {
        let result = Record::parse("$argon2$p$not*base64$ZGlnZXN0");
        assert!(matches!(
            result,
            Err(Error::Parse(ParseError::InvalidBase64 { field: "salt", .. }))
        ));

        // 带填充的编码不被接受
        let result = Record::parse("$argon2$p$c2FsdA$ZGlnZXN0==");
        assert!(matches!(
            result,
            Err(Error::Parse(ParseError::InvalidBase64 {
                field: "digest",
                ..
            }))
        ));
    }

    #[test]
    fn test_encode_rejects_separator_in_params() {
        let mut record = sample();
        record.params = "a=$".to_string();
        assert!(record.encode().is_err());

        let mut record = sample();
        record.algorithm_id = "arg$on2".to_string();
        assert!(record.encode().is_err());
    }

    #[test]
    fn test_debug_hides_bytes() {
        let debug = format!("{:?}", sample());
        assert!(debug.contains("salt_len: 16"));
        assert!(!debug.contains("saltsalt"));
    }
}
