//! 统一错误类型模块
//!
//! 提供 mcf 库中所有操作的错误类型定义。
//!
//! 注意 `Verify` 的约定：密码错误返回 `Ok(false)`，而不是错误。
//! 只有记录损坏、参数非法、算法未注册或派生失败才会返回 `Err`。

use std::fmt;

/// mcf 库的统一结果类型
pub type Result<T> = std::result::Result<T, Error>;

/// mcf 库的错误类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// 配置参数校验失败
    InvalidParameter {
        /// 参数名
        name: String,
        /// 非法的取值
        value: String,
    },

    /// 存储记录或参数文本解析失败
    Parse(ParseError),

    /// 记录中的算法标识未注册
    UnknownAlgorithm(String),

    /// 密钥派生失败
    Derivation(String),

    /// 盐值生成失败
    Randomness(String),

    /// 注册表配置错误
    Config(ConfigError),
}

impl Error {
    /// 创建一个参数校验错误
    pub fn invalid_parameter(name: impl Into<String>, value: impl ToString) -> Self {
        Error::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
        }
    }

    /// 创建一个派生错误
    pub fn derivation(msg: impl Into<String>) -> Self {
        Error::Derivation(msg.into())
    }

    /// 创建一个参数文本解析错误
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Error::Parse(ParseError::InvalidParams(msg.into()))
    }
}

/// 解析相关错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// 记录没有以分隔符开头
    MissingSeparator,
    /// 字段数量不对
    FieldCount { expected: usize, found: usize },
    /// 二进制字段不是合法的 base64
    InvalidBase64 { field: &'static str, message: String },
    /// 参数文本格式错误
    InvalidParams(String),
    /// 算法标识为空或包含分隔符
    InvalidAlgorithmId(String),
    /// 记录属于另一个算法（调用方路由错误）
    AlgorithmMismatch { expected: String, found: String },
}

/// 注册表相关错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// 没有设置默认算法
    NoDefault,
    /// 内部锁被毒化
    LockPoisoned,
}

// ============================================================================
// Display 实现
// ============================================================================

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidParameter { name, value } => {
                write!(f, "parameter {} has invalid value: {}", name, value)
            }
            Error::Parse(e) => write!(f, "Parse error: {}", e),
            Error::UnknownAlgorithm(id) => write!(f, "unknown algorithm: {}", id),
            Error::Derivation(msg) => write!(f, "key derivation failed: {}", msg),
            Error::Randomness(msg) => write!(f, "salt generation failed: {}", msg),
            Error::Config(e) => write!(f, "Config error: {}", e),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MissingSeparator => write!(f, "record must start with a separator"),
            ParseError::FieldCount { expected, found } => {
                write!(f, "expected {} fields, found {}", expected, found)
            }
            ParseError::InvalidBase64 { field, message } => {
                write!(f, "field '{}' is not valid base64: {}", field, message)
            }
            ParseError::InvalidParams(msg) => write!(f, "invalid params: {}", msg),
            ParseError::InvalidAlgorithmId(id) => write!(f, "invalid algorithm id: {:?}", id),
            ParseError::AlgorithmMismatch { expected, found } => {
                write!(
                    f,
                    "record belongs to algorithm '{}', not '{}'",
                    found, expected
                )
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoDefault => write!(f, "no default algorithm is set"),
            ConfigError::LockPoisoned => write!(f, "registry lock poisoned"),
        }
    }
}

// ============================================================================
// std::error::Error 实现
// ============================================================================

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(e) => Some(e),
            Error::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for ParseError {}
impl std::error::Error for ConfigError {}

// ============================================================================
// From 实现 - 方便错误转换
// ============================================================================

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::Parse(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}
