//! scrypt 算法插件
//!
//! 参数文本格式：`KeyLen=32,LogN=15,R=8,P=1`。
//! 校验只做静态检查，不做派生：scrypt 的参数错误都可以由 `scrypt::Params::new` 直接发现。

use serde::{Deserialize, Serialize};

use crate::encoder::params::{format_params, parse_number, split_params};
use crate::error::{Error, Result};
use crate::registry::Registry;

use super::Algorithm;

/// 记录中的算法标识
pub const ID: &str = "scrypt";

/// 默认输出长度（字节）
pub const DEFAULT_KEY_LEN: usize = 32;
/// 默认盐长度（字节）
pub const DEFAULT_SALT_LEN: usize = 16;
/// 默认 log2(N)
pub const DEFAULT_LOG_N: u8 = 15;
/// 默认块大小
pub const DEFAULT_R: u32 = 8;
/// 默认并行度
pub const DEFAULT_P: u32 = 1;

/// 输出长度上限（字节）
pub const MAX_KEY_LEN: usize = 64;

/// 工作内存上限（字节），即 1 GiB
///
/// scrypt 需要 `128 * R * (2^LogN + P)` 字节，记录中超过上限的参数在分配前就被拒绝。
pub const MAX_MEMORY_BYTES: u64 = 1 << 30;

const KEYS: [&str; 4] = ["KeyLen", "LogN", "R", "P"];

/// scrypt 参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScryptConfig {
    /// 输出长度（字节）
    pub key_len: usize,
    /// 盐长度（字节）
    pub salt_len: usize,
    /// CPU/内存代价 N 的以 2 为底的对数
    pub log_n: u8,
    /// 块大小
    pub r: u32,
    /// 并行度
    pub p: u32,
}

impl Default for ScryptConfig {
    fn default() -> Self {
        Self {
            key_len: DEFAULT_KEY_LEN,
            salt_len: DEFAULT_SALT_LEN,
            log_n: DEFAULT_LOG_N,
            r: DEFAULT_R,
            p: DEFAULT_P,
        }
    }
}

impl ScryptConfig {
    /// 设置输出长度
    pub fn with_key_len(mut self, key_len: usize) -> Self {
        self.key_len = key_len;
        self
    }

    /// 设置盐长度
    pub fn with_salt_len(mut self, salt_len: usize) -> Self {
        self.salt_len = salt_len;
        self
    }

    /// 设置 log2(N)
    pub fn with_log_n(mut self, log_n: u8) -> Self {
        self.log_n = log_n;
        self
    }

    /// 设置块大小
    pub fn with_r(mut self, r: u32) -> Self {
        self.r = r;
        self
    }

    /// 设置并行度
    pub fn with_p(mut self, p: u32) -> Self {
        self.p = p;
        self
    }

    /// `128 * R * (2^LogN + P)`，溢出时返回 `None`
    fn memory_bytes(&self) -> Option<u64> {
        1u64.checked_shl(u32::from(self.log_n))?
            .checked_add(u64::from(self.p))?
            .checked_mul(u64::from(self.r))?
            .checked_mul(128)
    }

    fn to_params(self) -> Result<::scrypt::Params> {
        ::scrypt::Params::new(self.log_n, self.r, self.p, self.key_len)
            .map_err(|e| Error::invalid_parameter("scrypt", e))
    }
}

/// scrypt 算法插件
#[derive(Debug, Clone, Copy, Default)]
pub struct Scrypt;

impl Algorithm for Scrypt {
    type Params = ScryptConfig;

    fn id(&self) -> &'static str {
        ID
    }

    fn validate(&self, params: &ScryptConfig) -> Result<()> {
        if params.log_n == 0 || params.log_n >= 64 {
            return Err(Error::invalid_parameter("LogN", params.log_n));
        }
        if params.key_len == 0 || params.key_len > MAX_KEY_LEN {
            return Err(Error::invalid_parameter("KeyLen", params.key_len));
        }
        if params.r == 0 {
            return Err(Error::invalid_parameter("R", params.r));
        }
        if params.p == 0 {
            return Err(Error::invalid_parameter("P", params.p));
        }
        if params.salt_len == 0 {
            return Err(Error::invalid_parameter("SaltLen", params.salt_len));
        }
        match params.memory_bytes() {
            Some(bytes) if bytes <= MAX_MEMORY_BYTES => {}
            _ => {
                let cost = format!("LogN={},R={},P={}", params.log_n, params.r, params.p);
                return Err(Error::invalid_parameter("Memory", cost));
            }
        }
        params.to_params().map(|_| ())
    }

    fn serialize_params(&self, params: &ScryptConfig) -> String {
        format_params(&[
            (KEYS[0], params.key_len.to_string()),
            (KEYS[1], params.log_n.to_string()),
            (KEYS[2], params.r.to_string()),
            (KEYS[3], params.p.to_string()),
        ])
    }

    fn parse_params(&self, text: &str, current: &ScryptConfig) -> Result<ScryptConfig> {
        let values = split_params(text, &KEYS)?;
        let params = ScryptConfig {
            key_len: parse_number(KEYS[0], values[0])?,
            salt_len: current.salt_len,
            log_n: parse_number(KEYS[1], values[1])?,
            r: parse_number(KEYS[2], values[2])?,
            p: parse_number(KEYS[3], values[3])?,
        };
        self.validate(&params)?;
        Ok(params)
    }

    fn salt_len(&self, params: &ScryptConfig) -> usize {
        params.salt_len
    }

    fn derive(&self, plaintext: &[u8], salt: &[u8], params: &ScryptConfig) -> Result<Vec<u8>> {
        let scrypt_params = params
            .to_params()
            .map_err(|e| Error::derivation(e.to_string()))?;
        let mut digest = vec![0u8; params.key_len];
        ::scrypt::scrypt(plaintext, salt, &scrypt_params, &mut digest)
            .map_err(|e| Error::derivation(format!("scrypt failed: {}", e)))?;
        Ok(digest)
    }

    fn at_least(&self, params: &ScryptConfig, reference: &ScryptConfig) -> bool {
        params.log_n >= reference.log_n
            && params.r >= reference.r
            && params.p >= reference.p
            && params.key_len >= reference.key_len
    }
}

/// 返回默认配置
pub fn get_config() -> ScryptConfig {
    ScryptConfig::default()
}

/// 校验配置并替换全局注册表中的 scrypt 编码器
pub fn set_config(config: ScryptConfig) -> Result<()> {
    Registry::global().register_algorithm(Scrypt, config)
}
