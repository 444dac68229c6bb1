//! PBKDF2 算法插件
//!
//! 使用 HMAC 作为伪随机函数。参数文本格式：`keylen=20,iterations=2000,hmac=SHA1`。
//! 哈希函数名是唯一的文本字段，所以放在最后。

use std::fmt;
use std::str::FromStr;

use hmac::Hmac;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512};

use crate::encoder::params::{format_params, parse_number, split_params};
use crate::error::{Error, Result};
use crate::registry::Registry;

use super::Algorithm;

/// 记录中的算法标识
pub const ID: &str = "pbkdf2";

/// 默认迭代次数
pub const DEFAULT_ITERATIONS: u32 = 2000;
/// 默认盐长度（字节）
pub const DEFAULT_SALT_LEN: usize = 16;
/// 默认伪随机函数
pub const DEFAULT_PRF: Prf = Prf::Sha1;
/// 默认输出长度，等于默认 HMAC 的输出长度
pub const DEFAULT_KEY_LEN: usize = DEFAULT_PRF.size();
/// 输出长度上限（字节），记录中更大的值在分配前就被拒绝
pub const MAX_KEY_LEN: usize = 1024;

const KEYS: [&str; 3] = ["keylen", "iterations", "hmac"];

/// PBKDF2 使用的 HMAC 哈希函数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Prf {
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl Prf {
    /// 哈希输出长度（字节）
    pub const fn size(&self) -> usize {
        match self {
            Prf::Sha1 => 20,
            Prf::Sha224 => 28,
            Prf::Sha256 => 32,
            Prf::Sha384 => 48,
            Prf::Sha512 => 64,
        }
    }

    /// 记录中使用的名称
    pub fn name(&self) -> &'static str {
        match self {
            Prf::Sha1 => "SHA1",
            Prf::Sha224 => "SHA224",
            Prf::Sha256 => "SHA256",
            Prf::Sha384 => "SHA384",
            Prf::Sha512 => "SHA512",
        }
    }
}

impl fmt::Display for Prf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Prf {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SHA1" => Ok(Prf::Sha1),
            "SHA224" => Ok(Prf::Sha224),
            "SHA256" => Ok(Prf::Sha256),
            "SHA384" => Ok(Prf::Sha384),
            "SHA512" => Ok(Prf::Sha512),
            other => Err(Error::invalid_parameter("hmac", other)),
        }
    }
}

/// PBKDF2 参数
///
/// 修改 `hash` 时通常也要修改 `key_len`，因为不同哈希函数的输出长度不同。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pbkdf2Config {
    /// 伪随机函数
    pub hash: Prf,
    /// 迭代次数，RFC 建议至少 1000
    pub iterations: u32,
    /// 输出长度（字节）
    pub key_len: usize,
    /// 盐长度（字节），RFC 建议至少 8
    pub salt_len: usize,
}

impl Default for Pbkdf2Config {
    fn default() -> Self {
        Self {
            hash: DEFAULT_PRF,
            iterations: DEFAULT_ITERATIONS,
            key_len: DEFAULT_KEY_LEN,
            salt_len: DEFAULT_SALT_LEN,
        }
    }
}

impl Pbkdf2Config {
    /// 切换哈希函数，同时把输出长度设为该哈希的输出长度
    pub fn with_hash(mut self, hash: Prf) -> Self {
        self.hash = hash;
        self.key_len = hash.size();
        self
    }

    /// 设置迭代次数
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

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
}

/// PBKDF2 算法插件
#[derive(Debug, Clone, Copy, Default)]
pub struct Pbkdf2;

impl Algorithm for Pbkdf2 {
    type Params = Pbkdf2Config;

    fn id(&self) -> &'static str {
        ID
    }

    fn validate(&self, params: &Pbkdf2Config) -> Result<()> {
        if params.iterations == 0 {
            return Err(Error::invalid_parameter("iterations", params.iterations));
        }
        if params.key_len == 0 || params.key_len > MAX_KEY_LEN {
            return Err(Error::invalid_parameter("keylen", params.key_len));
        }
        if params.salt_len == 0 {
            return Err(Error::invalid_parameter("saltlen", params.salt_len));
        }
        Ok(())
    }

    fn serialize_params(&self, params: &Pbkdf2Config) -> String {
        format_params(&[
            (KEYS[0], params.key_len.to_string()),
            (KEYS[1], params.iterations.to_string()),
            (KEYS[2], params.hash.to_string()),
        ])
    }

    fn parse_params(&self, text: &str, current: &Pbkdf2Config) -> Result<Pbkdf2Config> {
        let values = split_params(text, &KEYS)?;
        let params = Pbkdf2Config {
            key_len: parse_number(KEYS[0], values[0])?,
            iterations: parse_number(KEYS[1], values[1])?,
            hash: values[2].parse()?,
            salt_len: current.salt_len,
        };
        self.validate(&params)?;
        Ok(params)
    }

    fn salt_len(&self, params: &Pbkdf2Config) -> usize {
        params.salt_len
    }

    fn derive(&self, plaintext: &[u8], salt: &[u8], params: &Pbkdf2Config) -> Result<Vec<u8>> {
        use ::pbkdf2::pbkdf2;

        let mut digest = vec![0u8; params.key_len];
        let rounds = params.iterations;
        let result = match params.hash {
            Prf::Sha1 => pbkdf2::<Hmac<Sha1>>(plaintext, salt, rounds, &mut digest),
            Prf::Sha224 => pbkdf2::<Hmac<Sha224>>(plaintext, salt, rounds, &mut digest),
            Prf::Sha256 => pbkdf2::<Hmac<Sha256>>(plaintext, salt, rounds, &mut digest),
            Prf::Sha384 => pbkdf2::<Hmac<Sha384>>(plaintext, salt, rounds, &mut digest),
            Prf::Sha512 => pbkdf2::<Hmac<Sha512>>(plaintext, salt, rounds, &mut digest),
        };
        result.map_err(|e| Error::derivation(format!("PBKDF2 failed: {}", e)))?;
        Ok(digest)
    }

    fn at_least(&self, params: &Pbkdf2Config, reference: &Pbkdf2Config) -> bool {
        // 哈希函数之间没有强弱顺序，换了就需要重新生成
        params.hash == reference.hash
            && params.iterations >= reference.iterations
            && params.key_len >= reference.key_len
    }
}

/// 返回默认配置
pub fn get_config() -> Pbkdf2Config {
    Pbkdf2Config::default()
}

/// 为 pbkdf2 设置新的默认配置
///
/// 只有 pbkdf2 是默认算法时才有必要设置。
///
/// ```rust
/// use mcf::algorithm::pbkdf2::{self, Prf};
///
/// let config = pbkdf2::get_config()
///     .with_iterations(pbkdf2::DEFAULT_ITERATIONS * 3 / 2)
///     .with_hash(Prf::Sha256);
/// pbkdf2::set_config(config).unwrap();
/// ```
pub fn set_config(config: Pbkdf2Config) -> Result<()> {
    Registry::global().register_algorithm(Pbkdf2, config)
}
