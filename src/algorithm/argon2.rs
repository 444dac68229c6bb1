//! Argon2 算法插件
//!
//! 使用 Argon2i（版本 0x13）。参数文本格式：`KeyLen=32,I=8,M=1024,P=4`。
//!
//! ## 示例
//!
//! ```rust
//! use mcf::algorithm::argon2::{self, Argon2};
//! use mcf::encoder::{Bridge, Encoder};
//!
//! // 把默认的工作量翻倍
//! let config = argon2::get_config().with_iterations(argon2::DEFAULT_ITERATIONS * 2);
//!
//! let encoder = Bridge::new(Argon2, config).unwrap();
//! let encoded = encoder.generate(b"password").unwrap();
//! assert!(encoded.starts_with("$argon2$KeyLen=32,I=16,M=1024,P=4$"));
//! ```

use ::argon2::{Algorithm as Variant, Params, Version};
use serde::{Deserialize, Serialize};

use crate::encoder::params::{format_params, parse_number, split_params};
use crate::error::{Error, Result};
use crate::registry::Registry;

use super::Algorithm;

/// 记录中的算法标识
pub const ID: &str = "argon2";

// 在低端服务器硬件上每次验证约 10ms
/// 默认输出长度（字节）
pub const DEFAULT_KEY_LEN: usize = 32;
/// 默认盐长度（字节）
pub const DEFAULT_SALT_LEN: usize = 16;
/// 默认迭代次数（CPU 代价）
pub const DEFAULT_ITERATIONS: u32 = 8;
/// 默认内存代价（KiB）
pub const DEFAULT_MEMORY: u32 = 1024;
/// 默认并行度
pub const DEFAULT_PARALLELISM: u32 = 4;

/// 输出长度上限（字节）
pub const MAX_KEY_LEN: usize = 1024;
/// 内存代价上限（KiB），即 1 GiB
pub const MAX_MEMORY: u32 = 1 << 20;

/// Argon2 要求盐至少 8 字节
const MIN_SALT_LEN: usize = 8;

const KEYS: [&str; 4] = ["KeyLen", "I", "M", "P"];

/// Argon2 参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Argon2Config {
    /// 输出长度（字节）
    pub key_len: usize,
    /// 盐长度（字节）
    pub salt_len: usize,
    /// CPU 代价
    pub iterations: u32,
    /// 内存代价（KiB）
    pub memory: u32,
    /// 并行度
    pub parallelism: u32,
}

impl Default for Argon2Config {
    fn default() -> Self {
        Self {
            key_len: DEFAULT_KEY_LEN,
            salt_len: DEFAULT_SALT_LEN,
            iterations: DEFAULT_ITERATIONS,
            memory: DEFAULT_MEMORY,
            parallelism: DEFAULT_PARALLELISM,
        }
    }
}

impl Argon2Config {
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

    /// 设置迭代次数
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    /// 设置内存代价（KiB）
    pub fn with_memory(mut self, memory: u32) -> Self {
        self.memory = memory;
        self
    }

    /// 设置并行度
    pub fn with_parallelism(mut self, parallelism: u32) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// 静态范围检查，不做派生
    ///
    /// 记录中的参数也走这里，所以上限必须在分配内存之前检查。
    fn check_ranges(&self) -> Result<()> {
        if self.key_len < Params::MIN_OUTPUT_LEN || self.key_len > MAX_KEY_LEN {
            return Err(Error::invalid_parameter("KeyLen", self.key_len));
        }
        if self.salt_len < MIN_SALT_LEN {
            return Err(Error::invalid_parameter("SaltLen", self.salt_len));
        }
        if self.iterations < Params::MIN_T_COST {
            return Err(Error::invalid_parameter("Iterations", self.iterations));
        }
        if self.parallelism < Params::MIN_P_COST || self.parallelism > Params::MAX_P_COST {
            return Err(Error::invalid_parameter("Parallelism", self.parallelism));
        }
        let min_memory = Params::MIN_M_COST.max(8 * self.parallelism);
        if self.memory < min_memory || self.memory > MAX_MEMORY {
            return Err(Error::invalid_parameter("Memory", self.memory));
        }
        Ok(())
    }
}

/// Argon2 算法插件
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2;

impl Algorithm for Argon2 {
    type Params = Argon2Config;

    fn id(&self) -> &'static str {
        ID
    }

    fn validate(&self, params: &Argon2Config) -> Result<()> {
        params.check_ranges()?;

        // 用固定输入真正派生一次，让底层实现报告剩下的问题
        self.derive(b"password", b"saltsalt", params)
            .map(|_| ())
            .map_err(|e| Error::invalid_parameter("Argon2", e))
    }

    fn serialize_params(&self, params: &Argon2Config) -> String {
        format_params(&[
            (KEYS[0], params.key_len.to_string()),
            (KEYS[1], params.iterations.to_string()),
            (KEYS[2], params.memory.to_string()),
            (KEYS[3], params.parallelism.to_string()),
        ])
    }

    fn parse_params(&self, text: &str, current: &Argon2Config) -> Result<Argon2Config> {
        let values = split_params(text, &KEYS)?;
        let params = Argon2Config {
            key_len: parse_number(KEYS[0], values[0])?,
            salt_len: current.salt_len,
            iterations: parse_number(KEYS[1], values[1])?,
            memory: parse_number(KEYS[2], values[2])?,
            parallelism: parse_number(KEYS[3], values[3])?,
        };
        params.check_ranges()?;
        Ok(params)
    }

    fn salt_len(&self, params: &Argon2Config) -> usize {
        params.salt_len
    }

    fn derive(&self, plaintext: &[u8], salt: &[u8], params: &Argon2Config) -> Result<Vec<u8>> {
        let argon2_params = Params::new(
            params.memory,
            params.iterations,
            params.parallelism,
            Some(params.key_len),
        )
        .map_err(|e| Error::derivation(format!("Argon2 params rejected: {}", e)))?;

        let hasher = ::argon2::Argon2::new(Variant::Argon2i, Version::V0x13, argon2_params);
        let mut digest = vec![0u8; params.key_len];
        hasher
            .hash_password_into(plaintext, salt, &mut digest)
            .map_err(|e| Error::derivation(format!("Argon2 hash failed: {}", e)))?;
        Ok(digest)
    }

    fn at_least(&self, params: &Argon2Config, reference: &Argon2Config) -> bool {
        params.iterations >= reference.iterations
            && params.memory >= reference.memory
            && params.parallelism >= reference.parallelism
            && params.key_len >= reference.key_len
    }
}

/// 返回默认配置
///
/// 可以修改返回值后传给 [`set_config`]。
pub fn get_config() -> Argon2Config {
    Argon2Config::default()
}

/// 校验配置并替换全局注册表中的 argon2 编码器
///
/// 最好在默认配置的副本上修改，除非所有参数都要改：
///
/// ```rust
/// use mcf::algorithm::argon2;
///
/// let mut config = argon2::get_config();
/// config.iterations *= 2;
/// argon2::set_config(config).unwrap();
/// ```
pub fn set_config(config: Argon2Config) -> Result<()> {
    Registry::global().register_algorithm(Argon2, config)
}
