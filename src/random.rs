//! 盐值与常量时间比较模块
//!
//! 提供可注入的盐值来源（[`SaltProvider`]）以及用于比较摘要的常量时间比较函数。
//!
//! 默认实现 [`OsSaltProvider`] 使用操作系统提供的密码学安全随机数生成器。
//! 测试时可以替换为 [`FixedSaltProvider`] 以获得确定性的输出；
//! [`SharedSaltProvider`] 允许在运行时整体替换注册表使用的来源。

use std::fmt;
use std::sync::{Arc, RwLock};

use rand::{TryRngCore, rngs::OsRng};

use crate::error::{ConfigError, Error, Result};

/// 盐值来源
///
/// 实现必须可以被多个线程并发调用。
pub trait SaltProvider: Send + Sync {
    /// 生成 `len` 字节的盐值
    fn next_salt(&self, len: usize) -> Result<Vec<u8>>;
}

/// 基于操作系统 CSPRNG 的盐值来源
#[derive(Debug, Clone, Copy, Default)]
pub struct OsSaltProvider;

impl SaltProvider for OsSaltProvider {
    fn next_salt(&self, len: usize) -> Result<Vec<u8>> {
        generate_random_bytes(len)
    }
}

/// 固定盐值来源，仅用于测试和可重现的输出
///
/// 按需循环或截断内部字节以满足请求的长度。
#[derive(Clone)]
pub struct FixedSaltProvider {
    bytes: Vec<u8>,
}

impl FixedSaltProvider {
    /// 创建新的固定盐值来源
    ///
    /// # Example
    ///
    /// ```rust
    /// use mcf::random::{FixedSaltProvider, SaltProvider};
    ///
    /// let provider = FixedSaltProvider::new(b"saltsaltsaltsalt");
    /// assert_eq!(provider.next_salt(4).unwrap(), b"salt");
    /// ```
    pub fn new(bytes: impl AsRef<[u8]>) -> Self {
        Self {
            bytes: bytes.as_ref().to_vec(),
        }
    }
}

impl fmt::Debug for FixedSaltProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedSaltProvider")
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl SaltProvider for FixedSaltProvider {
    fn next_salt(&self, len: usize) -> Result<Vec<u8>> {
        if self.bytes.is_empty() && len > 0 {
            return Err(Error::Randomness("fixed salt is empty".to_string()));
        }
        Ok(self.bytes.iter().copied().cycle().take(len).collect())
    }
}

/// 可以在运行时替换的盐值来源
///
/// 注册表把同一个实例交给它创建的所有编码器，替换内部来源后，
/// 已注册的编码器在下一次生成时就会使用新的来源。
pub struct SharedSaltProvider {
    inner: RwLock<Arc<dyn SaltProvider>>,
}

impl SharedSaltProvider {
    /// 创建新的共享盐值来源
    pub fn new(inner: Arc<dyn SaltProvider>) -> Self {
        Self {
            inner: RwLock::new(inner),
        }
    }

    /// 替换内部的盐值来源
    pub fn replace(&self, inner: Arc<dyn SaltProvider>) -> Result<()> {
        let mut current = self
            .inner
            .write()
            .map_err(|_| ConfigError::LockPoisoned)?;
        *current = inner;
        Ok(())
    }

    fn current(&self) -> Result<Arc<dyn SaltProvider>> {
        let current = self.inner.read().map_err(|_| ConfigError::LockPoisoned)?;
        Ok(Arc::clone(&*current))
    }
}

impl Default for SharedSaltProvider {
    fn default() -> Self {
        Self::new(Arc::new(OsSaltProvider))
    }
}

impl fmt::Debug for SharedSaltProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSaltProvider").finish_non_exhaustive()
    }
}

impl SaltProvider for SharedSaltProvider {
    fn next_salt(&self, len: usize) -> Result<Vec<u8>> {
        // 不在持有读锁时调用内部来源
        self.current()?.next_salt(len)
    }
}

/// 生成指定长度的随机字节数组
///
/// 使用操作系统提供的密码学安全随机数生成器 (CSPRNG)
///
/// # Arguments
///
/// * `length` - 要生成的字节数
///
/// # Example
///
/// ```rust
/// use mcf::random::generate_random_bytes;
///
/// let bytes = generate_random_bytes(16).unwrap();
/// assert_eq!(bytes.len(), 16);
/// ```
pub fn generate_random_bytes(length: usize) -> Result<Vec<u8>> {
    let mut bytes = vec![0u8; length];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| Error::Randomness(format!("{:?}", e)))?;
    Ok(bytes)
}

/// 常量时间比较两个字节切片
///
/// 用于比较摘要，防止时序攻击。长度不同时直接返回 false。
///
/// # Example
///
/// ```rust
/// use mcf::random::constant_time_compare;
///
/// assert!(constant_time_compare(b"digest", b"digest"));
/// assert!(!constant_time_compare(b"digest", b"digesT"));
/// ```
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    use subtle::ConstantTimeEq;
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_random_bytes() {
        let bytes = generate_random_bytes(32).unwrap();
        assert_eq!(bytes.len(), 32);

        // 两次生成不应相同
        let bytes2 = generate_random_bytes(32).unwrap();
        assert_ne!(bytes, bytes2);
    }

    #[test]
    fn test_os_salt_provider_length() {
        let provider = OsSaltProvider;
        assert_eq!(provider.next_salt(16).unwrap().len(), 16);
        assert!(provider.next_salt(0).unwrap().is_empty());
    }

    #[test]
    fn test_fixed_salt_provider_cycles() {
        let provider = FixedSaltProvider::new(b"abc");
        assert_eq!(provider.next_salt(7).unwrap(), b"abcabca");
        assert_eq!(provider.next_salt(2).unwrap(), b"ab");
    }

    #[test]
    fn test_fixed_salt_provider_empty() {
        let provider = FixedSaltProvider::new(b"");
        assert!(matches!(provider.next_salt(4), Err(Error::Randomness(_))));
        assert!(provider.next_salt(0).unwrap().is_empty());
    }

    #[test]
    fn test_shared_salt_provider_replace() {
        let shared = SharedSaltProvider::new(Arc::new(FixedSaltProvider::new(b"ab")));
        assert_eq!(shared.next_salt(3).unwrap(), b"aba");

        shared
            .replace(Arc::new(FixedSaltProvider::new(b"xyz")))
            .unwrap();
        assert_eq!(shared.next_salt(3).unwrap(), b"xyz");

        shared.replace(Arc::new(OsSaltProvider)).unwrap();
        assert_ne!(shared.next_salt(16).unwrap(), shared.next_salt(16).unwrap());
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare(b"hello", b"hello"));
        assert!(!constant_time_compare(b"hello", b"world"));
        assert!(!constant_time_compare(b"hello", b"hello!"));
        assert!(constant_time_compare(b"", b""));
    }
}
