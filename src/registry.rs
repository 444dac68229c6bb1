//! 算法注册表
//!
//! 维护 `算法标识 -> 编码器` 的映射，以及一个用于新密码的默认算法。
//!
//! - 新密码使用默认编码器生成；
//! - 验证时根据记录中的算法标识找到对应的编码器；
//! - 重新注册同一个标识会整体替换编码器，不会修改正在使用的实例。
//!
//! 测试可以用 [`Registry::new`] 或 [`Registry::with_builtin`] 构造互相隔离的注册表，
//! 应用通常使用进程级的 [`Registry::global`]。
//!
//! ## 示例
//!
//! ```rust
//! use mcf::registry::{Registry, Verification};
//!
//! let registry = Registry::with_builtin().unwrap();
//!
//! let encoded = registry.generate("my_password").unwrap();
//! assert!(registry.verify("my_password", &encoded).unwrap());
//! assert!(!registry.verify("wrong_password", &encoded).unwrap());
//!
//! // 登录成功后顺便检查是否需要升级
//! match registry.verify_and_upgrade("my_password", &encoded).unwrap() {
//!     Verification::Valid => {}
//!     Verification::ValidUpgraded(new_encoding) => { /* 保存 new_encoding */ }
//!     Verification::Invalid => unreachable!(),
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};

use log::{debug, error, warn};

use crate::algorithm::Algorithm;
use crate::encoder::{Bridge, Encoder, Record, validate_algorithm_id};
use crate::error::{ConfigError, Error, Result};
use crate::random::{OsSaltProvider, SaltProvider, SharedSaltProvider};

/// 验证并升级的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// 密码错误
    Invalid,
    /// 密码正确，记录仍然是最新的
    Valid,
    /// 密码正确，记录已过时；附带用默认算法重新生成的记录，调用方应保存它
    ValidUpgraded(String),
}

impl Verification {
    /// 密码是否正确
    pub fn is_valid(&self) -> bool {
        !matches!(self, Verification::Invalid)
    }
}

/// 算法注册表
pub struct Registry {
    encoders: RwLock<HashMap<String, Arc<dyn Encoder>>>,
    default_id: RwLock<Option<String>>,
    salt_provider: Arc<SharedSaltProvider>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// 创建空的注册表，盐值来自操作系统随机数
    pub fn new() -> Self {
        Self::with_salt_provider(Arc::new(OsSaltProvider))
    }

    /// 创建空的注册表，使用指定的盐值来源
    ///
    /// 通过 [`register_algorithm`](Registry::register_algorithm) 注册的编码器都使用这个来源，
    /// 之后可以用 [`set_salt_provider`](Registry::set_salt_provider) 替换。
    pub fn with_salt_provider(salt_provider: Arc<dyn SaltProvider>) -> Self {
        Self {
            encoders: RwLock::new(HashMap::new()),
            default_id: RwLock::new(None),
            salt_provider: Arc::new(SharedSaltProvider::new(salt_provider)),
        }
    }

    /// 替换盐值来源
    ///
    /// 对已经注册和之后注册的编码器都立即生效。
    pub fn set_salt_provider(&self, salt_provider: Arc<dyn SaltProvider>) -> Result<()> {
        self.salt_provider.replace(salt_provider)?;
        debug!("salt provider replaced");
        Ok(())
    }

    /// 创建注册了所有已启用内置算法（默认配置）的注册表
    ///
    /// 默认算法依次优先选择 argon2、pbkdf2、scrypt。
    pub fn with_builtin() -> Result<Self> {
        let registry = Self::new();
        registry.install_builtin()?;
        Ok(registry)
    }

    /// 进程级注册表
    ///
    /// 第一次访问时创建并注册所有内置算法。内置算法注册失败只记录日志，
    /// 之后的 `lookup` / `default_encoder` 会返回相应错误。
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(|| {
            let registry = Registry::new();
            if let Err(e) = registry.install_builtin() {
                error!("failed to install built-in password algorithms: {}", e);
            }
            registry
        })
    }

    /// 注册所有已启用的内置算法并设置默认算法
    pub fn install_builtin(&self) -> Result<()> {
        #[cfg(feature = "scrypt")]
        {
            use crate::algorithm::scrypt;
            self.register_algorithm(scrypt::Scrypt, scrypt::get_config())?;
            self.set_default(scrypt::ID)?;
        }
        #[cfg(feature = "pbkdf2")]
        {
            use crate::algorithm::pbkdf2;
            self.register_algorithm(pbkdf2::Pbkdf2, pbkdf2::get_config())?;
            self.set_default(pbkdf2::ID)?;
        }
        #[cfg(feature = "argon2")]
        {
            use crate::algorithm::argon2;
            self.register_algorithm(argon2::Argon2, argon2::get_config())?;
            self.set_default(argon2::ID)?;
        }
        Ok(())
    }

    /// 校验配置，构造编码器并注册
    ///
    /// 配置按值移入编码器，调用方之后对自己那份配置的修改不会影响已注册的编码器。
    ///
    /// # Errors
    ///
    /// 配置校验失败时返回错误，原有的编码器保持不变。
    pub fn register_algorithm<A: Algorithm>(&self, algorithm: A, config: A::Params) -> Result<()> {
        let salt_provider: Arc<dyn SaltProvider> = self.salt_provider.clone();
        let bridge = Bridge::with_salt_provider(algorithm, config, salt_provider)?;
        self.register(Arc::new(bridge))
    }

    /// 注册或替换编码器，最后一次注册生效
    pub fn register(&self, encoder: Arc<dyn Encoder>) -> Result<()> {
        let id = encoder.id().to_string();
        validate_algorithm_id(&id)?;

        let mut encoders = self
            .encoders
            .write()
            .map_err(|_| ConfigError::LockPoisoned)?;
        let replaced = encoders.insert(id.clone(), encoder).is_some();

        debug!(
            "{} password encoder '{}'",
            if replaced { "replaced" } else { "registered" },
            id
        );
        Ok(())
    }

    /// 查找编码器
    pub fn lookup(&self, id: &str) -> Result<Arc<dyn Encoder>> {
        let encoders = self
            .encoders
            .read()
            .map_err(|_| ConfigError::LockPoisoned)?;
        encoders.get(id).cloned().ok_or_else(|| {
            warn!("no password encoder registered for '{}'", id);
            Error::UnknownAlgorithm(id.to_string())
        })
    }

    /// 已注册的算法标识（排序后）
    pub fn ids(&self) -> Result<Vec<String>> {
        let encoders = self
            .encoders
            .read()
            .map_err(|_| ConfigError::LockPoisoned)?;
        let mut ids: Vec<String> = encoders.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    /// 设置默认算法，必须是已注册的标识
    pub fn set_default(&self, id: &str) -> Result<()> {
        self.lookup(id)?;
        let mut default_id = self
            .default_id
            .write()
            .map_err(|_| ConfigError::LockPoisoned)?;
        *default_id = Some(id.to_string());
        debug!("default password algorithm set to '{}'", id);
        Ok(())
    }

    /// 当前默认算法标识
    pub fn default_id(&self) -> Result<Option<String>> {
        let default_id = self
            .default_id
            .read()
            .map_err(|_| ConfigError::LockPoisoned)?;
        Ok(default_id.clone())
    }

    /// 默认编码器
    pub fn default_encoder(&self) -> Result<Arc<dyn Encoder>> {
        let id = self.default_id()?.ok_or(ConfigError::NoDefault)?;
        self.lookup(&id)
    }

    /// 使用默认算法生成新记录
    pub fn generate(&self, plaintext: impl AsRef<[u8]>) -> Result<String> {
        self.default_encoder()?.generate(plaintext.as_ref())
    }

    /// 使用指定算法生成新记录
    pub fn generate_with(&self, id: &str, plaintext: impl AsRef<[u8]>) -> Result<String> {
        self.lookup(id)?.generate(plaintext.as_ref())
    }

    /// 根据记录中的算法标识验证密码
    ///
    /// 密码错误返回 `Ok(false)`；记录格式错误或算法未注册返回 `Err`。
    pub fn verify(&self, plaintext: impl AsRef<[u8]>, encoded: &str) -> Result<bool> {
        let record = Record::parse(encoded)?;
        self.lookup(&record.algorithm_id)?
            .verify(plaintext.as_ref(), encoded)
    }

    /// 记录是否由默认算法以不弱于当前配置的参数生成
    ///
    /// 记录属于非默认算法时返回 `false`，但算法仍需已注册。
    pub fn is_current(&self, encoded: &str) -> Result<bool> {
        let record = Record::parse(encoded)?;
        let encoder = self.lookup(&record.algorithm_id)?;
        let default_id = self.default_id()?.ok_or(ConfigError::NoDefault)?;

        if record.algorithm_id != default_id {
            debug!(
                "record uses '{}' but the default algorithm is '{}'",
                record.algorithm_id, default_id
            );
            return Ok(false);
        }
        encoder.is_current(encoded)
    }

    /// 验证密码，并在记录过时时用默认算法重新生成
    pub fn verify_and_upgrade(
        &self,
        plaintext: impl AsRef<[u8]>,
        encoded: &str,
    ) -> Result<Verification> {
        let plaintext = plaintext.as_ref();
        if !self.verify(plaintext, encoded)? {
            return Ok(Verification::Invalid);
        }
        if self.is_current(encoded)? {
            return Ok(Verification::Valid);
        }
        Ok(Verification::ValidUpgraded(self.generate(plaintext)?))
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("ids", &self.ids().unwrap_or_default())
            .field("default_id", &self.default_id().ok().flatten())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// 便捷函数（进程级注册表）
// ============================================================================

/// 使用全局注册表的默认算法生成新记录
///
/// # Example
///
/// ```rust
/// let encoded = mcf::generate("my_secure_password").unwrap();
/// assert!(mcf::verify("my_secure_password", &encoded).unwrap());
/// ```
pub fn generate(plaintext: impl AsRef<[u8]>) -> Result<String> {
    Registry::global().generate(plaintext)
}

/// 使用全局注册表验证密码
pub fn verify(plaintext: impl AsRef<[u8]>, encoded: &str) -> Result<bool> {
    Registry::global().verify(plaintext, encoded)
}

/// 使用全局注册表检查记录是否需要重新生成
pub fn is_current(encoded: &str) -> Result<bool> {
    Registry::global().is_current(encoded)
}

/// 替换全局注册表的盐值来源，通常只在测试中使用
pub fn set_salt_provider(salt_provider: Arc<dyn SaltProvider>) -> Result<()> {
    Registry::global().set_salt_provider(salt_provider)
}
