//! 算法插件
//!
//! 每个哈希族（argon2、pbkdf2、scrypt……）实现一次 [`Algorithm`] trait，
//! 然后由 [`Bridge`](crate::encoder::Bridge) 适配成统一的 [`Encoder`](crate::encoder::Encoder)。
//!
//! 参数类型是关联类型，所以 `at_least` 只能比较同一算法的两份参数，
//! 不会出现拿错类型的运行时断言。
//!
//! ## Features
//!
//! - `argon2` - Argon2i（默认启用）
//! - `pbkdf2` - PBKDF2-HMAC（默认启用）
//! - `scrypt` - scrypt

use std::fmt::Debug;

use crate::error::Result;
use crate::random::SaltProvider;

#[cfg(feature = "argon2")]
pub mod argon2;

#[cfg(feature = "pbkdf2")]
pub mod pbkdf2;

#[cfg(feature = "scrypt")]
pub mod scrypt;

// 编译时检查：至少需要启用一个算法
#[cfg(not(any(feature = "argon2", feature = "pbkdf2", feature = "scrypt")))]
compile_error!(
    "At least one password hashing algorithm (argon2, pbkdf2, or scrypt) must be enabled."
);

/// 一个哈希族的能力集合
pub trait Algorithm: Send + Sync + 'static {
    /// 算法参数（代价、长度等可调项）
    type Params: Clone + Debug + PartialEq + Send + Sync + 'static;

    /// 算法标识，写入每条记录，永远不能改变，不得包含 `$`
    fn id(&self) -> &'static str;

    /// 校验参数
    ///
    /// 注册时和从文本重建参数时都会调用。某些算法只有真正派生一次才能发现问题，
    /// 这种情况下可以用固定输入做一次派生。
    fn validate(&self, params: &Self::Params) -> Result<()>;

    /// 参数的规范文本形式，不得包含 `$`
    fn serialize_params(&self, params: &Self::Params) -> String;

    /// 从规范文本解析参数
    ///
    /// 必须与 [`serialize_params`](Algorithm::serialize_params) 精确往返。
    /// 不在文本中的字段（例如盐长度）取自 `current`。
    fn parse_params(&self, text: &str, current: &Self::Params) -> Result<Self::Params>;

    /// 新盐值的长度
    fn salt_len(&self, params: &Self::Params) -> usize;

    /// 生成新盐值
    fn new_salt(&self, params: &Self::Params, provider: &dyn SaltProvider) -> Result<Vec<u8>> {
        provider.next_salt(self.salt_len(params))
    }

    /// 派生摘要，对固定输入必须是确定性的
    fn derive(&self, plaintext: &[u8], salt: &[u8], params: &Self::Params) -> Result<Vec<u8>>;

    /// `params` 的每一个代价维度是否都不低于 `reference`
    ///
    /// 逐维比较，而不是字典序。
    fn at_least(&self, params: &Self::Params, reference: &Self::Params) -> bool;
}
