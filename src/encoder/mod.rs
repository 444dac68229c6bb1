//! 编码器模块
//!
//! [`Encoder`] 是所有算法对外暴露的统一能力：`generate`、`verify`、`is_current`。
//! [`Bridge`] 把任意 [`Algorithm`](crate::algorithm::Algorithm) 适配成 `Encoder`，
//! 负责记录布局、盐值生成和摘要比较，本身不包含任何算法相关的逻辑。
//!
//! ## 示例
//!
#![cfg_attr(feature = "pbkdf2", doc = "```rust")]
#![cfg_attr(not(feature = "pbkdf2"), doc = "```rust,ignore")]
//! use mcf::algorithm::pbkdf2::{Pbkdf2, Pbkdf2Config};
//! use mcf::encoder::{Bridge, Encoder};
//!
//! let encoder = Bridge::new(Pbkdf2, Pbkdf2Config::default()).unwrap();
//!
//! let encoded = encoder.generate(b"my_password").unwrap();
//! assert!(encoded.starts_with("$pbkdf2$"));
//!
//! assert!(encoder.verify(b"my_password", &encoded).unwrap());
//! assert!(!encoder.verify(b"wrong_password", &encoded).unwrap());
//! assert!(encoder.is_current(&encoded).unwrap());
//! ```

mod bridge;
pub mod params;
mod record;

pub use bridge::Bridge;
pub use record::{Record, SEPARATOR, validate_algorithm_id};

use crate::error::Result;

/// 把明文密码编码成可存储的记录
pub trait Encoder: Send + Sync {
    /// 记录中使用的算法标识，不包含分隔符
    fn id(&self) -> &str;

    /// 从明文生成新的编码记录
    ///
    /// 应用需要保存返回的记录供以后验证。
    fn generate(&self, plaintext: &[u8]) -> Result<String>;

    /// 验证明文是否与记录匹配
    ///
    /// 密码错误返回 `Ok(false)`；记录损坏、属于其他算法或派生失败返回 `Err`。
    fn verify(&self, plaintext: &[u8], encoded: &str) -> Result<bool>;

    /// 生成记录时使用的参数是否不弱于当前配置
    ///
    /// 返回 `false` 时应用应该在验证成功后（此时还持有明文）重新 `generate` 并保存。
    fn is_current(&self, encoded: &str) -> Result<bool>;
}
