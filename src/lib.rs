//! # mcf
//!
//! 可插拔的密码哈希框架。
//!
//! 应用只调用统一的 `generate` / `verify` / `is_current`，具体的哈希算法及其代价参数
//! 通过注册表按算法标识切换。算法标识写在每条存储记录里：
//!
//! ```text
//! $<id>$<params>$<salt-b64>$<digest-b64>
//! ```
//!
//! ## 功能特性
//!
//! - **算法插件**: 每个哈希族实现一次 [`Algorithm`] trait
//! - **编码桥**: [`Bridge`] 把插件适配成统一的 [`Encoder`]，负责记录布局、盐值和常量时间比较
//! - **注册表**: [`Registry`] 按算法标识分发，支持默认算法和整体替换
//! - **升级检测**: `is_current` 判断旧记录的参数是否弱于当前配置
//!
//! ## Features
//!
//! - `argon2` - Argon2i 插件（默认启用）
//! - `pbkdf2` - PBKDF2-HMAC 插件（默认启用）
//! - `scrypt` - scrypt 插件
//! - `full` - 启用所有插件
//!
//! ## 示例
//!
//! ```rust
//! // 使用进程级注册表的默认算法
//! let encoded = mcf::generate("my_secure_password").unwrap();
//!
//! assert!(mcf::verify("my_secure_password", &encoded).unwrap());
//! assert!(!mcf::verify("wrong_password", &encoded).unwrap());
//! assert!(mcf::is_current(&encoded).unwrap());
//! ```
//!
//! ## 提高代价参数
//!
#![cfg_attr(feature = "argon2", doc = "```rust")]
#![cfg_attr(not(feature = "argon2"), doc = "```rust,ignore")]
//! use mcf::algorithm::argon2;
//!
//! let old = mcf::generate("password").unwrap();
//!
//! let config = argon2::get_config().with_iterations(argon2::DEFAULT_ITERATIONS * 2);
//! argon2::set_config(config).unwrap();
//!
//! // 旧记录仍然可以验证，但需要重新生成
//! assert!(mcf::verify("password", &old).unwrap());
//! assert!(!mcf::is_current(&old).unwrap());
//! ```

pub mod algorithm;
pub mod encoder;
pub mod error;
pub mod random;
pub mod registry;

pub use error::{Error, Result};

// ============================================================================
// 核心类型导出
// ============================================================================

pub use algorithm::Algorithm;
pub use encoder::{Bridge, Encoder, Record};
pub use registry::{Registry, Verification, generate, is_current, set_salt_provider, verify};

// ============================================================================
// 盐值来源导出
// ============================================================================

pub use random::{
    FixedSaltProvider, OsSaltProvider, SaltProvider, SharedSaltProvider, constant_time_compare,
};
