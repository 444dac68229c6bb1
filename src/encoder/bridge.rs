//! 通用编码桥
//!
//! 把一个算法插件和一份配置组合成 [`Encoder`]。

use std::fmt;
use std::sync::Arc;

use log::{debug, warn};

use crate::algorithm::Algorithm;
use crate::error::{ParseError, Result};
use crate::random::{OsSaltProvider, SaltProvider, constant_time_compare};

use super::Encoder;
use super::record::{Record, validate_algorithm_id};

/// 算法无关的编码器实现
///
/// 配置在构造时按值保存，之后不会再被修改；需要新配置时构造新的 `Bridge` 整体替换。
pub struct Bridge<A: Algorithm> {
    algorithm: A,
    config: A::Params,
    salt_provider: Arc<dyn SaltProvider>,
}

impl<A: Algorithm> Bridge<A> {
    /// 使用操作系统随机数作为盐值来源创建编码器
    ///
    /// # Errors
    ///
    /// 算法标识非法或配置校验失败时返回错误。
    pub fn new(algorithm: A, config: A::Params) -> Result<Self> {
        Self::with_salt_provider(algorithm, config, Arc::new(OsSaltProvider))
    }

    /// 使用指定的盐值来源创建编码器
    pub fn with_salt_provider(
        algorithm: A,
        config: A::Params,
        salt_provider: Arc<dyn SaltProvider>,
    ) -> Result<Self> {
        validate_algorithm_id(algorithm.id())?;
        algorithm.validate(&config)?;
        Ok(Self {
            algorithm,
            config,
            salt_provider,
        })
    }

    /// 当前配置
    pub fn config(&self) -> &A::Params {
        &self.config
    }

    /// 底层算法
    pub fn algorithm(&self) -> &A {
        &self.algorithm
    }

    /// 解析属于本算法的记录
    fn parse_own(&self, encoded: &str) -> Result<(Record, A::Params)> {
        let record = Record::parse(encoded)?;
        if record.algorithm_id != self.algorithm.id() {
            warn!(
                "{} encoder received a record for '{}'",
                self.algorithm.id(),
                record.algorithm_id
            );
            return Err(ParseError::AlgorithmMismatch {
                expected: self.algorithm.id().to_string(),
                found: record.algorithm_id,
            }
            .into());
        }
        let params = self.algorithm.parse_params(&record.params, &self.config)?;
        Ok((record, params))
    }
}

impl<A: Algorithm> Encoder for Bridge<A> {
    fn id(&self) -> &str {
        self.algorithm.id()
    }

    fn generate(&self, plaintext: &[u8]) -> Result<String> {
        let salt = self
            .algorithm
            .new_salt(&self.config, self.salt_provider.as_ref())?;
        let digest = self.algorithm.derive(plaintext, &salt, &self.config)?;

        Record::new(
            self.algorithm.id(),
            self.algorithm.serialize_params(&self.config),
            salt,
            digest,
        )
        .encode()
    }

    fn verify(&self, plaintext: &[u8], encoded: &str) -> Result<bool> {
        let (record, params) = self.parse_own(encoded)?;
        let digest = self.algorithm.derive(plaintext, &record.salt, &params)?;
        Ok(constant_time_compare(&digest, &record.digest))
    }

    fn is_current(&self, encoded: &str) -> Result<bool> {
        let (record, params) = self.parse_own(encoded)?;

        // 盐长度不在参数文本里，用解码后的盐值长度作为一个维度
        let salt_ok = record.salt.len() >= self.algorithm.salt_len(&self.config);
        let current = salt_ok && self.algorithm.at_least(&params, &self.config);

        if !current {
            debug!(
                "{} record with params '{}' is weaker than the current configuration",
                self.algorithm.id(),
                record.params
            );
        }
        Ok(current)
    }
}

impl<A: Algorithm> fmt::Debug for Bridge<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("id", &self.algorithm.id())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
