//! 注册表集成测试
//!
//! 测试按算法标识分发、默认算法切换、配置升级流程以及并发安全性。

use std::sync::Arc;
use std::thread;

use mcf::encoder::Record;
use mcf::error::{ConfigError, Error, ParseError};
use mcf::random::FixedSaltProvider;
use mcf::registry::{Registry, Verification};

/// 测试内置注册表包含所有启用的算法
#[test]
fn test_builtin_registry_contents() {
    let registry = Registry::with_builtin().unwrap();
    let ids = registry.ids().unwrap();

    #[cfg(feature = "argon2")]
    assert!(ids.contains(&"argon2".to_string()));
    #[cfg(feature = "pbkdf2")]
    assert!(ids.contains(&"pbkdf2".to_string()));
    #[cfg(feature = "scrypt")]
    assert!(ids.contains(&"scrypt".to_string()));

    #[cfg(feature = "argon2")]
    assert_eq!(registry.default_id().unwrap().as_deref(), Some("argon2"));
}

/// 测试基本的生成、验证流程
#[test]
fn test_generate_and_verify() {
    let registry = Registry::with_builtin().unwrap();

    let encoded = registry.generate("my_password").unwrap();
    assert!(registry.verify("my_password", &encoded).unwrap());
    assert!(!registry.verify("not_my_password", &encoded).unwrap());
    assert!(registry.is_current(&encoded).unwrap());
}

/// 测试验证时按记录中的算法标识分发，而不是使用默认算法
#[test]
#[cfg(all(feature = "argon2", feature = "pbkdf2"))]
fn test_verify_dispatches_by_record_id() {
    let registry = Registry::with_builtin().unwrap();

    let argon2_record = registry.generate_with("argon2", "pw").unwrap();
    let pbkdf2_record = registry.generate_with("pbkdf2", "pw").unwrap();

    assert!(registry.verify("pw", &argon2_record).unwrap());
    assert!(registry.verify("pw", &pbkdf2_record).unwrap());

    // 直接使用错误的编码器是调用方错误
    let argon2 = registry.lookup("argon2").unwrap();
    assert!(matches!(
        argon2.verify(b"pw", &pbkdf2_record),
        Err(Error::Parse(ParseError::AlgorithmMismatch { .. }))
    ));
}

/// 测试未注册的算法与格式错误是不同的错误
#[test]
fn test_error_kinds_are_distinct() {
    let registry = Registry::with_builtin().unwrap();

    let unknown = Record::new("bcrypt", "cost=12", vec![1; 16], vec![2; 23]).to_string();
    assert!(matches!(
        registry.verify("pw", &unknown),
        Err(Error::UnknownAlgorithm(id)) if id == "bcrypt"
    ));

    assert!(matches!(
        registry.verify("pw", "$argon2$only$three"),
        Err(Error::Parse(ParseError::FieldCount { .. }))
    ));

    assert!(matches!(
        registry.verify("pw", "$argon2$KeyLen=32,I=8,M=1024,P=4$!!$AAAA"),
        Err(Error::Parse(ParseError::InvalidBase64 { field: "salt", .. }))
    ));
}

/// 测试没有默认算法时生成失败
#[test]
fn test_generate_without_default() {
    let registry = Registry::new();
    assert!(matches!(
        registry.generate("pw"),
        Err(Error::Config(ConfigError::NoDefault))
    ));
}

/// 测试重新注册更强的配置后，旧记录仍可验证但不再是最新的
#[test]
#[cfg(feature = "argon2")]
fn test_reregistration_triggers_upgrade() {
    use mcf::algorithm::argon2::{self, Argon2};

    let registry = Registry::with_builtin().unwrap();
    let old = registry.generate("password").unwrap();

    registry
        .register_algorithm(Argon2, argon2::get_config().with_iterations(16))
        .unwrap();

    assert!(registry.verify("password", &old).unwrap());
    assert!(!registry.is_current(&old).unwrap());

    let upgraded = match registry.verify_and_upgrade("password", &old).unwrap() {
        Verification::ValidUpgraded(encoded) => encoded,
        other => panic!("expected an upgrade, got {:?}", other),
    };
    assert!(upgraded.contains("I=16"));
    assert_eq!(
        registry.verify_and_upgrade("password", &upgraded).unwrap(),
        Verification::Valid
    );
    assert_eq!(
        registry.verify_and_upgrade("wrong", &upgraded).unwrap(),
        Verification::Invalid
    );
}

/// 测试切换默认算法后，旧算法的记录需要升级
#[test]
#[cfg(all(feature = "argon2", feature = "pbkdf2"))]
fn test_switching_default_algorithm() {
    let registry = Registry::with_builtin().unwrap();
    let argon2_record = registry.generate("pw").unwrap();

    registry.set_default("pbkdf2").unwrap();
    assert!(!registry.is_current(&argon2_record).unwrap());

    let upgraded = registry.verify_and_upgrade("pw", &argon2_record).unwrap();
    match upgraded {
        Verification::ValidUpgraded(encoded) => assert!(encoded.starts_with("$pbkdf2$")),
        other => panic!("expected an upgrade, got {:?}", other),
    }
}

/// 测试注册失败不会替换已有的编码器
#[test]
#[cfg(feature = "argon2")]
fn test_failed_registration_keeps_encoder() {
    use mcf::algorithm::argon2::{self, Argon2};

    let registry = Registry::with_builtin().unwrap();
    let result = registry.register_algorithm(Argon2, argon2::get_config().with_memory(1));

    match result {
        Err(Error::InvalidParameter { name, value }) => {
            assert_eq!(name, "Memory");
            assert_eq!(value, "1");
        }
        other => panic!("expected invalid parameter, got {:?}", other),
    }

    let encoded = registry.generate("pw").unwrap();
    assert!(encoded.contains("M=1024"));
}

/// 测试注入的盐值来源被注册表中的编码器共享
#[test]
#[cfg(feature = "pbkdf2")]
fn test_injected_salt_provider() {
    use mcf::algorithm::pbkdf2::{self, Pbkdf2};

    let registry =
        Registry::with_salt_provider(Arc::new(FixedSaltProvider::new(b"saltsaltsaltsalt")));
    registry
        .register_algorithm(Pbkdf2, pbkdf2::get_config())
        .unwrap();
    registry.set_default("pbkdf2").unwrap();

    assert_eq!(
        registry.generate("password").unwrap(),
        "$pbkdf2$keylen=20,iterations=2000,hmac=SHA1$c2FsdHNhbHRzYWx0c2FsdA$fnG7SBqY0itr61VL1paR6y8lIv4"
    );
}

/// 测试多线程并发生成、验证和重新注册
#[test]
#[cfg(feature = "pbkdf2")]
fn test_concurrent_use() {
    use mcf::algorithm::pbkdf2::{self, Pbkdf2};

    let registry = Arc::new(Registry::new());
    registry
        .register_algorithm(Pbkdf2, pbkdf2::get_config())
        .unwrap();
    registry.set_default("pbkdf2").unwrap();

    let mut handles = Vec::new();

    for i in 0..8 {
        let registry = Arc::clone(&registry);
        handles.push(thread::spawn(move || {
            let password = format!("password-{}", i);
            for _ in 0..10 {
                let encoded = registry.generate(&password).unwrap();
                assert!(registry.verify(&password, &encoded).unwrap());
                assert!(!registry.verify("nope", &encoded).unwrap());
            }
        }));
    }

    // 同时不断替换 pbkdf2 的编码器
    {
        let registry = Arc::clone(&registry);
        handles.push(thread::spawn(move || {
            for n in 0..20 {
                let config = pbkdf2::get_config().with_iterations(1000 + n * 100);
                registry.register_algorithm(Pbkdf2, config).unwrap();
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

/// 测试替换盐值来源后重新注册的配置也生成确定性的记录
#[test]
#[cfg(feature = "argon2")]
fn test_salt_provider_survives_reconfiguration() {
    use mcf::algorithm::argon2::{self, Argon2};

    let registry = Registry::with_builtin().unwrap();
    registry
        .set_salt_provider(Arc::new(FixedSaltProvider::new(b"saltsaltsaltsalt")))
        .unwrap();

    let before = registry.generate("password").unwrap();
    assert_eq!(before, registry.generate("password").unwrap());

    registry
        .register_algorithm(Argon2, argon2::get_config().with_iterations(9))
        .unwrap();
    let after = registry.generate("password").unwrap();
    assert_eq!(after, registry.generate("password").unwrap());
    assert!(after.contains("I=9"));
    assert_ne!(before, after);
}

/// 测试记录中超大的输出长度返回错误，不会在分配内存时崩溃
#[test]
#[cfg(feature = "pbkdf2")]
fn test_oversized_keylen_record_is_error() {
    let registry = Registry::with_builtin().unwrap();
    let stored = "$pbkdf2$keylen=18446744073709551615,iterations=1,hmac=SHA1$c2FsdA$ZGln";

    assert!(matches!(
        registry.verify("password", stored),
        Err(Error::InvalidParameter { .. })
    ));
    assert!(registry.verify_and_upgrade("password", stored).is_err());
}
