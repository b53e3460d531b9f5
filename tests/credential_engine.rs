//! Credential operations against a recording client factory.
//!
//! Run with: cargo test --test credential_engine

mod common;

use aerospike_creds::credentials::Statements;
use aerospike_creds::database::{Database, StaticUserConfig, UsernameConfig};
use aerospike_creds::{Error, ErrorCategory, ErrorSanitizer, Aerospike};
use common::{admin_config, Call, MockFactory, Op};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

type Engine = ErrorSanitizer<Aerospike<MockFactory>>;

async fn initialised(factory: &MockFactory) -> Engine {
    let db = aerospike_creds::new(factory.clone());
    db.initialize(admin_config(), false)
        .await
        .expect("initialize");
    db
}

fn roles_statement() -> Statements {
    Statements::with_creation([r#"{ "roles": ["read", "user-admin"] }"#])
}

fn expiration() -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(1_590_451_200)
}

#[tokio::test]
async fn test_create_user() {
    let factory = MockFactory::new();
    let db = initialised(&factory).await;

    let credentials = db
        .create_user(&roles_statement(), &UsernameConfig::default(), expiration())
        .await
        .expect("create user");

    assert_eq!(
        factory.recorder.commands(),
        vec![Call::CreateUser {
            user: credentials.username.clone(),
            password: credentials.password.clone(),
            roles: vec!["read".into(), "user-admin".into()],
        }]
    );
    assert!(credentials.username.starts_with("v-"));
    assert!(credentials.password.starts_with("A1a-"));
}

#[tokio::test]
async fn test_create_user_connects_lazily_once() {
    let factory = MockFactory::new();
    let db = initialised(&factory).await;
    assert!(factory.recorder.connects().is_empty());

    for _ in 0..3 {
        db.create_user(&roles_statement(), &UsernameConfig::default(), expiration())
            .await
            .unwrap();
    }
    assert_eq!(factory.recorder.connects().len(), 1);
    assert_eq!(factory.recorder.commands().len(), 3);
}

#[tokio::test]
async fn test_create_user_with_names() {
    let factory = MockFactory::new();
    let db = initialised(&factory).await;

    let names = UsernameConfig {
        display_name: "testdisplay".into(),
        role_name: "testrole".into(),
    };
    let credentials = db
        .create_user(&roles_statement(), &names, expiration())
        .await
        .unwrap();

    assert!(credentials.username.contains("testdisplay"));
    assert!(credentials.username.contains("testrole"));
}

#[tokio::test]
async fn test_create_user_with_legacy_statement() {
    let factory = MockFactory::new();
    let db = initialised(&factory).await;

    let statements = Statements {
        creation_statements: r#"{"roles":["read"]}"#.into(),
        ..Default::default()
    };
    db.create_user(&statements, &UsernameConfig::default(), expiration())
        .await
        .unwrap();

    match factory.recorder.commands().as_slice() {
        [Call::CreateUser { roles, .. }] => assert_eq!(roles, &vec!["read".to_string()]),
        other => panic!("expected one create, got {:?}", other),
    }
}

#[tokio::test]
async fn test_create_user_statement_errors_make_no_remote_call() {
    let cases: Vec<(Statements, &str)> = vec![
        (Statements::default(), "empty creation statements"),
        (
            Statements::with_creation([r#"{ "roles": [] }"#]),
            "roles array is required in creation statement",
        ),
        (Statements::with_creation(["invalid_json"]), "invalid creation statement"),
    ];

    for (statements, expected) in cases {
        let factory = MockFactory::new();
        let db = initialised(&factory).await;

        let err = db
            .create_user(&statements, &UsernameConfig::default(), expiration())
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with(expected), "{}", err);
        assert_eq!(err.category(), ErrorCategory::Invariant);
        assert!(factory.recorder.calls().is_empty(), "{:?}", statements);
    }
}

#[tokio::test]
async fn test_create_user_db_error() {
    let factory = MockFactory::new();
    factory
        .recorder
        .fail(Op::CreateUser, 61, "Aerospike error creating user");
    let db = initialised(&factory).await;

    let err = db
        .create_user(&roles_statement(), &UsernameConfig::default(), expiration())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Server { code: 61, .. }));
    assert!(err.to_string().contains("Aerospike error creating user"));
    assert_eq!(err.category(), ErrorCategory::RemoteOperation);
}

#[tokio::test]
async fn test_set_credentials() {
    let factory = MockFactory::new();
    let db = initialised(&factory).await;

    let static_user = StaticUserConfig {
        username: "test_user".into(),
        password: "test_password".into(),
    };
    let credentials = db
        .set_credentials(&Statements::default(), &static_user)
        .await
        .unwrap();

    assert_eq!(credentials.username, "test_user");
    assert_eq!(credentials.password, "test_password");
    assert_eq!(
        factory.recorder.commands(),
        vec![Call::ChangePassword {
            user: "test_user".into(),
            password: "test_password".into(),
        }]
    );
}

#[tokio::test]
async fn test_set_credentials_db_error() {
    let factory = MockFactory::new();
    factory
        .recorder
        .fail(Op::ChangePassword, 60, "Aerospike error changing password");
    let db = initialised(&factory).await;

    let static_user = StaticUserConfig {
        username: "test_user".into(),
        password: "test_password".into(),
    };
    let err = db
        .set_credentials(&Statements::default(), &static_user)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Aerospike error changing password"));
}

#[tokio::test]
async fn test_renew_user_is_noop() {
    let factory = MockFactory::new();
    let db = initialised(&factory).await;

    db.renew_user(&Statements::default(), "test_user", expiration())
        .await
        .unwrap();
    assert!(factory.recorder.calls().is_empty());
}

#[tokio::test]
async fn test_revoke_user() {
    let factory = MockFactory::new();
    let db = initialised(&factory).await;

    db.revoke_user(&Statements::default(), "test_user")
        .await
        .unwrap();
    assert_eq!(
        factory.recorder.commands(),
        vec![Call::DropUser {
            user: "test_user".into()
        }]
    );
}

#[tokio::test]
async fn test_revoke_user_db_error() {
    let factory = MockFactory::new();
    factory
        .recorder
        .fail(Op::DropUser, 60, "Aerospike error dropping user");
    let db = initialised(&factory).await;

    let err = db
        .revoke_user(&Statements::default(), "test_user")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Aerospike error dropping user"));
}

#[tokio::test]
async fn test_operations_before_initialize() {
    let factory = MockFactory::new();
    let db = aerospike_creds::new(factory.clone());

    let err = db
        .create_user(&roles_statement(), &UsernameConfig::default(), expiration())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotInitialized));
    assert_eq!(err.to_string(), "connection has not been initialized");
    assert!(factory.recorder.calls().is_empty());
}

#[tokio::test]
async fn test_rotate_root_credentials() {
    let factory = MockFactory::new();
    let db = initialised(&factory).await;

    let config = db.rotate_root_credentials(&[]).await.unwrap();

    let new_password = match factory.recorder.commands().as_slice() {
        [Call::ChangePassword { user, password }] => {
            assert_eq!(user, "test_admin_user");
            password.clone()
        }
        other => panic!("expected one password change, got {:?}", other),
    };
    assert!(!new_password.is_empty());
    assert_ne!(new_password, "test_admin_password");
    assert_eq!(config.get("password"), Some(&Value::String(new_password.clone())));
    assert_eq!(config.get("username"), admin_config().get("username"));
    assert_eq!(config.get("host"), admin_config().get("host"));

    let secrets = db.secret_values();
    assert_eq!(secrets.len(), 1);
    assert!(secrets.contains_key(&new_password));
}

#[tokio::test]
async fn test_rotate_root_uses_new_password_on_reconnect() {
    let factory = MockFactory::new();
    let db = initialised(&factory).await;

    db.rotate_root_credentials(&[]).await.unwrap();
    let new_password = db.secret_values().into_keys().next().unwrap();

    factory.recorder.kill_connection();
    db.revoke_user(&Statements::default(), "someone")
        .await
        .unwrap();

    let connects = factory.recorder.connects();
    assert_eq!(connects.len(), 2);
    match &connects[1] {
        Call::Connect { password, .. } => assert_eq!(password, &new_password),
        other => panic!("expected connect, got {:?}", other),
    }
}

#[tokio::test]
async fn test_rotate_root_credentials_db_error_keeps_config() {
    let factory = MockFactory::new();
    factory
        .recorder
        .fail(Op::ChangePassword, 60, "Aerospike error changing password");
    let db = initialised(&factory).await;

    let err = db.rotate_root_credentials(&[]).await.unwrap_err();
    assert!(err.to_string().contains("Aerospike error changing password"));

    let secrets = db.secret_values();
    assert!(secrets.contains_key("test_admin_password"));

    // the stored password is still the one used to reconnect
    factory.recorder.clear_failures();
    factory.recorder.kill_connection();
    db.revoke_user(&Statements::default(), "someone")
        .await
        .unwrap();
    match factory.recorder.connects().last() {
        Some(Call::Connect { password, .. }) => assert_eq!(password, "test_admin_password"),
        other => panic!("expected connect, got {:?}", other),
    }
}

#[tokio::test]
async fn test_dead_connection_is_replaced_once() {
    let factory = MockFactory::new();
    let db = initialised(&factory).await;

    db.revoke_user(&Statements::default(), "a").await.unwrap();
    factory.recorder.kill_connection();
    db.revoke_user(&Statements::default(), "b").await.unwrap();

    let calls = factory.recorder.calls();
    let kinds: Vec<&str> = calls
        .iter()
        .map(|call| match call {
            Call::Connect { .. } => "connect",
            Call::DropUser { .. } => "drop",
            Call::Close => "close",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, vec!["connect", "drop", "close", "connect", "drop"]);
}

#[tokio::test]
async fn test_reconnect_failure_is_reported() {
    let factory = MockFactory::new();
    let db = initialised(&factory).await;

    db.revoke_user(&Statements::default(), "a").await.unwrap();
    factory.recorder.kill_connection();
    factory.recorder.fail(Op::Connect, 0, "unable to connect to any host");

    let err = db
        .revoke_user(&Statements::default(), "b")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("unable to connect"));
    assert_eq!(factory.recorder.commands().len(), 1);
}

#[tokio::test]
async fn test_errors_are_scrubbed_of_admin_password() {
    let factory = MockFactory::new();
    factory.recorder.fail(
        Op::CreateUser,
        65,
        "login failed for test_admin_user/test_admin_password",
    );
    let db = initialised(&factory).await;

    let err = db
        .create_user(&roles_statement(), &UsernameConfig::default(), expiration())
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(!message.contains("test_admin_password"), "{}", message);
    assert!(message.contains("test_admin_user/[password]"), "{}", message);
    assert_eq!(err.category(), ErrorCategory::RemoteOperation);
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let factory = MockFactory::new();
    let db = initialised(&factory).await;

    db.revoke_user(&Statements::default(), "a").await.unwrap();
    db.close().await.unwrap();
    db.close().await.unwrap();

    let closes = factory
        .recorder
        .calls()
        .into_iter()
        .filter(|call| *call == Call::Close)
        .count();
    assert_eq!(closes, 1);
}

#[tokio::test]
async fn test_operations_never_overlap() {
    let factory = MockFactory::new();
    factory.recorder.set_delay(Duration::from_millis(10));
    let db = Arc::new(initialised(&factory).await);

    let mut handles = Vec::new();
    for i in 0..8 {
        let db = db.clone();
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                db.revoke_user(&Statements::default(), &format!("user-{}", i))
                    .await
                    .map(|_| ())
            } else {
                db.create_user(&roles_statement(), &UsernameConfig::default(), expiration())
                    .await
                    .map(|_| ())
            }
        }));
    }

    for result in futures::future::join_all(handles).await {
        result.expect("task").expect("operation");
    }

    assert_eq!(factory.recorder.max_in_flight(), 1);
    assert_eq!(factory.recorder.commands().len(), 8);
    assert_eq!(factory.recorder.connects().len(), 1);
}

#[tokio::test]
async fn test_type_name() {
    let db = aerospike_creds::new(MockFactory::new());
    assert_eq!(db.type_name(), aerospike_creds::TYPE_NAME);
}
