//! Shared helpers for the engine tests: a recording client factory with
//! injectable failures.

#![allow(dead_code)]

use aerospike_creds::client::{AdminClient, ClientFactory, Endpoint};
use aerospike_creds::connection::ClientPolicy;
use aerospike_creds::producer::RawConfig;
use aerospike_creds::{Error, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One observed call against the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect {
        user: String,
        password: String,
        hosts: Vec<Endpoint>,
        tls: bool,
    },
    CreateUser {
        user: String,
        password: String,
        roles: Vec<String>,
    },
    DropUser {
        user: String,
    },
    ChangePassword {
        user: String,
        password: String,
    },
    Close,
}

/// Which client operation a failure is injected into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Connect,
    CreateUser,
    DropUser,
    ChangePassword,
}

#[derive(Default)]
pub struct Recorder {
    calls: Mutex<Vec<Call>>,
    failures: Mutex<Vec<(Op, u8, String)>>,
    alive: AtomicBool,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Mutex<Duration>,
}

impl Recorder {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn connects(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Connect { .. }))
            .collect()
    }

    /// Calls other than connect and close
    pub fn commands(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| !matches!(call, Call::Connect { .. } | Call::Close))
            .collect()
    }

    /// Make `op` fail with a server error until cleared
    pub fn fail(&self, op: Op, code: u8, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .push((op, code, message.to_string()));
    }

    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    /// Mark the current client as disconnected
    pub fn kill_connection(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    /// Hold every command for `delay`
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    /// Highest number of commands observed running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn failure(&self, op: Op) -> Result<()> {
        let failures = self.failures.lock().unwrap();
        match failures.iter().find(|(failing, _, _)| *failing == op) {
            Some((_, code, message)) => Err(Error::Server {
                code: *code,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    async fn command(&self, op: Op, call: Call) -> Result<()> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.record(call);
        let result = self.failure(op);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[derive(Clone, Default)]
pub struct MockFactory {
    pub recorder: Arc<Recorder>,
}

impl MockFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

pub struct MockClient {
    recorder: Arc<Recorder>,
}

#[async_trait]
impl ClientFactory for MockFactory {
    type Client = MockClient;

    async fn connect(&self, policy: &ClientPolicy, hosts: &[Endpoint]) -> Result<MockClient> {
        self.recorder.record(Call::Connect {
            user: policy.user.clone(),
            password: policy.password.clone(),
            hosts: hosts.to_vec(),
            tls: policy.tls.is_some(),
        });
        self.recorder.failure(Op::Connect)?;
        self.recorder.alive.store(true, Ordering::SeqCst);
        Ok(MockClient {
            recorder: self.recorder.clone(),
        })
    }
}

#[async_trait]
impl AdminClient for MockClient {
    fn is_connected(&self) -> bool {
        self.recorder.alive.load(Ordering::SeqCst)
    }

    async fn close(&mut self) {
        self.recorder.record(Call::Close);
    }

    async fn create_user(&mut self, user: &str, password: &str, roles: &[String]) -> Result<()> {
        let call = Call::CreateUser {
            user: user.to_string(),
            password: password.to_string(),
            roles: roles.to_vec(),
        };
        self.recorder.command(Op::CreateUser, call).await
    }

    async fn drop_user(&mut self, user: &str) -> Result<()> {
        let call = Call::DropUser {
            user: user.to_string(),
        };
        self.recorder.command(Op::DropUser, call).await
    }

    async fn change_password(&mut self, user: &str, password: &str) -> Result<()> {
        let call = Call::ChangePassword {
            user: user.to_string(),
            password: password.to_string(),
        };
        self.recorder.command(Op::ChangePassword, call).await
    }
}

/// Build a raw configuration map from a JSON object literal
pub fn raw(value: Value) -> RawConfig {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {}", other),
    }
}

/// Configuration used by most engine tests
pub fn admin_config() -> RawConfig {
    raw(json!({
        "host": "test_host:3000",
        "username": "test_admin_user",
        "password": "test_admin_password",
    }))
}

pub fn fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("reading {}: {}", path, e))
}
