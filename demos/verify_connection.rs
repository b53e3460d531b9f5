//! Verify a connection configuration against a live cluster.
//!
//! Run with:
//! ```bash
//! AEROSPIKE_HOST=localhost:3000 AEROSPIKE_USER=admin AEROSPIKE_PASSWORD=admin \
//!     RUST_LOG=aerospike_creds=debug cargo run --example verify_connection
//! ```
//!
//! Optional: `AEROSPIKE_TLS_CA` and `AEROSPIKE_TLS_CERT_KEY` name PEM files
//! for TLS and mutual TLS.

use aerospike_creds::client::AerospikeClientFactory;
use aerospike_creds::database::Database;
use aerospike_creds::producer::RawConfig;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

fn env(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn pem_from_env(name: &str) -> Result<Option<String>, Box<dyn std::error::Error>> {
    match std::env::var(name) {
        Ok(path) if !path.is_empty() => Ok(Some(std::fs::read_to_string(path)?)),
        _ => Ok(None),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = RawConfig::new();
    config.insert("host".into(), Value::String(env("AEROSPIKE_HOST", "localhost:3000")));
    config.insert("username".into(), Value::String(env("AEROSPIKE_USER", "admin")));
    config.insert("password".into(), Value::String(env("AEROSPIKE_PASSWORD", "admin")));
    if let Some(ca) = pem_from_env("AEROSPIKE_TLS_CA")? {
        config.insert("tls_ca".into(), Value::String(ca));
    }
    if let Some(cert_key) = pem_from_env("AEROSPIKE_TLS_CERT_KEY")? {
        config.insert("tls_certificate_key".into(), Value::String(cert_key));
    }

    let db = aerospike_creds::new(AerospikeClientFactory::new());
    match db.initialize(config, true).await {
        Ok(_) => println!("connection verified"),
        Err(e) => {
            eprintln!("verification failed: {}", e);
            std::process::exit(1);
        }
    }

    db.close().await?;
    Ok(())
}
