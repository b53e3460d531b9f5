//! Credential generation policy and creation statements

mod policy;
mod statement;

pub use policy::{CredentialsProducer, SqlCredentialsProducer, UsernameConfig};
pub use statement::{CreationStatement, Statements};
