//! Client for the legislature's member directory.
//!
//! Maps the directory's numeric person and affiliation ids to politicians.
//! A known id is answered from the cross-reference store; an unknown one is
//! looked up remotely, resolved by name and riding, and written back so the
//! next lookup never touches the network.

pub mod client;
pub mod config;
pub mod detail;
pub mod transport;

pub use client::{DirectoryClient, DirectoryContext};
pub use config::DirectoryConfig;
pub use transport::{Fetched, ReqwestTransport, Transport};
