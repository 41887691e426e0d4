//! Host trust evaluation: identity resolution, assertion retrieval and
//! parsing, and asset tag matching.

pub mod assertion;
pub mod cache;
pub mod client;
pub mod directory;
pub mod policy;

pub use client::{AssertionSource, AttestationClient};
pub use directory::{DirectoryClient, HostDirectory};
