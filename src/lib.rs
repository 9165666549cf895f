//! Issue and rotate cluster admin kubeconfigs.
//!
//! A kubeconfig is built around a client certificate signed by the cluster's
//! client CA and stored in a `<cluster>-kubeconfig` secret. The secret can
//! later be checked for an expiring certificate and regenerated in place.

pub mod cert;
pub mod config;
pub mod error;
pub mod kubeconfig;
pub mod secret;
pub mod types;
pub mod utils;

pub use error::{Error, Result};
