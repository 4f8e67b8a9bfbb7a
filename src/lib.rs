pub mod cache;
pub mod certificate;
pub mod config;
pub mod crl;
pub mod crypto;
pub mod remote;
pub mod rules;
pub mod sync;
pub mod telemetry;
pub mod trust;
pub mod validator;
