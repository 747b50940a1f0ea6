//! nicotrans: a local TLS proxy that translates nicovideo comments.

pub mod certificate;
pub mod cli;
pub mod comments;
pub mod config;
pub mod dns;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod redirect;
pub mod translation;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
