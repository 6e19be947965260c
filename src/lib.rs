//! Origin-side protocol engines for a caching forward proxy
//!
//! Each engine is a non-blocking state machine driven from the outside by
//! a reactor: it speaks its wire protocol to the origin server, consults
//! and mutates the local cache entry for the resource, and finally selects
//! the response shape that streams bytes back to the client.
#[macro_use] extern crate log;
#[macro_use(quick_error)] extern crate quick_error;

pub mod blind;
pub mod cache;
pub mod config;
pub mod dns;
pub mod engine;
mod error;
pub mod ftp;
pub mod headers;
pub mod http;
pub mod request;
pub mod response;

pub use crate::blind::BlindEngine;
pub use crate::cache::{CacheEntry, FileStat};
pub use crate::config::Config;
pub use crate::dns::{Connector, Resolver, Transport};
pub use crate::engine::Engine;
pub use crate::error::Error;
pub use crate::ftp::FtpEngine;
pub use crate::http::HttpEngine;
pub use crate::request::Request;
pub use crate::response::ResponseKind;
