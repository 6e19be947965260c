//! Name resolution and the non-blocking connect primitive

use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::{Arc, Mutex};

use mio::net::TcpStream;

use crate::config::Config;
use crate::error::Error;

/// A byte stream an engine can drive
///
/// The two implementations are the mio TCP stream used in production and
/// the scripted streams the tests drive engines with.
pub trait Transport: Read + Write {
    fn peer_addr(&self) -> io::Result<SocketAddr>;
}

impl Transport for TcpStream {
    fn peer_addr(&self) -> io::Result<SocketAddr> {
        TcpStream::peer_addr(self)
    }
}

/// Something that can open an upstream connection
///
/// Engines keep one of these so the FTP data channel can be dialed in the
/// middle of a run.
pub trait Connector {
    type Stream: Transport;
    fn connect(&self, host: &str, port: u16) -> Result<Self::Stream, Error>;
}

impl<C: Connector> Connector for Arc<C> {
    type Stream = C::Stream;
    fn connect(&self, host: &str, port: u16) -> Result<Self::Stream, Error> {
        (**self).connect(host, port)
    }
}

/// Address-family-agnostic resolver with a process-lifetime memo table
///
/// Lookups go through `ToSocketAddrs` (getaddrinfo underneath); all
/// candidates are remembered per `(host, port)` and the first one is used.
/// There is no eviction: entries live as long as the resolver, which a
/// short-lived proxy process holds in an `Arc` for its whole life.
pub struct Resolver {
    config: Arc<Config>,
    memo: Mutex<HashMap<(String, u16), Vec<SocketAddr>>>,
}

impl Resolver {
    pub fn new(config: &Arc<Config>) -> Resolver {
        Resolver {
            config: config.clone(),
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve `host:port`, returning the first candidate
    pub fn resolve(&self, host: &str, port: u16) -> Result<SocketAddr, Error> {
        let mut memo = self.memo.lock().expect("dns memo table poisoned");
        if let Some(candidates) = memo.get(&(host.to_string(), port)) {
            return Ok(candidates[0]);
        }
        debug!("Requesting address info for {}:{}", host, port);
        let candidates: Vec<SocketAddr> = (host, port).to_socket_addrs()?
            .collect();
        let first = *candidates.first().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound,
                format!("no address found for {}:{}", host, port))
        })?;
        memo.insert((host.to_string(), port), candidates);
        Ok(first)
    }

    /// Start a non-blocking connect to `host:port`
    ///
    /// The returned stream is still in the connecting state; failures other
    /// than off-line mode and resolution errors surface on the first send
    /// or recv the reactor issues against it.
    pub fn connect(&self, host: &str, port: u16) -> Result<TcpStream, Error> {
        if !self.config.online {
            return Err(Error::Offline);
        }
        let addr = self.resolve(host, port)?;
        info!("Connecting to [{}]:[{}]", addr.ip(), addr.port());
        Ok(TcpStream::connect(addr)?)
    }
}

impl Connector for Resolver {
    type Stream = TcpStream;
    fn connect(&self, host: &str, port: u16) -> Result<TcpStream, Error> {
        Resolver::connect(self, host, port)
    }
}
