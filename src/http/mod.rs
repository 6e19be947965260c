//! The HTTP/1.1 origin client with cache integration

mod parser;

pub use self::parser::ResponseHead;

use std::io::{self, Write};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use netbuf::Buf;

use crate::cache::CacheEntry;
use crate::config::Config;
use crate::dns::{Connector, Transport};
use crate::engine::Engine;
use crate::error::Error;
use crate::headers::{self, HeaderMap};
use crate::request::Request;
use crate::response::ResponseKind;

use self::parser::Parser;


/// HTTP/1.1 origin fetch for one resource
///
/// The cache entry decides the request that goes out: a partial entry asks
/// for the missing byte range, a complete entry is revalidated with
/// `If-Modified-Since`, and in static mode a complete entry short-circuits
/// the network entirely. Once the response header is in, the status code
/// decides which downstream response shape takes over.
pub struct HttpEngine<S, E> {
    entry: E,
    socket: Option<S>,
    sendbuf: Buf,
    recvbuf: Buf,
    parser: Option<Parser>,
    head: Option<ResponseHead>,
    response: Option<ResponseKind>,
    max_chunk: usize,
}

impl<S: Transport, E: CacheEntry> HttpEngine<S, E> {
    pub fn new<C>(request: &Request, mut entry: E, connector: &C,
        config: &Arc<Config>)
        -> Result<HttpEngine<S, E>, Error>
        where C: Connector<Stream = S>
    {
        if config.static_serve && entry.full().is_some() {
            info!("Static mode; serving file directly from cache");
            entry.open_full()?;
            return Ok(HttpEngine {
                entry: entry,
                socket: None,
                sendbuf: Buf::new(),
                recvbuf: Buf::new(),
                parser: None,
                head: None,
                response: Some(ResponseKind::Data),
                max_chunk: config.max_chunk,
            });
        }

        let mut args = request.args.clone();
        args.remove(b"Accept-Encoding");
        args.remove(b"Range");
        if let Some(stat) = entry.partial() {
            info!("Requesting resume of partial file in cache: {} bytes",
                stat.size);
            args.insert(b"Range", format!("bytes={}-", stat.size).as_bytes());
        } else if let Some(stat) = entry.full() {
            let since = httpdate::fmt_http_date(
                SystemTime::UNIX_EPOCH + Duration::from_secs(stat.mtime));
            info!("Checking complete file in cache: {} bytes, {}",
                stat.size, since);
            args.insert(b"If-Modified-Since", since.as_bytes());
        }

        let socket = connector.connect(&request.host, request.port)?;
        let mut sendbuf = Buf::new();
        sendbuf.extend(b"GET /");
        sendbuf.extend(&request.path);
        sendbuf.extend(b" HTTP/1.1\r\n");
        for (name, value) in args.iter() {
            sendbuf.extend(name);
            sendbuf.extend(b": ");
            sendbuf.extend(value);
            sendbuf.extend(b"\r\n");
        }
        sendbuf.extend(b"\r\n");

        Ok(HttpEngine {
            entry: entry,
            socket: Some(socket),
            sendbuf: sendbuf,
            recvbuf: Buf::new(),
            parser: Some(Parser::new()),
            head: None,
            response: None,
            max_chunk: config.max_chunk,
        })
    }

    /// Upstream status code; zero until the header is parsed
    pub fn status(&self) -> u16 {
        self.head.as_ref().map(|head| head.code).unwrap_or(0)
    }

    pub fn reason(&self) -> &[u8] {
        self.head.as_ref().map(|head| &head.reason[..]).unwrap_or(b"")
    }

    /// A copy of the parsed upstream header map
    pub fn args(&self) -> HeaderMap {
        self.head.as_ref().map(|head| head.headers.clone())
            .unwrap_or_default()
    }

    /// Bytes received past the header terminator, owed to the response
    /// layer before it continues reading the socket
    pub fn leftover(&self) -> &[u8] {
        &self.recvbuf[..]
    }

    pub fn cache_entry(&self) -> &E {
        &self.entry
    }

    fn select_response(&mut self, mut head: ResponseHead)
        -> Result<(), Error>
    {
        let kind = match head.code {
            200 => {
                self.entry.open_new()?;
                if let Some(modified) = head.headers.get(b"Last-Modified") {
                    self.entry.set_mtime(parse_http_mtime(modified)?);
                }
                if let Some(length) = head.headers.get(b"Content-Length") {
                    let size = String::from_utf8_lossy(length).parse()
                        .map_err(|_| Error::BadContentLength)?;
                    self.entry.set_size(size);
                }
                body_kind(&mut head.headers)
            }
            206 if self.entry.partial().is_some() => {
                let range = head.headers.remove(b"Content-Range")
                    .unwrap_or_else(|| b"none specified".to_vec());
                let (beg, total) = parse_content_range(&range)?;
                self.entry.set_size(total);
                self.entry.open_partial(beg)?;
                body_kind(&mut head.headers)
            }
            304 if self.entry.full().is_some() => {
                self.entry.open_full()?;
                ResponseKind::Data
            }
            403 | 416 if self.entry.partial().is_some() => {
                info!("Upstream refused resume, discarding partial file");
                self.entry.remove_partial()?;
                ResponseKind::Blind
            }
            _ => ResponseKind::Blind,
        };
        self.head = Some(head);
        self.response = Some(kind);
        Ok(())
    }
}

/// Branch on `Transfer-Encoding`, removing it from the re-emitted header
/// since the downstream response re-frames the body itself
fn body_kind(headers: &mut HeaderMap) -> ResponseKind {
    match headers.remove(b"Transfer-Encoding") {
        Some(ref encoding) if headers::is_chunked(encoding) => {
            ResponseKind::ChunkedData
        }
        _ => ResponseKind::Data,
    }
}

fn parse_http_mtime(value: &[u8]) -> Result<u64, Error> {
    let text = std::str::from_utf8(value).map_err(|_| {
        Error::BadTime(String::from_utf8_lossy(value).into_owned())
    })?;
    let when = httpdate::parse_http_date(text)
        .map_err(|_| Error::BadTime(text.to_string()))?;
    let since = when.duration_since(SystemTime::UNIX_EPOCH)
        .map_err(|_| Error::BadTime(text.to_string()))?;
    Ok(since.as_secs())
}

/// Parse `bytes BEG-END/TOTAL`, checking that TOTAL and END agree
fn parse_content_range(value: &[u8]) -> Result<(u64, u64), Error> {
    let bad = || Error::BadContentRange(
        String::from_utf8_lossy(value).into_owned());
    let range = value.strip_prefix(b"bytes ").ok_or_else(bad)?;
    let slash = range.iter().position(|&b| b == b'/').ok_or_else(bad)?;
    let dash = range[..slash].iter().position(|&b| b == b'-')
        .ok_or_else(bad)?;
    let number = |digits: &[u8]| -> Result<u64, Error> {
        String::from_utf8_lossy(digits).parse().map_err(|_| bad())
    };
    let beg = number(&range[..dash])?;
    let end = number(&range[dash + 1..slash])?;
    let total = number(&range[slash + 1..])?;
    if total != end + 1 {
        return Err(bad());
    }
    Ok((beg, total))
}

impl<S: Transport, E: CacheEntry> Engine for HttpEngine<S, E> {
    type Stream = S;

    fn socket(&mut self) -> Option<&mut S> {
        self.socket.as_mut()
    }

    fn has_data(&self) -> bool {
        self.sendbuf.len() > 0
    }

    fn send(&mut self) -> Result<(), Error> {
        debug_assert!(self.has_data());
        let sock = match self.socket.as_mut() {
            Some(sock) => sock,
            None => return Ok(()),
        };
        match self.sendbuf.write_to(sock) {
            Ok(bytes) => trace!("Sent {} bytes of request", bytes),
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {}
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    fn recv(&mut self) -> Result<(), Error> {
        debug_assert!(!self.has_data());
        if self.response.is_some() {
            return Ok(());
        }
        let sock = match self.socket.as_mut() {
            Some(sock) => sock,
            None => return Ok(()),
        };
        if self.recvbuf.len() >= self.max_chunk {
            return Err(Error::HeaderTooLong);
        }
        match self.recvbuf.read_from(sock) {
            Ok(0) => return Err(Error::PrematureClose),
            Ok(bytes) => trace!("Received {} bytes of header", bytes),
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
        let parser = self.parser.as_mut().expect("parser gone before head");
        let consumed = parser.advance(&self.recvbuf[..])?;
        self.recvbuf.consume(consumed);
        if parser.is_done() {
            let head = self.parser.take()
                .expect("parser gone before head").finish();
            self.select_response(head)?;
        }
        Ok(())
    }

    fn response(&self) -> Option<ResponseKind> {
        self.response
    }

    /// Re-serialize the upstream status line and headers for relay
    fn recvbuf(&self) -> Vec<u8> {
        let head = match self.head {
            Some(ref head) => head,
            None => return Vec::new(),
        };
        let mut out = Vec::new();
        let _ = write!(out, "HTTP/1.1 {} ", head.code);
        out.extend_from_slice(&head.reason);
        out.extend_from_slice(b"\r\n");
        for (name, value) in head.headers.iter() {
            out.extend_from_slice(name);
            out.extend_from_slice(b": ");
            out.extend_from_slice(value);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(b"\r\n");
        out
    }
}
