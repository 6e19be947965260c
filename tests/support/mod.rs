//! Scripted transports, a scripted connector and an in-memory cache entry
//! so engines can be driven against fixed upstream byte scripts.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::net::SocketAddr;
use std::rc::Rc;

use origin_fetch::{CacheEntry, Connector, Engine, Error, FileStat, Transport};


pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A stream that replays scripted chunks, one chunk per read call
///
/// When the script runs out, reads either report end-of-file (the server
/// closed) or would-block (the server has nothing more to say yet).
pub struct ScriptStream {
    chunks: VecDeque<Vec<u8>>,
    close_when_drained: bool,
    written: Rc<RefCell<Vec<u8>>>,
    peer: SocketAddr,
}

impl ScriptStream {
    pub fn new(chunks: &[&[u8]], peer: &str) -> ScriptStream {
        ScriptStream {
            chunks: chunks.iter().map(|chunk| chunk.to_vec()).collect(),
            close_when_drained: false,
            written: Rc::new(RefCell::new(Vec::new())),
            peer: peer.parse().expect("scripted peer address"),
        }
    }

    /// Same, but reads past the script report an orderly close
    pub fn closing(chunks: &[&[u8]], peer: &str) -> ScriptStream {
        let mut stream = ScriptStream::new(chunks, peer);
        stream.close_when_drained = true;
        stream
    }

    /// Shared handle to everything the engine wrote to this stream
    pub fn written(&self) -> Rc<RefCell<Vec<u8>>> {
        self.written.clone()
    }
}

impl Read for ScriptStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.chunks.pop_front() {
            Some(mut chunk) => {
                let fits = chunk.len().min(buf.len());
                buf[..fits].copy_from_slice(&chunk[..fits]);
                if fits < chunk.len() {
                    self.chunks.push_front(chunk.split_off(fits));
                }
                Ok(fits)
            }
            None if self.close_when_drained => Ok(0),
            None => Err(io::ErrorKind::WouldBlock.into()),
        }
    }
}

impl Write for ScriptStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for ScriptStream {
    fn peer_addr(&self) -> io::Result<SocketAddr> {
        Ok(self.peer)
    }
}

/// Hands out pre-scripted streams in order and records every dial
#[derive(Clone)]
pub struct ScriptConnector {
    inner: Rc<RefCell<ConnectorState>>,
}

struct ConnectorState {
    streams: VecDeque<ScriptStream>,
    dials: Vec<(String, u16)>,
}

impl ScriptConnector {
    pub fn new() -> ScriptConnector {
        ScriptConnector {
            inner: Rc::new(RefCell::new(ConnectorState {
                streams: VecDeque::new(),
                dials: Vec::new(),
            })),
        }
    }

    pub fn push(&self, stream: ScriptStream) {
        self.inner.borrow_mut().streams.push_back(stream);
    }

    pub fn dials(&self) -> Vec<(String, u16)> {
        self.inner.borrow().dials.clone()
    }
}

impl Connector for ScriptConnector {
    type Stream = ScriptStream;
    fn connect(&self, host: &str, port: u16)
        -> Result<ScriptStream, Error>
    {
        let mut inner = self.inner.borrow_mut();
        inner.dials.push((host.to_string(), port));
        inner.streams.pop_front().ok_or_else(|| {
            Error::Io(io::Error::new(io::ErrorKind::ConnectionRefused,
                "no scripted stream left"))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    OpenNew,
    OpenPartial(u64),
    OpenFull,
    RemovePartial,
}

/// In-memory stand-in for one on-disk cache entry
#[derive(Debug, Default)]
pub struct TestEntry {
    partial: Option<FileStat>,
    full: Option<FileStat>,
    pub size: Option<u64>,
    pub mtime: Option<u64>,
    pub events: Vec<Event>,
}

impl TestEntry {
    pub fn absent() -> TestEntry {
        TestEntry::default()
    }

    pub fn with_partial(size: u64, mtime: u64) -> TestEntry {
        TestEntry {
            partial: Some(FileStat { size: size, mtime: mtime }),
            ..TestEntry::default()
        }
    }

    pub fn with_full(size: u64, mtime: u64) -> TestEntry {
        TestEntry {
            full: Some(FileStat { size: size, mtime: mtime }),
            ..TestEntry::default()
        }
    }
}

impl CacheEntry for TestEntry {
    fn partial(&self) -> Option<FileStat> {
        self.partial
    }
    fn full(&self) -> Option<FileStat> {
        self.full
    }
    fn open_new(&mut self) -> io::Result<()> {
        self.events.push(Event::OpenNew);
        Ok(())
    }
    fn open_partial(&mut self, offset: u64) -> io::Result<()> {
        self.events.push(Event::OpenPartial(offset));
        Ok(())
    }
    fn open_full(&mut self) -> io::Result<()> {
        self.events.push(Event::OpenFull);
        Ok(())
    }
    fn remove_partial(&mut self) -> io::Result<()> {
        self.partial = None;
        self.events.push(Event::RemovePartial);
        Ok(())
    }
    fn set_size(&mut self, size: u64) {
        self.size = Some(size);
    }
    fn set_mtime(&mut self, mtime: u64) {
        self.mtime = Some(mtime);
    }
    fn size(&self) -> Option<u64> {
        self.size
    }
    fn mtime(&self) -> Option<u64> {
        self.mtime
    }
}

/// Pump the engine the way the reactor would until it settles
pub fn run<E: Engine>(engine: &mut E) -> Result<(), Error> {
    for _ in 0..1000 {
        if engine.response().is_some() {
            return Ok(());
        }
        if engine.has_data() {
            engine.send()?;
        } else {
            engine.recv()?;
        }
    }
    panic!("engine did not settle on a response");
}
