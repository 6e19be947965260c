//! The FTP origin client: anonymous login, passive data channel,
//! SIZE/MDTM freshness check, REST-based resume

mod reply;

use std::io;
use std::sync::Arc;

use netbuf::Buf;

use crate::cache::CacheEntry;
use crate::config::Config;
use crate::dns::{Connector, Transport};
use crate::engine::Engine;
use crate::error::Error;
use crate::request::Request;
use crate::response::ResponseKind;


/// What the next completed control reply will be dispatched to
///
/// The sequence is fixed; each state accepts exactly the codes listed in
/// its handler and anything else kills the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// 220 greeting
    ServiceReady,
    /// 331 after `USER`
    PasswordPrompt,
    /// 230 after `PASS`
    LoggedIn,
    /// 200 after `TYPE I`
    BinaryOk,
    /// 229 after `EPSV`
    ExtendedPassive,
    /// 227 after `PASV`
    Passive,
    /// 213 or 550 after `SIZE`
    SizeReply,
    /// 213 or 550 after `MDTM`
    MtimeReply,
    /// 350 after `REST`
    ResumeAck,
    /// 150 or 550 after `RETR`
    DataStart,
    Done,
}

/// FTP fetch of one resource
///
/// Commands and replies flow on the control channel; the data channel
/// opened during passive negotiation carries the file bytes and is what
/// the response layer reads once `RETR` is acknowledged.
pub struct FtpEngine<C: Connector, E> {
    entry: E,
    connector: C,
    control: Option<C::Stream>,
    data: Option<C::Stream>,
    path: Vec<u8>,
    sendbuf: Buf,
    recvbuf: Buf,
    state: State,
    response: Option<ResponseKind>,
    max_chunk: usize,
}

impl<C: Connector, E: CacheEntry> FtpEngine<C, E> {
    pub fn new(request: &Request, mut entry: E, connector: C,
        config: &Arc<Config>)
        -> Result<FtpEngine<C, E>, Error>
    {
        if config.static_serve && entry.full().is_some() {
            info!("Static mode; serving file directly from cache");
            entry.open_full()?;
            return Ok(FtpEngine {
                entry: entry,
                connector: connector,
                control: None,
                data: None,
                path: request.path.clone(),
                sendbuf: Buf::new(),
                recvbuf: Buf::new(),
                state: State::Done,
                response: Some(ResponseKind::Data),
                max_chunk: config.max_chunk,
            });
        }

        let control = connector.connect(&request.host, request.port)?;
        Ok(FtpEngine {
            entry: entry,
            connector: connector,
            control: Some(control),
            data: None,
            path: request.path.clone(),
            sendbuf: Buf::new(),
            recvbuf: Buf::new(),
            state: State::ServiceReady,
            response: None,
            max_chunk: config.max_chunk,
        })
    }

    pub fn cache_entry(&self) -> &E {
        &self.entry
    }

    /// Hand the data channel over to the response layer
    pub fn into_data_socket(self) -> Option<C::Stream> {
        self.data
    }

    /// Queue a command on the control channel
    fn command(&mut self, verb: &[u8], argument: Option<&[u8]>) {
        self.sendbuf.extend(verb);
        if let Some(argument) = argument {
            self.sendbuf.extend(b" ");
            self.sendbuf.extend(argument);
        }
        self.sendbuf.extend(b"\r\n");
        trace!("C: {} {}",
            String::from_utf8_lossy(verb),
            argument.map(String::from_utf8_lossy).unwrap_or_default());
    }

    fn expect(&self, wanted: u16, code: u16) -> Result<(), Error> {
        if code != wanted {
            return Err(Error::UnexpectedReply(wanted, code));
        }
        Ok(())
    }

    /// Open the data channel to `host:port` discovered during passive
    /// negotiation, then ask for the file size
    fn open_data_channel(&mut self, host: &str, port: u16)
        -> Result<(), Error>
    {
        debug!("Data channel at [{}]:[{}]", host, port);
        self.data = Some(self.connector.connect(host, port)?);
        let path = self.path.clone();
        self.command(b"SIZE", Some(&path));
        self.state = State::SizeReply;
        Ok(())
    }

    fn dispatch(&mut self, code: u16, rest: &[u8]) -> Result<(), Error> {
        match self.state {
            State::ServiceReady => {
                self.expect(220, code)?;
                self.command(b"USER", Some(b"anonymous"));
                self.state = State::PasswordPrompt;
            }
            State::PasswordPrompt => {
                self.expect(331, code)?;
                self.command(b"PASS", Some(b"anonymous@"));
                self.state = State::LoggedIn;
            }
            State::LoggedIn => {
                self.expect(230, code)?;
                self.command(b"TYPE", Some(b"I"));
                self.state = State::BinaryOk;
            }
            State::BinaryOk => {
                self.expect(200, code)?;
                let control = self.control.as_ref()
                    .expect("control channel present while negotiating");
                if control.peer_addr()?.is_ipv6() {
                    self.command(b"EPSV", None);
                    self.state = State::ExtendedPassive;
                } else {
                    self.command(b"PASV", None);
                    self.state = State::Passive;
                }
            }
            State::ExtendedPassive => {
                self.expect(229, code)?;
                let port = reply::parse_extended_passive(rest)
                    .ok_or_else(|| Error::BadExtendedPassiveReply(
                        String::from_utf8_lossy(rest).into_owned()))?;
                // EPSV replies carry no address on purpose
                let control = self.control.as_ref()
                    .expect("control channel present while negotiating");
                let ip = control.peer_addr()?.ip();
                self.open_data_channel(&ip.to_string(), port)?;
            }
            State::Passive => {
                self.expect(227, code)?;
                let (ip, port) = reply::parse_passive(rest)
                    .ok_or_else(|| Error::BadPassiveReply(
                        String::from_utf8_lossy(rest).into_owned()))?;
                self.open_data_channel(&ip.to_string(), port)?;
            }
            State::SizeReply => {
                if code == 550 {
                    self.response = Some(ResponseKind::NotFound);
                    self.state = State::Done;
                    return Ok(());
                }
                self.expect(213, code)?;
                let size = String::from_utf8_lossy(rest).parse()
                    .map_err(|_| Error::BadSizeReply(
                        String::from_utf8_lossy(rest).into_owned()))?;
                info!("File size: {}", size);
                self.entry.set_size(size);
                let path = self.path.clone();
                self.command(b"MDTM", Some(&path));
                self.state = State::MtimeReply;
            }
            State::MtimeReply => {
                if code == 550 {
                    self.response = Some(ResponseKind::NotFound);
                    self.state = State::Done;
                    return Ok(());
                }
                self.expect(213, code)?;
                let mtime = reply::parse_mdtm(rest)
                    .ok_or_else(|| Error::BadTime(
                        String::from_utf8_lossy(rest).into_owned()))?;
                info!("Modification time: {}", mtime);
                self.entry.set_mtime(mtime);
                let path = self.path.clone();
                if let Some(stat) = self.entry.partial() {
                    info!("Resuming partial file in cache at {} bytes",
                        stat.size);
                    self.command(b"REST",
                        Some(format!("{}", stat.size).as_bytes()));
                    self.state = State::ResumeAck;
                } else if self.entry.full()
                    .map(|stat| stat.mtime == mtime).unwrap_or(false)
                {
                    info!("Complete file in cache is up to date");
                    self.entry.open_full()?;
                    self.response = Some(ResponseKind::Data);
                    self.state = State::Done;
                } else {
                    self.entry.open_new()?;
                    self.command(b"RETR", Some(&path));
                    self.state = State::DataStart;
                }
            }
            State::ResumeAck => {
                self.expect(350, code)?;
                let offset = self.entry.partial()
                    .map(|stat| stat.size).unwrap_or(0);
                self.entry.open_partial(offset)?;
                let path = self.path.clone();
                self.command(b"RETR", Some(&path));
                self.state = State::DataStart;
            }
            State::DataStart => {
                if code == 550 {
                    self.response = Some(ResponseKind::NotFound);
                    self.state = State::Done;
                    return Ok(());
                }
                self.expect(150, code)?;
                self.response = Some(ResponseKind::Data);
                self.state = State::Done;
            }
            State::Done => {}
        }
        Ok(())
    }
}

impl<C: Connector, E: CacheEntry> Engine for FtpEngine<C, E> {
    type Stream = C::Stream;

    fn socket(&mut self) -> Option<&mut C::Stream> {
        if self.response.is_some() && self.data.is_some() {
            self.data.as_mut()
        } else {
            self.control.as_mut()
        }
    }

    fn has_data(&self) -> bool {
        self.sendbuf.len() > 0
    }

    fn send(&mut self) -> Result<(), Error> {
        debug_assert!(self.has_data());
        let control = match self.control.as_mut() {
            Some(control) => control,
            None => return Ok(()),
        };
        match self.sendbuf.write_to(control) {
            Ok(bytes) => trace!("Sent {} bytes on control channel", bytes),
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {}
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    fn recv(&mut self) -> Result<(), Error> {
        debug_assert!(!self.has_data());
        if self.state == State::Done {
            return Ok(());
        }
        {
            let control = match self.control.as_mut() {
                Some(control) => control,
                None => return Ok(()),
            };
            if self.recvbuf.len() >= self.max_chunk {
                return Err(Error::ReplyTooLong);
            }
            match self.recvbuf.read_from(control) {
                Ok(0) => return Err(Error::PrematureClose),
                Ok(bytes) => {
                    trace!("Received {} bytes on control channel", bytes)
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            }
        }
        while self.state != State::Done {
            let eol = match self.recvbuf.as_ref().iter().position(|&b| b == b'\n') {
                Some(idx) => idx,
                None => break,
            };
            let line: Vec<u8> = self.recvbuf[..eol].to_vec();
            self.recvbuf.consume(eol + 1);
            let line = match line.last() {
                Some(&b'\r') => &line[..line.len() - 1],
                _ => &line[..],
            };
            trace!("S: {}", String::from_utf8_lossy(line));
            if let Some((code, rest)) = reply::split_reply(line) {
                self.dispatch(code, rest)?;
            }
        }
        Ok(())
    }

    fn response(&self) -> Option<ResponseKind> {
        self.response
    }
}
