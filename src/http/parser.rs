//! Incremental parser for the upstream response header
//!
//! The engine reads the socket into a pushback buffer and feeds it here;
//! only whole lines are ever consumed, so whatever follows the blank
//! terminator line is still buffered when the response layer takes the
//! socket over. That replaces the peek-then-consume trick a raw socket
//! would allow.

use crate::error::Error;
use crate::headers::{self, HeaderMap};


#[derive(Debug)]
enum State {
    /// Waiting for the status line
    Head,
    /// Collecting header fields until the blank line
    Args,
    Done,
}

/// Everything the status line and header block said
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub code: u16,
    pub reason: Vec<u8>,
    pub headers: HeaderMap,
}

#[derive(Debug)]
pub struct Parser {
    state: State,
    code: u16,
    reason: Vec<u8>,
    headers: HeaderMap,
}

impl Parser {
    pub fn new() -> Parser {
        Parser {
            state: State::Head,
            code: 0,
            reason: Vec::new(),
            headers: HeaderMap::new(),
        }
    }

    /// Parse as many whole lines as `chunk` holds, returning the number of
    /// bytes consumed
    ///
    /// Stops consuming at the blank line that terminates the header; the
    /// caller must not feed bytes past it back in.
    pub fn advance(&mut self, chunk: &[u8]) -> Result<usize, Error> {
        let mut consumed = 0;
        while !matches!(self.state, State::Done) {
            let rest = &chunk[consumed..];
            let eol = match rest.iter().position(|&b| b == b'\n') {
                Some(idx) => idx + 1,
                None => break,
            };
            let line = &rest[..eol];
            match self.state {
                State::Head => self.status_line(line)?,
                State::Args => self.header_line(line),
                State::Done => unreachable!(),
            }
            consumed += eol;
        }
        Ok(consumed)
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, State::Done)
    }

    /// Take the parsed head out; only meaningful once `is_done()`
    pub fn finish(self) -> ResponseHead {
        ResponseHead {
            code: self.code,
            reason: self.reason,
            headers: self.headers,
        }
    }

    fn status_line(&mut self, line: &[u8]) -> Result<(), Error> {
        info!("Server responds {}",
            String::from_utf8_lossy(line).trim_end());
        let fields: Vec<&[u8]> = line
            .split(|b| b.is_ascii_whitespace())
            .filter(|field| !field.is_empty())
            .collect();
        let valid = fields.len() >= 3
            && fields[0].starts_with(b"HTTP/")
            && fields[1].iter().all(u8::is_ascii_digit);
        if !valid {
            return Err(Error::BadStatusLine(
                String::from_utf8_lossy(line).into_owned()));
        }
        self.code = String::from_utf8_lossy(fields[1]).parse().map_err(|_| {
            Error::BadStatusLine(String::from_utf8_lossy(line).into_owned())
        })?;
        self.reason = fields[2..].join(&b' ');
        self.state = State::Args;
        Ok(())
    }

    fn header_line(&mut self, line: &[u8]) {
        if line == b"\r\n" || line == b"\n" {
            self.state = State::Done;
        } else if let Some(colon) = line.iter().position(|&b| b == b':') {
            trace!("> {}", String::from_utf8_lossy(line).trim_end());
            let name = headers::title_case(&line[..colon]);
            let value = headers::trim(&line[colon + 1..]);
            self.headers.insert(&name, value);
        } else {
            info!("Ignored header line: {:?}",
                String::from_utf8_lossy(line));
        }
    }
}
