//! Opaque relay for requests we do not understand

use std::io;

use netbuf::Buf;

use crate::dns::{Connector, Transport};
use crate::engine::Engine;
use crate::error::Error;
use crate::request::Request;
use crate::response::ResponseKind;


/// Forwards the raw client request and hands off to a blind relay
///
/// No cache interaction and no receive side: once the request bytes are
/// written the pass-through response copies upstream to downstream.
pub struct BlindEngine<S> {
    socket: Option<S>,
    sendbuf: Buf,
    response: Option<ResponseKind>,
}

impl<S: Transport> BlindEngine<S> {
    pub fn new<C>(request: &Request, connector: &C)
        -> Result<BlindEngine<S>, Error>
        where C: Connector<Stream = S>
    {
        let socket = connector.connect(&request.host, request.port)?;
        let mut sendbuf = Buf::new();
        sendbuf.extend(request.recvbuf());
        Ok(BlindEngine {
            socket: Some(socket),
            sendbuf: sendbuf,
            response: None,
        })
    }
}

impl<S: Transport> Engine for BlindEngine<S> {
    type Stream = S;

    fn socket(&mut self) -> Option<&mut S> {
        self.socket.as_mut()
    }

    fn has_data(&self) -> bool {
        self.sendbuf.len() > 0
    }

    fn send(&mut self) -> Result<(), Error> {
        let sock = match self.socket.as_mut() {
            Some(sock) => sock,
            None => return Ok(()),
        };
        match self.sendbuf.write_to(sock) {
            Ok(_) => {}
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
        if self.sendbuf.len() == 0 {
            self.response = Some(ResponseKind::Blind);
        }
        Ok(())
    }

    fn recv(&mut self) -> Result<(), Error> {
        // nothing to interpret, the response layer reads the socket
        Ok(())
    }

    fn response(&self) -> Option<ResponseKind> {
        self.response
    }
}
