use crate::headers::HeaderMap;


/// A client request as handed over by the request router
///
/// The router has already parsed the client side of the exchange; engines
/// only read from this. `path` is kept as the opaque byte string that
/// appeared on the wire, without the leading slash.
#[derive(Debug, Clone)]
pub struct Request {
    pub host: String,
    pub port: u16,
    pub path: Vec<u8>,
    /// Client headers in the order they will be re-emitted upstream
    pub args: HeaderMap,
    /// The original client request, pre-serialized, for blind relay
    pub recvbuf: Vec<u8>,
}

impl Request {
    pub fn recvbuf(&self) -> &[u8] {
        &self.recvbuf
    }
}
