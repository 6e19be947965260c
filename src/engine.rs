use crate::error::Error;
use crate::response::ResponseKind;


/// The contract between the reactor and a protocol engine
///
/// The reactor owns the event loop: it polls the engine's socket for
/// readability or writability and dispatches exactly one `send` or `recv`
/// per readiness event. Engines never block and never loop on the socket;
/// every call performs at most one syscall. An engine suspends implicitly:
/// with bytes queued it awaits writability, with an empty send buffer it
/// awaits readability.
pub trait Engine {
    type Stream;

    /// The socket currently driving progress, `None` when serving from
    /// the cache without touching the network
    fn socket(&mut self) -> Option<&mut Self::Stream>;

    /// True iff the send buffer is non-empty
    fn has_data(&self) -> bool;

    /// Write as much of the send buffer as the socket accepts right now
    fn send(&mut self) -> Result<(), Error>;

    /// Read once, then advance the protocol as far as the buffered bytes
    /// allow
    fn recv(&mut self) -> Result<(), Error>;

    /// The downstream response shape, set exactly once when negotiation
    /// completes
    fn response(&self) -> Option<ResponseKind>;

    /// The upstream response header re-serialized for relay; empty for
    /// engines that do not interpret the upstream header
    fn recvbuf(&self) -> Vec<u8> {
        Vec::new()
    }
}
