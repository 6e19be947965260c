/// Downstream response shape selected by an engine
///
/// Starts out unset (`Engine::response` returns `None`) and is assigned
/// exactly once when the upstream negotiation completes. The reactor polls
/// it to learn that the engine is done; the matching response object then
/// takes over the socket and the cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// Opaque relay of upstream bytes, no interpretation
    Blind,
    /// Plain body, length known or delimited by connection close
    Data,
    /// Body framed with chunked transfer encoding, needs a decoder
    ChunkedData,
    /// Resource does not exist upstream, render a 404
    NotFound,
}
