use std::io;


quick_error! {
    #[derive(Debug)]
    /// Failure of a single origin fetch
    ///
    /// Any of these is fatal to the engine that returned it: the reactor is
    /// expected to close the socket and tear the request down. Engines never
    /// retry on their own.
    pub enum Error {
        /// Network activity attempted while configured off-line
        Offline {
            description("operating in off-line mode")
        }
        /// I/O (basically networking) error during the exchange
        Io(err: io::Error) {
            description("IO error")
            display("IO error: {}", err)
            from()
        }
        /// The upstream HTTP status line could not be parsed
        BadStatusLine(line: String) {
            description("invalid header line")
            display("invalid header line: {:?}", line)
        }
        /// Bad `Content-Length` header
        BadContentLength {
            description("bad content length")
        }
        /// Missing, malformed or self-contradictory `Content-Range` header
        BadContentRange(value: String) {
            description("invalid content-range")
            display("invalid content-range: {:?}", value)
        }
        /// A timestamp matched none of the formats we understand
        BadTime(value: String) {
            description("unparseable timestamp")
            display("time data {:?} does not match any known format", value)
        }
        /// The FTP server replied with a code the current state can't accept
        UnexpectedReply(expected: u16, got: u16) {
            description("unexpected reply code")
            display("server sends {}; expected {}", got, expected)
        }
        /// `SIZE` reply did not carry a decimal file size
        BadSizeReply(value: String) {
            description("invalid SIZE reply")
            display("invalid SIZE reply: {:?}", value)
        }
        /// `PASV` reply carried no parseable address
        BadPassiveReply(line: String) {
            description("could not parse address from PASV reply")
            display("could not parse address from PASV reply ({:?})", line)
        }
        /// `EPSV` reply carried no parseable port
        BadExtendedPassiveReply(line: String) {
            description("could not parse port from EPSV reply")
            display("could not parse port from EPSV reply ({:?})", line)
        }
        /// Upstream closed the connection while a reply was still expected
        PrematureClose {
            description("server closed connection prematurely")
        }
        /// The response header outgrew the configured buffer cap
        HeaderTooLong {
            description("response header too long")
        }
        /// A control reply outgrew the configured buffer cap
        ReplyTooLong {
            description("control reply too long")
        }
    }
}
