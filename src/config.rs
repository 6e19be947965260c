use std::sync::Arc;


/// Process-wide knobs shared by all engines
///
/// Time formats carry no knob here: emission and parsing of HTTP dates is
/// delegated to `httpdate`, which emits IMF-fixdate and tries the three
/// standard formats in order when parsing.
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) online: bool,
    pub(crate) static_serve: bool,
    pub(crate) max_chunk: usize,
}

impl Config {
    /// Create a config with defaults
    pub fn new() -> Config {
        Config {
            online: true,
            static_serve: false,
            max_chunk: 65536,
        }
    }
    /// Whether outbound connects are allowed at all
    ///
    /// When false every engine construction that needs the network fails
    /// with `Error::Offline`.
    pub fn online(&mut self, value: bool) -> &mut Self {
        self.online = value;
        self
    }
    /// Serve complete cache entries without contacting the origin
    pub fn static_serve(&mut self, value: bool) -> &mut Self {
        self.static_serve = value;
        self
    }
    /// Cap on the bytes an engine may buffer while waiting for a
    /// complete header or reply
    pub fn max_chunk(&mut self, value: usize) -> &mut Self {
        self.max_chunk = value;
        self
    }
    /// Create a Arc'd config clone to pass to the constructor
    ///
    /// This is just a convenience method.
    pub fn done(&mut self) -> Arc<Config> {
        Arc::new(self.clone())
    }
}
