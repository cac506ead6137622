use std::fmt;

use crate::{
    arena::{AllocError, Arena, NodeId},
    registry::{DefaultMode, ReaderRegistry},
};

pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Builds the value returned for empty or whitespace-only input.
pub type EofFn = dyn for<'a> Fn(&mut Arena<'a>) -> Result<NodeId, AllocError> + Sync;

/// Reader configuration.
///
/// ```
/// use edn_rs::{DefaultMode, ParseOptions};
///
/// let options = ParseOptions::new()
///     .default_mode(DefaultMode::Unwrap)
///     .underscores(true);
/// let doc = edn_rs::parse_with_options(b"#point 1_000", &options).unwrap();
/// assert_eq!(doc.root().as_int(), Some(1000));
/// ```
#[derive(Copy, Clone)]
pub struct ParseOptions<'r> {
    pub(crate) registry: Option<&'r ReaderRegistry>,
    pub(crate) default_mode: DefaultMode,
    pub(crate) eof_value: Option<&'r EofFn>,
    pub(crate) max_depth: usize,
    pub(crate) max_nodes: usize,
    pub(crate) extended_integers: bool,
    pub(crate) ratios: bool,
    pub(crate) extended_characters: bool,
    pub(crate) metadata: bool,
    pub(crate) underscores: bool,
    pub(crate) text_blocks: bool,
}

impl Default for ParseOptions<'_> {
    fn default() -> Self {
        Self {
            registry: None,
            default_mode: DefaultMode::Passthrough,
            eof_value: None,
            max_depth: DEFAULT_MAX_DEPTH,
            max_nodes: usize::MAX,
            extended_integers: true,
            ratios: true,
            extended_characters: true,
            metadata: true,
            underscores: false,
            text_blocks: false,
        }
    }
}

impl<'r> ParseOptions<'r> {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn registry(mut self, registry: &'r ReaderRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    #[must_use]
    pub fn default_mode(mut self, mode: DefaultMode) -> Self {
        self.default_mode = mode;
        self
    }

    #[must_use]
    pub fn eof_value(mut self, build: &'r EofFn) -> Self {
        self.eof_value = Some(build);
        self
    }

    /// Deepest allowed collection nesting; deeper input is `InvalidSyntax`.
    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Node budget of the arena; exceeding it is `OutOfMemory`.
    #[must_use]
    pub fn max_nodes(mut self, nodes: usize) -> Self {
        self.max_nodes = nodes;
        self
    }

    /// Hex `0x1F`, octal `017` and radix `2r1010` integers.
    #[must_use]
    pub fn extended_integers(mut self, enabled: bool) -> Self {
        self.extended_integers = enabled;
        self
    }

    #[must_use]
    pub fn ratios(mut self, enabled: bool) -> Self {
        self.ratios = enabled;
        self
    }

    /// `\formfeed`, `\backspace` and octal `\oNNN` characters.
    #[must_use]
    pub fn extended_characters(mut self, enabled: bool) -> Self {
        self.extended_characters = enabled;
        self
    }

    #[must_use]
    pub fn metadata(mut self, enabled: bool) -> Self {
        self.metadata = enabled;
        self
    }

    /// `_` digit separators inside numbers.
    #[must_use]
    pub fn underscores(mut self, enabled: bool) -> Self {
        self.underscores = enabled;
        self
    }

    /// Triple-quoted strings with indentation stripping.
    #[must_use]
    pub fn text_blocks(mut self, enabled: bool) -> Self {
        self.text_blocks = enabled;
        self
    }
}

impl fmt::Debug for ParseOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseOptions")
            .field("registry", &self.registry)
            .field("default_mode", &self.default_mode)
            .field("eof_value", &self.eof_value.is_some())
            .field("max_depth", &self.max_depth)
            .field("max_nodes", &self.max_nodes)
            .field("extended_integers", &self.extended_integers)
            .field("ratios", &self.ratios)
            .field("extended_characters", &self.extended_characters)
            .field("metadata", &self.metadata)
            .field("underscores", &self.underscores)
            .field("text_blocks", &self.text_blocks)
            .finish()
    }
}
