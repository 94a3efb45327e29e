//! Codec configuration.

/// Nesting limit used when none is configured
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Options shared by decode and encode calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecOptions {
    /// Maximum element nesting. The tree builder, the serializer and host
    /// value conversion all fail with `OutOfResources` beyond it, so no
    /// recursive path can exhaust the native stack.
    pub max_depth: usize,
}

impl CodecOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for CodecOptions {
    fn default() -> Self {
        CodecOptions {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(CodecOptions::new().max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(CodecOptions::default().with_max_depth(4).max_depth, 4);
    }
}
