pub mod assembler;
pub mod window;

pub use self::assembler::{assemble, AssembledContext, ProfileSelection};
pub use self::window::{History, TRIM_PLACEHOLDER};

/// Role, tool guidance and output rules. Always the first segment.
pub const GHOSTWRITER_PROMPT: &str = include_str!("../../prompts/ghostwriter.txt");

/// Fixed blending rules appended in mix mode.
pub const MIX_DIRECTIVE: &str = include_str!("../../prompts/mix.txt");
