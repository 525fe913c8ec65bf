//! Channel layer for prompt matching.
//!
//! This module decides whether the tail of a terminal session's output is
//! showing a prompt, after stripping ANSI escape sequences.

mod buffer;
mod patterns;

pub use buffer::PatternBuffer;
pub use patterns::{PromptMatcher, compile_prompt_pattern, find_at_tail, union_pattern};
