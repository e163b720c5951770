//! Editor-facing encodings for Tessa analysis results.
//!
//! Today that is the semantic-token layer: the fixed type/modifier legend
//! and the whole-document delta encoder. The embedding language server owns
//! the transport; this crate only produces the payloads.

pub mod imports;
pub mod semantic_tokens;

#[cfg(test)]
mod tests;

pub use imports::{ImportGraph, LibraryDependency, NoImports, ResolvedImports};
pub use semantic_tokens::{
    decode_semantic_tokens, legend, semantic_tokens_full, to_semantic_tokens,
};
