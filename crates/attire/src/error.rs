//! Compile error taxonomy.

use attire_tokens::TokenError;
use thiserror::Error;

/// Fatal and element-scoped failures raised by the compiler.
///
/// Recoverable conditions (missing tokens under a `warn-*` policy, blank
/// classes, extension overlap, malformed style strings) never surface here;
/// they degrade to diagnostics and compilation continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Malformed hierarchy or styling configuration. Fatal: aborts the
    /// whole compile and names the violated invariant.
    #[error("configuration error at {context}: {message}")]
    Configuration { context: String, message: String },

    /// A styling system `extends` chain loops back on itself. Fatal; the
    /// message names the full cycle.
    #[error("styling system cycle: {}", .cycle.join(" -> "))]
    StylingCycle { cycle: Vec<String> },

    /// A token was missing under the `error` policy. Scoped to the
    /// offending element unless the project is compiled strict.
    #[error("token resolution failed at {path}: {source}")]
    TokenResolution {
        path: String,
        #[source]
        source: TokenError,
    },
}
