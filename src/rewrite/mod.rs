pub mod openai;

use crate::error::RewriteError;

pub use openai::OpenAiRewriter;

/// Rewrites a whole file from a system directive and a task directive.
/// Returns the complete replacement text, possibly wrapped in a code fence.
pub trait RewriteService {
    async fn rewrite(&self, system: &str, task: &str) -> Result<String, RewriteError>;
}
