use anyhow::Result;
use async_trait::async_trait;

// =============================================================================
// Generator Trait
// =============================================================================

/// A callable text-generation capability: prompt in, text out, may fail.
///
/// The credential travels with every call rather than living inside the
/// client so one client can serve an ordered credential list. The caller
/// owns the fallback policy; the client owns the wire protocol.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        credential: &str,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String>;
}
