//! The `GenerationService` trait -- the adapter interface for text backends.
//!
//! The trait is object-safe so callers can hold `Arc<dyn GenerationService>`
//! and swap the real Gemini client for a scripted one in tests.

use async_trait::async_trait;

use super::error::GenerationError;

/// A backend that turns one prompt into one block of text.
///
/// There is no conversation state: every call is independent.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Human-readable backend name (e.g. "gemini").
    fn name(&self) -> &str;

    /// Whether a credential is configured.
    ///
    /// Callers check this before sending anything; a backend without a
    /// credential must never be asked to generate.
    fn has_credential(&self) -> bool;

    /// Send `prompt` and return the generated text.
    async fn generate_text(&self, prompt: &str) -> Result<String, GenerationError>;
}

// Compile-time assertion: GenerationService must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn GenerationService) {}
};

#[cfg(test)]
mod tests {
    use super::*;

    /// Echoes the prompt back, used only to prove the trait works as
    /// `dyn GenerationService`.
    struct EchoService;

    #[async_trait]
    impl GenerationService for EchoService {
        fn name(&self) -> &str {
            "echo"
        }

        fn has_credential(&self) -> bool {
            true
        }

        async fn generate_text(&self, prompt: &str) -> Result<String, GenerationError> {
            Ok(prompt.to_string())
        }
    }

    #[tokio::test]
    async fn echo_service_as_trait_object() {
        let service: Box<dyn GenerationService> = Box::new(EchoService);
        assert_eq!(service.name(), "echo");
        assert!(service.has_credential());
        assert_eq!(service.generate_text("xin chào").await.unwrap(), "xin chào");
    }
}
