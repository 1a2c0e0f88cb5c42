pub mod openai;

use tracing::{debug, error};

use crate::errors::ApiError;

#[async_trait::async_trait]
pub trait Llm: Send + Sync {
    /// One single-turn chat completion; returns the first choice's text.
    async fn complete(&self, prompt: &str, model: &str) -> Result<String, ApiError>;
}

/// Calls the model once and turns every failure into `None`.
///
/// The error is logged with the item index; an empty completion counts as
/// no result too. A `None` means the item gets no record.
pub async fn call_api(llm: &dyn Llm, prompt: &str, model: &str, idx: usize) -> Option<String> {
    match llm.complete(prompt, model).await {
        Ok(text) if text.trim().is_empty() => {
            debug!(idx, "empty completion");
            None
        }
        Ok(text) => Some(text),
        Err(e) => {
            error!(idx, error = %e, "API call failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scripted(Result<&'static str, ()>);

    #[async_trait::async_trait]
    impl Llm for Scripted {
        async fn complete(&self, _prompt: &str, _model: &str) -> Result<String, ApiError> {
            self.0.map(str::to_string).map_err(|_| ApiError::NoChoices)
        }
    }

    #[tokio::test]
    async fn failures_and_empty_text_become_none() {
        assert_eq!(call_api(&Scripted(Err(())), "p", "m", 3).await, None);
        assert_eq!(call_api(&Scripted(Ok("  \n")), "p", "m", 3).await, None);
        assert_eq!(call_api(&Scripted(Ok("{}")), "p", "m", 3).await.as_deref(), Some("{}"));
    }
}
