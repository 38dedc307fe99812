//! Provider-specific URL handling.
//!
//! All supported providers accept the Chat Completions wire format; they only
//! differ in where the endpoint lives.

/// Supported completion providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Groq (groq.com), served under `/openai/v1`.
    Groq,
    /// `OpenAI` (api.openai.com)
    OpenAI,
    /// `OpenRouter` (openrouter.ai), served under `/api/v1`.
    OpenRouter,
    /// Generic OpenAI-compatible provider
    Generic,
}

impl Provider {
    /// Detect provider from base URL.
    ///
    /// # Example
    ///
    /// ```rust
    /// use portfolio_site::llm::Provider;
    ///
    /// let provider = Provider::detect_from_url("https://api.groq.com/openai");
    /// assert_eq!(provider, Provider::Groq);
    /// ```
    #[must_use]
    pub fn detect_from_url(base_url: &str) -> Self {
        let lower = base_url.to_lowercase();

        if lower.contains("groq.com") {
            Self::Groq
        } else if lower.contains("openrouter.ai") {
            Self::OpenRouter
        } else if lower.contains("openai.com") {
            Self::OpenAI
        } else {
            Self::Generic
        }
    }

    /// Build the chat completions URL for this provider.
    ///
    /// A base URL that already ends in `/v1` is used as-is so that
    /// `https://api.groq.com/openai/v1` and `https://api.groq.com/openai`
    /// resolve to the same endpoint.
    #[must_use]
    pub fn build_chat_url(self, base_url: &str) -> String {
        let base = base_url.trim_end_matches('/');

        if base.ends_with("/v1") {
            return format!("{base}/chat/completions");
        }

        match self {
            Self::Groq if !base.ends_with("/openai") => format!("{base}/openai/v1/chat/completions"),
            Self::OpenRouter if !base.ends_with("/api") => format!("{base}/api/v1/chat/completions"),
            _ => format!("{base}/v1/chat/completions"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_groq() {
        let provider = Provider::detect_from_url("https://api.groq.com/openai");
        assert_eq!(provider, Provider::Groq);
    }

    #[test]
    fn test_detect_openrouter() {
        let provider = Provider::detect_from_url("https://openrouter.ai");
        assert_eq!(provider, Provider::OpenRouter);
    }

    #[test]
    fn test_detect_generic() {
        let provider = Provider::detect_from_url("http://127.0.0.1:8080");
        assert_eq!(provider, Provider::Generic);
    }

    #[test]
    fn test_build_url_groq() {
        let url = Provider::Groq.build_chat_url("https://api.groq.com/openai/");
        assert_eq!(url, "https://api.groq.com/openai/v1/chat/completions");

        let url = Provider::Groq.build_chat_url("https://api.groq.com");
        assert_eq!(url, "https://api.groq.com/openai/v1/chat/completions");
    }

    #[test]
    fn test_build_url_with_version_suffix() {
        let url = Provider::OpenAI.build_chat_url("https://api.openai.com/v1");
        assert_eq!(url, "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn test_build_url_openrouter() {
        let url = Provider::OpenRouter.build_chat_url("https://openrouter.ai");
        assert_eq!(url, "https://openrouter.ai/api/v1/chat/completions");
    }

    #[test]
    fn test_build_url_generic() {
        let url = Provider::Generic.build_chat_url("http://127.0.0.1:8080");
        assert_eq!(url, "http://127.0.0.1:8080/v1/chat/completions");
    }
}
