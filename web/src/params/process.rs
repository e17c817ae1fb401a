use serde::Deserialize;
use utoipa::ToSchema;

fn default_max_tokens() -> u32 {
    100
}

/// Request body for starting a prompt-driven token stream.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProcessParams {
    /// Prompt text, echoed back on every emitted token event.
    pub prompt: String,
    /// Number of token events to emit. Zero is valid: the stream closes
    /// immediately after the response starts, having written no frames.
    #[serde(default = "default_max_tokens")]
    #[schema(default = 100)]
    pub max_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_tokens_defaults_to_one_hundred() {
        let params: ProcessParams = serde_json::from_str(r#"{"prompt": "hi"}"#).unwrap();
        assert_eq!(params.prompt, "hi");
        assert_eq!(params.max_tokens, 100);
    }

    #[test]
    fn explicit_max_tokens_wins() {
        let params: ProcessParams =
            serde_json::from_str(r#"{"prompt": "hi", "max_tokens": 3}"#).unwrap();
        assert_eq!(params.max_tokens, 3);
    }

    #[test]
    fn negative_max_tokens_is_rejected() {
        let result = serde_json::from_str::<ProcessParams>(r#"{"prompt": "hi", "max_tokens": -1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn missing_prompt_is_rejected() {
        let result = serde_json::from_str::<ProcessParams>(r#"{"max_tokens": 3}"#);
        assert!(result.is_err());
    }
}
