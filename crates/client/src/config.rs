//! Environment configuration for the chat endpoint.

/// Chat endpoint settings, read from the environment with defaults matching
/// a local Ollama install.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: String,
    pub model: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env_or("OLLAMA_HOST", "localhost"),
            port: env_or("OLLAMA_PORT", "11434"),
            model: env_or("OLLAMA_MODEL", "qwen3:8b"),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_variable_falls_back_to_default() {
        assert_eq!(env_or("CSVCHAT_TEST_UNSET_VARIABLE", "fallback"), "fallback");
    }
}
