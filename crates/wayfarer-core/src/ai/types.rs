//! Backend-agnostic request and info types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Sampling parameters sent with every generation call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl GenerationParams {
    /// Near-deterministic settings for structured plan generation
    pub fn plan() -> Self {
        Self {
            temperature: 0.1,
            top_k: 10,
            top_p: 0.8,
            max_output_tokens: 8192,
        }
    }

    /// Looser settings for conversational plan edits
    pub fn chat() -> Self {
        Self {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 4096,
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::plan()
    }
}

/// Which generative backend to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Gemini,
    Ollama,
    Mock,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Ollama => "ollama",
            Self::Mock => "mock",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::Gemini)
    }

    /// Host used when the config leaves it empty
    pub fn default_host(&self) -> &'static str {
        match self {
            Self::Gemini => "https://generativelanguage.googleapis.com",
            Self::Ollama => "http://localhost:11434",
            Self::Mock => "mock://localhost",
        }
    }

    /// Model used when the config leaves it empty
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini-2.0-flash",
            Self::Ollama => "llama3.2",
            Self::Mock => "mock",
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "ollama" => Ok(Self::Ollama),
            "mock" => Ok(Self::Mock),
            other => Err(format!("Unknown AI backend: {}", other)),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend description for health output and logs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendInfo {
    pub backend: BackendKind,
    pub model: String,
    pub host: String,
    /// Whether a credential is present (never the credential itself)
    pub has_api_key: bool,
}
