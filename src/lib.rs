pub mod api;
pub mod cache;
pub mod db;
pub mod duplicate;
pub mod environment;
pub mod error;
pub mod extract;
pub mod import;
pub mod llm;
pub mod logging;
pub mod normalize;
pub mod types;
pub mod util;

use async_openai::{config::OpenAIConfig, Client as OpenAIClient};
use ollama_rs::Ollama;

pub const TARGET_LLM_REQUEST: &str = "llm_request";
pub const TARGET_DB: &str = "db_query";
pub const TARGET_IMPORT: &str = "import";
pub const TARGET_DUPLICATE: &str = "duplicate";
pub const TARGET_NORMALIZE: &str = "normalize";
pub const TARGET_EXTRACT: &str = "extract";

#[derive(Clone, Debug)]
pub enum LLMClient {
    Ollama(Ollama),
    OpenAI(OpenAIClient<OpenAIConfig>),
}

#[derive(Clone, Debug)]
pub struct LLMParams {
    pub llm_client: LLMClient,
    pub model: String,
    pub temperature: f32,
}
