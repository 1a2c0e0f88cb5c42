use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use confcal::errors::ApiError;

pub struct FakeLlm {
    // maps each prompt to a completion; None simulates a transport failure
    pub handler: Box<dyn Fn(&str) -> Option<String> + Send + Sync>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeLlm {
    pub fn new(handler: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self { handler: Box::new(handler), prompts: Mutex::new(Vec::new()) }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl confcal::llm::Llm for FakeLlm {
    async fn complete(&self, prompt: &str, _model: &str) -> Result<String, ApiError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        (self.handler)(prompt).ok_or(ApiError::NoChoices)
    }
}

pub fn write_dataset(dir: &Path, value: serde_json::Value) -> std::path::PathBuf {
    let path = dir.join("dataset.json");
    std::fs::write(&path, serde_json::to_vec(&value).unwrap()).unwrap();
    path
}
