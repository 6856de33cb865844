use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use reel_textgen::{GenerationError, GenerationResult, TextGenerator};

/// Text generator fake returning fixed strings.
#[derive(Clone)]
pub struct StaticTextGenerator {
    pub summary: String,
    pub prompt: String,
    pub calls: Arc<Mutex<Vec<String>>>,
    pub fail_with: Option<String>,
}

impl StaticTextGenerator {
    pub fn new(prompt: &str) -> Self {
        Self {
            summary: "a static summary".to_string(),
            prompt: prompt.to_string(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            summary: String::new(),
            prompt: String::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: Some(msg.to_string()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for StaticTextGenerator {
    async fn summarize(&self, answers: &[String]) -> GenerationResult<String> {
        self.calls.lock().unwrap().push(answers.join("|"));
        if let Some(ref msg) = self.fail_with {
            return Err(GenerationError::request(msg.clone()));
        }
        Ok(self.summary.clone())
    }

    async fn prompt_from_summary(&self, summary: &str) -> GenerationResult<String> {
        self.calls.lock().unwrap().push(summary.to_string());
        if let Some(ref msg) = self.fail_with {
            return Err(GenerationError::request(msg.clone()));
        }
        Ok(self.prompt.clone())
    }
}
