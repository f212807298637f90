use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use reviewlens_analytics::{LlmClient, LlmPrompt, ReportGenerator, ThemeSummarizer};
use reviewlens_core::config::{AppConfig, OutputConfig};
use reviewlens_core::store::ReviewStore;

const SAMPLE_CSV: &str = "\
Country,Restaurant Name,Sentiment,Review Title,Review Date,Review
Japan,SteamNoodles,Positive,Great,Jan 2019,Rich broth and quick service
Japan,SteamNoodles,Negative,Cold,Mar 2019,The food was cold
Japan,SteamNoodles,Neutral,Fine,Jun 2019,Average ramen
Japan,SteamNoodles,Positive,Lovely,Aug 2018,Friendly staff
Japan,SteamNoodles,Negative,Slow,Sept 2018,Waited an hour for noodles
";

/// Answers sentiment prompts with a fixed label and everything else with a
/// fixed reply.
#[derive(Clone)]
pub struct CannedLlm {
    label: String,
    reply: String,
    prompts: Arc<Mutex<Vec<LlmPrompt>>>,
}

impl CannedLlm {
    pub fn new(label: &str, reply: &str) -> Self {
        Self { label: label.to_string(), reply: reply.to_string(), prompts: Arc::default() }
    }

    pub fn call_count(&self) -> usize {
        match self.prompts.lock() {
            Ok(prompts) => prompts.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

#[async_trait]
impl LlmClient for CannedLlm {
    async fn complete(&self, prompt: &LlmPrompt) -> Result<String> {
        match self.prompts.lock() {
            Ok(mut prompts) => prompts.push(prompt.clone()),
            Err(poisoned) => poisoned.into_inner().push(prompt.clone()),
        }
        if prompt.system.contains("sentiment analysis expert") {
            Ok(self.label.clone())
        } else {
            Ok(self.reply.clone())
        }
    }
}

pub fn sample_store() -> Arc<ReviewStore> {
    Arc::new(ReviewStore::from_reader(SAMPLE_CSV.as_bytes()).expect("sample dataset"))
}

pub fn output_config(directory: &Path) -> OutputConfig {
    let mut output = AppConfig::default().output;
    output.directory = directory.to_path_buf();
    output
}

pub fn report_generator(llm: &CannedLlm) -> ReportGenerator {
    let shared: Arc<CannedLlm> = Arc::new(llm.clone());
    ReportGenerator::new(shared.clone(), ThemeSummarizer::new(shared, 6_000))
}
