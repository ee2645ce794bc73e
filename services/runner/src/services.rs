//! Generator Wiring
//!
//! Builds the command generator and pipeline selected by the configuration.

use crate::config::{Config, GeneratorKind};
use anyhow::{Context, Result};
use async_openai::config::OpenAIConfig;
use cdu_core::{
    CommandGenerator, CommandPipeline, KeywordCommandGenerator, LlmCommandGenerator, Message,
    OpenAICompatibleClient,
};
use serde_json::Value;
use std::{fs, sync::Arc};
use tracing::info;

/// Creates the generator named by `config.generator`.
pub fn build_generator(config: &Config) -> Result<Arc<dyn CommandGenerator>> {
    match config.generator {
        GeneratorKind::Keyword => {
            info!("Using keyword command generator.");
            Ok(Arc::new(KeywordCommandGenerator::new()))
        }
        GeneratorKind::Llm => {
            info!(model = %config.chat_model, "Using LLM command generator.");
            let api_key = config
                .openai_api_key
                .as_ref()
                .context("OPENAI_API_KEY is required for the LLM generator")?;
            let openai_config = OpenAIConfig::new()
                .with_api_key(api_key)
                .with_api_base(&config.openai_api_base);
            let client = Arc::new(OpenAICompatibleClient::new(
                openai_config,
                config.chat_model.clone(),
            ));

            let mut generator = LlmCommandGenerator::new(client);
            if let Some(path) = &config.prompt_template_path {
                let template = fs::read_to_string(path).with_context(|| {
                    format!("Failed to read prompt template from {}", path.display())
                })?;
                generator = generator.with_prompt_template(template);
            }
            Ok(Arc::new(generator))
        }
    }
}

/// Wraps `generator` in a pipeline using the configured policy and concurrency.
pub fn build_pipeline(config: &Config, generator: Arc<dyn CommandGenerator>) -> CommandPipeline {
    CommandPipeline::new(generator)
        .with_error_policy(config.error_policy)
        .with_concurrency(config.max_concurrency)
}

/// Renders each message's output fields as one JSON line.
pub fn render_output(messages: &[Message]) -> Result<String> {
    let lines = messages
        .iter()
        .map(|message| serde_json::to_string(&Value::Object(message.as_output())))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdu_core::{ErrorPolicy, Flow, FlowsList};
    use std::io::Write;
    use std::path::PathBuf;
    use tracing::Level;

    fn keyword_config() -> Config {
        Config {
            generator: GeneratorKind::Keyword,
            openai_api_key: None,
            openai_api_base: "https://api.openai.com/v1/".to_string(),
            chat_model: "gpt-4o".to_string(),
            error_policy: ErrorPolicy::CollectErrors,
            max_concurrency: 3,
            prompt_template_path: None,
            log_level: Level::INFO,
        }
    }

    #[tokio::test]
    async fn test_keyword_pipeline_end_to_end() {
        let config = keyword_config();
        let pipeline = build_pipeline(&config, build_generator(&config).unwrap());
        let flows = FlowsList::new(vec![Flow::new("order_flow")]);
        let mut messages = vec![Message::new("cancel my order"), Message::new("thanks!")];

        let report = pipeline.run(&mut messages, None, Some(&flows)).await.unwrap();

        assert!(report.is_success());
        assert_eq!(pipeline.concurrency(), 3);
        assert_eq!(pipeline.error_policy(), ErrorPolicy::CollectErrors);
        assert_eq!(
            render_output(&messages).unwrap(),
            "{\"commands\":[{\"command\":\"CancelFlow\",\"flow\":\"order_flow\"}],\"text\":\"cancel my order\"}\n\
             {\"commands\":[{\"command\":\"ChitChatAnswer\"}],\"text\":\"thanks!\"}"
        );
    }

    #[test]
    fn test_llm_generator_requires_key() {
        let config = Config {
            generator: GeneratorKind::Llm,
            ..keyword_config()
        };
        assert!(build_generator(&config).is_err());
    }

    #[test]
    fn test_llm_generator_reads_prompt_template() {
        let mut template = tempfile::NamedTempFile::new().unwrap();
        template.write_all(b"{user_message}").unwrap();
        let config = Config {
            generator: GeneratorKind::Llm,
            openai_api_key: Some("test-key".to_string()),
            prompt_template_path: Some(template.path().to_path_buf()),
            ..keyword_config()
        };

        assert!(build_generator(&config).is_ok());
    }

    #[test]
    fn test_llm_generator_missing_template_file() {
        let config = Config {
            generator: GeneratorKind::Llm,
            openai_api_key: Some("test-key".to_string()),
            prompt_template_path: Some(PathBuf::from("/no/such/template.md")),
            ..keyword_config()
        };

        let err = build_generator(&config).err().unwrap();
        assert!(err.to_string().contains("prompt template"));
    }
}
