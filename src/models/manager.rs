//! Lazy model loading coordinator

use anyhow::{Context, Result};
use std::path::PathBuf;

use super::Embedder;
use crate::cli::Provider;
use crate::config::{self, Config};
use crate::core::Embedding;

/// ONNX sentence encoder that only loads the model on first use
pub struct Models {
	text: Option<super::text::TextModel>,
	text_path: PathBuf,
	tokenizer_path: PathBuf,
	provider: Provider,
}

impl Models {
	pub fn new(config: &Config) -> Result<Self> {
		let text_path = config.text_model_path().context(format!(
			"Text model not found. Ensure {} exists or set {}",
			config::TEXT_MODEL,
			config::ENV_MODELS_DIR
		))?;
		let tokenizer_path = config.tokenizer_path().context(format!(
			"Tokenizer not found. Ensure {} exists or set {}",
			config::TOKENIZER,
			config::ENV_MODELS_DIR
		))?;

		if !text_path.exists() {
			anyhow::bail!("Text model file does not exist: {}", text_path.display());
		}
		if !tokenizer_path.exists() {
			anyhow::bail!(
				"Tokenizer file does not exist: {}",
				tokenizer_path.display()
			);
		}

		Ok(Self {
			text: None,
			text_path,
			tokenizer_path,
			provider: config.provider,
		})
	}
}

impl Embedder for Models {
	fn model_id(&self) -> &str {
		config::MODEL_ID
	}

	fn dimension(&self) -> usize {
		config::EMBEDDING_DIM
	}

	fn encode_batch(&mut self, texts: &[&str]) -> Result<Vec<Embedding>> {
		let model = match self.text.as_mut() {
			Some(model) => model,
			None => {
				crate::ui::debug(&format!("Loading text model: {}", self.text_path.display()));
				let model = super::text::TextModel::load(
					&self.text_path,
					&self.tokenizer_path,
					self.provider,
				)?;
				crate::ui::success("Text model loaded");
				self.text.insert(model)
			}
		};

		let embeddings = model.encode_batch(texts)?;
		anyhow::ensure!(
			embeddings.len() == texts.len(),
			"model returned {} embeddings for {} inputs",
			embeddings.len(),
			texts.len()
		);
		Ok(embeddings)
	}
}
