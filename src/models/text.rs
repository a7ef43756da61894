//! Sentence encoder (MiniLM) for product descriptions

use anyhow::{Context, Result};
use ort::session::Session;
use std::path::Path;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

use crate::cli::Provider;
use crate::config::{EMBEDDING_DIM, MAX_TOKENS};
use crate::core::Embedding;

pub struct TextModel {
    session: Session,
    tokenizer: Tokenizer,
}

impl TextModel {
    pub fn load(model_path: &Path, tokenizer_path: &Path, provider: Provider) -> Result<Self> {
        let session = crate::runtime::create_session(model_path, provider)
            .context("Failed to load text model")?;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            ..Default::default()
        }));
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure truncation: {}", e))?;

        Ok(Self { session, tokenizer })
    }

    pub fn encode_batch(&mut self, texts: &[&str]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = self.tokenizer.encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        let batch = encodings.len();
        let seq_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);

        let mut input_ids = Vec::with_capacity(batch * seq_len);
        let mut attention_mask = Vec::with_capacity(batch * seq_len);
        let mut type_ids = Vec::with_capacity(batch * seq_len);
        for encoding in &encodings {
            input_ids.extend(encoding.get_ids().iter().map(|&x| x as i64));
            attention_mask.extend(encoding.get_attention_mask().iter().map(|&x| x as i64));
            type_ids.extend(encoding.get_type_ids().iter().map(|&x| x as i64));
        }
        let mask = attention_mask.clone();

        let shape = vec![batch, seq_len];
        let ids = ort::value::Value::from_array((shape.clone(), input_ids))?;
        let attention = ort::value::Value::from_array((shape.clone(), attention_mask))?;
        let types = ort::value::Value::from_array((shape, type_ids))?;

        let outputs = self.session.run(ort::inputs![
            "input_ids" => ids,
            "attention_mask" => attention,
            "token_type_ids" => types
        ])?;
        let pooled = extract_embeddings(&outputs, &mask, batch, seq_len)?;

        Ok(pooled.into_iter().map(Embedding::new).collect())
    }
}

fn extract_embeddings(
    outputs: &ort::session::SessionOutputs,
    mask: &[i64],
    batch: usize,
    seq_len: usize,
) -> Result<Vec<Vec<f32>>> {
    let hidden = outputs.get("last_hidden_state")
        .context("No last_hidden_state output found")?;

    let (shape, data) = hidden.try_extract_tensor::<f32>()?;
    let dims: Vec<usize> = shape.iter().map(|&x| x as usize).collect();

    match dims.as_slice() {
        // Already pooled by the export
        [b, dim] if *b == batch && *dim == EMBEDDING_DIM => {
            Ok(data.chunks(EMBEDDING_DIM).map(|c| c.to_vec()).collect())
        }
        [b, s, dim] if *b == batch && *s == seq_len && *dim == EMBEDDING_DIM => {
            Ok(mean_pool(data, mask, batch, seq_len, EMBEDDING_DIM))
        }
        _ => anyhow::bail!("Unexpected text model output shape {:?}", dims),
    }
}

/// Average token vectors, counting only positions the attention mask keeps
fn mean_pool(data: &[f32], mask: &[i64], batch: usize, seq_len: usize, dim: usize) -> Vec<Vec<f32>> {
    (0..batch)
        .map(|b| {
            let mut pooled = vec![0.0f32; dim];
            let mut count = 0.0f32;
            for t in 0..seq_len {
                if mask[b * seq_len + t] == 0 {
                    continue;
                }
                count += 1.0;
                let offset = (b * seq_len + t) * dim;
                for j in 0..dim {
                    pooled[j] += data[offset + j];
                }
            }
            let count = count.max(1.0);
            pooled.iter_mut().for_each(|v| *v /= count);
            pooled
        })
        .collect()
}
