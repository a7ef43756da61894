//! Execution provider selection

use anyhow::{Context, Result};
use ort::ep::ExecutionProvider;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::ui;

pub use crate::cli::Provider;

static PROVIDER_LOGGED: AtomicBool = AtomicBool::new(false);

fn log_once(message: &str) {
	if !PROVIDER_LOGGED.swap(true, Ordering::Relaxed) {
		ui::info(message);
	}
}

pub fn create_session(model_path: &Path, provider: Provider) -> Result<Session> {
	let mut builder = Session::builder().context("Failed to create session builder")?;

	match provider {
		Provider::Auto => register_best(&mut builder),
		Provider::Cpu => log_once("Using CPU execution provider (forced)"),
		Provider::Cuda => {
			if !try_cuda(&mut builder) {
				ui::error("CUDA requested but unavailable, falling back to CPU");
			}
		}
		Provider::Tensorrt => {
			if !try_tensorrt(&mut builder) {
				ui::error("TensorRT requested but unavailable, falling back to CPU");
			}
		}
		Provider::Coreml => {
			#[cfg(target_os = "macos")]
			if !try_coreml(&mut builder) {
				ui::error("CoreML requested but unavailable, falling back to CPU");
			}
			#[cfg(not(target_os = "macos"))]
			ui::error("CoreML only available on macOS, falling back to CPU");
		}
		Provider::Xnnpack => {
			if !try_xnnpack(&mut builder) {
				ui::error("XNNPACK requested but unavailable, falling back to CPU");
			}
		}
	}

	builder
		.with_optimization_level(GraphOptimizationLevel::Level3)?
		.with_intra_threads(4)?
		.commit_from_file(model_path)
		.context("Failed to load model")
}

fn register_best(builder: &mut SessionBuilder) {
	if try_tensorrt(builder) || try_cuda(builder) {
		return;
	}

	#[cfg(target_os = "macos")]
	if try_coreml(builder) {
		return;
	}

	if try_xnnpack(builder) {
		return;
	}

	log_once("Using CPU execution provider");
}

fn try_register<P: ExecutionProvider + Default>(builder: &mut SessionBuilder, name: &str) -> bool {
	ui::debug(&format!("Trying provider: {}", name));

	let provider = P::default();
	if !provider.is_available().unwrap_or(false) {
		ui::debug(&format!("{} not available", name));
		return false;
	}

	match provider.register(builder) {
		Ok(_) => {
			if !PROVIDER_LOGGED.swap(true, Ordering::Relaxed) {
				ui::success(&format!("Using {} execution provider", name));
			}
			true
		}
		Err(e) => {
			ui::debug(&format!("{} registration failed: {}", name, e));
			false
		}
	}
}

fn try_cuda(builder: &mut SessionBuilder) -> bool {
	try_register::<ort::ep::CUDA>(builder, "CUDA")
}

#[cfg(target_os = "macos")]
fn try_coreml(builder: &mut SessionBuilder) -> bool {
	try_register::<ort::ep::CoreML>(builder, "CoreML")
}

fn try_tensorrt(builder: &mut SessionBuilder) -> bool {
	try_register::<ort::ep::TensorRT>(builder, "TensorRT")
}

fn try_xnnpack(builder: &mut SessionBuilder) -> bool {
	try_register::<ort::ep::XNNPACK>(builder, "XNNPACK")
}
