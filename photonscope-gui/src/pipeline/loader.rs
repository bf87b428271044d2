//! File loading worker.
//!
//! Runs one load on a background thread and reports the outcome through
//! the app channel. Files without a suffix go through the NI binary loader;
//! everything else is dispatched by the registry.

use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Instant;

use photonscope_core::Dataset;
use photonscope_io::{load_ni_binary, LoadOptions, LoaderRegistry};

use crate::message::AppMessage;
use crate::state::{BrowserSession, NI_BINARY_HINT};

/// One load request.
pub struct LoadRequest {
    pub generation: u64,
    pub path: PathBuf,
    pub options: LoadOptions,
}

fn load(registry: &LoaderRegistry, request: &LoadRequest) -> photonscope_io::Result<Dataset> {
    if BrowserSession::loader_hint(&request.path) == NI_BINARY_HINT {
        load_ni_binary(&request.path, &request.options)
    } else {
        registry.load(&request.path, &request.options)
    }
}

/// Loads the requested file and sends the result to the UI thread.
pub fn load_file_worker(
    registry: &Arc<LoaderRegistry>,
    request: LoadRequest,
    tx: &Sender<AppMessage>,
) {
    let start = Instant::now();
    let message = match load(registry, &request) {
        Ok(dataset) => {
            log::info!(
                "loaded {} ({} events) in {:.2?}",
                request.path.display(),
                dataset.events().len(),
                start.elapsed()
            );
            AppMessage::LoadComplete(request.generation, Box::new(dataset), start.elapsed())
        }
        Err(e) => {
            log::warn!("failed to load {}: {e}", request.path.display());
            AppMessage::LoadError(request.generation, request.path, e.to_string())
        }
    };
    let _ = tx.send(message);
}
