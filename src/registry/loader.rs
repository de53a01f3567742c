//! Lazy, exactly-once analyzer instantiation
//!
//! Registration stores only a factory; the analyzer itself is built on
//! first use. Each descriptor owns an [`InstanceSlot`] whose cell is
//! initialized at most once per process, no matter how many requests race
//! on it. A factory failure is just as permanent as a success: the error
//! message is stored and replayed on every later call instead of retrying
//! the factory.

use crate::error::{HarmoniaError, Result};
use crate::registry::{Analyzer, AnalyzerFactory};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

type LoadOutcome = std::result::Result<Arc<dyn Analyzer>, String>;

/// Write-once holder for a lazily constructed analyzer instance
#[derive(Default)]
pub struct InstanceSlot {
    cell: OnceCell<LoadOutcome>,
}

impl InstanceSlot {
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// True once the factory has run, successfully or not
    pub fn initialized(&self) -> bool {
        self.cell.initialized()
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.cell.get(), Some(Ok(_)))
    }

    pub fn load_failed(&self) -> bool {
        matches!(self.cell.get(), Some(Err(_)))
    }

    /// Run the factory at most once and hand out the shared instance
    ///
    /// Concurrent callers block on the same initialization; losers of the
    /// race observe the winner's outcome. Once the factory has failed, the
    /// stored message is replayed without calling the factory again.
    pub async fn get_or_load(&self, id: &str, factory: &AnalyzerFactory) -> Result<Arc<dyn Analyzer>> {
        let outcome = self
            .cell
            .get_or_init(|| async {
                debug!("Instantiating analyzer '{}'", id);
                match factory() {
                    Ok(instance) => {
                        info!("Analyzer '{}' loaded", id);
                        Ok(instance)
                    }
                    Err(e) => {
                        let message = e.to_string();
                        error!("Analyzer '{}' failed to load: {}", id, message);
                        Err(message)
                    }
                }
            })
            .await;

        match outcome {
            Ok(instance) => Ok(Arc::clone(instance)),
            Err(message) => Err(HarmoniaError::AnalyzerLoad {
                id: id.to_string(),
                message: message.clone(),
            }),
        }
    }
}
