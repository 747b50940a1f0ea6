//! Translator capability and the configured backend.

use std::future::Future;
use std::time::Duration;

use crate::config::{BackendKind, TranslationConfig};
use crate::translation::papago::Papago;
use crate::translation::TranslateError;

/// Opaque text-in, text-out translator.
///
/// Implementations know nothing about markers; they are only expected to keep
/// line structure intact.
pub trait Translate: Send + Sync + 'static {
    fn translate(&self, text: &str) -> impl Future<Output = Result<String, TranslateError>> + Send;
}

/// Returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Translate for Passthrough {
    async fn translate(&self, text: &str) -> Result<String, TranslateError> {
        Ok(text.to_string())
    }
}

/// Translator selected by configuration.
#[derive(Debug, Clone)]
pub enum TranslatorBackend {
    Papago(Papago),
    Passthrough(Passthrough),
}

impl TranslatorBackend {
    /// Build the configured backend. `timeout` bounds every outbound call.
    pub fn from_config(config: &TranslationConfig, timeout: Duration) -> Result<Self, TranslateError> {
        match config.backend {
            BackendKind::Papago => Ok(TranslatorBackend::Papago(Papago::new(
                &config.papago_url,
                &config.source,
                &config.target,
                timeout,
            )?)),
            BackendKind::Passthrough => Ok(TranslatorBackend::Passthrough(Passthrough)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TranslatorBackend::Papago(_) => "papago",
            TranslatorBackend::Passthrough(_) => "passthrough",
        }
    }
}

impl Translate for TranslatorBackend {
    async fn translate(&self, text: &str) -> Result<String, TranslateError> {
        match self {
            TranslatorBackend::Papago(papago) => papago.translate(text).await,
            TranslatorBackend::Passthrough(passthrough) => passthrough.translate(text).await,
        }
    }
}
