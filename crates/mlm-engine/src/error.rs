//! Error type for `mlm-engine`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] mlm_core::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("failed to read template {path:?}: {source}")]
  TemplateRead {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("template error: {0}")]
  Template(#[from] minijinja::Error),

  #[error("configuration error: {0}")]
  Config(String),

  #[error("delivery failed: {0}")]
  Delivery(String),
}

impl Error {
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
