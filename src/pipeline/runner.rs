//! The image-to-tensor pipeline.

use crate::config::{Config, Options};
use crate::error::Result;
use crate::image::RawImage;
use crate::message::{ImageMessage, TensorList};
use crate::tensor::TensorRecord;

use super::pack::pack;
use super::preprocess::transform;

/// Stateless image-to-tensor pipeline over a fixed configuration.
///
/// Holds nothing but its [`Config`], so a single instance can be shared by
/// reference across threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    /// Create a pipeline over a validated configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        tracing::info!(
            "Pipeline ready: {}x{}, normalize={}, tensor_fmt={}, data_type={}",
            config.target_width(),
            config.target_height(),
            config.normalize(),
            config.layout(),
            config.element_type()
        );

        Self { config }
    }

    /// Validate named options and create a pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if any option is invalid.
    pub fn from_options(options: &Options) -> Result<Self> {
        Config::try_from(options).map(Self::new)
    }

    /// The configuration this pipeline runs with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Turn one image into a tensor record.
    ///
    /// # Errors
    ///
    /// Returns an error if the image is not a 3-channel buffer matching its
    /// dimensions, or if packing fails.
    pub fn process(&self, image: &RawImage<'_>) -> Result<TensorRecord> {
        let transformed = transform(image, &self.config)?;
        pack(&transformed, &self.config)
    }

    /// Decode and process one message.
    ///
    /// Failures are logged and yield `None`; the caller moves on to the next
    /// message. On success the input header is copied onto the output.
    #[must_use]
    pub fn handle(&self, message: &ImageMessage) -> Option<TensorList> {
        tracing::debug!("Handling image from frame `{}`", message.header.frame_id);

        let result = message
            .decode()
            .and_then(|image| self.process(&image.as_raw()));

        match result {
            Ok(tensor) => Some(TensorList {
                header: message.header.clone(),
                tensors: vec![tensor],
            }),
            Err(err) => {
                tracing::error!(
                    "Dropping image from frame `{}`: {err}",
                    message.header.frame_id
                );
                None
            }
        }
    }
}
