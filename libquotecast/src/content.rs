//! Content generation for text and image posts

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::imaging::prompt::build_image_prompt;
use crate::imaging::{ImageComposer, ImageGenerator, ImageHost};
use crate::types::{ColorPresets, ImageSource, PageConfig};

/// Fallbacks for per-page image settings that are unset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDefaults {
    pub model: String,
    pub resolution: String,
    pub font: String,
}

impl Default for ContentDefaults {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for ContentDefaults {
    fn from(config: &Config) -> Self {
        Self {
            model: config.generation.default_model.clone(),
            resolution: config.generation.default_resolution.clone(),
            font: config.compose.default_font.clone(),
        }
    }
}

/// Preset chosen for a text post and the index to persist afterwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetChoice {
    pub preset_id: String,
    pub next_index: u32,
}

/// Round-robin pick from the page's decorative presets
///
/// Returns `None` when presets are disabled or the list is empty.
pub fn next_preset(color: &ColorPresets) -> Option<PresetChoice> {
    if !color.enabled || color.presets.is_empty() {
        return None;
    }
    let len = color.presets.len();
    let index = color.index as usize;
    Some(PresetChoice {
        preset_id: color.presets[index % len].clone(),
        next_index: ((index + 1) % len) as u32,
    })
}

/// Produces the image URL for image posts
#[derive(Clone)]
pub struct ContentGenerator {
    generator: Arc<dyn ImageGenerator>,
    host: Arc<dyn ImageHost>,
    composer: Arc<dyn ImageComposer>,
    defaults: ContentDefaults,
}

impl ContentGenerator {
    pub fn new(
        generator: Arc<dyn ImageGenerator>,
        host: Arc<dyn ImageHost>,
        composer: Arc<dyn ImageComposer>,
    ) -> Self {
        Self {
            generator,
            host,
            composer,
            defaults: ContentDefaults::default(),
        }
    }

    pub fn with_defaults(mut self, defaults: ContentDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Produce a publicly reachable image for `quote` on `config`'s page
    ///
    /// A templated-background page without a background URL falls back to
    /// a generated image.
    pub async fn image_url(&self, config: &PageConfig, quote: &str) -> Result<String> {
        match config.image.source {
            ImageSource::TemplatedBackground => {
                let background = config
                    .image
                    .background_url
                    .as_deref()
                    .filter(|url| !url.trim().is_empty());
                match background {
                    Some(background) => {
                        let font = config.image.font.as_deref().unwrap_or(&self.defaults.font);
                        self.composer.compose(quote, background, font).await
                    }
                    None => {
                        tracing::warn!(
                            page_id = %config.page_id,
                            "No background configured for templated image, generating instead"
                        );
                        self.generated_image_url(config, quote).await
                    }
                }
            }
            ImageSource::Generated => self.generated_image_url(config, quote).await,
        }
    }

    async fn generated_image_url(&self, config: &PageConfig, quote: &str) -> Result<String> {
        let resolution = config
            .image
            .resolution
            .as_deref()
            .unwrap_or(&self.defaults.resolution);
        let model = config.image.model.as_deref().unwrap_or(&self.defaults.model);

        let prompt = build_image_prompt(
            quote,
            config.page_name.as_deref(),
            config.image.prompt_template.as_deref(),
            config.image.aspect_ratio.as_deref(),
            resolution,
        );

        let image = self.generator.generate(&prompt, model).await?;
        self.host.upload(&image).await
    }
}
