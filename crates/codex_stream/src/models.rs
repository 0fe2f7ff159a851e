use std::{collections::BTreeMap, sync::OnceLock};

use serde::Serialize;

use crate::defaults::DEFAULT_MODEL_ID;

/// Static capability metadata for a model id.
///
/// Prices are USD per million tokens.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModelInfo {
    pub max_tokens: u32,
    pub context_window: u32,
    pub supports_images: bool,
    pub supports_prompt_cache: bool,
    pub supports_reasoning_effort: bool,
    pub input_price: f64,
    pub output_price: f64,
    pub cache_reads_price: f64,
    pub description: &'static str,
}

/// A resolved model id paired with its catalog entry.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModelSelection {
    pub id: String,
    pub info: ModelInfo,
}

/// Read-only mapping of supported model ids to [`ModelInfo`].
#[derive(Clone, Debug)]
pub struct ModelCatalog {
    default_id: &'static str,
    models: BTreeMap<&'static str, ModelInfo>,
}

impl ModelCatalog {
    /// Builds a catalog. `default_id` must be one of the entries.
    pub fn new(
        default_id: &'static str,
        models: impl IntoIterator<Item = (&'static str, ModelInfo)>,
    ) -> Option<Self> {
        let models: BTreeMap<_, _> = models.into_iter().collect();
        models.contains_key(default_id).then_some(Self { default_id, models })
    }

    /// Models supported by `codex exec`, built once per process.
    pub fn codex_cli() -> &'static ModelCatalog {
        static CATALOG: OnceLock<ModelCatalog> = OnceLock::new();
        CATALOG.get_or_init(|| ModelCatalog {
            default_id: DEFAULT_MODEL_ID,
            models: codex_cli_models().into_iter().collect(),
        })
    }

    pub fn default_id(&self) -> &'static str {
        self.default_id
    }

    pub fn get(&self, id: &str) -> Option<&ModelInfo> {
        self.models.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.models.keys().copied()
    }

    /// Returns the requested model when the catalog knows it, the default model otherwise.
    pub fn resolve(&self, requested: Option<&str>) -> ModelSelection {
        if let Some((id, info)) = requested.and_then(|id| self.models.get_key_value(id)) {
            return ModelSelection {
                id: (*id).to_string(),
                info: info.clone(),
            };
        }

        ModelSelection {
            id: self.default_id.to_string(),
            info: self.models[self.default_id].clone(),
        }
    }
}

fn codex_cli_models() -> [(&'static str, ModelInfo); 5] {
    let gpt_5_1 = ModelInfo {
        max_tokens: 128_000,
        context_window: 400_000,
        supports_images: true,
        supports_prompt_cache: true,
        supports_reasoning_effort: true,
        input_price: 1.25,
        output_price: 10.0,
        cache_reads_price: 0.125,
        description: "GPT-5.1: flagship model for coding and agentic tasks",
    };

    [
        (
            "gpt-5.1-codex-max",
            ModelInfo {
                description: "GPT-5.1 Codex Max: long-horizon agentic coding model",
                ..gpt_5_1.clone()
            },
        ),
        (
            "gpt-5.1-codex",
            ModelInfo {
                description: "GPT-5.1 Codex: GPT-5.1 tuned for agentic coding in Codex",
                ..gpt_5_1.clone()
            },
        ),
        (
            "gpt-5.1-codex-mini",
            ModelInfo {
                input_price: 0.25,
                output_price: 2.0,
                cache_reads_price: 0.025,
                description: "GPT-5.1 Codex Mini: smaller, cheaper Codex model",
                ..gpt_5_1.clone()
            },
        ),
        (
            "gpt-5.1-chat-latest",
            ModelInfo {
                max_tokens: 16_384,
                context_window: 128_000,
                supports_reasoning_effort: false,
                description: "GPT-5.1 Chat: the model used in ChatGPT",
                ..gpt_5_1.clone()
            },
        ),
        ("gpt-5.1", gpt_5_1),
    ]
}
