use glif_core::config::AppConfig;
use glif_core::error::BridgeError;
use glif_core::types::{ContentType, GenerationRequest, HandleOutcome, InboundMessage, Reply};
use tracing::{debug, error, info};

use crate::image_client::ImageClient;
use crate::prompt_parser::{clean_prompt, extract_aspect_ratio};
use crate::storage::ImageStore;
use crate::trigger_router::TriggerTable;

/// route → parse → generate → download → reply, for one message at a time.
#[derive(Clone)]
pub struct Orchestrator {
    triggers: TriggerTable,
    client: ImageClient,
}

impl Orchestrator {
    pub fn new(triggers: TriggerTable, client: ImageClient) -> Self {
        Self { triggers, client }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, BridgeError> {
        let triggers = TriggerTable::from_config(&config.triggers)?;
        let store = ImageStore::from_config(&config.storage);
        store.ensure_dir()?;
        let client = ImageClient::from_config(&config.glif, &config.download, store)?;
        Ok(Self::new(triggers, client))
    }

    pub fn triggers(&self) -> &TriggerTable {
        &self.triggers
    }

    pub fn store(&self) -> &ImageStore {
        self.client.store()
    }

    pub async fn handle(&self, msg: &InboundMessage) -> HandleOutcome {
        if msg.content_type != ContentType::Text {
            return HandleOutcome::Continue;
        }
        let Some(route) = self.triggers.route(&msg.text) else {
            return HandleOutcome::Continue;
        };
        debug!(
            "handle_message: trigger={} model_id={} text={}",
            route.trigger, route.model_id, msg.text
        );

        let rest = route.remainder.trim();
        let request = GenerationRequest {
            model_id: route.model_id.to_string(),
            aspect_ratio: extract_aspect_ratio(rest),
            prompt: clean_prompt(rest),
        };

        match self.run(&request).await {
            Ok(bytes) => {
                info!(
                    "handle_message: image ready model_id={} bytes={}",
                    request.model_id,
                    bytes.len()
                );
                HandleOutcome::Break(Reply::Image(bytes))
            }
            Err(err) => {
                error!("handle_message: failed model_id={} err={err}", request.model_id);
                HandleOutcome::Break(Reply::Error(format!(
                    "Image generation failed: {}",
                    err.user_message()
                )))
            }
        }
    }

    async fn run(&self, request: &GenerationRequest) -> Result<Vec<u8>, BridgeError> {
        let url = self.client.generate(request).await?;
        let path = self.client.download_and_save(&url).await?;
        self.client.store().read(&path).await
    }
}
