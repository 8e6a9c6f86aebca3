use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::{
    config::Settings,
    error::Result,
    management::{Context, Coordinator, Dispatcher, TokenProvider},
    spotify::SpotifyApi,
    utils,
};

/// One configured integration instance and everything it owns.
///
/// Setup fails when the first refresh fails, leaving nothing running.
/// Unloading stops the poll loop and drops the runtime context.
pub struct Integration {
    context: Arc<Context>,
    api: Arc<SpotifyApi>,
    coordinator: Arc<Coordinator>,
    dispatcher: Dispatcher,
    poller: Option<JoinHandle<()>>,
}

impl Integration {
    pub async fn setup(settings: &Settings, tokens: Arc<dyn TokenProvider>) -> Result<Self> {
        let context = Arc::new(Context::new(utils::generate_instance_id(), settings));
        let api = Arc::new(SpotifyApi::new(settings.api_url.as_str()));
        let coordinator = Arc::new(Coordinator::new(
            Arc::clone(&api),
            Arc::clone(&tokens),
            Arc::clone(&context),
        ));
        Self::assemble(context, api, tokens, coordinator).await
    }

    /// Same as [`Integration::setup`] with prebuilt parts.
    pub async fn assemble(
        context: Arc<Context>,
        api: Arc<SpotifyApi>,
        tokens: Arc<dyn TokenProvider>,
        coordinator: Arc<Coordinator>,
    ) -> Result<Self> {
        coordinator.tick().await?;
        tracing::info!(entry = %context.entry_id(), "integration ready");

        let dispatcher = Dispatcher::new(
            Arc::clone(&context),
            Arc::clone(&api),
            tokens,
            Arc::clone(&coordinator),
        );

        Ok(Self {
            context,
            api,
            coordinator,
            dispatcher,
            poller: None,
        })
    }

    /// Starts the poll loop. Calling it twice keeps the first loop.
    pub fn start(&mut self) {
        if self.poller.is_none() {
            self.poller = Some(Arc::clone(&self.coordinator).start());
        }
    }

    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }

    pub fn api(&self) -> &Arc<SpotifyApi> {
        &self.api
    }

    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn unload(mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
        tracing::info!(entry = %self.context.entry_id(), "integration unloaded");
    }
}
