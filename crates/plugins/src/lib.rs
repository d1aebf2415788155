//! The bundled snagbot plugins: three interactive download workflows
//! (search-select, quality-select, list-formats) and three one-shot
//! download commands, plus the shared delivery action they dispatch to.

pub mod delivery;
pub mod facebook;
pub mod formats;
pub mod tiktok;
pub mod urls;
pub mod yt_audio;
pub mod yt_search;
pub mod yt_video;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use {
    snagbot_channels::{PluginRegistry, Transport},
    snagbot_config::Config,
    snagbot_media::MediaSource,
};

use crate::delivery::Delivery;

/// Build the full plugin registry wired to one transport and media source.
///
/// Registration order matters: it is the order the before-hooks see every
/// inbound message.
pub fn build_registry(
    transport: Arc<dyn Transport>,
    source: Arc<dyn MediaSource>,
    config: &Config,
) -> PluginRegistry {
    let client = reqwest::Client::new();
    let delivery = Arc::new(Delivery::new(
        Arc::clone(&transport),
        Arc::clone(&source),
        config,
    ));

    let mut registry = PluginRegistry::new(Arc::clone(&transport));
    registry.register(Arc::new(yt_search::YtSearchPlugin::new(
        Arc::clone(&transport),
        Arc::clone(&source),
        Arc::clone(&delivery),
        config,
    )));
    registry.register(Arc::new(yt_video::YtVideoPlugin::new(
        Arc::clone(&transport),
        Arc::clone(&source),
        Arc::clone(&delivery),
        client.clone(),
        config,
    )));
    registry.register(Arc::new(formats::FormatsPlugin::new(
        Arc::clone(&transport),
        Arc::clone(&source),
        Arc::clone(&delivery),
        config,
    )));
    registry.register(Arc::new(yt_audio::YtAudioPlugin::new(
        Arc::clone(&delivery),
        config,
    )));
    registry.register(Arc::new(tiktok::TikTokPlugin::new(
        Arc::clone(&transport),
        client,
        config,
    )));
    registry.register(Arc::new(facebook::FacebookPlugin::new(delivery, config)));
    registry
}
