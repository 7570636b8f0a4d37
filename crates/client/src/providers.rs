//! Provider wiring from configuration.

use std::future::Future;
use std::sync::Arc;

use crate::brave::{self, BraveImageProvider};
use crate::render::{self, RenderError, Renderer};
use crate::scrape::{BrowserImageProvider, SearchSite};
use productshot_core::{AppConfig, Error, ImageProvider};

/// Build the configured providers in fallback order.
///
/// Browser providers are skipped when rendering is disabled or the browser
/// cannot be launched; they share a single renderer. `brave-images` is skipped
/// when no API key is set. Ending up with no usable provider is an error.
pub async fn build_providers(config: &AppConfig) -> Result<Vec<Arc<dyn ImageProvider>>, Error> {
    build_providers_with(config, |user_agent| async move { render::launch(&user_agent).await }).await
}

/// [`build_providers`] with a caller-supplied browser launcher, called at most once.
pub async fn build_providers_with<F, Fut>(
    config: &AppConfig,
    launch: F,
) -> Result<Vec<Arc<dyn ImageProvider>>, Error>
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = Result<Arc<dyn Renderer>, RenderError>>,
{
    let mut providers: Vec<Arc<dyn ImageProvider>> = Vec::with_capacity(config.providers.len());
    let mut launch = Some(launch);
    let mut renderer: Option<Arc<dyn Renderer>> = None;

    for name in &config.providers {
        if let Some(site) = SearchSite::from_name(name) {
            if !config.render_enabled {
                tracing::warn!(provider = %name, "rendering disabled, skipping browser provider");
                continue;
            }
            if renderer.is_none()
                && let Some(launch) = launch.take()
            {
                match launch(config.user_agent.clone()).await {
                    Ok(launched) => renderer = Some(launched),
                    Err(e) => tracing::warn!(error = %e, "browser unavailable, skipping browser providers"),
                }
            }
            if let Some(shared) = &renderer {
                providers.push(Arc::new(BrowserImageProvider::new(
                    shared.clone(),
                    site,
                    std::time::Duration::from_millis(config.render_timeout_ms),
                )));
            }
        } else if name == brave::PROVIDER_NAME {
            if let Err(e) = config.require_brave_api_key() {
                tracing::warn!(provider = %name, error = %e, "no API key, skipping provider");
                continue;
            }
            providers.push(Arc::new(BraveImageProvider::from_app(config)?));
        } else {
            return Err(Error::InvalidInput(format!("unknown provider: {name}")));
        }
    }

    if providers.is_empty() {
        return Err(Error::InvalidInput(
            "no usable providers; enable rendering or set PRODUCTSHOT_BRAVE_API_KEY".into(),
        ));
    }

    tracing::info!(
        providers = ?providers.iter().map(|p| p.name().to_string()).collect::<Vec<_>>(),
        "providers ready"
    );

    Ok(providers)
}
