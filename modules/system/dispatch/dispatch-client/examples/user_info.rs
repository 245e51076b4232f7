//! Fetch a user's profile through a configured service.
//!
//! Environment keys are lowercased, so the service is registered as `users`.
//!
//! ```sh
//! DISPATCH_SERVICES__USERS__BASE_URL=http://11.45.14.233 \
//! DISPATCH_SERVICES__USERS__HEADERS__COOKIE=xxxxxxxx \
//! RUST_LOG=dispatch_client=debug \
//! cargo run -p cf-dispatch-client --example user_info
//! ```

use std::sync::Arc;

use dispatch_client::{DispatchConfig, Dispatcher, RequestArgument, ServiceRegistry, Verb};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = DispatchConfig::from_env()?;
    let registry = Arc::new(ServiceRegistry::new());
    let registered = config.register_all(&registry)?;
    tracing::info!(registered, "services ready");

    let dispatcher = Dispatcher::from_config(Arc::clone(&registry), &config.transport)?;

    dispatcher
        .dispatch(
            RequestArgument::new("/user/info")
                .method(Verb::Get)
                .body_field("userId", json!(114_514))
                .expected_code(200)
                .service("users"),
        )
        .await
        .on_success(|_, data| {
            println!("user: {}", data.map(ToString::to_string).unwrap_or_default());
        })
        .on_failure(|msg, _| eprintln!("request failed: {msg}"))
        .what_ever(|_, _| println!("request finished"));

    let removed = registry.shutdown();
    tracing::info!(removed, "services released");
    Ok(())
}
