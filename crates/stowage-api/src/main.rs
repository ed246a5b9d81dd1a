use stowage_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Production wiring is the one place the process-wide container
    // registry is populated.
    stowage_core::install_global_containers(config.containers.clone())?;

    // Initialize the application (database, services, routes)
    let (_state, router) = stowage_api::setup::initialize_app(config.clone()).await?;

    // Start the server
    stowage_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
