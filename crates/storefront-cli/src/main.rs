#![doc = include_str!("../README.md")]

use clap::{CommandFactory, Parser};
use color_eyre::eyre::Result;
use storefront_commerce::CommerceClient;
use storefront_core::{Client, ClientSettings};
use storefront_state::{DatabaseConfiguration, SdkManagedState};
use tracing::{debug, warn};
use tracing_subscriber::{
    EnvFilter, prelude::__tracing_subscriber_SubscriberExt as _, util::SubscriberInitExt as _,
};

use crate::{command::*, render::CommandResult};

mod auth;
mod command;
mod commerce;
mod render;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // the log level hierarchy is determined by:
    //    - if RUST_LOG is detected at runtime
    //    - if RUST_LOG is provided at compile time
    //    - default to INFO
    let filter = EnvFilter::builder()
        .with_default_directive(
            option_env!("RUST_LOG")
                .unwrap_or("info")
                .parse()
                .expect("should provide valid log level at compile time."),
        )
        // parse directives from the RUST_LOG environment variable,
        // overriding the default directive for matching targets.
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    color_eyre::install()?;

    let cli = Cli::parse();
    let render_config = render::RenderConfig::new(&cli);

    let Some(command) = cli.command else {
        let mut cmd = Cli::command();
        cmd.print_help()?;
        return Ok(());
    };

    let state = SdkManagedState::initialize(DatabaseConfiguration::Sqlite {
        file_path: cli.state_file,
    })
    .await?;
    let client = Client::new(
        Some(ClientSettings {
            api_url: cli.api_url,
            ..Default::default()
        }),
        state.settings(),
    );
    if client.session().restore().await.is_some() {
        debug!("Restored previous session");
    }

    let commerce = CommerceClient::new(client.clone());
    if let Err(e) = commerce.load_persisted().await {
        warn!("Ignoring unreadable cached collections: {e}");
    }

    let result = process_commands(command, &client, &commerce).await;

    if let Some(flush) = commerce.unload().flush() {
        if let Err(e) = flush.await {
            warn!("Favorites sync task failed: {e}");
        }
    }

    // Render the result of the command
    render_config.render_result(result)
}

async fn process_commands(
    command: Commands,
    client: &Client,
    commerce: &CommerceClient,
) -> CommandResult {
    match command {
        // Auth commands
        Commands::Login(args) => auth::login(client, commerce, args).await,
        Commands::Logout => auth::logout(client, commerce).await,
        Commands::Profile { command } => auth::profile(client, command).await,

        // Commerce commands
        Commands::Cart { command } => commerce::cart(commerce, command).await,
        Commands::Favorites { command } => commerce::favorites(commerce, command).await,
    }
}
