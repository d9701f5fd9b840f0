use color_eyre::eyre::Result;
use inquire::Password;
use serde_json::json;
use storefront_commerce::CommerceClient;
use storefront_core::{Client, auth::ProfileUpdate};
use tracing::{info, warn};

use crate::{
    command::{LoginArgs, ProfileCommands},
    render::CommandResult,
};

pub(crate) async fn login(
    client: &Client,
    commerce: &CommerceClient,
    args: LoginArgs,
) -> CommandResult {
    let password = match args.password {
        Some(password) => password,
        None => Password::new("Password").without_confirmation().prompt()?,
    };

    let user = client.auth().login(&args.username, &password).await?;

    // The merged favorites should reach the server before the process exits.
    if let Some(push) = commerce.on_login().await? {
        if let Err(e) = push.await {
            warn!("Favorites push did not complete: {e}");
        }
    }
    info!("Logged in as {}", args.username);

    Ok(match user {
        Some(user) => serde_json::to_value(user)?.into(),
        None => "Logged in".into(),
    })
}

pub(crate) async fn logout(client: &Client, commerce: &CommerceClient) -> CommandResult {
    client.auth().logout().await;
    commerce.on_logout().await;
    Ok("Logged out".into())
}

pub(crate) async fn profile(client: &Client, command: Option<ProfileCommands>) -> CommandResult {
    let profile = match command.unwrap_or(ProfileCommands::Show) {
        ProfileCommands::Show => show(client).await?,
        ProfileCommands::Update {
            email,
            first_name,
            last_name,
            phone,
        } => {
            client
                .auth()
                .update_profile(&ProfileUpdate {
                    email,
                    first_name,
                    last_name,
                    phone,
                })
                .await?
        }
    };

    Ok(json!(profile).into())
}

/// Fetch the profile, falling back to the cached copy when the server can't be reached.
async fn show(client: &Client) -> Result<storefront_core::auth::UserProfile> {
    match client.auth().profile().await {
        Ok(profile) => Ok(profile),
        Err(e) => match client.auth().cached_profile().await {
            Some(profile) if client.auth().is_authenticated() => {
                warn!("Showing cached profile: {e}");
                Ok(profile)
            }
            _ => Err(e.into()),
        },
    }
}
