use serde_json::json;
use storefront_commerce::{CommerceClient, ResourceItem};

use crate::{
    command::{CartCommands, FavoritesCommands},
    render::CommandResult,
};

pub(crate) async fn cart(commerce: &CommerceClient, command: CartCommands) -> CommandResult {
    let cart = commerce.cart();
    match command {
        CartCommands::List => {
            cart.refresh().await?;
        }
        CartCommands::Add { item, quantity } => {
            cart.add(ResourceItem::new(item, "", 0.0).with_quantity(quantity))
                .await?;
        }
        CartCommands::Set { item, quantity } => cart.set_quantity(&item, quantity).await?,
        CartCommands::Remove { item } => cart.remove(&item).await?,
        CartCommands::Clear => cart.clear().await?,
    }

    Ok(json!({ "items": &*cart.items(), "total": cart.total() }).into())
}

pub(crate) async fn favorites(
    commerce: &CommerceClient,
    command: FavoritesCommands,
) -> CommandResult {
    let favorites = commerce.favorites();
    match command {
        FavoritesCommands::List => {
            favorites.refresh().await?;
        }
        FavoritesCommands::Add { item } => {
            favorites.add(ResourceItem::new(item, "", 0.0)).await?;
        }
        FavoritesCommands::Remove { item } => favorites.remove(&item).await?,
        FavoritesCommands::Sync => favorites.sync().await?,
    }

    Ok(json!({ "items": &*favorites.items() }).into())
}
