use std::sync::Arc;

use clap::Parser;
use serde::Serialize;
use tracing::{error, info};
use wishkeeper::api::ApiError;
use wishkeeper::api::types::{ItemPatch, NewItem};
use wishkeeper::cli::{Args, Command, ItemCommand, WishlistCommand, init_logging, resolve_config};
use wishkeeper::token_store::{FileTokenStore, TokenStore};
use wishkeeper::{Wishkeeper, create_client};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    let config = resolve_config(&args).await;
    let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(&args.token_file));

    let client = match create_client(&config, store) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Failed to build client");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&client, args.command).await {
        error!(error = %e, "{}", e.user_message());
        std::process::exit(1);
    }
}

async fn run(client: &Wishkeeper, command: Command) -> Result<(), ApiError> {
    match command {
        Command::Login { email, password } => {
            let status = client.auth.login(&email, &password).await;
            if !status.is_success() {
                return Err(ApiError::Unauthorized);
            }
            info!("Logged in");
        }
        Command::Logout => {
            client.auth.logout();
            info!("Logged out");
        }
        Command::Signup { email, password } => {
            let status = client.auth.sign_up(&email, &password).await?;
            info!(status = %status, "Account created, check your inbox to verify");
        }
        Command::Me => print_json(&client.account.me().await?),
        Command::RequestReset { email } => {
            client.auth.request_password_reset(&email).await?;
            info!("Password-reset email requested");
        }
        Command::ConfirmReset { token, password } => {
            client.auth.reset_password(&password, &password, &token).await?;
            info!("Password reset");
        }
        Command::ChangePassword { old, new } => {
            client.account.change_password(&old, &new, &new).await?;
            info!("Password changed");
        }
        Command::Wishlist(cmd) => run_wishlist(client, cmd).await?,
        Command::Item(cmd) => run_item(client, cmd).await?,
    }
    Ok(())
}

async fn run_wishlist(client: &Wishkeeper, cmd: WishlistCommand) -> Result<(), ApiError> {
    match cmd {
        WishlistCommand::List => print_json(&client.wishlists.list().await?),
        WishlistCommand::Create { name, description } => {
            print_json(&client.wishlists.create(&name, description.as_deref()).await?)
        }
        WishlistCommand::Show { id } => print_json(&client.wishlists.get(id).await?),
        WishlistCommand::Rename { id, name } => {
            print_json(&client.wishlists.rename(id, &name).await?)
        }
        WishlistCommand::Delete { id } => {
            client.wishlists.delete(id).await?;
            info!(%id, "Wishlist deleted");
        }
        WishlistCommand::Share { id } => print_json(&client.wishlists.share(id).await?),
        WishlistCommand::Shared { slug } => print_json(&client.wishlists.shared(&slug).await?),
    }
    Ok(())
}

async fn run_item(client: &Wishkeeper, cmd: ItemCommand) -> Result<(), ApiError> {
    match cmd {
        ItemCommand::Add {
            wishlist,
            name,
            link,
            priority,
            password,
        } => {
            let item = NewItem {
                name,
                link,
                priority,
                password,
            };
            print_json(&client.wishlists.add_item(wishlist, &item).await?);
        }
        ItemCommand::Update {
            wishlist,
            item,
            name,
            link,
            priority,
        } => {
            let patch = ItemPatch {
                name,
                link,
                priority,
            };
            print_json(&client.wishlists.update_item(wishlist, item, &patch).await?);
        }
        ItemCommand::Remove { wishlist, item } => {
            client.wishlists.remove_item(wishlist, item).await?;
            info!(%item, "Item removed");
        }
        ItemCommand::Unlock {
            wishlist,
            item,
            password,
        } => {
            print_json(&client.wishlists.unlock_item(wishlist, item, &password).await?);
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => error!(error = %e, "Failed to render response"),
    }
}
