use anyhow::{anyhow, Context};
use clap::{Args, ValueEnum};

use crate::auth::{hash_password, validate_password_strength};
use crate::config;
use crate::database::{models::NewUser, open_store};
use crate::types::Role;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RoleArg {
    Admin,
    User,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Admin => Role::Admin,
            RoleArg::User => Role::User,
        }
    }
}

#[derive(Args, Debug)]
pub struct CreateUserArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub full_name: String,

    #[arg(long, env = "NEW_USER_PASSWORD", help = "Password (or set NEW_USER_PASSWORD)")]
    pub password: String,

    #[arg(long)]
    pub contact_number: Option<String>,

    #[arg(long, value_enum, default_value = "user")]
    pub role: RoleArg,
}

pub async fn handle(args: CreateUserArgs) -> anyhow::Result<()> {
    let config = config::config();
    validate_password_strength(&args.password).map_err(|msg| anyhow!(msg))?;

    let store = open_store(config).await.context("failed to open datastore")?;
    let password_hash = hash_password(&args.password, config.security.bcrypt_cost).await?;
    let role = Role::from(args.role);

    let id = store
        .create_user(NewUser {
            full_name: args.full_name,
            email: args.email.trim().to_lowercase(),
            password_hash,
            contact_number: args.contact_number,
            role,
        })
        .await
        .context("failed to create user")?;

    println!("Created {} user {}", role, id);
    Ok(())
}
