use clap::Subcommand;
use serde_json::json;

use crate::auth::hash_password;
use crate::cli::{utils, OutputFormat};
use crate::database::models::{NewUser, User};
use crate::database::DatabaseError;
use crate::types::Role;

#[derive(Subcommand)]
pub enum AdminCommands {
    #[command(about = "Create an ADMIN account")]
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    #[command(about = "Grant the ADMIN role to an existing account")]
    Promote {
        #[arg(long)]
        email: String,
    },
}

pub async fn handle(cmd: AdminCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = utils::connect().await?;

    match cmd {
        AdminCommands::Create { name, email, password } => {
            if password.len() < 6 {
                return utils::output_error(output_format, "Password must be at least 6 characters", Some("VALIDATION_ERROR"));
            }
            let new_user = NewUser {
                name,
                email: email.trim().to_lowercase(),
                password_hash: hash_password(&password)?,
                role: Role::Admin,
            };
            match User::create(&pool, &new_user).await {
                Ok(user) => utils::output_success(
                    output_format,
                    &format!("Created admin {}", user.email),
                    Some(json!({ "id": user.id, "email": user.email })),
                ),
                Err(DatabaseError::Conflict(_)) => {
                    utils::output_error(output_format, "Email is already registered", Some("CONFLICT"))
                }
                Err(e) => Err(e.into()),
            }
        }
        AdminCommands::Promote { email } => match User::promote(&pool, email.trim()).await? {
            Some(user) => utils::output_success(
                output_format,
                &format!("{} is now an admin", user.email),
                Some(json!({ "id": user.id, "email": user.email })),
            ),
            None => utils::output_error(output_format, &format!("No user with email {}", email), Some("NOT_FOUND")),
        },
    }
}
