use anyhow::{bail, Context};
use clap::Subcommand;
use reqwest::Method;
use serde_json::{json, Value};

use crate::auth::Permission;
use crate::cli::client::ApiClient;
use crate::cli::utils::{output_success, output_table};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "List users")]
    List,

    #[command(about = "Create a user")]
    Create {
        #[arg(help = "Username")]
        username: String,
        #[arg(long, help = "Initial password")]
        new_password: String,
        #[arg(long, help = "Role template: scouter, head-scouter or admin")]
        role: Option<String>,
        #[arg(long = "grant", help = "Permission as collection:flags, e.g. entries:rw (repeatable)")]
        grants: Vec<String>,
    },

    #[command(about = "Delete a user")]
    Delete {
        #[arg(help = "User id")]
        id: String,
    },

    #[command(about = "Replace a user's permission list")]
    Grant {
        #[arg(help = "User id")]
        id: String,
        #[arg(help = "Permissions as collection:flags, e.g. schemas:r entries:rw")]
        grants: Vec<String>,
    },
}

/// `entries:rw` → read + write on entries. An empty flag set (`users:`) grants nothing.
pub fn parse_grant(grant: &str) -> anyhow::Result<Permission> {
    let (name, flags) = grant
        .split_once(':')
        .with_context(|| format!("invalid grant '{}': expected collection:flags", grant))?;
    if name.is_empty() {
        bail!("invalid grant '{}': missing collection name", grant);
    }

    let mut permission = Permission::new(name, false, false);
    for flag in flags.chars() {
        match flag {
            'r' => permission.read = true,
            'w' => permission.write = true,
            other => bail!("invalid grant '{}': unknown flag '{}'", grant, other),
        }
    }
    Ok(permission)
}

fn parse_grants(grants: &[String]) -> anyhow::Result<Vec<Permission>> {
    grants.iter().map(|g| parse_grant(g)).collect()
}

pub async fn handle(client: &ApiClient, cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UserCommands::List => {
            let users = client.send(client.authed(Method::GET, "/users")?).await?;
            let rows = match users {
                Value::Array(rows) => rows,
                _ => bail!("unexpected response from /users"),
            };
            output_table(
                output_format,
                &rows,
                &[("id", "ID"), ("username", "USERNAME"), ("role", "ROLE"), ("createdAt", "CREATED")],
                "No users",
            )
        }
        UserCommands::Create {
            username,
            new_password,
            role,
            grants,
        } => {
            let body = json!({
                "username": username,
                "password": new_password,
                "role": role,
                "permissions": parse_grants(&grants)?,
            });
            let response = client
                .send(client.authed(Method::POST, "/users")?.json(&body))
                .await?;
            output_success(output_format, &format!("Created user {}", username), Some(response))
        }
        UserCommands::Delete { id } => {
            let response = client
                .send(client.authed(Method::DELETE, &format!("/users/{}", id))?)
                .await?;
            output_success(output_format, &format!("Deleted user {}", id), Some(response))
        }
        UserCommands::Grant { id, grants } => {
            let body = json!({ "permissions": parse_grants(&grants)? });
            let response = client
                .send(
                    client
                        .authed(Method::PUT, &format!("/users/{}/permissions", id))?
                        .json(&body),
                )
                .await?;
            output_success(output_format, &format!("Updated permissions of {}", id), Some(response))
        }
    }
}
