use reqwest::Method;
use serde_json::json;

use crate::cli::client::ApiClient;
use crate::cli::utils::{cell, output_success};
use crate::cli::OutputFormat;

pub async fn login(client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    let (username, password) = client.credentials()?;
    let request = client
        .public(Method::POST, "/auth/login")?
        .json(&json!({ "username": username, "password": password }));
    let response = client.send(request).await?;

    match output_format {
        OutputFormat::Json => output_success(output_format, "Logged in", Some(response)),
        OutputFormat::Text => {
            println!("✓ Logged in as {} (role: {})", username, cell(&response["role"]));
            println!("token: {}", cell(&response["token"]));
            Ok(())
        }
    }
}

pub async fn init(client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    let response = client.send(client.public(Method::GET, "/initialize")?).await?;
    let message = if response["created"] == json!(true) {
        "Admin account created"
    } else {
        "Admin account already present"
    };
    output_success(output_format, message, Some(response))
}
