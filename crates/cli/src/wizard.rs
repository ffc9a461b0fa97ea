//! Interactive setup wizard for utapi configuration

use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Password};
use indicatif::{ProgressBar, ProgressStyle};
use utapi_core::config::{DEFAULT_HOST, DEFAULT_VERSION};
use utapi_core::{save_config, ConfigFile, UploadThingConfig, UploadThingSection, UtApi};

/// Run the interactive setup wizard
pub async fn run_init_wizard() -> Result<()> {
    println!("🚀 Welcome to utapi setup!\n");

    println!("This wizard will guide you through the configuration process.");
    println!("You will need your UploadThing secret key (sk_...),");
    println!("found in the API Keys section of the UploadThing dashboard.\n");

    let api_key = prompt_api_key()?;
    let host = prompt_host()?;

    println!("\n📋 Configuration summary:");
    println!("  Host: {}", host);
    println!("  Version: {}", DEFAULT_VERSION);
    println!("  API key: {}...", api_key.chars().take(8).collect::<String>());

    let confirm = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Save this configuration?")
        .default(false)
        .interact()?;

    if !confirm {
        println!("❌ Configuration cancelled");
        return Ok(());
    }

    let config = ConfigFile {
        uploadthing: UploadThingSection {
            api_key: Some(api_key.clone()),
            host: host.clone(),
            ..Default::default()
        },
        advanced: None,
        logging: None,
        output: None,
    };

    let pb = ProgressBar::new(2);
    pb.set_style(
        ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.set_message("Saving configuration...");

    let path = save_config(&config)?;

    pb.inc(1);
    pb.finish_with_message("✅ Configuration saved!");

    let test = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Test the API key now?")
        .default(true)
        .interact()?;

    if test {
        let client = UtApi::new(UploadThingConfig::new(api_key).with_host(host))?;
        match client.get_app_info().await {
            Ok(info) => println!("  ✅ Connected to app {}", info.app_id),
            Err(e) => println!("  ⚠️  Connection test failed: {}", e),
        }
    }

    println!("\n🎉 Setup complete!");
    println!("\nConfiguration saved to: {}", path.display());
    println!("\nYou can now use utapi:");
    println!("  $ utapi files list");
    println!("  $ utapi upload ./photo.png");
    println!("  $ utapi usage");

    Ok(())
}

/// Prompt for the secret key
fn prompt_api_key() -> Result<String> {
    Password::with_theme(&ColorfulTheme::default())
        .with_prompt("UploadThing secret key")
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.is_empty() {
                Err("Secret key cannot be empty")
            } else if !input.starts_with("sk_") {
                Err("Invalid key format (should start with 'sk_')")
            } else {
                Ok(())
            }
        })
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to get secret key: {}", e))
}

/// Prompt for the API host
fn prompt_host() -> Result<String> {
    Input::with_theme(&ColorfulTheme::default())
        .with_prompt("API host")
        .default(DEFAULT_HOST.to_string())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.starts_with("https://") || input.starts_with("http://") {
                Ok(())
            } else {
                Err("Host must start with https:// or http://")
            }
        })
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to get API host: {}", e))
}
