//! Command handlers for utapi CLI

use crate::wizard::run_init_wizard;
use crate::OutputFormat;
use anyhow::{Context, Result};
use clap::Command;
use clap_complete::{generate, Shell as ClapShell};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tabled::{Table, Tabled};
use utapi_core::config::SECRET_ENV;
use utapi_core::{
    config_exists, get_config_path, load_config, validate_config, Acl, Error, RenameFileUpdate,
    UploadThingConfig, UtApi,
};

/// Build the API client from the environment and config file
fn build_client() -> Result<UtApi> {
    let config = match UploadThingConfig::from_env() {
        Ok(config) => config,
        Err(e @ Error::MissingEnv(_)) => {
            return Err(anyhow::Error::new(e).context(format!(
                "No UploadThing API key found. Set {} or run 'utapi init'",
                SECRET_ENV
            )));
        }
        Err(e) => return Err(e.into()),
    };
    tracing::debug!(host = %config.host, version = %config.version, "resolved UploadThing config");

    Ok(UtApi::new(config)?)
}

/// Resolve the output format: flag first, then config file, then table
fn output_format(flag: Option<OutputFormat>) -> OutputFormat {
    if let Some(format) = flag {
        return format;
    }

    let configured = if config_exists() {
        load_config()
            .map(|c| c.output_or_default().default_format)
            .unwrap_or_default()
    } else {
        String::new()
    };

    let format = match configured.as_str() {
        "json" => OutputFormat::Json,
        _ => OutputFormat::Table,
    };
    tracing::debug!(?format, "output format from config");
    format
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

/// Handle init command
pub async fn handle_init() -> Result<()> {
    run_init_wizard().await
}

/// Show current configuration
pub fn handle_config_show() -> Result<()> {
    println!("Current configuration:");
    println!();

    let config_path = get_config_path()?;
    if config_path.exists() {
        let config = load_config()?;
        println!("File: {}", config_path.display());
        println!();
        println!("UploadThing:");
        println!("  Host: {}", config.uploadthing.host);
        println!("  Version: {}", config.uploadthing.version);
        println!(
            "  API key: {}",
            config
                .uploadthing
                .api_key
                .as_deref()
                .map(mask_secret)
                .unwrap_or_else(|| "(not set)".to_string())
        );
        if let Some(fe) = &config.uploadthing.fe_package {
            println!("  FE package: {}", fe);
        }
        if let Some(be) = &config.uploadthing.be_adapter {
            println!("  BE adapter: {}", be);
        }
        println!();
        println!("Advanced:");
        println!("  Timeout: {}s", config.advanced_or_default().timeout);
        let logging = config.logging_or_default();
        println!("Logging:");
        println!("  Level: {}", logging.level);
        println!("  Format: {}", logging.format);
    } else {
        println!("  ⚠️  No configuration file (run 'utapi init')");
    }

    println!();
    match std::env::var(SECRET_ENV) {
        Ok(secret) if !secret.is_empty() => {
            println!("{} is set ({}) and takes precedence", SECRET_ENV, mask_secret(&secret))
        }
        _ => println!("{} is not set", SECRET_ENV),
    }

    Ok(())
}

/// Validate configuration and API key
pub async fn handle_config_validate() -> Result<()> {
    println!("Validating configuration...");

    if config_exists() {
        let config = load_config()?;
        validate_config(&config)?;
        println!("  ✅ Valid configuration format");
    }

    let client = build_client()?;
    println!("  Testing UploadThing API key...");
    let info = client.get_app_info().await?;

    println!("  ✅ API key accepted for app {}", info.app_id);

    Ok(())
}

/// Open the config file in $EDITOR
pub fn handle_config_edit() -> Result<()> {
    let config_path = get_config_path()?;
    if !config_path.exists() {
        return Err(anyhow::anyhow!(
            "Configuration not found at {} (run 'utapi init')",
            config_path.display()
        ));
    }

    println!("Opening editor...");
    println!("  File: {}", config_path.display());
    println!();

    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    let status = std::process::Command::new(editor)
        .arg(&config_path)
        .status()?;

    if status.success() {
        println!("  ✅ Configuration edited");

        // Validate after edit
        let config = load_config()?;
        validate_config(&config)?;
        println!("  ✅ Configuration valid");
    } else {
        println!("  ⚠️  Editor exited with error");
    }

    Ok(())
}

/// List files
pub async fn handle_files_list(limit: u32, offset: u32, output: Option<OutputFormat>) -> Result<()> {
    let client = build_client()?;
    let page = client.list_files(limit, offset).await?;

    if output_format(output) == OutputFormat::Json {
        return print_json(&page);
    }

    if page.files.is_empty() {
        println!("  No files found");
        return Ok(());
    }

    #[derive(Tabled)]
    struct FileRow {
        key: String,
        name: String,
        status: String,
        size: String,
        uploaded: String,
    }

    let rows: Vec<FileRow> = page
        .files
        .iter()
        .map(|f| FileRow {
            key: f.key.clone(),
            name: f.name.clone(),
            status: f.status.clone(),
            size: format_bytes(f.size),
            uploaded: format_timestamp(f.uploaded_at),
        })
        .collect();

    println!("{}", Table::new(rows));
    if page.has_more {
        println!();
        println!(
            "More files available: utapi files list --offset {}",
            offset.saturating_add(limit)
        );
    }

    Ok(())
}

/// Delete files
pub async fn handle_files_delete(keys: Vec<String>) -> Result<()> {
    let client = build_client()?;

    println!("⚠️  Deleting {} file(s)...", keys.len());
    println!("  This action is IRREVERSIBLE!");

    let result = client.delete_files(keys).await?;

    if result.success {
        println!("  ✅ {} file(s) deleted", result.deleted_count);
    } else {
        println!("  ⚠️  UploadThing reported failure ({} deleted)", result.deleted_count);
    }

    Ok(())
}

/// Rename a file
pub async fn handle_files_rename(key: &str, new_name: &str) -> Result<()> {
    let client = build_client()?;

    println!("Renaming {} -> {}...", key, new_name);
    let result = client
        .rename_files(vec![RenameFileUpdate::new(key, new_name)])
        .await?;

    if result.success {
        println!("  ✅ {} file(s) renamed", result.renamed_count);
    } else {
        println!("  ⚠️  UploadThing reported failure");
    }

    Ok(())
}

/// Show storage usage
pub async fn handle_usage(output: Option<OutputFormat>) -> Result<()> {
    let client = build_client()?;
    let usage = client.get_usage_info().await?;

    if output_format(output) == OutputFormat::Json {
        return print_json(&usage);
    }

    println!("Usage:");
    println!("  Files uploaded: {}", usage.files_uploaded);
    println!("  App storage: {}", format_bytes(usage.app_total_bytes));
    println!("  Total storage: {}", format_bytes(usage.total_bytes));
    println!(
        "  Limit: {} ({:.1}% used)",
        format_bytes(usage.limit_bytes),
        percent(usage.total_bytes, usage.limit_bytes)
    );

    Ok(())
}

/// Show app info
pub async fn handle_app_info(output: Option<OutputFormat>) -> Result<()> {
    let client = build_client()?;
    let info = client.get_app_info().await?;

    if output_format(output) == OutputFormat::Json {
        return print_json(&info);
    }

    println!("App:");
    println!("  ID: {}", info.app_id);
    println!("  Default ACL: {}", info.default_acl);
    println!(
        "  ACL override: {}",
        if info.allow_acl_override {
            "allowed"
        } else {
            "not allowed"
        }
    );

    Ok(())
}

/// Issue a presigned URL for a private file
pub async fn handle_url(key: &str, expires: Option<u32>, output: Option<OutputFormat>) -> Result<()> {
    // 0 means "provider default", same as omitting it
    let expires = expires.filter(|secs| *secs > 0);
    let client = build_client()?;
    let url = client.get_presigned_url(key, expires).await?;

    match output_format(output) {
        OutputFormat::Json => print_json(&serde_json::json!({
            "key": key,
            "url": url,
            "expires_in": expires,
            "expires_at": expires.map(|secs| chrono::Utc::now() + chrono::Duration::seconds(secs as i64)),
        })),
        OutputFormat::Table => {
            println!("  ✅ URL generated:");
            println!("  {}", url);
            if let Some(secs) = expires {
                println!();
                println!("  Expires in: {}s", secs);
            }
            Ok(())
        }
    }
}

/// Upload a local file
pub async fn handle_upload(
    file: &str,
    acl: Acl,
    custom_id: Option<&str>,
    output: Option<OutputFormat>,
) -> Result<()> {
    let path = Path::new(file);
    if !path.is_file() {
        return Err(anyhow::anyhow!("File not found: {}", file));
    }

    let client = build_client()?;
    let size = path.metadata()?.len();

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(format!("Uploading {} ({})...", file, format_bytes(size)));
    pb.enable_steady_tick(Duration::from_millis(100));

    let presigned = match client.upload_file(path, acl, custom_id).await {
        Ok(presigned) => presigned,
        Err(e) => {
            pb.abandon_with_message("❌ Upload failed");
            return Err(e.into());
        }
    };
    pb.finish_with_message("✅ Upload complete");

    if output_format(output) == OutputFormat::Json {
        return print_json(&presigned);
    }

    println!("  Key: {}", presigned.key);
    println!("  URL: {}", style(&presigned.file_url).cyan());
    if let Some(custom_id) = &presigned.custom_id {
        println!("  Custom ID: {}", custom_id);
    }

    Ok(())
}

/// Installation check
pub fn handle_doctor_check() -> Result<()> {
    println!("Checking utapi installation...");

    println!("  ✅ utapi is installed");
    println!("  Version: {}", env!("CARGO_PKG_VERSION"));

    let config_path = get_config_path()?;
    if config_path.exists() {
        println!("  ✅ Configuration found");

        let config = load_config()?;
        validate_config(&config)?;
        println!("  ✅ Configuration valid");
    } else {
        println!("  ⚠️  Configuration not found (run 'utapi init')");
    }

    match std::env::var(SECRET_ENV) {
        Ok(secret) if !secret.is_empty() => println!("  ✅ {} is set", SECRET_ENV),
        _ => println!("  ⚠️  {} is not set", SECRET_ENV),
    }

    Ok(())
}

/// Test the API connection
pub async fn handle_doctor_test_connection() -> Result<()> {
    println!("Testing UploadThing connection...");

    let client = build_client()?;
    println!("  Host: {}", client.config().host);

    let info = client.get_app_info().await?;
    println!("  ✅ Connected to app {}", info.app_id);

    let usage = client.get_usage_info().await?;
    println!("  ✅ {} file(s), {} stored", usage.files_uploaded, format_bytes(usage.app_total_bytes));

    println!();
    println!("  {}", style("All checks passed!").green());

    Ok(())
}

/// Handle shell completion generation
pub fn handle_completion(shell: &str, cmd: &mut Command) -> Result<()> {
    let clap_shell = match shell {
        "bash" => ClapShell::Bash,
        "zsh" => ClapShell::Zsh,
        "fish" => ClapShell::Fish,
        "elvish" => ClapShell::Elvish,
        "powershell" | "pwsh" => ClapShell::PowerShell,
        _ => {
            return Err(anyhow::anyhow!(
                "Unsupported shell: {}\nSupported shells: bash, zsh, fish, elvish, powershell",
                shell
            ));
        }
    };

    // Script on stdout, instructions on stderr so `source <(...)` stays clean
    generate(clap_shell, cmd, "utapi", &mut std::io::stdout());

    eprintln!();
    eprintln!("Installation instructions:");
    match clap_shell {
        ClapShell::Bash => {
            eprintln!("  # Add to your ~/.bashrc:");
            eprintln!("  source <(utapi completion bash)");
        }
        ClapShell::Zsh => {
            eprintln!("  utapi completion zsh > ~/.zsh/completion/_utapi");
            eprintln!("  # then add to ~/.zshrc:");
            eprintln!("  fpath=(~/.zsh/completion $fpath)");
            eprintln!("  autoload -U compinit && compinit");
        }
        ClapShell::Fish => {
            eprintln!("  utapi completion fish > ~/.config/fish/completions/utapi.fish");
        }
        ClapShell::Elvish => {
            eprintln!("  utapi completion elvish > ~/.elvish/lib/utapi.elv");
        }
        ClapShell::PowerShell => {
            eprintln!("  utapi completion powershell | Out-String | Invoke-Expression");
        }
        _ => {}
    }

    Ok(())
}

/// Format bytes to human-readable size
fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}

/// Format a millisecond unix timestamp
fn format_timestamp(millis: i64) -> String {
    match chrono::DateTime::from_timestamp_millis(millis) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => millis.to_string(),
    }
}

/// Show only the first 8 characters of a secret
fn mask_secret(secret: &str) -> String {
    if secret.chars().count() <= 8 {
        return "********".to_string();
    }
    let visible: String = secret.chars().take(8).collect();
    format!("{}...", visible)
}

fn percent(used: u64, limit: u64) -> f64 {
    if limit == 0 {
        0.0
    } else {
        used as f64 * 100.0 / limit as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0.00 B");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(2 * 1024 * 1024 * 1024), "2.00 GB");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00");
        assert_eq!(format_timestamp(1_700_000_000_000), "2023-11-14 22:13");
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("sk_live_abcdef123456"), "sk_live_...");
        assert_eq!(mask_secret("short"), "********");
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(50, 200), 25.0);
        assert_eq!(percent(10, 0), 0.0);
    }
}
