//! Config command - manage the capa configuration file.
//!
//! Settings are addressed with dotted keys (`render.format`,
//! `extraction.tables.sender_ie`). Each settable key is parsed into its
//! typed field, so a bad value is rejected before anything is written.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Subcommand};
use console::style;

use capa_core::invoice::rules::{cnpj_root, LookupTables};
use capa_core::{CapaConfig, OutputFormat};

use super::default_config_path;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Write a configuration file with the defaults
    Init {
        /// Output path (default: the configuration file)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Print one setting, e.g. "render.volume_number"
    Get { key: String },

    /// Change one setting
    Set { key: String, value: String },

    /// Add a known value to a lookup table, e.g. "sender_ie 123456789"
    Add { table: String, value: String },

    /// Show configuration file path
    Path,
}

pub async fn run(args: ConfigArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let path = config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);

    match args.command {
        ConfigCommand::Show => {
            if !path.exists() {
                eprintln!("{} No config file found, showing defaults.", style("ℹ").blue());
            }
            println!("{}", serde_json::to_string_pretty(&load(&path)?)?);
        }
        ConfigCommand::Init { output, force } => {
            let output = output.unwrap_or(path);
            if output.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {}. Use --force to overwrite.",
                    output.display()
                );
            }
            save(&CapaConfig::default(), &output)?;
            println!("{} Created configuration file at {}", style("✓").green(), output.display());
        }
        ConfigCommand::Get { key } => {
            let config = serde_json::to_value(load(&path)?)?;
            let value = config
                .pointer(&format!("/{}", key.replace('.', "/")))
                .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))?;
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        ConfigCommand::Set { key, value } => {
            let mut config = load(&path)?;
            apply_setting(&mut config, &key, &value)?;
            save(&config, &path)?;
            println!("{} Set {} = {}", style("✓").green(), key, value);
        }
        ConfigCommand::Add { table, value } => {
            let mut config = load(&path)?;
            let added = add_known_value(&mut config.extraction.tables, &table, &value)?;
            save(&config, &path)?;
            if added {
                println!("{} Added {:?} to {}", style("✓").green(), value.trim(), table);
            } else {
                println!("{} {} already lists {:?}", style("ℹ").blue(), table, value.trim());
            }
        }
        ConfigCommand::Path => {
            println!("Configuration file: {}", path.display());
            if path.exists() {
                println!("Status: {}", style("exists").green());
            } else {
                println!("Status: {}", style("not created").yellow());
                println!();
                println!("Run 'capa config init' to create a configuration file.");
            }
        }
    }

    Ok(())
}

/// The file at `path`, or the defaults when it does not exist yet.
fn load(path: &Path) -> anyhow::Result<CapaConfig> {
    if path.exists() {
        CapaConfig::from_file(path).with_context(|| format!("reading {}", path.display()))
    } else {
        Ok(CapaConfig::default())
    }
}

fn save(config: &CapaConfig, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    config.save(path).with_context(|| format!("writing {}", path.display()))
}

/// Parse `value` for the setting named by `key` and store it.
fn apply_setting(config: &mut CapaConfig, key: &str, value: &str) -> anyhow::Result<()> {
    let trimmed = value.trim();

    match key {
        "pdf.try_empty_password" => config.pdf.try_empty_password = parse_flag(key, trimmed)?,
        "pdf.max_pages" => {
            config.pdf.max_pages = trimmed
                .parse()
                .with_context(|| format!("{} expects a page count (0 = all), got {:?}", key, value))?;
        }
        "pdf.spool_dir" => {
            config.pdf.spool_dir = (!trimmed.is_empty()).then(|| PathBuf::from(trimmed));
        }
        "render.format" => config.render.format = parse_format(trimmed)?,
        "render.volume_number" => config.render.volume_number = required(key, trimmed)?,
        "render.output_dir" => config.render.output_dir = PathBuf::from(required(key, trimmed)?),
        "extraction.party_rules" => {
            config.extraction.party_rules = serde_json::from_str(trimmed)
                .with_context(|| format!("{} expects a JSON list of rules", key))?;
        }
        other => {
            let table = other
                .strip_prefix("extraction.tables.")
                .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))?;
            set_table(&mut config.extraction.tables, table, trimmed)?;
        }
    }

    Ok(())
}

fn set_table(tables: &mut LookupTables, table: &str, value: &str) -> anyhow::Result<()> {
    match table {
        "extrafarma_cnpj_root" => {
            let digits: String = value.chars().filter(char::is_ascii_digit).collect();
            let well_formed = value.chars().all(|c| c.is_ascii_digit() || c == '.');
            if digits.is_empty() || digits.len() > 9 || !well_formed {
                anyhow::bail!("{} expects a CNPJ root of up to 9 digits, got {:?}", table, value);
            }
            tables.extrafarma_cnpj_root = cnpj_root(&digits);
        }
        "extrafarma_store_prefix" => {
            if value.len() != 1 || !value.chars().all(|c| c.is_ascii_digit()) {
                anyhow::bail!("{} expects a single digit, got {:?}", table, value);
            }
            tables.extrafarma_store_prefix = value.to_string();
        }
        "sender_localities" | "recipient_localities" => {
            let localities = serde_json::from_str(value)
                .with_context(|| format!("{} expects a JSON list of localities", table))?;
            if table == "sender_localities" {
                tables.sender_localities = localities;
            } else {
                tables.recipient_localities = localities;
            }
        }
        _ => *string_table(tables, table)? = parse_list(value)?,
    }

    Ok(())
}

/// Append `value` to a string table, returning false when already listed.
fn add_known_value(tables: &mut LookupTables, table: &str, value: &str) -> anyhow::Result<bool> {
    let value = required(table, value.trim())?;
    let list = string_table(tables, table)?;

    if list.contains(&value) {
        return Ok(false);
    }
    list.push(value);
    Ok(true)
}

fn string_table<'a>(tables: &'a mut LookupTables, table: &str) -> anyhow::Result<&'a mut Vec<String>> {
    let list = match table {
        "known_totals" => &mut tables.known_totals,
        "operation_types" => &mut tables.operation_types,
        "sender_names" => &mut tables.sender_names,
        "sender_addresses" => &mut tables.sender_addresses,
        "sender_ie" => &mut tables.sender_ie,
        "recipient_names" => &mut tables.recipient_names,
        "recipient_addresses" => &mut tables.recipient_addresses,
        "recipient_neighborhoods" => &mut tables.recipient_neighborhoods,
        "recipient_ceps" => &mut tables.recipient_ceps,
        "recipient_ie" => &mut tables.recipient_ie,
        other => anyhow::bail!("Unknown lookup table: {}", other),
    };
    Ok(list)
}

/// A JSON list of strings, or a single value.
///
/// Plain values are never split on commas; addresses contain them.
fn parse_list(value: &str) -> anyhow::Result<Vec<String>> {
    if value.starts_with('[') {
        return serde_json::from_str(value).context("expected a JSON list of strings");
    }
    Ok(vec![required("value", value)?])
}

fn parse_format(value: &str) -> anyhow::Result<OutputFormat> {
    match value.to_lowercase().as_str() {
        "pdf" => Ok(OutputFormat::Pdf),
        "docx" => Ok(OutputFormat::Docx),
        other => anyhow::bail!("Unsupported output format: {} (expected pdf or docx)", other),
    }
}

fn parse_flag(key: &str, value: &str) -> anyhow::Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => anyhow::bail!("{} expects true or false, got {:?}", key, value),
    }
}

fn required(key: &str, value: &str) -> anyhow::Result<String> {
    if value.is_empty() {
        anyhow::bail!("{} cannot be empty", key);
    }
    Ok(value.to_string())
}
