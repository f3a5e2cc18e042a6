use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chrono::{DateTime, SecondsFormat, Utc};
use colored::Colorize;
use docstore_blob::LocalBlobClient;
use docstore_storage::{BlobStorageService, StaticIdentity, StorageConfig, StorageService};
use docstore_types::{Application, GenericDocument, ObjectType, Pipeline};
use serde_json::{json, Value};

use crate::cli::*;

type Service = BlobStorageService<LocalBlobClient>;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(cli, &mut io::stdin().lock(), &mut out)
}

/// Runs one command against the configured bucket, reading document bodies
/// from `input` when no file is given.
pub fn execute(cli: Cli, input: &mut dyn Read, out: &mut dyn Write) -> anyhow::Result<()> {
    let Cli { command, config, user, format, .. } = cli;
    let open = || open_service(&config, user.clone());
    match command {
        Command::Types => cmd_types(format, out),
        Command::Init => cmd_init(&open()?, format, out),
        Command::Put(args) => cmd_put(&open()?, args, input, format, out),
        Command::Get(args) => cmd_get(&open()?, args, format, out),
        Command::Delete(args) => cmd_delete(&open()?, args, format, out),
        Command::List(args) => cmd_list(&open()?, args, format, out),
        Command::Versions(args) => cmd_versions(&open()?, args, format, out),
        Command::LastModified(args) => cmd_last_modified(&open()?, args, format, out),
    }
}

fn open_service(config_path: &Path, user: Option<String>) -> anyhow::Result<Service> {
    let config = StorageConfig::load(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let root = endpoint_root(&config.endpoint)?;
    tracing::debug!(root = %root.display(), bucket = %config.bucket_name, "opening local backend");

    let svc = BlobStorageService::new(LocalBlobClient::new(root), config)?;
    Ok(match user {
        Some(user) => svc.with_identity(StaticIdentity::new(user)),
        None => svc,
    })
}

/// Directory served by the local backend for a configured endpoint.
fn endpoint_root(endpoint: &str) -> anyhow::Result<PathBuf> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        bail!("config has no endpoint; set it to a directory or file:// URL");
    }
    if let Some(path) = endpoint.strip_prefix("file://") {
        if path.is_empty() {
            bail!("file:// endpoint has no path");
        }
        return Ok(PathBuf::from(path));
    }
    if let Some((scheme, _)) = endpoint.split_once("://") {
        bail!("unsupported endpoint scheme `{scheme}`; only file:// is available");
    }
    Ok(PathBuf::from(endpoint))
}

fn format_millis(millis: i64) -> String {
    if millis <= 0 {
        return "never".into();
    }
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| millis.to_string())
}

fn print_json(out: &mut dyn Write, value: &Value, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(value)?)?,
        OutputFormat::Text => writeln!(out, "{}", serde_json::to_string_pretty(value)?)?,
    }
    Ok(())
}

fn cmd_types(format: OutputFormat, out: &mut dyn Write) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let types: Vec<Value> = ObjectType::ALL
                .iter()
                .map(|t| {
                    json!({
                        "group": t.group(),
                        "metadataFilename": t.default_metadata_filename(),
                    })
                })
                .collect();
            writeln!(out, "{}", Value::Array(types))?;
        }
        OutputFormat::Text => {
            for t in ObjectType::ALL {
                writeln!(
                    out,
                    "{:<18} {}",
                    t.group().bold(),
                    t.default_metadata_filename().dimmed()
                )?;
            }
        }
    }
    Ok(())
}

fn cmd_init(svc: &Service, format: OutputFormat, out: &mut dyn Write) -> anyhow::Result<()> {
    svc.ensure_bucket_exists()?;
    let bucket = &svc.config().bucket_name;
    let versioning = svc.config().versioning && svc.supports_versioning();
    match format {
        OutputFormat::Json => {
            writeln!(out, "{}", json!({"bucket": bucket, "versioning": versioning}))?;
        }
        OutputFormat::Text => {
            writeln!(out, "{} Bucket {} ready", "✓".green().bold(), bucket.bold())?;
            let state = if versioning { "on".green() } else { "off".yellow() };
            writeln!(out, "  Versioning: {state}")?;
        }
    }
    Ok(())
}

/// Parses a document body, checking it against the typed record when the
/// object type has one.
fn parse_document(object_type: ObjectType, body: &str) -> anyhow::Result<GenericDocument> {
    let value: Value = serde_json::from_str(body).context("document is not valid JSON")?;
    match object_type {
        ObjectType::Application => {
            serde_json::from_value::<Application>(value.clone())
                .context("document is not a valid application")?;
        }
        ObjectType::Pipeline => {
            serde_json::from_value::<Pipeline>(value.clone())
                .context("document is not a valid pipeline")?;
        }
        _ => {}
    }
    match GenericDocument::from_value(value) {
        Some(doc) => Ok(doc),
        None => bail!("document must be a JSON object"),
    }
}

fn cmd_put(
    svc: &Service,
    args: PutArgs,
    input: &mut dyn Read,
    format: OutputFormat,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let body = match &args.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut body = String::new();
            input.read_to_string(&mut body).context("reading stdin")?;
            body
        }
    };
    let mut doc = parse_document(args.object_type, &body)?;
    svc.store_object(args.object_type, &args.key, &mut doc)?;

    let key = svc.backend_key(args.object_type, &args.key);
    match format {
        OutputFormat::Json => writeln!(out, "{}", json!({"stored": key}))?,
        OutputFormat::Text => writeln!(out, "{} Stored {}", "✓".green().bold(), key.cyan())?,
    }
    Ok(())
}

fn cmd_get(
    svc: &Service,
    args: ObjectArgs,
    format: OutputFormat,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let doc: GenericDocument = svc.load_object(args.object_type, &args.key)?;
    print_json(out, &serde_json::to_value(&doc)?, format)
}

fn cmd_delete(
    svc: &Service,
    args: ObjectArgs,
    format: OutputFormat,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    svc.delete_object(args.object_type, &args.key)?;
    let key = svc.backend_key(args.object_type, &args.key);
    match format {
        OutputFormat::Json => writeln!(out, "{}", json!({"deleted": key}))?,
        OutputFormat::Text => writeln!(out, "{} Deleted {}", "✓".green().bold(), key.cyan())?,
    }
    Ok(())
}

fn cmd_list(
    svc: &Service,
    args: TypeArgs,
    format: OutputFormat,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let listed: BTreeMap<String, i64> = svc
        .list_object_keys(args.object_type)?
        .into_iter()
        .collect();
    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(&listed)?)?,
        OutputFormat::Text => {
            if listed.is_empty() {
                writeln!(out, "No {} documents.", args.object_type)?;
            }
            for (key, millis) in &listed {
                writeln!(out, "{:<40} {}", key.bold(), format_millis(*millis).dimmed())?;
            }
        }
    }
    Ok(())
}

fn cmd_versions(
    svc: &Service,
    args: VersionsArgs,
    format: OutputFormat,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let versions: Vec<GenericDocument> =
        svc.list_object_versions(args.object_type, &args.key, args.max)?;
    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(&versions)?)?,
        OutputFormat::Text => {
            for (i, doc) in versions.iter().enumerate() {
                let by = doc.last_modified_by.as_deref().unwrap_or("unknown");
                writeln!(
                    out,
                    "{}  {}  by {}",
                    format!("#{}", i + 1).yellow().bold(),
                    format_millis(doc.last_modified.unwrap_or(0)),
                    by.cyan()
                )?;
                writeln!(out, "{}", serde_json::to_string_pretty(&doc.fields)?)?;
            }
        }
    }
    Ok(())
}

fn cmd_last_modified(
    svc: &Service,
    args: TypeArgs,
    format: OutputFormat,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let millis = svc.get_last_modified(args.object_type);
    match format {
        OutputFormat::Json => writeln!(out, "{}", json!({"lastModified": millis}))?,
        OutputFormat::Text => writeln!(
            out,
            "{} last modified {}",
            args.object_type.to_string().bold(),
            format_millis(millis)
        )?,
    }
    Ok(())
}
