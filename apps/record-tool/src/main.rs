//! CLI tool for record schemas and record files.
//!
//! Provides commands for:
//! - Schema inspection and normalisation
//! - Building records from text values
//! - Dumping and converting record files

mod cli;

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use record_core::{
    FieldVal, Record, RecordConfig, RecordCopier, RecordData, RecordInfo, SharedSink, TracingSink,
};
use tracing::Level;

use cli::{Cli, Commands};

/// Loads the first `<RecordInfo>` block of a schema file.
fn load_info(path: &Path, config: &RecordConfig, sink: &SharedSink) -> anyhow::Result<RecordInfo> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema {}", path.display()))?;
    let mut info = RecordInfo::with_config(config, Some(sink.clone()));
    info.init_from_xml(&text, None, true)
        .with_context(|| format!("Invalid schema {}", path.display()))?;
    if info.num_fields() == 0 {
        bail!("No <RecordInfo> fields found in {}", path.display());
    }
    tracing::debug!(
        schema = %path.display(),
        fields = info.num_fields(),
        fixed_size = info.fixed_size(),
        "schema loaded"
    );
    Ok(info)
}

fn inspect(info: &RecordInfo, json: bool) -> anyhow::Result<()> {
    if json {
        let fields: Vec<serde_json::Value> = info
            .iter()
            .map(|field| {
                serde_json::json!({
                    "name": field.name(),
                    "type": field.field_type().name(),
                    "size": field.size(),
                    "scale": field.scale(),
                    "offset": field.offset(),
                    "raw_size": field.raw_size(),
                    "var_length": field.is_var_length(),
                })
            })
            .collect();
        let summary = serde_json::json!({
            "fields": fields,
            "fixed_size": info.fixed_size(),
            "contains_var_data": info.contains_var_data(),
            "hash": format!("{:08x}", info.hash()),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!(
        "{:<24} {:<12} {:>10} {:>6} {:>8} {:>8}",
        "name", "type", "size", "scale", "offset", "raw"
    );
    for field in info {
        println!(
            "{:<24} {:<12} {:>10} {:>6} {:>8} {:>8}",
            field.name(),
            field.field_type().name(),
            field.size(),
            field.scale(),
            field.offset(),
            field.raw_size()
        );
    }
    println!(
        "fixed size: {} bytes, var data: {}, hash: {:08x}",
        info.fixed_size(),
        info.contains_var_data(),
        info.hash()
    );
    Ok(())
}

fn build_record(info: &RecordInfo, values: &[String]) -> anyhow::Result<Record> {
    let mut record = info.create_record()?;
    for field in info {
        field.set_null(&mut record)?;
    }
    for pair in values {
        let (name, value) = pair
            .split_once('=')
            .with_context(|| format!("Expected name=value, got '{}'", pair))?;
        let field = info.field_by_name(name)?;
        field
            .set_from_wstring(&mut record, value)
            .with_context(|| format!("Failed to set field '{}'", name))?;
    }
    Ok(record)
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Splits a record file into records.
fn for_each_record(
    info: &RecordInfo,
    bytes: &[u8],
    mut visit: impl FnMut(RecordData<'_>) -> anyhow::Result<()>,
) -> anyhow::Result<usize> {
    let mut rest = bytes;
    let mut count = 0;
    while !rest.is_empty() {
        if !info.has_whole_record(rest) {
            bail!(
                "Trailing partial record after {} records ({} bytes left)",
                count,
                rest.len()
            );
        }
        let len = info.record_len(RecordData::new(rest));
        visit(RecordData::new(&rest[..len]))?;
        rest = &rest[len..];
        count += 1;
    }
    Ok(count)
}

fn record_json(info: &RecordInfo, data: RecordData<'_>) -> anyhow::Result<serde_json::Value> {
    let mut object = serde_json::Map::new();
    for field in info {
        let FieldVal { is_null, value } = field.get_as_wstring(data)?;
        let value = if is_null {
            serde_json::Value::Null
        } else {
            serde_json::Value::String(value)
        };
        object.insert(field.name().to_string(), value);
    }
    Ok(serde_json::Value::Object(object))
}

fn convert(
    from: &RecordInfo,
    to: &RecordInfo,
    config: &RecordConfig,
    input: &Path,
    output: &Path,
) -> anyhow::Result<usize> {
    let mut copier = RecordCopier::with_config(to, from, config);
    for (dest_idx, field) in to.iter().enumerate() {
        match from.field_num_opt(field.name()) {
            Some(src_idx) => copier.add(dest_idx, src_idx),
            None => tracing::warn!(field = field.name(), "no source field; output will be null"),
        }
    }
    copier.done_adding()?;
    tracing::debug!(commands = copier.num_commands(), "copier ready");

    let bytes = std::fs::read(input)
        .with_context(|| format!("Failed to read records {}", input.display()))?;
    let file = File::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let mut writer = BufWriter::new(file);
    let mut record = to.create_record()?;
    let count = for_each_record(from, &bytes, |data| {
        record.reset();
        copier.set_dest_to_null(&mut record)?;
        copier.copy(&mut record, data)?;
        to.write(&mut writer, &mut record)?;
        Ok(())
    })?;
    writer.flush()?;
    Ok(count)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => RecordConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => RecordConfig::default(),
    };
    let sink: SharedSink = Arc::new(TracingSink::new(config.conversion_error_limit));

    match cli.command {
        Commands::Inspect { schema, json } => {
            let info = load_info(&schema, &config, &sink)?;
            inspect(&info, json)?;
        }
        Commands::Normalize { schema, no_source } => {
            let info = load_info(&schema, &config, &sink)?;
            print!("{}", info.record_xml_metadata(!no_source));
        }
        Commands::BuildRecord {
            schema,
            values,
            output,
        } => {
            let info = load_info(&schema, &config, &sink)?;
            let mut record = build_record(&info, &values)?;
            match output {
                Some(path) => {
                    let mut file = OpenOptions::new()
                        .create(true)
                        .append(true)
                        .open(&path)
                        .with_context(|| format!("Failed to open {}", path.display()))?;
                    let version = info.write(&mut file, &mut record)?;
                    tracing::info!(
                        bytes = record.len(),
                        version,
                        "record appended to {}",
                        path.display()
                    );
                }
                None => println!("{}", to_hex(record.finalize().as_bytes())),
            }
        }
        Commands::Dump { schema, input } => {
            let info = load_info(&schema, &config, &sink)?;
            let bytes = std::fs::read(&input)
                .with_context(|| format!("Failed to read records {}", input.display()))?;
            let count = for_each_record(&info, &bytes, |data| {
                println!("{}", serde_json::to_string(&record_json(&info, data)?)?);
                Ok(())
            })?;
            tracing::debug!(records = count, "dump finished");
        }
        Commands::Convert {
            from,
            to,
            input,
            output,
        } => {
            let from_info = load_info(&from, &config, &sink)?;
            let to_info = load_info(&to, &config, &sink)?;
            let count = convert(&from_info, &to_info, &config, &input, &output)?;
            tracing::info!(records = count, "converted {}", input.display());
        }
    }

    Ok(())
}
