//! Resbin CLI - Command-line tool for inspecting compiled Android resources.
//!
//! This is the main entry point for the resbin command-line application.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use resbin::axml::{Chunk, ChunkDispatcher};
use resbin::prelude::*;
use resbin::res::table::TableHeader;

/// Resbin - Android binary XML and resource chunk tool
#[derive(Parser)]
#[command(name = "resbin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a binary XML file to text XML
    Convert {
        /// Input binary XML file
        #[arg(short, long, env = "RESBIN_INPUT")]
        input: PathBuf,

        /// Output XML file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the pull parser events of a binary XML file
    Events {
        /// Input binary XML file
        #[arg(short, long, env = "RESBIN_INPUT")]
        input: PathBuf,

        /// Print one JSON object per event
        #[arg(long)]
        json: bool,
    },

    /// Dump the string pool of a binary XML or resource table file
    Strings {
        /// Input file
        #[arg(short, long, env = "RESBIN_INPUT")]
        input: PathBuf,

        /// Also print style spans
        #[arg(short, long)]
        styles: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| level.into()),
        ))
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Convert { input, output } => {
            cmd_convert(&input, output.as_deref())?;
        }
        Commands::Events { input, json } => {
            cmd_events(&input, json)?;
        }
        Commands::Strings { input, styles } => {
            cmd_strings(&input, styles)?;
        }
    }

    Ok(())
}

fn cmd_convert(input: &Path, output: Option<&Path>) -> Result<()> {
    let data = fs::read(input).context("Failed to read input file")?;
    let mut parser = XmlParser::new(&data[..]);

    match output {
        Some(path) => {
            let file = fs::File::create(path).context("Failed to create output file")?;
            let mut writer = BufWriter::new(file);
            parser
                .write_xml(&mut writer)
                .context("Failed to convert binary XML")?;
            writer.flush().context("Failed to write output file")?;
            eprintln!("Converted {} -> {}", input.display(), path.display());
        }
        None => {
            let xml = parser.to_xml_string().context("Failed to convert binary XML")?;
            println!("{xml}");
        }
    }

    Ok(())
}

fn cmd_events(input: &Path, as_json: bool) -> Result<()> {
    let data = fs::read(input).context("Failed to read input file")?;
    let mut parser = XmlParser::new(&data[..]);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    loop {
        let event = parser.advance().context("Failed to parse binary XML")?;
        if as_json {
            writeln!(out, "{}", event_json(&parser)?)?;
        } else {
            writeln!(out, "{}", event_line(&parser)?)?;
        }
        if event.is_terminal() {
            break;
        }
    }

    Ok(())
}

fn event_line<R, D>(parser: &XmlParser<R, D>) -> Result<String> {
    let event = parser.event();
    let line = parser
        .line_number()
        .map(|n| format!("{n:>5} "))
        .unwrap_or_else(|| "      ".to_string());

    let detail = match event {
        XmlEvent::StartNamespace | XmlEvent::EndNamespace => {
            format!("{}={}", parser.namespace_prefix()?, parser.namespace_uri()?)
        }
        XmlEvent::StartTag => {
            let mut text = qualified(parser.element_namespace()?, parser.element_name()?);
            for attribute in parser.attributes() {
                let value = match attribute.value_string_id() {
                    Some(_) => attribute.value_string()?.to_string(),
                    None => attribute.typed_value().value().to_string(),
                };
                text.push_str(&format!(
                    " {}={value:?}",
                    qualified(attribute.namespace()?, attribute.name()?)
                ));
            }
            text
        }
        XmlEvent::EndTag => qualified(parser.element_namespace()?, parser.element_name()?),
        XmlEvent::Text => format!("{:?}", parser.text()?),
        _ => String::new(),
    };

    Ok(format!("{line}{event:<15} {detail}").trim_end().to_string())
}

fn qualified(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{{{namespace}}}{name}")
    }
}

fn event_json<R, D>(parser: &XmlParser<R, D>) -> Result<serde_json::Value> {
    let mut value = json!({
        "event": parser.event(),
        "line": parser.line_number(),
    });

    match parser.event() {
        XmlEvent::StartNamespace | XmlEvent::EndNamespace => {
            value["prefix"] = json!(parser.namespace_prefix()?);
            value["uri"] = json!(parser.namespace_uri()?);
        }
        XmlEvent::StartTag => {
            value["namespace"] = json!(parser.element_namespace()?);
            value["name"] = json!(parser.element_name()?);
            let attributes = parser
                .attributes()
                .map(|attribute| -> Result<serde_json::Value> {
                    Ok(json!({
                        "namespace": attribute.namespace()?,
                        "name": attribute.name()?,
                        "raw": attribute.value_string_id().map(|_| attribute.value_string()).transpose()?,
                        "typed": attribute.typed_value().value(),
                        "resource_id": attribute.resource_id(),
                    }))
                })
                .collect::<Result<Vec<_>>>()?;
            value["attributes"] = json!(attributes);
        }
        XmlEvent::EndTag => {
            value["namespace"] = json!(parser.element_namespace()?);
            value["name"] = json!(parser.element_name()?);
        }
        XmlEvent::Text => {
            value["text"] = json!(parser.text()?);
        }
        _ => {}
    }

    Ok(value)
}

fn cmd_strings(input: &Path, show_styles: bool) -> Result<()> {
    let data = fs::read(input).context("Failed to read input file")?;
    let mut stream = &data[..];

    // A resource table keeps its global string pool right after the table
    // header; binary XML documents are walked by the chunk dispatcher.
    if let Some(header) = ChunkHeader::read(&mut &data[..])? {
        if header.chunk_type() == Some(ChunkType::Table) {
            stream = &stream[usize::from(ChunkHeader::SIZE)..];
            let table = TableHeader::read(&header, &mut stream).context("Failed to read table header")?;
            eprintln!("Resource table with {} package(s)", table.package_count);
        }
    }

    let mut warnings: Vec<Warning> = Vec::new();
    let mut dispatcher = ChunkDispatcher::new(stream);
    let pool = loop {
        match dispatcher
            .next_chunk(&mut warnings)
            .context("Failed to read chunk")?
        {
            Some(Chunk::StringPool(pool)) => break pool,
            Some(_) => continue,
            None => bail!("No string pool found in {}", input.display()),
        }
    };
    for warning in &warnings {
        tracing::debug!(%warning, "chunk skipped before string pool");
    }

    println!(
        "{} strings, {} ({})",
        pool.len(),
        if pool.is_utf8() { "UTF-8" } else { "UTF-16" },
        if pool.is_sorted() { "sorted" } else { "unsorted" }
    );

    for (index, s) in pool.strings().enumerate() {
        println!("{index:>6}: {s:?}");
        if show_styles {
            for span in pool.styles(index as u32)? {
                println!(
                    "          <{}> {}..={}",
                    pool.resolve(span.name)?,
                    span.first_char,
                    span.last_char
                );
            }
        }
    }

    Ok(())
}
