use std::{collections::HashMap, fmt::Write as _, fs, path::PathBuf};

use anyhow::Result;
use clap::Args;
use ipcstream::{StreamReader, StreamSchema, decode::FieldDescriptor};

use crate::input::open_input;

#[derive(Args)]
pub struct SchemaArgs {
    /// Path to the IPC stream, or `-` for stdin
    input: String,

    /// Output file path (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl SchemaArgs {
    pub fn run(self) -> Result<()> {
        let mut reader = StreamReader::new(open_input(&self.input)?);
        reader.read_schema()?;
        let schema = reader
            .stream_schema()
            .ok_or_else(|| anyhow::anyhow!("schema not available after reading it"))?;
        let text = format_schema(schema)?;

        match self.output {
            Some(path) => fs::write(path, text)?,
            None => print!("{text}"),
        }
        Ok(())
    }
}

fn format_schema(schema: &StreamSchema) -> Result<String> {
    let mut out = String::new();
    for field in schema.fields() {
        format_field(&mut out, field, 0)?;
    }
    format_metadata(&mut out, schema.metadata(), 0)?;
    Ok(out)
}

fn format_field(out: &mut String, field: &FieldDescriptor, depth: usize) -> Result<()> {
    let indent = "  ".repeat(depth);
    let nullable = if field.nullable { "" } else { " not null" };
    write!(out, "{indent}{}: {}{nullable}", field.name, field.value_type())?;
    if let Some(encoding) = &field.dictionary {
        write!(
            out,
            " (dictionary id={} index={}{})",
            encoding.id,
            encoding.index_type,
            if encoding.is_ordered { " ordered" } else { "" }
        )?;
    }
    writeln!(out)?;
    format_metadata(out, &field.metadata, depth + 1)?;
    for child in &field.children {
        format_field(out, child, depth + 1)?;
    }
    Ok(())
}

fn format_metadata(
    out: &mut String,
    metadata: &HashMap<String, String>,
    depth: usize,
) -> Result<()> {
    let indent = "  ".repeat(depth);
    let mut entries: Vec<_> = metadata.iter().collect();
    entries.sort();
    for (key, value) in entries {
        writeln!(out, "{indent}# {key} = {value}")?;
    }
    Ok(())
}
