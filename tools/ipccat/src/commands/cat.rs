use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use ipcstream::StreamReader;

use crate::{format::OutputFormat, input::open_input, writer::create_writer};

#[derive(Args)]
pub struct CatArgs {
    /// Path to the IPC stream, or `-` for stdin
    input: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Output file path (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Copy every buffer out of the message body
    #[arg(long)]
    no_shared_buffers: bool,

    /// Stop after this many record batches
    #[arg(short = 'n', long)]
    limit: Option<usize>,
}

impl CatArgs {
    pub fn run(self) -> Result<()> {
        let stream = open_input(&self.input)?;
        let mut reader = StreamReader::builder()
            .with_shared_buffers(!self.no_shared_buffers)
            .build(stream);
        let mut writer = create_writer(self.format, self.output.as_deref())?;

        let mut batches = 0usize;
        let mut rows = 0usize;
        while self.limit.is_none_or(|limit| batches < limit) {
            let Some(batch) = reader.next_batch()? else {
                break;
            };
            batches += 1;
            rows += batch.num_rows();
            writer.write_batch(&batch)?;
        }
        writer.finish()?;

        eprintln!("{batches} batches, {rows} rows");
        Ok(())
    }
}
