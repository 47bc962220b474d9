use std::{
    fs,
    io::{self, BufWriter, Write},
    path::Path,
};

use anyhow::Result;
use arrow::{record_batch::RecordBatch, util::pretty::pretty_format_batches};

use crate::format::OutputFormat;

pub trait RecordBatchWriter {
    fn write_batch(&mut self, batch: &RecordBatch) -> Result<()>;
    fn finish(&mut self) -> Result<()>;
}

pub fn create_writer(
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<Box<dyn RecordBatchWriter>> {
    let flush_each_batch = output.is_none();
    let dest: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(fs::File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    Ok(match format {
        OutputFormat::Table => Box::new(TableWriter {
            dest,
            flush_each_batch,
        }),
        OutputFormat::Jsonl => Box::new(JsonlWriter {
            dest,
            flush_each_batch,
        }),
        OutputFormat::Csv => Box::new(CsvWriter {
            dest,
            header_written: false,
            flush_each_batch,
        }),
    })
}

// --- Table ---

pub struct TableWriter {
    dest: Box<dyn Write>,
    flush_each_batch: bool,
}

impl RecordBatchWriter for TableWriter {
    fn write_batch(&mut self, batch: &RecordBatch) -> Result<()> {
        let table = pretty_format_batches(std::slice::from_ref(batch))?;
        writeln!(self.dest, "{table}")?;
        if self.flush_each_batch {
            self.dest.flush()?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.dest.flush()?;
        Ok(())
    }
}

// --- JSON Lines ---

pub struct JsonlWriter {
    dest: Box<dyn Write>,
    flush_each_batch: bool,
}

impl RecordBatchWriter for JsonlWriter {
    fn write_batch(&mut self, batch: &RecordBatch) -> Result<()> {
        let mut json_writer = arrow::json::LineDelimitedWriter::new(&mut self.dest);
        json_writer.write(batch)?;
        json_writer.finish()?;
        drop(json_writer);
        if self.flush_each_batch {
            self.dest.flush()?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.dest.flush()?;
        Ok(())
    }
}

// --- CSV ---

pub struct CsvWriter {
    dest: Box<dyn Write>,
    header_written: bool,
    flush_each_batch: bool,
}

impl RecordBatchWriter for CsvWriter {
    fn write_batch(&mut self, batch: &RecordBatch) -> Result<()> {
        let mut csv_writer = arrow::csv::WriterBuilder::new()
            .with_header(!self.header_written)
            .build(&mut self.dest);
        self.header_written = true;
        csv_writer.write(batch)?;
        drop(csv_writer);
        if self.flush_each_batch {
            self.dest.flush()?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.dest.flush()?;
        Ok(())
    }
}
