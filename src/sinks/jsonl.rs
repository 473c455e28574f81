use super::{DataSink, Writer, open_writer, tag_properties};
use crate::input::Record;
use anyhow::Result;
use std::io::Write;
use std::path::Path;

/// One flat tag object per line; geometry is dropped.
pub struct JsonlSink {
    writer: Writer,
}

impl JsonlSink {
    pub fn new(path: &Path) -> Result<Self> {
        Ok(Self {
            writer: open_writer(path)?,
        })
    }
}

impl DataSink for JsonlSink {
    fn add_record(&mut self, record: &Record) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &tag_properties(&record.tags))?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
