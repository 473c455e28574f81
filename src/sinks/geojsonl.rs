use super::{DataSink, Writer, feature_for, open_writer};
use crate::input::Record;
use anyhow::Result;
use geojson::GeoJson;
use std::io::Write;
use std::path::Path;

/// One GeoJSON Feature per line.
pub struct GeoJsonlSink {
    writer: Writer,
}

impl GeoJsonlSink {
    pub fn new(path: &Path) -> Result<Self> {
        Ok(Self {
            writer: open_writer(path)?,
        })
    }
}

impl DataSink for GeoJsonlSink {
    fn add_record(&mut self, record: &Record) -> Result<()> {
        let geojson = GeoJson::Feature(feature_for(record));
        serde_json::to_writer(&mut self.writer, &geojson)?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
