use super::{DataSink, Writer, feature_for, open_writer};
use crate::input::Record;
use anyhow::Result;
use geojson::GeoJson;
use std::io::Write;
use std::path::Path;

/// A single FeatureCollection, streamed feature by feature.
pub struct GeoJsonSink {
    writer: Writer,
    first_feature: bool,
}

impl GeoJsonSink {
    pub fn new(path: &Path) -> Result<Self> {
        let mut writer = open_writer(path)?;

        writeln!(writer, "{{")?;
        writeln!(writer, "  \"type\": \"FeatureCollection\",")?;
        writeln!(writer, "  \"features\": [")?;

        Ok(Self {
            writer,
            first_feature: true,
        })
    }
}

impl DataSink for GeoJsonSink {
    fn add_record(&mut self, record: &Record) -> Result<()> {
        if !self.first_feature {
            writeln!(self.writer, ",")?;
        }
        self.first_feature = false;

        let geojson = GeoJson::Feature(feature_for(record));
        serde_json::to_writer(&mut self.writer, &geojson)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        writeln!(self.writer)?;
        writeln!(self.writer, "  ]")?;
        writeln!(self.writer, "}}")?;
        self.writer.flush()?;
        Ok(())
    }
}
