use anyhow::Result;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::input::Record;
use crate::tags::TagBundle;

pub mod geojson;
pub mod geojsonl;
pub mod jsonl;

pub use self::geojson::GeoJsonSink;
pub use self::geojsonl::GeoJsonlSink;
pub use self::jsonl::JsonlSink;

pub trait DataSink: Send {
    fn add_record(&mut self, record: &Record) -> Result<()>;
    fn finish(&mut self) -> Result<()>;
}

pub type Writer = BufWriter<Box<dyn Write + Send>>;

/// Buffered writer over a file, or stdout for `-`.
pub fn open_writer(path: &Path) -> Result<Writer> {
    let inner: Box<dyn Write + Send> = if path.as_os_str() == "-" {
        Box::new(std::io::stdout())
    } else {
        Box::new(File::create(path)?)
    };
    Ok(BufWriter::new(inner))
}

pub fn tag_properties(tags: &TagBundle) -> Map<String, Value> {
    tags.iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect()
}

fn feature_for(record: &Record) -> ::geojson::Feature {
    ::geojson::Feature {
        bbox: None,
        geometry: record.geometry.clone(),
        id: None,
        properties: Some(tag_properties(&record.tags)),
        foreign_members: None,
    }
}
