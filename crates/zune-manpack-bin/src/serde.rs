use std::ffi::OsString;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use zune_manpack::ManpackHeader;

pub struct Metadata<'a> {
    file:      OsString,
    file_size: u64,
    header:    &'a ManpackHeader
}

impl<'a> Metadata<'a> {
    pub fn new(file: OsString, file_size: u64, header: &ManpackHeader) -> Metadata {
        Metadata {
            file,
            file_size,
            header
        }
    }
}

impl<'a> Serialize for Metadata<'a> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer
    {
        let header = self.header;
        let raw_size = header.pixel_count().unwrap_or(0).saturating_mul(4);

        let mut state = serializer.serialize_struct("ManpackMetadata", 10)?;

        state.serialize_field("file", &self.file.to_string_lossy())?;
        state.serialize_field("file_size", &self.file_size)?;
        state.serialize_field("version", &header.version)?;
        state.serialize_field("width", &header.width)?;
        state.serialize_field("height", &header.height)?;
        state.serialize_field("colorspace", &format!("{:?}", header.layout.colorspace()))?;
        state.serialize_field("method", header.method.name())?;
        state.serialize_field("predictor", header.predictor.name())?;
        state.serialize_field("payload_length", &header.payload_length)?;
        state.serialize_field("ratio", &(raw_size as f64 / self.file_size.max(1) as f64))?;

        state.end()
    }
}
