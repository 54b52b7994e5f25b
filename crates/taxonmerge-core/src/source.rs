//! JSON taxon sources.
//!
//! A source is the already-typed output of a loader: locations first, then
//! taxon records. Field names follow Darwin Core.
//!
//! ```json
//! { "locations": [ { "locationID": "aus", "locality": "Australia" } ],
//!   "taxa": [ { "taxonID": "t1", "datasetID": "afd", "scientificName": "Canis lupus",
//!               "taxonRank": "species", "taxonomicStatus": "accepted" } ] }
//! ```

use crate::distribution::LocationRecord;
use crate::error::Result;
use crate::instance::InstanceRecord;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxonSource {
    pub locations: Vec<LocationRecord>,
    pub taxa: Vec<InstanceRecord>,
}

impl TaxonSource {
    pub fn new(taxa: Vec<InstanceRecord>) -> Self {
        Self {
            locations: Vec::new(),
            taxa,
        }
    }

    pub fn read<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let source = Self::read(BufReader::new(File::open(path)?))?;
        tracing::info!(
            path = %path.display(),
            locations = source.locations.len(),
            taxa = source.taxa.len(),
            "loaded taxon source"
        );
        Ok(source)
    }

    pub fn write<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}
