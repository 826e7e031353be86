// src/pipeline/readers/csv_reader.rs
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::data_model::Schema;
use crate::error::{PipelineError, Result};
use crate::pipeline::readers::BaseReader;

/// Reads a CSV artifact whose header must equal `T::COLUMNS` exactly.
pub struct CsvReader<T> {
    path: PathBuf,
    _record: PhantomData<T>,
}

impl<T> CsvReader<T> {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        CsvReader {
            path: path.as_ref().to_path_buf(),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T> BaseReader for CsvReader<T>
where
    T: DeserializeOwned + Schema + 'static,
{
    type Record = T;

    fn read_records(&self) -> Result<Box<dyn Iterator<Item = Result<T>>>> {
        if !self.path.is_file() {
            return Err(PipelineError::MissingInput {
                path: self.path.clone(),
            });
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let headers = reader.headers()?.clone();
        if !headers.iter().eq(T::COLUMNS.iter().copied()) {
            return Err(PipelineError::MalformedRecord {
                path: self.path.clone(),
                reason: format!(
                    "expected header [{}], found [{}]",
                    T::COLUMNS.join(","),
                    headers.iter().collect::<Vec<_>>().join(",")
                ),
            });
        }
        debug!(path = %self.path.display(), "Opened CSV input");

        let path = self.path.clone();
        let rows = reader.into_deserialize::<T>().map(move |row| {
            row.map_err(|e| PipelineError::MalformedRecord {
                path: path.clone(),
                reason: e.to_string(),
            })
        });
        Ok(Box::new(rows))
    }
}
