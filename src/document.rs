// Copyright (c) 2025 - Cowboy AI, Inc.
//! Configuration Documents
//!
//! Reads and writes the persistent JSON form of each tier's model. Reading
//! validates the model invariants, so an accepted document is always a
//! consistent model. Unknown top-level metadata in domain and host documents
//! is carried through untouched and written back on save.

use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

use crate::errors::{InfrastructureError, InfrastructureResult};
use crate::model::ConfigurationModel;

/// Parse and validate a model from a JSON string
pub fn parse<M>(document: &str) -> InfrastructureResult<M>
where
    M: ConfigurationModel + DeserializeOwned,
{
    let model: M = serde_json::from_str(document)
        .map_err(|e| InfrastructureError::Deserialization(e.to_string()))?;
    model.validate()?;
    Ok(model)
}

/// Parse and validate a model from a reader
pub fn read<M, R>(reader: R) -> InfrastructureResult<M>
where
    M: ConfigurationModel + DeserializeOwned,
    R: Read,
{
    let model: M = serde_json::from_reader(reader)
        .map_err(|e| InfrastructureError::Deserialization(e.to_string()))?;
    model.validate()?;
    Ok(model)
}

/// Write a model as pretty-printed JSON
pub fn write<M, W>(model: &M, writer: W) -> InfrastructureResult<()>
where
    M: ConfigurationModel,
    W: Write,
{
    serde_json::to_writer_pretty(writer, model)?;
    Ok(())
}

pub fn to_string<M: ConfigurationModel>(model: &M) -> InfrastructureResult<String> {
    Ok(serde_json::to_string_pretty(model)?)
}

/// Load a model document from disk
pub fn load<M, P>(path: P) -> InfrastructureResult<M>
where
    M: ConfigurationModel + DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let model = read(BufReader::new(File::open(path)?))?;
    let tier = M::TIER;
    debug!(path = %path.display(), tier = %tier, "Loaded configuration document");
    Ok(model)
}

/// Save a model document to disk, replacing any existing file
pub fn save<M, P>(model: &M, path: P) -> InfrastructureResult<()>
where
    M: ConfigurationModel,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    write(model, &mut writer)?;
    writer.flush()?;
    let tier = M::TIER;
    debug!(path = %path.display(), tier = %tier, "Saved configuration document");
    Ok(())
}
