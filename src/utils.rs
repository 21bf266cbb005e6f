use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Error};
use serde::{Serialize, de::DeserializeOwned};

/// Left pads a clock time with zeros to `HH:MM`. Longer strings are returned unchanged.
pub fn zero_pad_time(time: &str) -> String {
    format!("{time:0>5}")
}

/// Reads the previous stage's output
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, Error> {
    let file = File::open(path).with_context(|| format!("couldn't open {}", path.display()))?;

    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("couldn't parse {}", path.display()))
}

/// Writes pretty printed JSON, replacing the file if it exists
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Error> {
    let file = File::create(path).with_context(|| format!("couldn't create {}", path.display()))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("couldn't write {}", path.display()))?;

    writer
        .flush()
        .with_context(|| format!("couldn't write {}", path.display()))
}
