use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use zip::result::ZipError;
use zip::ZipArchive;

use super::FeedError;

/// Where the GTFS text files come from.
pub(super) enum Source {
    Dir(PathBuf),
    Zip(ZipArchive<File>),
}

impl Source {
    pub(super) fn open(path: &Path) -> Result<Self, FeedError> {
        if path.is_dir() {
            return Ok(Source::Dir(path.to_path_buf()));
        }
        if path.is_file() {
            let file = File::open(path).map_err(|source| FeedError::Io {
                file_name: path.display().to_string(),
                source,
            })?;
            return Ok(Source::Zip(ZipArchive::new(file)?));
        }
        Err(FeedError::NotFound(path.display().to_string()))
    }

    /// Read a file the feed must provide.
    pub(super) fn read<O: DeserializeOwned>(&mut self, file_name: &str) -> Result<Vec<O>, FeedError> {
        self.read_optional(file_name)?
            .ok_or_else(|| FeedError::MissingFile(file_name.to_string()))
    }

    /// Read a file, or `None` when the feed doesn't have it.
    pub(super) fn read_optional<O: DeserializeOwned>(
        &mut self,
        file_name: &str,
    ) -> Result<Option<Vec<O>>, FeedError> {
        match self {
            Source::Dir(dir) => {
                let path = dir.join(file_name);
                if !path.is_file() {
                    return Ok(None);
                }
                let file = File::open(&path).map_err(|source| FeedError::Io {
                    file_name: file_name.to_string(),
                    source,
                })?;
                parse_records(file, file_name).map(Some)
            }
            Source::Zip(archive) => match archive.by_name(file_name) {
                Ok(file) => parse_records(file, file_name).map(Some),
                Err(ZipError::FileNotFound) => Ok(None),
                Err(err) => Err(err.into()),
            },
        }
    }
}

fn parse_records<R: Read, O: DeserializeOwned>(reader: R, file_name: &str) -> Result<Vec<O>, FeedError> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
        .deserialize()
        .collect::<Result<Vec<O>, _>>()
        .map_err(|source| FeedError::Csv {
            file_name: file_name.to_string(),
            source,
        })
}
