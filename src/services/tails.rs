//! Tails files: the public table of accumulator points for a revocation registry
//!
//! A tails file starts with a two byte version header followed by the compressed G1
//! points in order. Files are addressed by the base58 SHA-256 hash of their contents.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind as IoErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use anoncreds_clsig::{
    bls12_381::G1Affine, io::FixedLengthBytes, Tails, TailsGenerator,
};
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use sha2::{Digest, Sha256};

use crate::{
    data_types::rev_reg_def::RevocationRegistryDefinitionPrivate,
    error::{Error, Result},
};

const TAILS_VERSION: [u8; 2] = [0, 2];
const TAIL_SIZE: usize = 48;
const TEMP_NAME_LEN: usize = 16;

/// Writes tails files into a directory
#[derive(Clone, Debug)]
pub struct TailsFileWriter {
    root_path: PathBuf,
}

impl TailsFileWriter {
    /// Create a writer for a directory, by default `tails` under the system temp directory
    pub fn new(root_path: Option<String>) -> Self {
        let root_path = root_path
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("tails"));
        Self { root_path }
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Write the tails points, returning the file location and content hash
    pub fn write(&mut self, generator: TailsGenerator) -> Result<(String, String)> {
        fs::create_dir_all(&self.root_path)?;
        let temp_name: String = OsRng
            .sample_iter(&Alphanumeric)
            .take(TEMP_NAME_LEN)
            .map(char::from)
            .collect();
        let temp_path = self.root_path.join(format!("{}.tmp", temp_name));
        let hash = match write_points(&temp_path, generator) {
            Ok(hash) => hash,
            Err(err) => {
                fs::remove_file(&temp_path).ok();
                return Err(err);
            }
        };
        let path = self.root_path.join(&hash);
        if let Err(err) = fs::rename(&temp_path, &path) {
            fs::remove_file(&temp_path).ok();
            return Err(err.into());
        }
        let location = path
            .to_str()
            .ok_or_else(|| err_msg!(IOError, "Tails file path is not valid UTF-8"))?
            .to_string();
        debug!("Wrote tails file: {}", location);
        Ok((location, hash))
    }
}

fn write_points(path: &Path, generator: TailsGenerator) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(&TAILS_VERSION)?;
    hasher.update(TAILS_VERSION);
    for point in generator {
        point.with_bytes(|b| {
            hasher.update(b);
            writer.write_all(b)
        })?;
    }
    writer.flush()?;
    Ok(bs58::encode(hasher.finalize()).into_string())
}

/// Reads a tails file from disk
#[derive(Clone, Debug)]
pub struct TailsFileReader {
    path: PathBuf,
}

impl TailsFileReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check the file contents against the hash published in a registry definition
    pub fn verify_hash(&self, expected: &str) -> Result<()> {
        let mut reader = BufReader::new(File::open(&self.path)?);
        let mut hasher = Sha256::new();
        let mut buf = [0u8; 4096];
        loop {
            let len = reader.read(&mut buf)?;
            if len == 0 {
                break;
            }
            hasher.update(&buf[..len]);
        }
        let hash = bs58::encode(hasher.finalize()).into_string();
        if hash == expected {
            Ok(())
        } else {
            Err(err_msg!(
                Input,
                "Tails file hash mismatch: expected {}, found {}",
                expected,
                hash
            ))
        }
    }

    /// Open the file for sequential access to the points
    pub fn open(&self) -> Result<TailsFileStream> {
        let mut reader = BufReader::new(File::open(&self.path)?);
        let mut version = [0u8; 2];
        reader
            .read_exact(&mut version)
            .map_err(err_map!(IOError, "Error reading tails file header"))?;
        if version != TAILS_VERSION {
            return Err(err_msg!(
                Unsupported,
                "Unsupported tails file version: {:?}",
                version
            ));
        }
        Ok(TailsFileStream { reader, read: 0 })
    }
}

/// A buffered stream over the points of a tails file
#[derive(Debug)]
pub struct TailsFileStream {
    reader: BufReader<File>,
    read: usize,
}

impl Tails for TailsFileStream {
    type Error = Error;

    fn next_tail(&mut self) -> Result<G1Affine> {
        let mut buf = [0u8; TAIL_SIZE];
        self.reader.read_exact(&mut buf).map_err(|err| {
            if err.kind() == IoErrorKind::UnexpectedEof {
                err_msg!(IOError, "Tails file truncated after {} points", self.read)
            } else {
                Error::from(err)
            }
        })?;
        self.read += 1;
        Ok(<G1Affine as FixedLengthBytes>::from_bytes(&buf)?)
    }
}

/// Regenerate the tails file for a registry from its private key
pub fn generate_tails_file(
    rev_reg_def_private: &RevocationRegistryDefinitionPrivate,
    max_cred_num: u32,
    root_path: Option<String>,
) -> Result<(String, String)> {
    let generator = TailsGenerator::new(&rev_reg_def_private.keypair(), max_cred_num as usize)?;
    TailsFileWriter::new(root_path).write(generator)
}
