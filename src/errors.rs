use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse newick: {0}")]
    InvalidNewick(String),

    #[error("No trees found in: {0}")]
    EmptyInput(PathBuf),

    #[error("Node {0} visited twice while converting tree")]
    CycleDetected(usize),

    #[error("Failed to read metadata table: {0}")]
    MetadataParse(#[from] csv::Error),

    #[error("Metadata table {path} is missing required column: {column}")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type TreeResult<T> = Result<T, TreeError>;
