use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
pub struct Cli {
    /// Image file to format
    pub image: PathBuf,

    /// Number of 512-byte blocks, defaults to the image size
    #[arg(long, short)]
    pub blocks: Option<u32>,

    /// Create (or truncate) the image file first
    #[arg(long, short)]
    pub create: bool,
}
