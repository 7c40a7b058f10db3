use clap::{Parser, Subcommand};
use std::path::PathBuf;

use zxfs_tools::Structure;

#[derive(Parser)]
pub struct Cli {
    /// Image file to inspect
    pub image: PathBuf,

    #[command(subcommand)]
    pub what: What,
}

#[derive(Subcommand)]
pub enum What {
    /// Superblock and both bitmaps
    Super,
    /// One inode record
    Inode { index: u32 },
    /// A data block decoded as directory entries
    Dir { block: u32 },
    /// A data block as hex
    Block { block: u32 },
    /// Any device block as hex, counted from the start of the image
    DeviceBlock { block: u32 },
}

impl From<What> for Structure {
    fn from(what: What) -> Self {
        match what {
            What::Super => Self::Super,
            What::Inode { index } => Self::Inode(index),
            What::Dir { block } => Self::Dir(block),
            What::Block { block } => Self::Block(block),
            What::DeviceBlock { block } => Self::DeviceBlock(block),
        }
    }
}
