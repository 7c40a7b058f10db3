mod cli;

use std::io;
use std::sync::Arc;

use block_dev::BlockDevice;
use clap::Parser;
use cli::Cli;
use zxfs::ZxFileSystem;
use zxfs::geometry::MIN_DEVICE_BLOCKS;
use zxfs_tools::{BlockFile, SystemClock};

fn main() -> io::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let block_file = if cli.create {
        BlockFile::create(&cli.image, cli.blocks.unwrap_or(MIN_DEVICE_BLOCKS))?
    } else {
        BlockFile::open(&cli.image)?
    };
    let blocks = match cli.blocks {
        Some(blocks) => blocks,
        None => block_file.blocks()?,
    };
    log::info!("image={:?} blocks={blocks}", cli.image);

    let block_dev: Arc<dyn BlockDevice> = Arc::new(block_file);
    let fs = ZxFileSystem::format(block_dev, blocks, SystemClock).map_err(io::Error::other)?;
    fs.sync().map_err(io::Error::other)?;

    let sb = fs.super_block().snapshot();
    println!(
        "{}: {blocks} blocks, {} free inodes, {} free data blocks",
        cli.image.display(),
        sb.free_inodes,
        sb.free_blocks
    );
    Ok(())
}
