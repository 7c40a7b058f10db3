mod cli;

use std::io;

use clap::Parser;
use cli::Cli;
use zxfs_tools::BlockFile;

fn main() -> io::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let block_file = BlockFile::open_read_only(&cli.image)?;
    let report = zxfs_tools::inspect(&block_file, cli.what.into()).map_err(io::Error::other)?;
    println!("{report}");
    Ok(())
}
