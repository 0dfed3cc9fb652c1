use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
pub struct Cli {
    /// Executable source directory
    #[arg(long, short)]
    pub source: PathBuf,

    /// Executable target directory
    #[arg(long, short)]
    pub target: PathBuf,

    /// Output directory
    #[arg(long, short = 'O')]
    pub out_dir: PathBuf,

    /// Number of blocks of the image
    #[arg(long, default_value_t = 8192)]
    pub blocks: u32,

    /// Capacity of the inode table
    #[arg(long, default_value_t = 256)]
    pub inodes: u32,
}
