mod cli;

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read};
use std::sync::Arc;

use block_dev::BlockDevice;
use clap::Parser;
use cli::Cli;
use kfile::{Null, OpenFlag, Vfs, Zero};
use minfs::{BLOCK_SIZE, MinFileSystem};
use minfs_fuse::BlockFile;

const NULL_DEVICE: u32 = 0;
const ZERO_DEVICE: u32 = 1;

fn main() -> io::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    log::info!("source={:?} target={:?}", cli.source, cli.target);

    let fd = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(cli.out_dir.join("fs.img"))?;
    fd.set_len(cli.blocks as u64 * BLOCK_SIZE as u64)?;

    let block_dev: Arc<dyn BlockDevice> = Arc::new(BlockFile::new(fd));
    let mut vfs = Vfs::new(MinFileSystem::format(block_dev, cli.blocks, cli.inodes));

    mkdir(&mut vfs, "/bin")?;
    mkdir(&mut vfs, "/dev")?;
    vfs.register_device("/dev/null", NULL_DEVICE, Arc::new(Null))
        .map_err(into_io)?;
    vfs.register_device("/dev/zero", ZERO_DEVICE, Arc::new(Zero))
        .map_err(into_io)?;

    let apps = fs::read_dir(&cli.source)?
        .map(|app| {
            app.map(|app| {
                app.file_name()
                    .to_str()
                    .and_then(|fname| fname.split_once('.'))
                    .expect("source file name doesn't match `*.rs`")
                    .0
                    .to_owned()
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    for app in apps {
        log::info!("app={app:?}");
        let mut host_file = File::open(cli.target.join(&app))?;
        let mut elf_data: Vec<u8> = Vec::new();
        host_file.read_to_end(&mut elf_data)?;

        let fd = vfs
            .open(
                &format!("/bin/{app}"),
                OpenFlag::CREATE | OpenFlag::WRONLY | OpenFlag::TRUNC,
            )
            .map_err(into_io)?;
        let written = vfs.write(fd, &elf_data);
        vfs.close(fd).map_err(into_io)?;
        written.map_err(|err| io::Error::other(format!("{app}: {err}")))?;
    }

    vfs.sync();
    Ok(())
}

fn mkdir(vfs: &mut Vfs, path: &str) -> io::Result<()> {
    let fd = vfs
        .open(path, OpenFlag::CREATE | OpenFlag::DIR)
        .map_err(into_io)?;
    vfs.close(fd).map_err(into_io)
}

fn into_io(err: minfs::Error) -> io::Error {
    io::Error::other(err.to_string())
}
