use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Arc;

use minfs::{BLOCK_SIZE, InodeKind, MinFileSystem};

use crate::BlockFile;

const TOTAL_BLOCKS: u32 = 512;

fn image_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("minfs-{}-{name}.img", std::process::id()))
}

fn open_image(path: &PathBuf, create: bool) -> Arc<BlockFile> {
    let fd = OpenOptions::new()
        .read(true)
        .write(true)
        .create(create)
        .truncate(create)
        .open(path)
        .unwrap();
    if create {
        fd.set_len(TOTAL_BLOCKS as u64 * BLOCK_SIZE as u64).unwrap();
    }

    Arc::new(BlockFile::new(fd))
}

#[test]
fn image_survives_remount() {
    let _ = env_logger::builder().is_test(true).try_init();
    let path = image_path("remount");
    let content: Vec<u8> = (0..3000u32).map(|i| (i % 251) as u8).collect();

    {
        let mut fs = MinFileSystem::format(open_image(&path, true), TOTAL_BLOCKS, 64);
        let bin = fs.open("/bin", InodeKind::Directory, None).unwrap();
        let app = fs.open("app", InodeKind::File, Some(&bin)).unwrap();
        fs.write_at(&app, 0, &content).unwrap();
        fs.release(app);
        fs.release(bin);
    }

    let image_len = fs::metadata(&path).unwrap().len();
    assert_eq!(image_len, TOTAL_BLOCKS as u64 * BLOCK_SIZE as u64);

    let mut fs = MinFileSystem::mount(open_image(&path, false));
    let app = fs.open("/bin/app", InodeKind::None, None).unwrap();
    let mut buf = vec![0; content.len()];
    assert_eq!(fs.read_at(&app, 0, &mut buf), content.len());
    assert_eq!(buf, content);
    fs.release(app);
    drop(fs);

    fs::remove_file(&path).unwrap();
}
