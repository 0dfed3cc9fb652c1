use std::sync::Arc;

use block_dev::RamDisk;
use enumflags2::BitFlags;
use kfile::config::MAX_FILES;
use kfile::{Fd, Null, OpenFlag, Vfs, Whence, Zero};
use minfs::{BLOCK_SIZE, Error, InodeKind, MinFileSystem, Stat};

const TOTAL_BLOCKS: u32 = 1024;

fn new_vfs() -> Vfs {
    let _ = env_logger::builder().is_test(true).try_init();
    let disk = Arc::new(RamDisk::new(BLOCK_SIZE, TOTAL_BLOCKS as usize));
    Vfs::new(MinFileSystem::format(disk, TOTAL_BLOCKS, 128))
}

fn create() -> BitFlags<OpenFlag> {
    OpenFlag::CREATE | OpenFlag::WRONLY
}

fn mkdir(vfs: &mut Vfs, path: &str) {
    let fd = vfs.open(path, OpenFlag::CREATE | OpenFlag::DIR).unwrap();
    vfs.close(fd).unwrap();
}

#[test]
fn hello() {
    let mut vfs = new_vfs();

    let fd = vfs.open("/a", create()).unwrap();
    assert_eq!(vfs.write(fd, b"hello"), Ok(5));
    assert_eq!(vfs.fstat(fd).unwrap().size, 5);
    vfs.close(fd).unwrap();

    let fd = vfs.open("/a", OpenFlag::read_only()).unwrap();
    let mut buf = [0; 5];
    assert_eq!(vfs.read(fd, &mut buf), Ok(5));
    assert_eq!(&buf, b"hello");
    assert_eq!(vfs.seek(fd, 0, Whence::End), Ok(5));
    assert_eq!(vfs.read(fd, &mut buf), Ok(0));
    vfs.close(fd).unwrap();
}

#[test]
fn mode_mismatch() {
    let mut vfs = new_vfs();
    let fd = vfs.open("/f", create()).unwrap();
    vfs.close(fd).unwrap();
    mkdir(&mut vfs, "/d");

    assert_eq!(
        vfs.open("/f", OpenFlag::CREATE | OpenFlag::DIR),
        Err(Error::NotADirectory)
    );
    assert_eq!(vfs.open("/f", OpenFlag::DIR.into()), Err(Error::NotADirectory));
    for flags in [OpenFlag::WRONLY, OpenFlag::RDWR, OpenFlag::TRUNC] {
        assert_eq!(vfs.open("/d", flags.into()), Err(Error::IsADirectory));
    }
    assert_eq!(vfs.open("/missing", OpenFlag::read_only()), Err(Error::NotFound));

    // 失败的打开不占用描述符
    let dir = vfs.open("/d", OpenFlag::DIR.into()).unwrap();
    assert_eq!(dir, Fd(0));
    let stat = vfs.fstat(dir).unwrap();
    assert_eq!(stat.kind, InodeKind::Directory);
    assert_eq!(stat.size, 64);
    assert_eq!(vfs.write(dir, b"x"), Err(Error::PermissionDenied));
    vfs.close(dir).unwrap();
}

#[test]
fn permissions() {
    let mut vfs = new_vfs();
    let writer = vfs.open("/f", create()).unwrap();
    vfs.write(writer, b"data").unwrap();

    let mut buf = [0; 4];
    assert_eq!(vfs.read(writer, &mut buf), Err(Error::PermissionDenied));

    let reader = vfs.open("/f", OpenFlag::read_only()).unwrap();
    assert_eq!(vfs.write(reader, b"x"), Err(Error::PermissionDenied));
    assert_eq!(vfs.read(reader, &mut buf), Ok(4));

    let both = vfs.open("/f", OpenFlag::RDWR.into()).unwrap();
    assert_eq!(vfs.write(both, b"D"), Ok(1));
    assert_eq!(vfs.read(both, &mut buf), Ok(3));
    assert_eq!(&buf[..3], b"ata");

    for fd in [writer, reader, both] {
        vfs.close(fd).unwrap();
    }
}

#[test]
fn duplicates_share_offset() {
    let mut vfs = new_vfs();
    let fd = vfs.open("/shared", OpenFlag::CREATE | OpenFlag::RDWR).unwrap();
    let dup = vfs.dup(fd).unwrap();
    assert_eq!(dup, fd);

    vfs.write(fd, b"abcdef").unwrap();
    assert_eq!(vfs.seek(dup, 0, Whence::Current), Ok(6));

    vfs.seek(dup, 2, Whence::Set).unwrap();
    let mut buf = [0; 2];
    vfs.read(fd, &mut buf).unwrap();
    assert_eq!(&buf, b"cd");
    assert_eq!(vfs.seek(dup, 0, Whence::Current), Ok(4));

    // 计数归零前描述符依然可用
    vfs.close(fd).unwrap();
    assert_eq!(vfs.read(dup, &mut buf), Ok(2));
    vfs.close(dup).unwrap();
    assert_eq!(vfs.read(dup, &mut buf), Err(Error::BadDescriptor));
    assert_eq!(vfs.close(dup), Err(Error::BadDescriptor));
}

#[test]
fn seek_bounds() {
    let mut vfs = new_vfs();
    let fd = vfs.open("/f", OpenFlag::CREATE | OpenFlag::RDWR).unwrap();
    vfs.write(fd, b"hello").unwrap();

    assert_eq!(vfs.seek(fd, 1, Whence::Set), Ok(1));
    assert_eq!(vfs.seek(fd, 100, Whence::Set), Err(Error::InvalidSeek));
    assert_eq!(vfs.seek(fd, -2, Whence::Current), Err(Error::InvalidSeek));
    assert_eq!(vfs.seek(fd, 1, Whence::End), Err(Error::InvalidSeek));
    assert_eq!(vfs.seek(fd, 0, Whence::Current), Ok(1));
    assert_eq!(vfs.seek(fd, -5, Whence::End), Ok(0));

    vfs.close(fd).unwrap();
}

#[test]
fn truncate_on_open() {
    let mut vfs = new_vfs();
    let fd = vfs.open("/log", create()).unwrap();
    vfs.write(fd, &[7; 3 * BLOCK_SIZE]).unwrap();
    vfs.close(fd).unwrap();

    let fd = vfs.open("/log", OpenFlag::WRONLY | OpenFlag::TRUNC).unwrap();
    assert_eq!(vfs.fstat(fd).unwrap().size, 0);
    vfs.write(fd, b"new").unwrap();
    vfs.close(fd).unwrap();

    let fd = vfs.open("/log", create() | OpenFlag::TRUNC).unwrap();
    assert_eq!(vfs.fstat(fd).unwrap().size, 0);
    vfs.close(fd).unwrap();
}

#[test]
fn unlink_while_open() {
    let mut vfs = new_vfs();
    let fd = vfs.open("/tmp", OpenFlag::CREATE | OpenFlag::RDWR).unwrap();
    vfs.write(fd, b"still here").unwrap();
    let ino = vfs.fstat(fd).unwrap().ino;

    vfs.unlink("/tmp").unwrap();
    assert_eq!(vfs.open("/tmp", OpenFlag::read_only()), Err(Error::NotFound));
    assert_eq!(vfs.unlink("/tmp"), Err(Error::NotFound));

    vfs.seek(fd, 0, Whence::Set).unwrap();
    let mut buf = [0; 10];
    assert_eq!(vfs.read(fd, &mut buf), Ok(10));
    assert_eq!(&buf, b"still here");

    vfs.close(fd).unwrap();
    assert_eq!(vfs.fs().alloc_inode(InodeKind::File), ino);
}

#[test]
fn devices() {
    let mut vfs = new_vfs();
    mkdir(&mut vfs, "/dev");
    vfs.register_device("/dev/zero", 1, Arc::new(Zero)).unwrap();
    assert_eq!(
        vfs.register_device("/dev/big", 99, Arc::new(Zero)),
        Err(Error::NoSuchDevice)
    );

    let fd = vfs.open("/dev/zero", OpenFlag::RDWR.into()).unwrap();
    let mut buf = [0xff; 4];
    assert_eq!(vfs.read(fd, &mut buf), Ok(4));
    assert_eq!(buf, [0; 4]);
    assert_eq!(vfs.write(fd, b"abc"), Ok(3));
    assert_eq!(vfs.seek(fd, 0, Whence::Set), Err(Error::Unsupported));
    assert_eq!(vfs.fstat(fd), Ok(Stat::DEVICE));
    vfs.close(fd).unwrap();

    // 设备号没有绑定实现
    vfs.fs().register_device("/dev/ghost", 9, None).unwrap();
    assert_eq!(
        vfs.open("/dev/ghost", OpenFlag::read_only()),
        Err(Error::NoSuchDevice)
    );
}

#[test]
fn failed_registration_keeps_binding() {
    let mut vfs = new_vfs();
    vfs.register_device("/zero", 1, Arc::new(Zero)).unwrap();
    let fd = vfs.open("/file", create()).unwrap();
    vfs.close(fd).unwrap();

    assert_eq!(
        vfs.register_device("/file", 1, Arc::new(Null)),
        Err(Error::AlreadyExists)
    );
    assert_eq!(
        vfs.register_device("/missing/null", 1, Arc::new(Null)),
        Err(Error::NotFound)
    );

    let fd = vfs.open("/zero", OpenFlag::read_only()).unwrap();
    let mut buf = [0xff; 4];
    assert_eq!(vfs.read(fd, &mut buf), Ok(4));
    assert_eq!(buf, [0; 4]);
    vfs.close(fd).unwrap();

    // 设备号越界时不建立设备文件
    assert_eq!(
        vfs.register_device("/big", 99, Arc::new(Zero)),
        Err(Error::NoSuchDevice)
    );
    assert_eq!(vfs.fs().open("/big", InodeKind::None, None), Err(Error::NotFound));
}

#[test]
fn chdir() {
    let mut vfs = new_vfs();
    mkdir(&mut vfs, "/usr");
    vfs.chdir("/usr").unwrap();

    let fd = vfs.open("notes", create()).unwrap();
    let ino = vfs.fstat(fd).unwrap().ino;
    vfs.close(fd).unwrap();
    assert_eq!(vfs.chdir("notes"), Err(Error::NotADirectory));
    assert_eq!(vfs.chdir("/nowhere"), Err(Error::NotFound));

    vfs.chdir("..").unwrap();
    let fd = vfs.open("usr/notes", OpenFlag::read_only()).unwrap();
    assert_eq!(vfs.fstat(fd).unwrap().ino, ino);
    vfs.close(fd).unwrap();

    // 绝对路径不受当前目录影响
    vfs.chdir("usr").unwrap();
    let fd = vfs.open("/usr/notes", OpenFlag::read_only()).unwrap();
    vfs.close(fd).unwrap();
    vfs.unlink("notes").unwrap();
    assert_eq!(vfs.open("/usr/notes", OpenFlag::read_only()), Err(Error::NotFound));
}

#[test]
fn descriptor_exhaustion() {
    let mut vfs = new_vfs();
    let fds: Vec<Fd> = (0..MAX_FILES)
        .map(|_| vfs.open("/f", create()).unwrap())
        .collect();
    assert_eq!(vfs.open("/f", create()), Err(Error::NoFreeDescriptor));

    vfs.close(fds[7]).unwrap();
    assert_eq!(vfs.open("/f", create()), Ok(Fd(7)));
}
