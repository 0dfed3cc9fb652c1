//! # 文件描述符层
//!
//! 全局的打开文件表。一个描述符表示带有特定读写属性的I/O资源，
//! 文件与目录持有 inode 句柄与偏移量，设备文件只持有设备的读写实现。
//!
//! [`FileTable::duplicate`] 得到的是同一个描述符，偏移量随之共享。

use alloc::sync::Arc;
use alloc::vec::Vec;

use enumflags2::{BitFlags, bitflags};
use minfs::{Inode, MinFileSystem};
use vfs::{Error, InodeKind, Stat};

use crate::config::MAX_FILES;
use crate::device::{Device, DeviceTable};

#[rustfmt::skip]
#[allow(clippy::upper_case_acronyms)]
#[bitflags]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenFlag {
    /// 只写
    WRONLY = 0b0_0001,
    /// 读写兼备
    RDWR   = 0b0_0010,
    /// 不存在则创建
    CREATE = 0b0_0100,
    /// 先清空文件，再交给用户
    TRUNC  = 0b0_1000,
    /// 打开目录；与 `CREATE` 一起时创建目录
    DIR    = 0b1_0000,
}

impl OpenFlag {
    // enumflags2拒绝值为0的标志
    /// 只读
    pub const RDONLY: u32 = 0b0_0000;

    #[inline]
    pub fn read_only() -> BitFlags<OpenFlag> {
        BitFlags::from_bits_truncate(Self::RDONLY)
    }

    /// 解析系统调用传入的标志，含有未知的位则失败
    pub fn decode(raw: u32) -> Result<BitFlags<OpenFlag>, Error> {
        BitFlags::from_bits(raw).map_err(|_| Error::Unsupported)
    }

    /// 不存在时以何种类型创建
    fn create_kind(flags: BitFlags<OpenFlag>) -> InodeKind {
        match (flags.contains(Self::CREATE), flags.contains(Self::DIR)) {
            (false, _) => InodeKind::None,
            (true, false) => InodeKind::File,
            (true, true) => InodeKind::Directory,
        }
    }
}

/// 偏移量的基准
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    /// 文件开头
    Set,
    /// 当前偏移量
    Current,
    /// 文件末尾
    End,
}

impl Whence {
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Set),
            1 => Some(Self::Current),
            2 => Some(Self::End),
            _ => None,
        }
    }
}

/// 文件描述符：打开文件表的下标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fd(pub usize);

/// 打开的文件
#[derive(Debug, Default)]
struct File {
    refs: usize,
    readable: bool,
    writable: bool,
    inner: FileInner,
}

#[derive(Debug, Default)]
enum FileInner {
    /// 刚分配，尚未绑定
    #[default]
    Empty,
    /// 普通文件或目录
    Inode {
        inode: Inode,
        /// **文件**内的偏移量
        offset: usize,
    },
    Device(Arc<dyn Device>),
}

#[derive(Debug)]
pub struct FileTable {
    files: Vec<File>,
}

impl FileTable {
    pub fn new() -> Self {
        let mut files = Vec::with_capacity(MAX_FILES);
        files.resize_with(MAX_FILES, File::default);
        Self { files }
    }

    /// 占用第一个空闲的描述符，计数为1，尚未绑定任何资源
    pub fn allocate(&mut self) -> Result<Fd, Error> {
        let Some(index) = self.files.iter().position(|file| file.refs == 0) else {
            log::warn!("run out of file descriptors");
            return Err(Error::NoFreeDescriptor);
        };
        self.files[index] = File {
            refs: 1,
            ..Default::default()
        };

        Ok(Fd(index))
    }

    /// 按 `flags` 打开路径，失败时不占用描述符
    pub fn open(
        &mut self,
        path: &str,
        flags: BitFlags<OpenFlag>,
        cwd: Option<&Inode>,
        fs: &mut MinFileSystem,
        devices: &DeviceTable,
    ) -> Result<Fd, Error> {
        let fd = self.allocate()?;

        match Self::bind(path, flags, cwd, fs, devices) {
            Ok(inner) => {
                let file = &mut self.files[fd.0];
                file.readable = !flags.contains(OpenFlag::WRONLY);
                file.writable = flags.intersects(OpenFlag::WRONLY | OpenFlag::RDWR);
                file.inner = inner;
                log::debug!("open {path:?} as {fd:?} with {flags:?}");
                Ok(fd)
            }
            Err(err) => {
                self.files[fd.0] = File::default();
                log::warn!("cannot open {path:?} with {flags:?}: {err}");
                Err(err)
            }
        }
    }

    pub fn read(&mut self, fd: Fd, buf: &mut [u8], fs: &mut MinFileSystem) -> Result<usize, Error> {
        let file = self.file_mut(fd)?;
        if !file.readable {
            return Err(Error::PermissionDenied);
        }

        match &mut file.inner {
            FileInner::Inode { inode, offset } => {
                let read_size = fs.read_at(inode, *offset, buf);
                *offset += read_size;
                Ok(read_size)
            }
            FileInner::Device(device) => Ok(device.read(buf)),
            FileInner::Empty => Err(Error::BadDescriptor),
        }
    }

    pub fn write(&mut self, fd: Fd, buf: &[u8], fs: &mut MinFileSystem) -> Result<usize, Error> {
        let file = self.file_mut(fd)?;
        if !file.writable {
            return Err(Error::PermissionDenied);
        }

        match &mut file.inner {
            FileInner::Inode { inode, offset } => {
                let write_size = fs.write_at(inode, *offset, buf)?;
                *offset += write_size;
                Ok(write_size)
            }
            FileInner::Device(device) => Ok(device.write(buf)),
            FileInner::Empty => Err(Error::BadDescriptor),
        }
    }

    /// 调整偏移量并返回新的值，结果必须落在 `[0, size]` 之内，否则偏移量不变
    pub fn seek(
        &mut self,
        fd: Fd,
        offset: i64,
        whence: Whence,
        fs: &MinFileSystem,
    ) -> Result<usize, Error> {
        let FileInner::Inode {
            inode,
            offset: current,
        } = &mut self.file_mut(fd)?.inner
        else {
            return Err(Error::Unsupported);
        };

        let size = fs.size(inode) as i64;
        let base = match whence {
            Whence::Set => 0,
            Whence::Current => *current as i64,
            Whence::End => size,
        };
        let target = base
            .checked_add(offset)
            .filter(|target| (0..=size).contains(target))
            .ok_or(Error::InvalidSeek)?;
        *current = target as usize;

        Ok(*current)
    }

    /// 增加计数，返回同一个描述符
    pub fn duplicate(&mut self, fd: Fd) -> Result<Fd, Error> {
        self.file_mut(fd)?.refs += 1;
        Ok(fd)
    }

    /// 减少计数，归零时释放其持有的 inode
    pub fn close(&mut self, fd: Fd, fs: &mut MinFileSystem) -> Result<(), Error> {
        let file = self.file_mut(fd)?;
        file.refs -= 1;
        if file.refs > 0 {
            return Ok(());
        }

        if let FileInner::Inode { inode, .. } = core::mem::take(file).inner {
            fs.release(inode);
        }
        log::debug!("close {fd:?}");

        Ok(())
    }

    pub fn stat(&self, fd: Fd, fs: &MinFileSystem) -> Result<Stat, Error> {
        match &self.file(fd)?.inner {
            FileInner::Inode { inode, .. } => Ok(fs.stat(inode)),
            FileInner::Device(_) => Ok(Stat::DEVICE),
            FileInner::Empty => Err(Error::BadDescriptor),
        }
    }
}

impl FileTable {
    fn file(&self, fd: Fd) -> Result<&File, Error> {
        self.files
            .get(fd.0)
            .filter(|file| file.refs > 0)
            .ok_or(Error::BadDescriptor)
    }

    fn file_mut(&mut self, fd: Fd) -> Result<&mut File, Error> {
        self.files
            .get_mut(fd.0)
            .filter(|file| file.refs > 0)
            .ok_or(Error::BadDescriptor)
    }

    /// 解析路径并检查类型与标志是否相容
    fn bind(
        path: &str,
        flags: BitFlags<OpenFlag>,
        cwd: Option<&Inode>,
        fs: &mut MinFileSystem,
        devices: &DeviceTable,
    ) -> Result<FileInner, Error> {
        let inode = fs.open(path, OpenFlag::create_kind(flags), cwd)?;

        match fs.kind(&inode) {
            InodeKind::Directory
                if flags.intersects(OpenFlag::WRONLY | OpenFlag::RDWR | OpenFlag::TRUNC) =>
            {
                fs.release(inode);
                Err(Error::IsADirectory)
            }
            InodeKind::File if flags.contains(OpenFlag::DIR) => {
                fs.release(inode);
                Err(Error::NotADirectory)
            }
            InodeKind::Device => {
                // 设备文件不持有 inode
                let device_id = fs.device_id(&inode);
                fs.release(inode);
                device_id
                    .and_then(|device_id| devices.get(device_id))
                    .map(FileInner::Device)
                    .ok_or(Error::NoSuchDevice)
            }
            kind => {
                if kind == InodeKind::File && flags.contains(OpenFlag::TRUNC) {
                    fs.truncate(&inode);
                }
                Ok(FileInner::Inode { inode, offset: 0 })
            }
        }
    }
}

impl Default for FileTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_flags() {
        assert!(OpenFlag::decode(OpenFlag::RDONLY).unwrap().is_empty());
        assert_eq!(OpenFlag::decode(0x1).unwrap(), BitFlags::from(OpenFlag::WRONLY));
        assert_eq!(
            OpenFlag::decode(0x4 | 0x8 | 0x2).unwrap(),
            OpenFlag::CREATE | OpenFlag::TRUNC | OpenFlag::RDWR
        );
        assert_eq!(OpenFlag::decode(0x20), Err(Error::Unsupported));
    }

    #[test]
    fn create_kind() {
        assert_eq!(OpenFlag::create_kind(OpenFlag::read_only()), InodeKind::None);
        assert_eq!(OpenFlag::create_kind(OpenFlag::DIR.into()), InodeKind::None);
        assert_eq!(
            OpenFlag::create_kind(OpenFlag::CREATE | OpenFlag::WRONLY),
            InodeKind::File
        );
        assert_eq!(
            OpenFlag::create_kind(OpenFlag::CREATE | OpenFlag::DIR),
            InodeKind::Directory
        );
    }

    #[test]
    fn whence() {
        assert_eq!(Whence::from_raw(0), Some(Whence::Set));
        assert_eq!(Whence::from_raw(2), Some(Whence::End));
        assert_eq!(Whence::from_raw(3), None);
    }
}
