//! # 内核文件接口
//!
//! ## 分层（自上而下）
//!
//! 1. 系统调用层：只与 [`Vfs`] 打交道
//! 2. 文件描述符层：[`FileTable`]
//! 3. 设备层：[`DeviceTable`]
//! 4. 文件系统层：[`minfs`]
//!
//! 一切都经由 `&mut Vfs`，同一时刻只有一个调用者。

#![no_std]

extern crate alloc;

pub mod config;
mod device;
mod file;

use alloc::sync::Arc;

use enumflags2::BitFlags;
use minfs::{Inode, InodeKind, MinFileSystem};
use vfs::{Error, Stat};

use crate::config::MAX_DEVICES;

pub use self::{
    device::{Device, DeviceTable, Null, Zero},
    file::{Fd, FileTable, OpenFlag, Whence},
};

/// 系统调用层看到的文件系统
#[derive(Debug)]
pub struct Vfs {
    fs: MinFileSystem,
    files: FileTable,
    devices: DeviceTable,
    /// 当前目录，缺省为根目录
    cwd: Option<Inode>,
}

impl Vfs {
    pub fn new(fs: MinFileSystem) -> Self {
        Self {
            fs,
            files: FileTable::new(),
            devices: DeviceTable::new(),
            cwd: None,
        }
    }

    #[inline]
    pub fn fs(&mut self) -> &mut MinFileSystem {
        &mut self.fs
    }

    #[inline]
    pub fn cwd(&self) -> Option<&Inode> {
        self.cwd.as_ref()
    }

    pub fn open(&mut self, path: &str, flags: BitFlags<OpenFlag>) -> Result<Fd, Error> {
        self.files
            .open(path, flags, self.cwd.as_ref(), &mut self.fs, &self.devices)
    }

    #[inline]
    pub fn read(&mut self, fd: Fd, buf: &mut [u8]) -> Result<usize, Error> {
        self.files.read(fd, buf, &mut self.fs)
    }

    #[inline]
    pub fn write(&mut self, fd: Fd, buf: &[u8]) -> Result<usize, Error> {
        self.files.write(fd, buf, &mut self.fs)
    }

    #[inline]
    pub fn seek(&mut self, fd: Fd, offset: i64, whence: Whence) -> Result<usize, Error> {
        self.files.seek(fd, offset, whence, &self.fs)
    }

    #[inline]
    pub fn dup(&mut self, fd: Fd) -> Result<Fd, Error> {
        self.files.duplicate(fd)
    }

    #[inline]
    pub fn close(&mut self, fd: Fd) -> Result<(), Error> {
        self.files.close(fd, &mut self.fs)
    }

    #[inline]
    pub fn fstat(&self, fd: Fd) -> Result<Stat, Error> {
        self.files.stat(fd, &self.fs)
    }

    /// 切换当前目录，目标必须是目录
    pub fn chdir(&mut self, path: &str) -> Result<(), Error> {
        let dir = self.fs.open(path, InodeKind::None, self.cwd.as_ref())?;
        if !self.fs.kind(&dir).is_dir() {
            self.fs.release(dir);
            return Err(Error::NotADirectory);
        }

        if let Some(old) = self.cwd.replace(dir) {
            self.fs.release(old);
        }
        Ok(())
    }

    /// 删除目录项，已打开的描述符依然可用
    #[inline]
    pub fn unlink(&mut self, path: &str) -> Result<(), Error> {
        self.fs.remove(path, self.cwd.as_ref())
    }

    /// 在 `path` 处建立设备文件并绑定设备号。
    ///
    /// 建立设备文件失败时，设备号原有的绑定保持不变。
    pub fn register_device(
        &mut self,
        path: &str,
        device_id: u32,
        device: Arc<dyn Device>,
    ) -> Result<(), Error> {
        if device_id as usize >= MAX_DEVICES {
            return Err(Error::NoSuchDevice);
        }
        self.fs.register_device(path, device_id, self.cwd.as_ref())?;
        self.devices.register(device_id, device)?;
        log::info!("device {device_id} registered at {path:?}");

        Ok(())
    }

    #[inline]
    pub fn sync(&self) {
        self.fs.sync();
    }
}
