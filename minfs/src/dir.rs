//! # 目录层
//!
//! 目录就是类型为 [`InodeKind::Directory`] 的 inode，其数据是一串按插入顺序排列的
//! [`DirEntry`]。前两项固定是`.`与`..`；删除的项原地清零成空槽位，不做压缩，
//! 新建的项优先填入扫描时遇到的第一个空槽位。

use alloc::vec::Vec;

use vfs::{Error, InodeKind};

use crate::config::MAX_FILE_SIZE;
use crate::layout::DirEntry;
use crate::path::{Path, truncate_name};
use crate::{Inode, MinFileSystem};

impl MinFileSystem {
    /// 在目录 `parent` 中查找 `name`，返回 inode 与其目录项的偏移。
    ///
    /// 找不到时，若 `create` 不为 [`InodeKind::None`] 则以该类型新建。
    /// 名字按目录项中保存的形式截断后再比较。
    pub fn lookup_or_create(
        &mut self,
        parent: &Inode,
        name: &str,
        create: InodeKind,
    ) -> Result<(Inode, usize), Error> {
        let name = truncate_name(name);
        if !self.kind(parent).is_dir() {
            return Err(Error::NotADirectory);
        }

        let size = self.size(parent) as usize;
        let mut empty_slot = None;
        let mut dir_entry = DirEntry::default();
        for offset in (0..size).step_by(DirEntry::SIZE) {
            self.read_entry(parent, offset, &mut dir_entry);
            if dir_entry.is_empty() {
                empty_slot.get_or_insert(offset);
                continue;
            }
            if dir_entry.name() == name {
                let inode = self.acquire(dir_entry.inode_id())?;
                return Ok((inode, offset));
            }
        }

        if create == InodeKind::None {
            return Err(Error::NotFound);
        }

        let slot = empty_slot.unwrap_or(size);
        if slot + DirEntry::SIZE > MAX_FILE_SIZE {
            return Err(Error::FileTooLarge);
        }

        let inode_id = self.alloc_inode(create);
        let inode = match self.acquire(inode_id) {
            Ok(inode) => inode,
            Err(err) => {
                self.free_inode(inode_id);
                return Err(err);
            }
        };
        if create == InodeKind::Directory {
            let parent_id = self.inode_id(parent);
            self.init_dir(&inode, parent_id);
        }
        self.write_at(parent, slot, DirEntry::new(name, inode_id).as_bytes())?;
        log::debug!(
            "created {name:?} as {create:?}: inode {inode_id} at offset {slot} of inode {}",
            self.inode_id(parent)
        );

        Ok((inode, slot))
    }

    /// 从根目录（绝对路径）或 `cwd`（相对路径，缺省为根目录）出发，
    /// 走到最后一项的父目录为止，返回父目录与最后一项的名字。
    pub fn resolve_parent<'p>(
        &mut self,
        path: &'p str,
        cwd: Option<&Inode>,
    ) -> Result<(Inode, &'p str), Error> {
        let mut dir = match cwd {
            Some(cwd) if path.is_relative() => self.duplicate(cwd),
            _ => self.root()?,
        };

        let mut rest = path;
        while let Some((name, next)) = rest.next_component() {
            if !self.kind(&dir).is_dir() {
                self.release(dir);
                log::warn!("{path:?}: middle segment isn't directory");
                return Err(Error::NotADirectory);
            }
            if next.is_empty() {
                return Ok((dir, name));
            }

            let found = self.lookup_or_create(&dir, name, InodeKind::None);
            self.release(dir);
            dir = match found {
                Ok((inode, _)) => inode,
                Err(err) => {
                    log::warn!("{path:?}: cannot resolve {name:?}: {err}");
                    return Err(err);
                }
            };
            rest = next;
        }

        self.release(dir);
        Err(Error::NotFound)
    }

    /// 解析完整路径；最后一项不存在且 `create` 不为 [`InodeKind::None`] 时以该类型新建。
    ///
    /// 单独的根路径直接返回根目录。
    pub fn open(&mut self, path: &str, create: InodeKind, cwd: Option<&Inode>) -> Result<Inode, Error> {
        if path.next_component().is_none() {
            return if path.is_absolute() {
                self.root()
            } else {
                Err(Error::NotFound)
            };
        }

        let (parent, name) = self.resolve_parent(path, cwd)?;
        let found = self.lookup_or_create(&parent, name, create);
        self.release(parent);

        found.map(|(inode, _)| inode)
    }

    /// 删除路径所指的项：清零其目录项并标记 inode 待删除，
    /// 数据要等到 inode 的最后一个引用释放时才回收。
    pub fn remove(&mut self, path: &str, cwd: Option<&Inode>) -> Result<(), Error> {
        let (parent, name) = self.resolve_parent(path, cwd)?;
        let removed = self.remove_entry(&parent, name);
        self.release(parent);

        removed
    }

    /// 在 `path` 处建立（或更新）设备文件，记录设备号
    pub fn register_device(
        &mut self,
        path: &str,
        device_id: u32,
        cwd: Option<&Inode>,
    ) -> Result<(), Error> {
        let inode = self.open(path, InodeKind::Device, cwd)?;
        if self.kind(&inode) != InodeKind::Device {
            self.release(inode);
            return Err(Error::AlreadyExists);
        }

        self.inodes.disk_inode_mut(&inode).device = device_id;
        self.persist(&inode);
        self.release(inode);
        self.sync();

        Ok(())
    }

    /// 目录的全部槽位，按顺序排列，包括 inode 编号为0的空槽位
    pub fn entries(&mut self, dir: &Inode) -> Result<Vec<DirEntry>, Error> {
        if !self.kind(dir).is_dir() {
            return Err(Error::NotADirectory);
        }

        let size = self.size(dir) as usize;
        Ok((0..size)
            .step_by(DirEntry::SIZE)
            .map(|offset| {
                let mut dir_entry = DirEntry::default();
                self.read_entry(dir, offset, &mut dir_entry);
                dir_entry
            })
            .collect())
    }

    /// 除了首两项的`.`与`..`再无其它项；空槽位不算
    pub fn is_empty_dir(&mut self, dir: &Inode) -> bool {
        debug_assert!(self.kind(dir).is_dir());

        let size = self.size(dir) as usize;
        let mut dir_entry = DirEntry::default();
        for offset in (0..size).step_by(DirEntry::SIZE) {
            self.read_entry(dir, offset, &mut dir_entry);
            let relative = match offset / DirEntry::SIZE {
                0 => dir_entry.name() == ".",
                1 => dir_entry.name() == "..",
                _ => false,
            };
            if !dir_entry.is_empty() && !relative {
                return false;
            }
        }

        true
    }
}

impl MinFileSystem {
    /// 写入新目录的`.`与`..`
    pub(crate) fn init_dir(&mut self, dir: &Inode, parent_id: u32) {
        debug_assert!(self.kind(dir).is_dir());
        debug_assert_eq!(self.size(dir), 0);

        let dot = DirEntry::new(".", self.inode_id(dir));
        let dotdot = DirEntry::new("..", parent_id);
        for (offset, dir_entry) in [(0, dot), (DirEntry::SIZE, dotdot)] {
            if let Err(err) = self.write_at(dir, offset, dir_entry.as_bytes()) {
                panic!("cannot initialize directory: {err}");
            }
        }
    }

    fn read_entry(&mut self, dir: &Inode, offset: usize, dir_entry: &mut DirEntry) {
        let read_size = self.read_at(dir, offset, dir_entry.as_bytes_mut());
        assert_eq!(read_size, DirEntry::SIZE, "directory size is not aligned");
    }

    fn remove_entry(&mut self, parent: &Inode, name: &str) -> Result<(), Error> {
        if matches!(name, "." | "..") {
            return Err(Error::InvalidName);
        }

        let (inode, offset) = self.lookup_or_create(parent, name, InodeKind::None)?;
        if self.kind(&inode).is_dir() && !self.is_empty_dir(&inode) {
            log::warn!("cannot remove {name:?}: directory not empty");
            self.release(inode);
            return Err(Error::DirectoryNotEmpty);
        }

        let tombstoned = self.write_at(parent, offset, &[0; DirEntry::SIZE]);
        if tombstoned.is_ok() {
            self.inodes.mark_pending_delete(&inode);
            log::debug!(
                "removed {name:?}: inode {} pending delete",
                self.inode_id(&inode)
            );
        }
        self.release(inode);

        tombstoned.map(|_| ())
    }
}
