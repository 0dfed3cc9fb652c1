//! # 内存 inode 缓存层
//!
//! 磁盘 inode 在内存中的副本，带引用计数。同一编号的 inode 在缓存中只有一份，
//! 多次打开同一路径得到的是同一个槽位、同一个计数。
//!
//! 被引用期间缓存中的副本就是权威数据，每次修改大小或块编号后都要 [`persist`]。
//! 删除是延迟的：[`release`] 令计数归零且带有删除标记时，才清空数据并归还磁盘 inode。
//!
//! [`persist`]: MinFileSystem::persist
//! [`release`]: MinFileSystem::release

use alloc::vec::Vec;

use vfs::{Error, InodeKind, Stat};

use crate::MinFileSystem;
use crate::config::INODE_CACHE_CAP;
use crate::layout::DiskInode;

/// 内存 inode 的句柄
///
/// 句柄不可复制，要再持有一份引用只能经由 [`MinFileSystem::duplicate`]，
/// 用完后必须交还给 [`MinFileSystem::release`]。
#[derive(Debug, PartialEq, Eq)]
pub struct Inode {
    slot: usize,
}

#[derive(Debug)]
pub(crate) struct InodeCache {
    slots: Vec<InodeSlot>,
}

#[derive(Debug, Default)]
struct InodeSlot {
    /// inode 编号，0表示槽位未曾使用
    id: u32,
    refs: usize,
    pending_delete: bool,
    disk_inode: DiskInode,
}

impl InodeCache {
    pub fn new() -> Self {
        let mut slots = Vec::with_capacity(INODE_CACHE_CAP);
        slots.resize_with(INODE_CACHE_CAP, InodeSlot::default);
        Self { slots }
    }

    #[inline]
    pub fn disk_inode(&self, inode: &Inode) -> &DiskInode {
        &self.slots[inode.slot].disk_inode
    }

    #[inline]
    pub fn disk_inode_mut(&mut self, inode: &Inode) -> &mut DiskInode {
        &mut self.slots[inode.slot].disk_inode
    }

    #[inline]
    pub fn mark_pending_delete(&mut self, inode: &Inode) {
        self.slots[inode.slot].pending_delete = true;
    }

    fn find(&self, id: u32) -> Option<usize> {
        self.slots.iter().position(|slot| slot.id == id)
    }

    fn free_slot(&self) -> Option<usize> {
        self.slots.iter().position(|slot| slot.refs == 0)
    }
}

impl MinFileSystem {
    /// 取得编号为 `inode_id` 的 inode。
    ///
    /// 已缓存则只增加计数，不会重读磁盘；否则占用一个空闲槽位并读入磁盘 inode。
    pub fn acquire(&mut self, inode_id: u32) -> Result<Inode, Error> {
        assert_ne!(inode_id, 0, "inode 0 is reserved");

        if let Some(slot) = self.inodes.find(inode_id) {
            self.inodes.slots[slot].refs += 1;
            return Ok(Inode { slot });
        }

        let Some(slot) = self.inodes.free_slot() else {
            log::warn!("no free slot for inode {inode_id}");
            return Err(Error::InodeCacheFull);
        };
        let disk_inode = self.read_disk_inode(inode_id);
        self.inodes.slots[slot] = InodeSlot {
            id: inode_id,
            refs: 1,
            pending_delete: false,
            disk_inode,
        };

        Ok(Inode { slot })
    }

    /// 增加计数，返回指向同一槽位的句柄
    pub fn duplicate(&mut self, inode: &Inode) -> Inode {
        let slot = &mut self.inodes.slots[inode.slot];
        assert!(slot.refs > 0, "duplicate of released inode {}", slot.id);
        slot.refs += 1;

        Inode { slot: inode.slot }
    }

    /// 减少计数；归零且被标记删除时，清空数据并归还磁盘 inode，只发生一次。
    pub fn release(&mut self, inode: Inode) {
        let slot = &mut self.inodes.slots[inode.slot];
        assert!(slot.refs > 0, "release of released inode {}", slot.id);
        slot.refs -= 1;

        if slot.refs == 0 && slot.pending_delete {
            let inode_id = slot.id;
            self.truncate(&inode);
            self.free_inode(inode_id);
            // 作废槽位，编号被重新分配时要从磁盘读入
            self.inodes.slots[inode.slot] = InodeSlot::default();
            self.sync();
            log::debug!("reclaimed inode {inode_id}");
        }
    }

    /// 把内存中的副本写回磁盘 inode
    pub fn persist(&mut self, inode: &Inode) {
        let slot = &self.inodes.slots[inode.slot];
        let (inode_id, disk_inode) = (slot.id, slot.disk_inode);
        self.write_disk_inode(inode_id, &disk_inode);
    }

    #[inline]
    pub fn inode_id(&self, inode: &Inode) -> u32 {
        self.inodes.slots[inode.slot].id
    }

    #[inline]
    pub fn kind(&self, inode: &Inode) -> InodeKind {
        self.inodes.disk_inode(inode).kind()
    }

    #[inline]
    pub fn size(&self, inode: &Inode) -> u32 {
        self.inodes.disk_inode(inode).size
    }

    /// 设备文件的设备号，其它类型返回空
    pub fn device_id(&self, inode: &Inode) -> Option<u32> {
        let disk_inode = self.inodes.disk_inode(inode);
        (disk_inode.kind() == InodeKind::Device).then_some(disk_inode.device)
    }

    #[inline]
    pub fn ref_count(&self, inode: &Inode) -> usize {
        self.inodes.slots[inode.slot].refs
    }

    #[inline]
    pub fn is_pending_delete(&self, inode: &Inode) -> bool {
        self.inodes.slots[inode.slot].pending_delete
    }

    pub fn stat(&self, inode: &Inode) -> Stat {
        Stat {
            ino: self.inode_id(inode),
            kind: self.kind(inode),
            size: self.size(inode),
        }
    }
}
