//! 磁盘上的 inode
//!
//! 数据块的索引分两级：
//! - 直接索引：`direct` 中的 [`NDIRECT`] 个块编号，每个编号都指向一个**数据块**
//! - 一级索引：`indirect` 指向一个索引块，整个块连续存储**块编号**
//!
//! 编号为0表示该位置尚未分配块。

use core::mem;

use vfs::InodeKind;

use crate::config::{BLOCK_SIZE, NDIRECT, NINDIRECT};

/// 间接索引块
pub type IndirectBlock = [u32; NINDIRECT];

pub const INODE_SIZE: usize = mem::size_of::<DiskInode>();
pub const INODES_PER_BLOCK: usize = BLOCK_SIZE / INODE_SIZE;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct DiskInode {
    // 不用枚举是为了严控布局，见 [`DiskInode::kind`]
    kind: u32,
    /// 设备文件的设备号
    pub device: u32,
    /// 文件字节数
    pub size: u32,
    /// 直接索引块
    pub direct: [u32; NDIRECT],
    /// 指向一个一级索引块
    pub indirect: u32,
}

/// 逻辑块索引落在 inode 的哪个位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSlot {
    /// `direct` 数组的下标
    Direct(usize),
    /// 一级索引块内的下标
    Indirect(usize),
}

impl DiskInode {
    #[inline]
    pub fn new(kind: InodeKind) -> Self {
        Self {
            kind: kind.into(),
            ..Default::default()
        }
    }

    pub fn kind(&self) -> InodeKind {
        InodeKind::from_raw(self.kind)
            .unwrap_or_else(|| panic!("corrupted inode: unknown kind {}", self.kind))
    }
}

impl BlockSlot {
    /// 逻辑上 inode 指向一系列数据块，此处传入的是这些数据块的索引（逻辑索引）。
    /// 超出一级索引范围时返回空。
    pub fn of(block_index: usize) -> Option<Self> {
        if block_index < NDIRECT {
            Some(Self::Direct(block_index))
        } else if block_index < NDIRECT + NINDIRECT {
            // 剔去直接索引的部分
            Some(Self::Indirect(block_index - NDIRECT))
        } else {
            None
        }
    }
}
