//! # 磁盘块管理器层
//!
//! 构建出磁盘的布局并使用：块的分配与回收、inode 表的分配与回收。
//! 这一层的耗尽是无法恢复的，直接 panic。

use alloc::sync::Arc;

use block_dev::BlockDevice;
use vfs::InodeKind;

use crate::block_cache::BlockCacheManager;
use crate::config::{RESERVED_BLOCKS, ROOT_INODE, SUPER_BLOCK_ID};
use crate::icache::InodeCache;
use crate::layout::*;
use crate::{BLOCK_SIZE, Inode};

/// 一个挂载着的卷。
///
/// 所有操作都经由 `&mut self`，同一时刻只有一个调用者。
#[derive(Debug)]
pub struct MinFileSystem {
    pub(crate) cache: BlockCacheManager,
    pub(crate) inodes: InodeCache,
    super_block: SuperBlock,
    bitmap: Bitmap,
}

impl MinFileSystem {
    /// 在设备上建立新的文件系统，根目录为 [`ROOT_INODE`]。
    pub fn format(block_device: Arc<dyn BlockDevice>, total_blocks: u32, inode_count: u32) -> Self {
        assert!(inode_count > ROOT_INODE, "at least one usable inode");
        assert!(
            total_blocks as usize > RESERVED_BLOCKS,
            "device too small: {total_blocks} blocks"
        );

        let bitmap_blocks = Bitmap::blocks_for(total_blocks);
        let inode_area_start = SUPER_BLOCK_ID as u32 + 1 + bitmap_blocks;
        let inode_area_blocks = (inode_count as usize * INODE_SIZE).div_ceil(BLOCK_SIZE) as u32;
        let metadata_end = inode_area_start + inode_area_blocks;
        assert!(
            metadata_end as usize <= RESERVED_BLOCKS,
            "metadata takes {metadata_end} blocks, more than the reserved area"
        );

        let mut cache = BlockCacheManager::new(block_device);
        for block_id in 0..metadata_end {
            cache.zero(block_id as usize);
        }

        let super_block = SuperBlock::new(
            SUPER_BLOCK_ID as u32 + 1,
            inode_area_start,
            inode_count,
            ROOT_INODE,
            total_blocks,
        );
        cache
            .get(SUPER_BLOCK_ID)
            .lock()
            .map_mut(0, |sb: &mut SuperBlock| *sb = super_block);

        let bitmap = Bitmap::new(
            super_block.bitmap_block as usize,
            bitmap_blocks as usize,
            total_blocks,
        );
        for block_id in 0..RESERVED_BLOCKS as u32 {
            bitmap.set(&mut cache, block_id);
        }

        let mut fs = Self {
            cache,
            inodes: InodeCache::new(),
            super_block,
            bitmap,
        };

        assert_eq!(fs.alloc_inode(InodeKind::Directory), ROOT_INODE);
        let root = fs.root().expect("inode cache is empty after format");
        fs.init_dir(&root, ROOT_INODE);
        fs.release(root);
        fs.sync();

        log::info!(
            "formatted: {total_blocks} blocks, {inode_count} inodes, bitmap {bitmap_blocks} blocks, inode area [{inode_area_start}, {metadata_end})"
        );
        fs
    }

    pub fn mount(block_device: Arc<dyn BlockDevice>) -> Self {
        let mut cache = BlockCacheManager::new(block_device);
        let super_block = cache
            .get(SUPER_BLOCK_ID)
            .lock()
            .map(0, |sb: &SuperBlock| *sb);
        assert!(super_block.is_valid(), "error when loading minfs");

        let bitmap = Bitmap::new(
            super_block.bitmap_block as usize,
            Bitmap::blocks_for(super_block.total_blocks) as usize,
            super_block.total_blocks,
        );
        log::info!("mounted: {super_block:?}");

        Self {
            cache,
            inodes: InodeCache::new(),
            super_block,
            bitmap,
        }
    }

    #[inline]
    pub fn super_block(&self) -> &SuperBlock {
        &self.super_block
    }

    /// 取得根目录
    #[inline]
    pub fn root(&mut self) -> Result<Inode, vfs::Error> {
        self.acquire(self.super_block.root_inode)
    }

    /// 把块缓存写回设备
    #[inline]
    pub fn sync(&self) {
        self.cache.sync_all();
    }

    /// 在设备上分配新的块并清零，返回其ID
    pub fn alloc_block(&mut self) -> u32 {
        let Some(block_id) = self.bitmap.alloc(&mut self.cache) else {
            panic!("no free block on device");
        };
        self.cache.zero(block_id as usize);
        log::debug!("alloc block {block_id}");

        block_id
    }

    pub fn free_block(&mut self, block_id: u32) {
        assert!(
            block_id as usize >= RESERVED_BLOCKS,
            "cannot free reserved block {block_id}"
        );
        self.bitmap.dealloc(&mut self.cache, block_id);
        log::debug!("free block {block_id}");
    }

    #[inline]
    pub fn block_in_use(&mut self, block_id: u32) -> bool {
        self.bitmap.is_set(&mut self.cache, block_id)
    }

    /// 从1号起寻找空闲的磁盘 inode，写入类型并返回其编号
    pub fn alloc_inode(&mut self, kind: InodeKind) -> u32 {
        debug_assert_ne!(kind, InodeKind::None);

        for inode_id in ROOT_INODE..self.super_block.inode_count {
            if self.read_disk_inode(inode_id).kind() == InodeKind::None {
                self.write_disk_inode(inode_id, &DiskInode::new(kind));
                log::debug!("alloc inode {inode_id} as {kind:?}");
                return inode_id;
            }
        }

        panic!("inode table is full");
    }

    /// 清零磁盘 inode，其类型随之变回空闲
    pub fn free_inode(&mut self, inode_id: u32) {
        self.write_disk_inode(inode_id, &DiskInode::default());
        log::debug!("free inode {inode_id}");
    }

    /// 通过ID获取 inode 在磁盘上的位置：**块ID**以及**块内偏移**
    pub fn disk_inode_pos(&self, inode_id: u32) -> (usize, usize) {
        assert!(
            inode_id != 0 && inode_id < self.super_block.inode_count,
            "invalid inode number {inode_id}"
        );
        let block_id =
            self.super_block.inode_area_start as usize + inode_id as usize / INODES_PER_BLOCK;
        let block_offset = inode_id as usize % INODES_PER_BLOCK * INODE_SIZE;

        (block_id, block_offset)
    }

    pub(crate) fn read_disk_inode(&mut self, inode_id: u32) -> DiskInode {
        let (block_id, block_offset) = self.disk_inode_pos(inode_id);
        self.cache
            .get(block_id)
            .lock()
            .map(block_offset, |disk_inode: &DiskInode| *disk_inode)
    }

    pub(crate) fn write_disk_inode(&mut self, inode_id: u32, disk_inode: &DiskInode) {
        let (block_id, block_offset) = self.disk_inode_pos(inode_id);
        self.cache
            .get(block_id)
            .lock()
            .map_mut(block_offset, |on_disk: &mut DiskInode| *on_disk = *disk_inode);
    }
}
