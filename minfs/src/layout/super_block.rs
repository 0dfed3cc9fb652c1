use crate::config::MAGIC;

/// 超级块：
/// - 定位其它连续区域；
/// - 提供文件系统合法性校验
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct SuperBlock {
    /// 块位图的起始块
    pub bitmap_block: u32,
    /// inode表的起始块
    pub inode_area_start: u32,
    /// inode表的容量
    pub inode_count: u32,
    /// 根目录的 inode 编号
    pub root_inode: u32,
    /// 设备的总块数
    pub total_blocks: u32,
    /// 魔数：用于校验文件系统合法性
    magic: u32,
}

impl SuperBlock {
    #[inline]
    pub fn new(
        bitmap_block: u32,
        inode_area_start: u32,
        inode_count: u32,
        root_inode: u32,
        total_blocks: u32,
    ) -> Self {
        Self {
            bitmap_block,
            inode_area_start,
            inode_count,
            root_inode,
            total_blocks,
            magic: MAGIC,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.magic == MAGIC
    }
}
