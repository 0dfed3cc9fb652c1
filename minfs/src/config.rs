//! Constants used in minfs

/// 块大小（字节）
pub const BLOCK_SIZE: usize = 512;
/// 每块的位数，即一块位图能指示的块数
pub const BLOCK_BITS: usize = BLOCK_SIZE * 8;

/// 超级块所在的块
pub const SUPER_BLOCK_ID: usize = 0;
/// 前64块（超级块、位图、inode表）永远不会被分配或释放
pub const RESERVED_BLOCKS: usize = 64;

pub const MAGIC: u32 = 0x6d69_6e66;

/// 根目录的 inode 编号，0号 inode 保留不用
pub const ROOT_INODE: u32 = 1;

/// 直接索引个数
pub const NDIRECT: usize = 12;
/// 一级索引块可编号数量
pub const NINDIRECT: usize = BLOCK_SIZE / 4;
/// 文件最多占用的数据块数
pub const MAX_FILE_BLOCKS: usize = NDIRECT + NINDIRECT;
/// 文件的最大字节数
pub const MAX_FILE_SIZE: usize = MAX_FILE_BLOCKS * BLOCK_SIZE;

/// 文件名的最大长度，目录项内还要留一字节给 \0
pub const MAX_NAME: usize = 27;

/// 内存 inode 缓存的容量
pub const INODE_CACHE_CAP: usize = 128;
/// 块缓存个数的上限
pub const BLOCK_CACHE_CAP: usize = 16;
