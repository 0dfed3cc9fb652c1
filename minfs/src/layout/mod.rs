//! # 磁盘数据结构层
//!
//! minfs 的磁盘布局：
//! 超级块 | 块位图 | inode表 | 数据块区域
//!
//! 前三者都在保留的前 [`RESERVED_BLOCKS`](crate::config::RESERVED_BLOCKS) 块之内。

mod super_block;
pub use super_block::SuperBlock;

mod bitmap;
pub use bitmap::Bitmap;

mod inode;
pub use inode::{BlockSlot, DiskInode, INODE_SIZE, INODES_PER_BLOCK, IndirectBlock};

/// 目录项，也属于磁盘文件系统数据结构
mod dir_entry;
pub use dir_entry::DirEntry;
