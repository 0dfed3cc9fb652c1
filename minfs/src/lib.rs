#![no_std]

extern crate alloc;

/* minfs 的整体架构，自上而下 */

// 目录层：路径解析、目录项的查找、创建与删除
mod dir;

// 数据块映射层：逻辑块到物理块的转换与文件读写
mod mapper;

// 内存 inode 缓存层：引用计数与延迟删除
mod icache;

// 磁盘块管理器层：块位图与 inode 表
mod volume;

// 磁盘数据结构层：表示磁盘文件系统的数据结构
mod layout;

// 块缓存层：内存上的磁盘块数据缓存
mod block_cache;

pub mod config;
pub mod path;

pub use self::{
    config::{BLOCK_SIZE, MAX_FILE_SIZE, MAX_NAME},
    icache::Inode,
    layout::{DirEntry, DiskInode, SuperBlock},
    path::Path,
    volume::MinFileSystem,
};
pub use vfs::{Error, InodeKind, Stat};

type DataBlock = [u8; BLOCK_SIZE];
