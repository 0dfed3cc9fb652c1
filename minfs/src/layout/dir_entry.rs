use core::{ptr, slice};

use crate::config::MAX_NAME;
use crate::path::truncate_name;

/// 目录项：目录的数据就是一串连续的目录项。
///
/// inode 编号为0的目录项是空槽位（被删除的项会原地清零）。
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[repr(C)]
pub struct DirEntry {
    inode_id: u32,
    // 最后一字节留给 \0
    name: [u8; MAX_NAME + 1],
}

impl DirEntry {
    /// 目录项大小恒为32字节
    pub const SIZE: usize = 32;

    /// 名字超出 [`MAX_NAME`] 的部分会被截去
    #[inline]
    pub fn new(name: &str, inode_id: u32) -> Self {
        let bytes = truncate_name(name).as_bytes();
        let mut name = [0; MAX_NAME + 1];
        name[..bytes.len()].copy_from_slice(bytes);

        Self { name, inode_id }
    }

    pub fn name(&self) -> &str {
        let len = self.name.iter().position(|&c| c == 0).unwrap_or(MAX_NAME);
        core::str::from_utf8(&self.name[..len]).unwrap_or_default()
    }

    #[inline]
    pub fn inode_id(&self) -> u32 {
        self.inode_id
    }

    /// 空槽位
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inode_id == 0
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(ptr::from_ref(self).cast(), Self::SIZE) }
    }

    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        unsafe { slice::from_raw_parts_mut(ptr::from_mut(self).cast(), Self::SIZE) }
    }
}
