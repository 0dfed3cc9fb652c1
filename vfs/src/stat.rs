use crate::InodeKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct Stat {
    /// Inode number，设备文件为0
    pub ino: u32,
    pub kind: InodeKind,
    /// File size
    pub size: u32,
}

impl Stat {
    pub const DEVICE: Self = Self {
        ino: 0,
        kind: InodeKind::Device,
        size: 0,
    };
}
