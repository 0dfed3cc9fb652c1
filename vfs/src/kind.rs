/// 磁盘 inode 的类型，`None` 表示空闲的 inode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum InodeKind {
    #[default]
    None = 0,
    File = 1,
    Directory = 2,
    Device = 3,
}

impl InodeKind {
    /// 由磁盘上的原始值还原类型，未知的值返回 `None`
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::None),
            1 => Some(Self::File),
            2 => Some(Self::Directory),
            3 => Some(Self::Device),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_dir(self) -> bool {
        matches!(self, Self::Directory)
    }
}

impl From<InodeKind> for u32 {
    #[inline]
    fn from(kind: InodeKind) -> Self {
        kind as u32
    }
}
