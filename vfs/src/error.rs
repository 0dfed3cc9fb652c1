use derive_more::Display;

/// 可恢复的错误，交由调用者处理。
///
/// 设备空间、inode 表耗尽之类无法恢复的情况不在此列，直接 panic。
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[display(fmt = "no such file or directory")]
    NotFound,
    #[display(fmt = "file exists")]
    AlreadyExists,
    #[display(fmt = "not a directory")]
    NotADirectory,
    #[display(fmt = "is a directory")]
    IsADirectory,
    #[display(fmt = "directory not empty")]
    DirectoryNotEmpty,
    /// `.` 与 `..` 不能被删除
    #[display(fmt = "invalid name")]
    InvalidName,
    #[display(fmt = "permission denied")]
    PermissionDenied,
    /// 偏移量落在 `[0, size]` 之外
    #[display(fmt = "invalid seek")]
    InvalidSeek,
    /// 超出直接索引加一级索引的寻址范围
    #[display(fmt = "file too large")]
    FileTooLarge,
    /// 写入起点越过了文件末尾
    #[display(fmt = "write past end of file")]
    WritePastEnd,
    #[display(fmt = "inode cache is full")]
    InodeCacheFull,
    #[display(fmt = "no free file descriptor")]
    NoFreeDescriptor,
    #[display(fmt = "bad file descriptor")]
    BadDescriptor,
    #[display(fmt = "no such device")]
    NoSuchDevice,
    #[display(fmt = "operation not supported")]
    Unsupported,
}
