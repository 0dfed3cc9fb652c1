//! Constants used in kfile

/// 系统范围内同时打开的文件数上限
pub const MAX_FILES: usize = 128;
/// 设备号的范围
pub const MAX_DEVICES: usize = 16;
