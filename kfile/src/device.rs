//! # 设备
//!
//! 设备文件在磁盘上只记录一个设备号，打开时经由 [`DeviceTable`] 找到真正的读写实现。

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt::Debug;

use vfs::Error;

use crate::config::MAX_DEVICES;

/// 字符设备的读写实现，没有偏移量的概念
pub trait Device: Debug + Send + Sync {
    /// 返回实际读出的字节数
    fn read(&self, buf: &mut [u8]) -> usize;

    /// 返回实际写入的字节数
    fn write(&self, buf: &[u8]) -> usize;
}

/// 设备号到设备实现的映射
#[derive(Debug)]
pub struct DeviceTable {
    devices: Vec<Option<Arc<dyn Device>>>,
}

impl DeviceTable {
    pub fn new() -> Self {
        let mut devices = Vec::with_capacity(MAX_DEVICES);
        devices.resize_with(MAX_DEVICES, || None);
        Self { devices }
    }

    /// 绑定设备号，已绑定的会被替换
    pub fn register(&mut self, device_id: u32, device: Arc<dyn Device>) -> Result<(), Error> {
        let slot = self
            .devices
            .get_mut(device_id as usize)
            .ok_or(Error::NoSuchDevice)?;
        if slot.replace(device).is_some() {
            log::warn!("device {device_id} rebound");
        }

        Ok(())
    }

    pub fn get(&self, device_id: u32) -> Option<Arc<dyn Device>> {
        self.devices.get(device_id as usize)?.clone()
    }
}

impl Default for DeviceTable {
    fn default() -> Self {
        Self::new()
    }
}

/// 读出空，写入即丢弃
#[derive(Debug)]
pub struct Null;

/// 读出全零，写入即丢弃
#[derive(Debug)]
pub struct Zero;

impl Device for Null {
    #[inline]
    fn read(&self, _buf: &mut [u8]) -> usize {
        0
    }

    #[inline]
    fn write(&self, buf: &[u8]) -> usize {
        buf.len()
    }
}

impl Device for Zero {
    fn read(&self, buf: &mut [u8]) -> usize {
        buf.fill(0);
        buf.len()
    }

    #[inline]
    fn write(&self, buf: &[u8]) -> usize {
        buf.len()
    }
}
