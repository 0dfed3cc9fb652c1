use alloc::vec;
use alloc::vec::Vec;

use spin::Mutex;

use crate::BlockDevice;

/// 位于内存中的块设备
#[derive(Debug)]
pub struct RamDisk {
    block_size: usize,
    data: Mutex<Vec<u8>>,
}

impl RamDisk {
    pub fn new(block_size: usize, blocks: usize) -> Self {
        Self {
            block_size,
            data: Mutex::new(vec![0; block_size * blocks]),
        }
    }

    fn range(&self, block_id: usize, len: usize) -> core::ops::Range<usize> {
        assert_eq!(len, self.block_size, "not a complete block!");
        let start = block_id * self.block_size;
        start..start + len
    }
}

impl BlockDevice for RamDisk {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) {
        let range = self.range(block_id, buf.len());
        let data = self.data.lock();
        assert!(range.end <= data.len(), "block {block_id} out of device");
        buf.copy_from_slice(&data[range]);
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) {
        let range = self.range(block_id, buf.len());
        let mut data = self.data.lock();
        assert!(range.end <= data.len(), "block {block_id} out of device");
        data[range].copy_from_slice(buf);
    }
}
