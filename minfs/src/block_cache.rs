//! # 块缓存层
//!
//! 块设备读写速度一般慢于内存读写速度，因此我们在内存中开辟缓冲区，
//! 把即将操作的块复制到内存中，提高对块设备的操作效率。
//!
//! 块缓存层对使用者来说是透明的，使用者对块设备的操作都经过块缓存层，
//! 且**操作块时一定在缓冲区当中**。每个卷拥有自己的缓存管理器，
//! 缓存只以块ID区分，不会与其它设备混淆。
//!
//! 缓存与块设备同步后并不会移除块缓存，该操作由缓存管理器调度执行。

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::mem;

use block_dev::BlockDevice;
use spin::Mutex;

use crate::config::BLOCK_CACHE_CAP;
use crate::{BLOCK_SIZE, DataBlock};

/// 块缓存的管理器，缓存、调度块缓存
#[derive(Debug)]
pub struct BlockCacheManager {
    block_device: Arc<dyn BlockDevice>,
    queue: Vec<(usize, Arc<Mutex<BlockCache>>)>,
}

/// 内存中的块缓存
#[derive(Debug)]
pub struct BlockCache {
    /// 缓存的数据
    data: AlignedBlock,
    /// 对应的块ID
    block_id: usize,
    /// 底层块设备的引用
    block_device: Arc<dyn BlockDevice>,
    /// 是否为脏块
    modified: bool,
}

/// 磁盘结构都按4字节对齐，缓冲区得满足它们的对齐要求
#[derive(Debug)]
#[repr(C, align(8))]
struct AlignedBlock(DataBlock);

impl BlockCache {
    pub fn new(block_id: usize, block_device: Arc<dyn BlockDevice>) -> Self {
        let mut data = AlignedBlock([0; BLOCK_SIZE]);
        block_device.read_block(block_id, &mut data.0);

        Self {
            data,
            block_id,
            block_device,
            modified: false,
        }
    }

    pub fn sync(&mut self) {
        if self.modified {
            self.modified = false;
            self.block_device.write_block(self.block_id, &self.data.0);
        }
    }

    pub fn get<T: Sized>(&self, offset: usize) -> &T {
        let type_size = mem::size_of::<T>();
        assert!(type_size + offset <= BLOCK_SIZE);
        let addr = self.offset(offset).cast::<T>();
        assert!(addr.is_aligned(), "misaligned access at offset {offset}");
        unsafe { &*addr }
    }

    pub fn get_mut<T: Sized>(&mut self, offset: usize) -> &mut T {
        let type_size = mem::size_of::<T>();
        assert!(type_size + offset <= BLOCK_SIZE);
        self.modified = true;
        let addr = self.offset(offset).cast_mut().cast::<T>();
        assert!(addr.is_aligned(), "misaligned access at offset {offset}");
        unsafe { &mut *addr }
    }

    #[inline]
    pub fn map<T: Sized, V>(&self, offset: usize, f: impl FnOnce(&T) -> V) -> V {
        f(self.get(offset))
    }

    #[inline]
    pub fn map_mut<T: Sized, V>(&mut self, offset: usize, f: impl FnOnce(&mut T) -> V) -> V {
        f(self.get_mut(offset))
    }
}

impl BlockCache {
    #[inline]
    fn offset(&self, count: usize) -> *const u8 {
        self.data.0.as_ptr().wrapping_add(count)
    }
}

impl Drop for BlockCache {
    fn drop(&mut self) {
        self.sync();
    }
}

impl BlockCacheManager {
    pub fn new(block_device: Arc<dyn BlockDevice>) -> Self {
        Self {
            block_device,
            queue: Vec::with_capacity(BLOCK_CACHE_CAP),
        }
    }

    // 块缓存调度策略：踢走闲置块
    pub fn get(&mut self, block_id: usize) -> Arc<Mutex<BlockCache>> {
        // 尝试从缓冲区中读取块
        if let Some(cache) = self
            .queue
            .iter()
            .find_map(|(id, cache)| (block_id == *id).then_some(cache))
        {
            return Arc::clone(cache);
        };

        // 触及上限，写回一个块
        if self.queue.len() == BLOCK_CACHE_CAP {
            let index = self
                .queue
                .iter()
                .position(|(_, cache)| Arc::strong_count(cache) == 1) // 没有其它引用的才能写回
                .expect("run out of block cache");
            self.queue.remove(index);
        }

        // 缓存新块
        let block_cache = Arc::new(Mutex::new(BlockCache::new(
            block_id,
            self.block_device.clone(),
        )));
        self.queue.push((block_id, block_cache.clone()));

        block_cache
    }

    /// 从块内偏移 `offset` 处读出 `buf.len()` 字节
    pub fn read(&mut self, block_id: usize, offset: usize, buf: &mut [u8]) {
        assert!(offset + buf.len() <= BLOCK_SIZE);
        self.get(block_id)
            .lock()
            .map(0, |data: &DataBlock| buf.copy_from_slice(&data[offset..offset + buf.len()]));
    }

    /// 把 `buf` 写到块内偏移 `offset` 处
    pub fn write(&mut self, block_id: usize, offset: usize, buf: &[u8]) {
        assert!(offset + buf.len() <= BLOCK_SIZE);
        self.get(block_id)
            .lock()
            .map_mut(0, |data: &mut DataBlock| {
                data[offset..offset + buf.len()].copy_from_slice(buf)
            });
    }

    pub fn zero(&mut self, block_id: usize) {
        self.get(block_id)
            .lock()
            .map_mut(0, |data: &mut DataBlock| data.fill(0));
    }

    pub fn sync_all(&self) {
        self.queue.iter().for_each(|(_, cache)| cache.lock().sync());
    }
}
