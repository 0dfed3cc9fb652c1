use crate::block_cache::BlockCacheManager;
use crate::config::BLOCK_BITS;

/// 位图区域内块的结构，以4字节为一组
type BitmapBlock = [u32; BLOCK_BITS / 32];

/// 块位图，每一位记录设备上一块的分配情况
#[derive(Debug)]
pub struct Bitmap {
    /// 位图的起始块
    start_block_id: usize,
    /// 位图占用块数
    blocks: usize,
    /// 位图所指示的块数，超出部分的位不可分配
    capacity: u32,
}

/// 块编号
struct BlockID(u32);

impl Bitmap {
    #[inline]
    pub fn new(start_block_id: usize, blocks: usize, capacity: u32) -> Self {
        debug_assert!(capacity as usize <= blocks * BLOCK_BITS);
        Self {
            start_block_id,
            blocks,
            capacity,
        }
    }

    /// 容纳 `capacity` 个位所需的块数
    #[inline]
    pub fn blocks_for(capacity: u32) -> u32 {
        capacity.div_ceil(BLOCK_BITS as u32)
    }

    /// 从0号块起寻找第一个空闲位并置位，返回其块编号。
    /// 若位图的空间用尽，则返回空。
    pub fn alloc(&self, cache: &mut BlockCacheManager) -> Option<u32> {
        for block_index in 0..self.blocks {
            let bitmap_block = cache.get(self.start_block_id + block_index);
            let mut bitmap_block = bitmap_block.lock();
            let bitmap_block: &mut BitmapBlock = bitmap_block.get_mut(0);

            let Some((group_index, ingroup_index)) = bitmap_block
                .iter()
                .enumerate()
                .find_map(|(group_index, &bits)| {
                    (bits != u32::MAX).then_some((group_index, bits.trailing_ones()))
                })
            else {
                continue;
            };

            let block_id = BlockID::encode(block_index, group_index, ingroup_index as usize);
            // 首个空闲位已越过设备末尾，之后也不会有可用的块
            if block_id >= self.capacity {
                return None;
            }

            bitmap_block[group_index] |= 1 << ingroup_index;
            return Some(block_id);
        }

        None
    }

    /// 把指定块标记为已用，用于格式化时占住保留区域
    pub fn set(&self, cache: &mut BlockCacheManager, block_id: u32) {
        let (block_index, group_index, ingroup_index) = BlockID(block_id).decode();
        cache
            .get(self.start_block_id + block_index)
            .lock()
            .map_mut(0, |bitmap_block: &mut BitmapBlock| {
                bitmap_block[group_index] |= 1 << ingroup_index
            });
    }

    pub fn dealloc(&self, cache: &mut BlockCacheManager, block_id: u32) {
        assert!(block_id < self.capacity, "block {block_id} out of device");
        let (block_index, group_index, ingroup_index) = BlockID(block_id).decode();
        cache
            .get(self.start_block_id + block_index)
            .lock()
            .map_mut(0, |bitmap_block: &mut BitmapBlock| {
                // 编号一定得有对应的位
                assert_ne!(
                    bitmap_block[group_index] & (1 << ingroup_index),
                    0,
                    "double free of block {block_id}"
                );
                bitmap_block[group_index] &= !(1 << ingroup_index);
            });
    }

    pub fn is_set(&self, cache: &mut BlockCacheManager, block_id: u32) -> bool {
        let (block_index, group_index, ingroup_index) = BlockID(block_id).decode();
        cache
            .get(self.start_block_id + block_index)
            .lock()
            .map(0, |bitmap_block: &BitmapBlock| {
                bitmap_block[group_index] & (1 << ingroup_index) != 0
            })
    }
}

impl BlockID {
    /// 线性映射编码得到块ID
    #[inline]
    fn encode(block_index: usize, group_index: usize, ingroup_index: usize) -> u32 {
        (block_index * BLOCK_BITS + group_index * 32 + ingroup_index) as u32
    }

    fn decode(self) -> (usize, usize, usize) {
        let mut block_id = self.0 as usize;

        let block_index = block_id / BLOCK_BITS;
        block_id %= BLOCK_BITS;
        (block_index, block_id / 32, block_id % 32)
    }
}

#[cfg(test)]
mod tests {
    use super::BlockID;

    #[test]
    fn block_id_codec() {
        assert_eq!(BlockID(0).decode(), (0, 0, 0));
        assert_eq!(BlockID(33).decode(), (0, 1, 1));
        assert_eq!(BlockID(4096 + 70).decode(), (1, 2, 6));
        assert_eq!(BlockID::encode(1, 2, 6), 4096 + 70);
    }
}
