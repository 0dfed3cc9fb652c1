//! # 数据块映射层
//!
//! 把文件内的逻辑块翻译成设备上的物理块，首次触及时分配，
//! 并在此基础上按块边界切分字节区间完成读写。

use vfs::Error;

use crate::config::{MAX_FILE_SIZE, NDIRECT};
use crate::layout::{BlockSlot, IndirectBlock};
use crate::{BLOCK_SIZE, Inode, MinFileSystem};

impl MinFileSystem {
    /// 返回逻辑块 `block_index` 对应的物理块，未分配则当场分配。
    ///
    /// # Panics
    ///
    /// `block_index` 超出直接索引加一级索引的范围。
    pub fn map_block(&mut self, inode: &Inode, block_index: usize) -> u32 {
        match BlockSlot::of(block_index) {
            Some(BlockSlot::Direct(index)) => {
                let block_id = self.inodes.disk_inode(inode).direct[index];
                if block_id != 0 {
                    return block_id;
                }

                let block_id = self.alloc_block();
                self.inodes.disk_inode_mut(inode).direct[index] = block_id;
                self.persist(inode);
                block_id
            }
            Some(BlockSlot::Indirect(index)) => {
                let mut indirect = self.inodes.disk_inode(inode).indirect;
                if indirect == 0 {
                    indirect = self.alloc_block();
                    self.inodes.disk_inode_mut(inode).indirect = indirect;
                    self.persist(inode);
                }

                let indirect_block = self.cache.get(indirect as usize);
                let block_id = indirect_block
                    .lock()
                    .map(0, |indirect_block: &IndirectBlock| indirect_block[index]);
                if block_id != 0 {
                    return block_id;
                }

                let block_id = self.alloc_block();
                indirect_block
                    .lock()
                    .map_mut(0, |indirect_block: &mut IndirectBlock| {
                        indirect_block[index] = block_id
                    });
                block_id
            }
            None => panic!("file too large: logical block {block_index}"),
        }
    }

    /// 从指定位置(字节偏移)读出数据填充`buf`，读到文件末尾为止
    pub fn read_at(&mut self, inode: &Inode, offset: usize, buf: &mut [u8]) -> usize {
        let size = self.size(inode) as usize;
        if offset >= size {
            return 0;
        }
        let end = (offset + buf.len()).min(size);

        let mut start = offset;
        // 已读取多少字节
        let mut read_size = 0;
        while start < end {
            let block_index = start / BLOCK_SIZE;
            // 当前块的末地址(字节)
            let current_block_end = ((block_index + 1) * BLOCK_SIZE).min(end);
            let block_read_size = current_block_end - start;

            let block_id = self.map_block(inode, block_index);
            // 绝对地址 % 块大小 = 块内偏移
            self.cache.read(
                block_id as usize,
                start % BLOCK_SIZE,
                &mut buf[read_size..read_size + block_read_size],
            );

            read_size += block_read_size;
            start = current_block_end;
        }

        read_size
    }

    /// 把`buf`写到指定位置，越过原有大小时扩大文件。
    ///
    /// 起点不能越过文件末尾；终点超出寻址范围时一个字节也不写。
    pub fn write_at(&mut self, inode: &Inode, offset: usize, buf: &[u8]) -> Result<usize, Error> {
        let size = self.size(inode) as usize;
        if offset > size {
            return Err(Error::WritePastEnd);
        }
        let end = offset + buf.len();
        if end > MAX_FILE_SIZE {
            return Err(Error::FileTooLarge);
        }

        let mut start = offset;
        let mut written_size = 0;
        while start < end {
            let block_index = start / BLOCK_SIZE;
            let current_block_end = ((block_index + 1) * BLOCK_SIZE).min(end);
            let block_write_size = current_block_end - start;

            let block_id = self.map_block(inode, block_index);
            self.cache.write(
                block_id as usize,
                start % BLOCK_SIZE,
                &buf[written_size..written_size + block_write_size],
            );

            written_size += block_write_size;
            start = current_block_end;
        }

        if end > size {
            self.inodes.disk_inode_mut(inode).size = end as u32;
            self.persist(inode);
        }
        self.sync();

        Ok(written_size)
    }

    /// 清空文件：大小归零，归还全部数据块与索引块
    pub fn truncate(&mut self, inode: &Inode) {
        let disk_inode = *self.inodes.disk_inode(inode);

        for block_id in disk_inode.direct.into_iter().filter(|&id| id != 0) {
            self.free_block(block_id);
        }

        if disk_inode.indirect != 0 {
            let indirect_block = self
                .cache
                .get(disk_inode.indirect as usize)
                .lock()
                .map(0, |indirect_block: &IndirectBlock| *indirect_block);
            // 跳过未分配的项
            for block_id in indirect_block.into_iter().filter(|&id| id != 0) {
                self.free_block(block_id);
            }
            self.free_block(disk_inode.indirect);
        }

        let disk_inode = self.inodes.disk_inode_mut(inode);
        disk_inode.size = 0;
        disk_inode.direct = [0; NDIRECT];
        disk_inode.indirect = 0;
        self.persist(inode);
        self.sync();
    }
}
