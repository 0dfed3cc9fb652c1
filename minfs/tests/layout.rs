use std::mem;

use minfs::{BLOCK_SIZE, DirEntry, DiskInode, SuperBlock};

#[test]
fn layout() {
    assert_eq!(64, mem::size_of::<DiskInode>());
    assert_eq!(32, mem::size_of::<DirEntry>());
    assert_eq!(DirEntry::SIZE, mem::size_of::<DirEntry>());
    assert_eq!(24, mem::size_of::<SuperBlock>());
    assert_eq!(0, BLOCK_SIZE % mem::size_of::<DiskInode>());
}
