/// Value bytes live outside the ledger's slot table; the ledger itself only
/// keeps `{kvIdx, size, root}` per key. `BlobStore` is the seam for wherever
/// the bytes are actually held.

use std::collections::BTreeMap;

use primitive_types::H256;

pub trait BlobStore {
    fn put_blob(&mut self, key: H256, value: Vec<u8>);

    fn get_blob(&self, key: &H256) -> Option<&[u8]>;

    fn remove_blob(&mut self, key: &H256) -> Option<Vec<u8>>;
}

/// In-process blob store.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: BTreeMap<H256, Vec<u8>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl BlobStore for MemoryBlobStore {
    fn put_blob(&mut self, key: H256, value: Vec<u8>) {
        self.blobs.insert(key, value);
    }

    fn get_blob(&self, key: &H256) -> Option<&[u8]> {
        self.blobs.get(key).map(Vec::as_slice)
    }

    fn remove_blob(&mut self, key: &H256) -> Option<Vec<u8>> {
        self.blobs.remove(key)
    }
}
