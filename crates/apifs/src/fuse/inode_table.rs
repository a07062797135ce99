//! Inode ↔ path mapping for the mounted tree
//!
//! Paths are interned the first time the kernel looks them up and keep their
//! inode for the life of the mount. Nothing is ever renamed or deleted, so
//! the table only grows.

use std::collections::HashMap;

use crate::vfs::normalize_path;

#[derive(Debug)]
pub struct InodeTable {
    by_path: HashMap<String, u64>,
    by_inode: HashMap<u64, String>,
    next_inode: u64,
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl InodeTable {
    /// Root inode number (always 1 in FUSE)
    pub const ROOT_INODE: u64 = 1;

    pub fn new() -> Self {
        let mut table = Self {
            by_path: HashMap::new(),
            by_inode: HashMap::new(),
            next_inode: Self::ROOT_INODE + 1,
        };
        table.by_path.insert("/".to_string(), Self::ROOT_INODE);
        table.by_inode.insert(Self::ROOT_INODE, "/".to_string());
        table
    }

    /// Inode for `path`, allocating one on first sight
    pub fn intern(&mut self, path: &str) -> u64 {
        let path = normalize_path(path);
        if let Some(&inode) = self.by_path.get(&path) {
            return inode;
        }

        let inode = self.next_inode;
        self.next_inode += 1;
        self.by_path.insert(path.clone(), inode);
        self.by_inode.insert(inode, path);
        inode
    }

    pub fn inode(&self, path: &str) -> Option<u64> {
        self.by_path.get(&normalize_path(path)).copied()
    }

    pub fn path(&self, inode: u64) -> Option<&str> {
        self.by_inode.get(&inode).map(String::as_str)
    }

    /// `parent/name`, without doubling the root slash
    pub fn child_path(parent: &str, name: &str) -> String {
        if parent == "/" {
            format!("/{}", name)
        } else {
            format!("{}/{}", parent, name)
        }
    }

    pub fn parent_path(path: &str) -> String {
        let normalized = normalize_path(path);
        match normalized.rfind('/') {
            Some(0) | None => "/".to_string(),
            Some(pos) => normalized[..pos].to_string(),
        }
    }
}
