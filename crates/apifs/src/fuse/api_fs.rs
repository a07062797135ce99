//! `fuser::Filesystem` over a [`NamespaceRouter`]
//!
//! The kernel speaks inodes and byte ranges; the router speaks whole paths
//! and whole documents. This layer translates between the two:
//!
//! - inodes are interned per path on lookup/readdir
//! - reads slice the full document at the requested offset
//! - writes accumulate in a per-handle buffer and reach the router as a
//!   single `write` on flush, or on release if no flush came first

use std::collections::HashMap;
use std::ffi::OsStr;
use std::time::{Duration, SystemTime};

use fuser::{
    FileAttr, FileType, Filesystem, ReplyAttr, ReplyCreate, ReplyData, ReplyDirectory,
    ReplyEmpty, ReplyEntry, ReplyOpen, ReplyWrite, Request, TimeOrNow,
};
use libc::c_int;

use super::inode_table::InodeTable;
use crate::error::FsError;
use crate::vfs::{ApiNode, NamespaceRouter};

/// How long the kernel may cache attributes and entries
const KERNEL_TTL: Duration = Duration::from_secs(1);

const BLOCK_SIZE: u32 = 512;

/// Largest payload a single open handle may buffer before commit
const MAX_PENDING_WRITE: usize = 1024 * 1024;

/// Map a filesystem error onto an errno
pub fn errno(err: &FsError) -> c_int {
    match err {
        FsError::Parse(_) => libc::EINVAL,
        FsError::ReadOnly(_) => libc::EACCES,
        FsError::NotFound(_) => libc::ENOENT,
        FsError::Remote(_) => libc::EIO,
    }
}

/// An open file handle
#[derive(Debug)]
struct OpenFile {
    path: String,
    /// Bytes written since open or the last commit
    pending: Option<Vec<u8>>,
}

/// What a path is, independent of its inode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Stat {
    pub kind: FileType,
    pub size: u64,
    pub perm: u16,
}

pub struct ApiFs {
    router: NamespaceRouter,
    inodes: InodeTable,
    open_files: HashMap<u64, OpenFile>,
    next_fh: u64,
    uid: u32,
    gid: u32,
    mounted_at: SystemTime,
}

impl ApiFs {
    pub fn new(router: NamespaceRouter) -> Self {
        // SAFETY: getuid/getgid cannot fail and touch no memory
        let (uid, gid) = unsafe { (libc::getuid(), libc::getgid()) };
        Self {
            router,
            inodes: InodeTable::new(),
            open_files: HashMap::new(),
            next_fh: 1,
            uid,
            gid,
            mounted_at: SystemTime::now(),
        }
    }

    /// Describe `path`, or `None` if it does not exist
    pub(crate) fn stat(&self, path: &str) -> Result<Option<Stat>, FsError> {
        if self.router.is_directory(path)? {
            return Ok(Some(Stat {
                kind: FileType::Directory,
                size: 0,
                perm: 0o555,
            }));
        }
        if self.router.is_file(path)? {
            let size = self.router.read(path)?.len() as u64;
            let perm = if self.router.can_write(path)? {
                0o644
            } else {
                0o444
            };
            return Ok(Some(Stat {
                kind: FileType::RegularFile,
                size,
                perm,
            }));
        }
        Ok(None)
    }

    fn file_attr(&self, ino: u64, stat: Stat) -> FileAttr {
        FileAttr {
            ino,
            size: stat.size,
            blocks: stat.size.div_ceil(BLOCK_SIZE as u64),
            atime: self.mounted_at,
            mtime: self.mounted_at,
            ctime: self.mounted_at,
            crtime: self.mounted_at,
            kind: stat.kind,
            perm: stat.perm,
            nlink: if stat.kind == FileType::Directory { 2 } else { 1 },
            uid: self.uid,
            gid: self.gid,
            rdev: 0,
            blksize: BLOCK_SIZE,
            flags: 0,
        }
    }

    fn attr_for_inode(&self, ino: u64) -> Result<FileAttr, c_int> {
        let path = self.inodes.path(ino).ok_or(libc::ENOENT)?;
        match self.stat(path) {
            Ok(Some(stat)) => Ok(self.file_attr(ino, stat)),
            Ok(None) => Err(libc::ENOENT),
            Err(e) => {
                tracing::warn!("getattr {} failed: {}", path, e);
                Err(errno(&e))
            }
        }
    }

    fn lookup_path(&mut self, parent: u64, name: &OsStr) -> Result<FileAttr, c_int> {
        let parent_path = self.inodes.path(parent).ok_or(libc::ENOENT)?;
        let name = name.to_str().ok_or(libc::ENOENT)?;
        let path = InodeTable::child_path(parent_path, name);

        let stat = match self.stat(&path) {
            Ok(Some(stat)) => stat,
            Ok(None) => return Err(libc::ENOENT),
            Err(e) => {
                tracing::warn!("lookup {} failed: {}", path, e);
                return Err(errno(&e));
            }
        };
        let ino = self.inodes.intern(&path);
        Ok(self.file_attr(ino, stat))
    }

    /// Directory listing with `.` and `..`, as `(inode, kind, name)`
    fn list_dir(&mut self, ino: u64) -> Result<Vec<(u64, FileType, String)>, c_int> {
        let path = self.inodes.path(ino).ok_or(libc::ENOENT)?.to_string();
        let names = self.router.entries(&path).map_err(|e| {
            tracing::warn!("readdir {} failed: {}", path, e);
            errno(&e)
        })?;

        let parent = self.inodes.intern(&InodeTable::parent_path(&path));
        let mut listing = vec![
            (ino, FileType::Directory, ".".to_string()),
            (parent, FileType::Directory, "..".to_string()),
        ];
        for name in names {
            let child = InodeTable::child_path(&path, &name);
            let kind = match self.router.is_directory(&child) {
                Ok(true) => FileType::Directory,
                _ => FileType::RegularFile,
            };
            listing.push((self.inodes.intern(&child), kind, name));
        }
        Ok(listing)
    }

    fn open_path(&mut self, ino: u64, flags: i32) -> Result<u64, c_int> {
        let path = self.inodes.path(ino).ok_or(libc::ENOENT)?.to_string();
        let writing = flags & libc::O_ACCMODE != libc::O_RDONLY;
        if writing {
            match self.router.can_write(&path) {
                Ok(true) => {}
                Ok(false) => return Err(libc::EACCES),
                Err(e) => return Err(errno(&e)),
            }
        }

        let fh = self.next_fh;
        self.next_fh += 1;
        self.open_files.insert(fh, OpenFile { path, pending: None });
        Ok(fh)
    }

    fn read_range(&self, ino: u64, fh: u64, offset: i64, size: u32) -> Result<Vec<u8>, c_int> {
        let path = match self.open_files.get(&fh) {
            Some(file) => file.path.as_str(),
            None => self.inodes.path(ino).ok_or(libc::ENOENT)?,
        };
        let content = self.router.read(path).map_err(|e| {
            tracing::warn!("read {} failed: {}", path, e);
            errno(&e)
        })?;

        let start = (offset.max(0) as usize).min(content.len());
        let end = start.saturating_add(size as usize).min(content.len());
        Ok(content[start..end].to_vec())
    }

    fn buffer_write(&mut self, fh: u64, offset: i64, data: &[u8]) -> Result<u32, c_int> {
        let file = self.open_files.get_mut(&fh).ok_or(libc::EBADF)?;
        let offset = usize::try_from(offset).map_err(|_| libc::EINVAL)?;
        let buffer = file.pending.get_or_insert_with(Vec::new);

        // Payloads arrive as sequential appends; anything else is a partial write
        if offset != buffer.len() {
            return Err(libc::EINVAL);
        }
        let end = offset.checked_add(data.len()).ok_or(libc::EINVAL)?;
        if end > MAX_PENDING_WRITE {
            return Err(libc::EFBIG);
        }
        buffer.extend_from_slice(data);
        Ok(data.len() as u32)
    }

    /// Hand any buffered bytes of `fh` to the router
    fn commit(&mut self, fh: u64) -> Result<(), c_int> {
        let file = self.open_files.get_mut(&fh).ok_or(libc::EBADF)?;
        let Some(content) = file.pending.take() else {
            return Ok(());
        };
        self.router.write(&file.path, &content).map_err(|e| {
            tracing::warn!("write {} failed: {}", file.path, e);
            errno(&e)
        })
    }
}

impl Filesystem for ApiFs {
    fn lookup(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        match self.lookup_path(parent, name) {
            Ok(attr) => reply.entry(&KERNEL_TTL, &attr, 0),
            Err(code) => reply.error(code),
        }
    }

    fn getattr(&mut self, _req: &Request<'_>, ino: u64, _fh: Option<u64>, reply: ReplyAttr) {
        match self.attr_for_inode(ino) {
            Ok(attr) => reply.attr(&KERNEL_TTL, &attr),
            Err(code) => reply.error(code),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn setattr(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _mode: Option<u32>,
        _uid: Option<u32>,
        _gid: Option<u32>,
        size: Option<u64>,
        _atime: Option<TimeOrNow>,
        _mtime: Option<TimeOrNow>,
        _ctime: Option<SystemTime>,
        fh: Option<u64>,
        _crtime: Option<SystemTime>,
        _chgtime: Option<SystemTime>,
        _bkuptime: Option<SystemTime>,
        _flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        // Truncation is the only change honoured, and only on open buffers
        if let (Some(0), Some(fh)) = (size, fh) {
            if let Some(file) = self.open_files.get_mut(&fh) {
                file.pending = None;
            }
        }
        match self.attr_for_inode(ino) {
            Ok(attr) => reply.attr(&KERNEL_TTL, &attr),
            Err(code) => reply.error(code),
        }
    }

    fn readdir(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        let listing = match self.list_dir(ino) {
            Ok(listing) => listing,
            Err(code) => {
                reply.error(code);
                return;
            }
        };

        for (i, (child, kind, name)) in listing
            .into_iter()
            .enumerate()
            .skip(offset.max(0) as usize)
        {
            if reply.add(child, (i + 1) as i64, kind, name) {
                break;
            }
        }
        reply.ok();
    }

    fn open(&mut self, _req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
        match self.open_path(ino, flags) {
            Ok(fh) => reply.opened(fh, 0),
            Err(code) => reply.error(code),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn read(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        match self.read_range(ino, fh, offset, size) {
            Ok(data) => reply.data(&data),
            Err(code) => reply.error(code),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn write(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        fh: u64,
        offset: i64,
        data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        match self.buffer_write(fh, offset, data) {
            Ok(written) => reply.written(written),
            Err(code) => reply.error(code),
        }
    }

    fn flush(&mut self, _req: &Request<'_>, _ino: u64, fh: u64, _lock_owner: u64, reply: ReplyEmpty) {
        match self.commit(fh) {
            Ok(()) => reply.ok(),
            Err(code) => reply.error(code),
        }
    }

    fn release(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        fh: u64,
        _flags: i32,
        _lock_owner: Option<u64>,
        _flush: bool,
        reply: ReplyEmpty,
    ) {
        let result = self.commit(fh);
        self.open_files.remove(&fh);
        match result {
            Ok(()) => reply.ok(),
            Err(code) => reply.error(code),
        }
    }

    fn create(
        &mut self,
        _req: &Request<'_>,
        _parent: u64,
        name: &OsStr,
        _mode: u32,
        _umask: u32,
        _flags: i32,
        reply: ReplyCreate,
    ) {
        tracing::debug!("refusing to create {:?}", name);
        reply.error(libc::EACCES);
    }

    fn mkdir(
        &mut self,
        _req: &Request<'_>,
        _parent: u64,
        name: &OsStr,
        _mode: u32,
        _umask: u32,
        reply: ReplyEntry,
    ) {
        tracing::debug!("refusing to mkdir {:?}", name);
        reply.error(libc::EACCES);
    }

    fn unlink(&mut self, _req: &Request<'_>, _parent: u64, name: &OsStr, reply: ReplyEmpty) {
        tracing::debug!("refusing to unlink {:?}", name);
        reply.error(libc::EACCES);
    }

    fn rmdir(&mut self, _req: &Request<'_>, _parent: u64, name: &OsStr, reply: ReplyEmpty) {
        tracing::debug!("refusing to rmdir {:?}", name);
        reply.error(libc::EACCES);
    }

    fn rename(
        &mut self,
        _req: &Request<'_>,
        _parent: u64,
        name: &OsStr,
        _newparent: u64,
        _newname: &OsStr,
        _flags: u32,
        reply: ReplyEmpty,
    ) {
        tracing::debug!("refusing to rename {:?}", name);
        reply.error(libc::EACCES);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use crate::client::{RemoteCollection, Resource};
    use crate::testkit::FakeCollection;
    use crate::vfs::COLLECTION_TTL;

    fn setup() -> (Arc<FakeCollection>, ApiFs) {
        let customers = Arc::new(FakeCollection::new("customers").with_resources(vec![
            Resource::new("CU1").with_field("email", "one@example.com"),
        ]));
        let remotes: Vec<Arc<dyn RemoteCollection>> = vec![customers.clone()];
        let router = NamespaceRouter::from_remotes(remotes, COLLECTION_TTL);
        (customers, ApiFs::new(router))
    }

    fn lookup(fs: &mut ApiFs, path: &str) -> Result<FileAttr, c_int> {
        let parent = fs.inodes.intern(&InodeTable::parent_path(path));
        let name = path.rsplit('/').next().unwrap_or_default().to_string();
        fs.lookup_path(parent, OsStr::new(&name))
    }

    #[test]
    fn test_stat_kinds() {
        let (_, fs) = setup();

        let root = fs.stat("/").unwrap().unwrap();
        assert_eq!(root.kind, FileType::Directory);

        let create = fs.stat("/customers/_create").unwrap().unwrap();
        assert_eq!(create.kind, FileType::RegularFile);
        assert_eq!(create.size, 0);
        assert_eq!(create.perm, 0o644);

        let object = fs.stat("/customers/CU1").unwrap().unwrap();
        assert_eq!(object.perm, 0o444);
        assert_eq!(
            object.size,
            Resource::new("CU1")
                .with_field("email", "one@example.com")
                .to_json_bytes()
                .unwrap()
                .len() as u64
        );

        assert!(fs.stat("/customers/CU9").unwrap().is_none());
        assert!(fs.stat("/unknown").unwrap().is_none());
    }

    #[test]
    fn test_lookup_interns_inodes() {
        let (_, mut fs) = setup();

        let attr = lookup(&mut fs, "/customers").unwrap();
        assert_eq!(attr.kind, FileType::Directory);
        assert_eq!(fs.inodes.inode("/customers"), Some(attr.ino));

        assert_eq!(lookup(&mut fs, "/nope").unwrap_err(), libc::ENOENT);
        assert_eq!(fs.inodes.inode("/nope"), None);
    }

    #[test]
    fn test_list_dir() {
        let (_, mut fs) = setup();
        let root = fs.list_dir(InodeTable::ROOT_INODE).unwrap();
        let names: Vec<_> = root.iter().map(|(_, _, n)| n.as_str()).collect();
        assert_eq!(names, [".", "..", "customers"]);
        assert_eq!(root[2].1, FileType::Directory);

        let dir = fs.inodes.intern("/customers");
        let listing = fs.list_dir(dir).unwrap();
        let names: Vec<_> = listing.iter().map(|(_, _, n)| n.as_str()).collect();
        assert_eq!(names, [".", "..", "CU1", "_create"]);
        assert!(listing[2..].iter().all(|(_, k, _)| *k == FileType::RegularFile));
    }

    #[test]
    fn test_open_for_write_requires_writable_path() {
        let (_, mut fs) = setup();
        let object = fs.inodes.intern("/customers/CU1");
        let create = fs.inodes.intern("/customers/_create");

        assert_eq!(fs.open_path(object, libc::O_WRONLY), Err(libc::EACCES));
        assert!(fs.open_path(object, libc::O_RDONLY).is_ok());
        assert!(fs.open_path(create, libc::O_WRONLY | libc::O_TRUNC).is_ok());
    }

    #[test]
    fn test_read_range() {
        let (_, mut fs) = setup();
        let ino = fs.inodes.intern("/customers/CU1");
        let fh = fs.open_path(ino, libc::O_RDONLY).unwrap();

        let all = fs.read_range(ino, fh, 0, 4096).unwrap();
        assert!(all.starts_with(br#"{"id":"CU1""#));

        let tail = fs.read_range(ino, fh, 2, 3).unwrap();
        assert_eq!(tail, b"id\"");

        assert!(fs.read_range(ino, fh, 10_000, 10).unwrap().is_empty());
    }

    #[test]
    fn test_buffered_write_commits_once_on_flush() {
        let (customers, mut fs) = setup();
        let ino = fs.inodes.intern("/customers/_create");
        let fh = fs.open_path(ino, libc::O_WRONLY).unwrap();

        fs.buffer_write(fh, 0, br#"{"email":"#).unwrap();
        fs.buffer_write(fh, 9, br#""a@example.com"}"#).unwrap();
        assert!(customers.created().is_empty());

        fs.commit(fh).unwrap();
        fs.commit(fh).unwrap();

        let created = customers.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0]["email"], "a@example.com");
    }

    #[test]
    fn test_malformed_write_is_einval() {
        let (customers, mut fs) = setup();
        let ino = fs.inodes.intern("/customers/_create");
        let fh = fs.open_path(ino, libc::O_WRONLY).unwrap();

        fs.buffer_write(fh, 0, b"not-json").unwrap();
        assert_eq!(fs.commit(fh), Err(libc::EINVAL));
        assert!(customers.created().is_empty());
    }

    #[test]
    fn test_write_at_gap_offset_is_einval() {
        let (customers, mut fs) = setup();
        let ino = fs.inodes.intern("/customers/_create");
        let fh = fs.open_path(ino, libc::O_WRONLY).unwrap();

        assert_eq!(fs.buffer_write(fh, i64::MAX, b"{}"), Err(libc::EINVAL));
        assert_eq!(fs.buffer_write(fh, 5, b"{}"), Err(libc::EINVAL));
        assert_eq!(fs.buffer_write(fh, -1, b"{}"), Err(libc::EINVAL));

        fs.buffer_write(fh, 0, b"{").unwrap();
        assert_eq!(fs.buffer_write(fh, 0, b"}"), Err(libc::EINVAL));
        fs.buffer_write(fh, 1, b"}").unwrap();
        fs.commit(fh).unwrap();
        assert_eq!(customers.created().len(), 1);
    }

    #[test]
    fn test_oversized_write_is_efbig() {
        let (customers, mut fs) = setup();
        let ino = fs.inodes.intern("/customers/_create");
        let fh = fs.open_path(ino, libc::O_WRONLY).unwrap();

        let chunk = vec![b' '; MAX_PENDING_WRITE];
        fs.buffer_write(fh, 0, &chunk).unwrap();
        let offset = MAX_PENDING_WRITE as i64;
        assert_eq!(fs.buffer_write(fh, offset, b"{}"), Err(libc::EFBIG));
        assert!(customers.created().is_empty());
    }

    #[test]
    fn test_write_to_unknown_handle() {
        let (_, mut fs) = setup();
        assert_eq!(fs.buffer_write(42, 0, b"{}"), Err(libc::EBADF));
    }
}
