// Copyright 2025 OPPO.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::fs::{Caller, TahoeFileSystem};
use crate::node::NodeAttr;
use crate::session::NodeTable;
use crate::{err_fuse, FuseResult};
use fuser::consts::FOPEN_DIRECT_IO;
use fuser::{
    FileAttr, FileType, Filesystem, MountOption, ReplyAttr, ReplyData, ReplyDirectory,
    ReplyEmpty, ReplyEntry, ReplyOpen, ReplyStatfs, Request, TimeOrNow,
};
use log::{debug, info};
use std::ffi::OsStr;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tahoe_common::conf::FuseConf;
use tahoe_common::FsResult;

const BLOCK_SIZE: u32 = 4096;

/// Inode reported for listed entries the kernel has not looked up yet.
pub const FUSE_UNKNOWN_INO: u64 = 0xffff_ffff;

/// Serves a [`TahoeFileSystem`] to the kernel through `fuser`.
pub struct FuseSession {
    fs: TahoeFileSystem,
    nodes: NodeTable,
    ttl: Duration,
}

impl FuseSession {
    pub fn new(fs: TahoeFileSystem) -> Self {
        let ttl = fs.conf().attr_ttl;
        Self {
            fs,
            nodes: NodeTable::new(),
            ttl,
        }
    }

    pub fn fs(&self) -> &TahoeFileSystem {
        &self.fs
    }

    pub fn nodes(&self) -> &NodeTable {
        &self.nodes
    }

    pub fn mount_options(conf: &FuseConf) -> Vec<MountOption> {
        let mut options = vec![MountOption::RO, MountOption::FSName(conf.fs_name.clone())];
        if conf.allow_other {
            options.push(MountOption::AllowOther);
        }
        if conf.auto_unmount {
            options.push(MountOption::AutoUnmount);
        }
        options
    }

    /// Blocks until the file system is unmounted.
    pub fn mount(self) -> FsResult<()> {
        let conf = self.fs.conf().clone();
        let options = Self::mount_options(&conf);
        info!("mounting {} at {}, options {:?}", conf.fs_name, conf.mnt_path, options);

        fuser::mount2(self, Path::new(&conf.mnt_path), &options)?;
        info!("{} unmounted", conf.mnt_path);
        Ok(())
    }

    fn time(secs: i64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs.max(0) as u64)
    }

    fn time_secs(time: TimeOrNow) -> i64 {
        let time = match time {
            TimeOrNow::SpecificTime(v) => v,
            TimeOrNow::Now => SystemTime::now(),
        };
        match time.duration_since(UNIX_EPOCH) {
            Ok(v) => v.as_secs() as i64,
            Err(e) => -(e.duration().as_secs() as i64),
        }
    }

    /// Unknown sizes are reported as 0; files are opened with direct io so reads
    /// still run to the end of the content.
    pub fn file_attr(ino: u64, attr: &NodeAttr) -> FileAttr {
        let size = u64::try_from(attr.size).unwrap_or(0);
        let kind = if attr.is_dir() {
            FileType::Directory
        } else {
            FileType::RegularFile
        };

        FileAttr {
            ino,
            size,
            blocks: size.div_ceil(512),
            atime: Self::time(attr.atime),
            mtime: Self::time(attr.mtime),
            ctime: Self::time(attr.ctime),
            crtime: UNIX_EPOCH,
            kind,
            perm: (attr.mode & 0o7777) as u16,
            nlink: attr.nlink,
            uid: attr.uid,
            gid: attr.gid,
            rdev: 0,
            flags: 0,
            blksize: BLOCK_SIZE,
        }
    }

    fn name_str(name: &OsStr) -> FuseResult<&str> {
        match name.to_str() {
            Some(v) => Ok(v),
            None => err_fuse!(libc::EINVAL, "invalid name {:?}", name),
        }
    }

    fn path(&self, ino: u64) -> FuseResult<String> {
        match self.nodes.get_path(ino) {
            Some(v) => Ok(v.to_string()),
            None => err_fuse!(libc::ENOENT, "unknown inode {}", ino),
        }
    }

    fn child_path(&self, parent: u64, name: &OsStr) -> FuseResult<String> {
        let name = Self::name_str(name)?;
        match self.nodes.child_path(parent, name) {
            Some(v) => Ok(v),
            None => err_fuse!(libc::ENOENT, "unknown inode {}", parent),
        }
    }

    pub fn lookup_entry(&mut self, caller: &Caller, parent: u64, name: &OsStr) -> FuseResult<FileAttr> {
        let path = self.child_path(parent, name)?;
        let attr = self.fs.getattr(caller, &path)?;
        let ino = self.nodes.get_or_insert(&path);
        Ok(Self::file_attr(ino, &attr))
    }

    pub fn getattr_entry(&mut self, caller: &Caller, ino: u64) -> FuseResult<FileAttr> {
        let path = self.path(ino)?;
        let attr = self.fs.getattr(caller, &path)?;
        Ok(Self::file_attr(ino, &attr))
    }

    /// Directory entries after `offset`, each with the offset of the next one.
    ///
    /// Listing does not register paths: readdir carries no lookup count, so the
    /// kernel would never forget them.
    pub fn readdir_entries(
        &mut self,
        caller: &Caller,
        ino: u64,
        offset: i64,
    ) -> FuseResult<Vec<(u64, i64, FileType, String)>> {
        let path = self.path(ino)?;
        let listing = self.fs.getdir(caller, &path)?;

        let mut entries = Vec::with_capacity(listing.len());
        for (i, (name, mode)) in listing.into_iter().enumerate() {
            if (i as i64) < offset {
                continue;
            }
            let entry_ino = match name.as_str() {
                "." => Some(ino),
                ".." => self.nodes.get_ino(NodeTable::parent_path(&path)),
                _ => self
                    .nodes
                    .child_path(ino, &name)
                    .and_then(|child| self.nodes.get_ino(&child)),
            };
            let kind = if mode & libc::S_IFMT as u32 == libc::S_IFDIR as u32 {
                FileType::Directory
            } else {
                FileType::RegularFile
            };
            let entry_ino = entry_ino.unwrap_or(FUSE_UNKNOWN_INO);
            entries.push((entry_ino, i as i64 + 1, kind, name));
        }

        Ok(entries)
    }

    fn open_file(&mut self, caller: &Caller, ino: u64, flags: i32) -> FuseResult<()> {
        let path = self.path(ino)?;
        self.fs.open(caller, &path, flags)
    }

    fn read_file(&mut self, caller: &Caller, ino: u64, offset: i64, size: u32) -> FuseResult<Vec<u8>> {
        let path = self.path(ino)?;
        let offset = offset.max(0) as u64;
        let data = self.fs.read(caller, &path, size as usize, offset)?;
        Ok(data.to_vec())
    }

    fn release_file(&mut self, caller: &Caller, ino: u64) -> FuseResult<()> {
        let path = self.path(ino)?;
        self.fs.release(caller, &path)
    }

    #[allow(clippy::too_many_arguments)]
    fn set_attr(
        &mut self,
        caller: &Caller,
        ino: u64,
        mode: Option<u32>,
        uid: Option<u32>,
        gid: Option<u32>,
        size: Option<u64>,
        atime: Option<TimeOrNow>,
        mtime: Option<TimeOrNow>,
    ) -> FuseResult<FileAttr> {
        let path = self.path(ino)?;
        if let Some(size) = size {
            self.fs.truncate(caller, &path, size)?;
        } else if let Some(mode) = mode {
            self.fs.chmod(caller, &path, mode)?;
        } else if uid.is_some() || gid.is_some() {
            self.fs.chown(caller, &path, uid, gid)?;
        } else if atime.is_some() || mtime.is_some() {
            let atime = atime.map(Self::time_secs);
            let mtime = mtime.map(Self::time_secs);
            self.fs.utime(caller, &path, atime, mtime)?;
        }
        self.getattr_entry(caller, ino)
    }

    // Mutating calls never succeed; an unexpected Ok still reports ENOSYS.
    fn errno(res: FuseResult<()>) -> i32 {
        match res {
            Ok(()) => libc::ENOSYS,
            Err(e) => e.errno(),
        }
    }

    fn reply_empty(res: FuseResult<()>, reply: ReplyEmpty) {
        match res {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(e.errno()),
        }
    }
}

impl Filesystem for FuseSession {
    fn lookup(&mut self, req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        let caller = Caller::new(req.pid());
        match self.lookup_entry(&caller, parent, name) {
            Ok(attr) => reply.entry(&self.ttl, &attr, 0),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn forget(&mut self, _req: &Request<'_>, ino: u64, _nlookup: u64) {
        debug!("forget {}", ino);
        self.nodes.forget(ino);
    }

    fn getattr(&mut self, req: &Request<'_>, ino: u64, reply: ReplyAttr) {
        let caller = Caller::new(req.pid());
        match self.getattr_entry(&caller, ino) {
            Ok(attr) => reply.attr(&self.ttl, &attr),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn setattr(
        &mut self,
        req: &Request<'_>,
        ino: u64,
        mode: Option<u32>,
        uid: Option<u32>,
        gid: Option<u32>,
        size: Option<u64>,
        atime: Option<TimeOrNow>,
        mtime: Option<TimeOrNow>,
        _ctime: Option<SystemTime>,
        _fh: Option<u64>,
        _crtime: Option<SystemTime>,
        _chgtime: Option<SystemTime>,
        _bkuptime: Option<SystemTime>,
        _flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        let caller = Caller::new(req.pid());
        match self.set_attr(&caller, ino, mode, uid, gid, size, atime, mtime) {
            Ok(attr) => reply.attr(&self.ttl, &attr),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn readlink(&mut self, req: &Request<'_>, ino: u64, reply: ReplyData) {
        let caller = Caller::new(req.pid());
        let res = self
            .path(ino)
            .and_then(|path| self.fs.readlink(&caller, &path));
        reply.error(Self::errno(res));
    }

    fn mknod(
        &mut self,
        req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        mode: u32,
        _umask: u32,
        rdev: u32,
        reply: ReplyEntry,
    ) {
        let caller = Caller::new(req.pid());
        let res = self
            .child_path(parent, name)
            .and_then(|path| self.fs.mknod(&caller, &path, mode, rdev));
        reply.error(Self::errno(res));
    }

    fn mkdir(
        &mut self,
        req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        mode: u32,
        _umask: u32,
        reply: ReplyEntry,
    ) {
        let caller = Caller::new(req.pid());
        let res = self
            .child_path(parent, name)
            .and_then(|path| self.fs.mkdir(&caller, &path, mode));
        reply.error(Self::errno(res));
    }

    fn unlink(&mut self, req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        let caller = Caller::new(req.pid());
        let res = self
            .child_path(parent, name)
            .and_then(|path| self.fs.unlink(&caller, &path));
        Self::reply_empty(res, reply);
    }

    fn rmdir(&mut self, req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        let caller = Caller::new(req.pid());
        let res = self
            .child_path(parent, name)
            .and_then(|path| self.fs.rmdir(&caller, &path));
        Self::reply_empty(res, reply);
    }

    fn symlink(
        &mut self,
        req: &Request<'_>,
        parent: u64,
        link_name: &OsStr,
        target: &Path,
        reply: ReplyEntry,
    ) {
        let caller = Caller::new(req.pid());
        let target = target.to_string_lossy();
        let res = self
            .child_path(parent, link_name)
            .and_then(|link| self.fs.symlink(&caller, &target, &link));
        reply.error(Self::errno(res));
    }

    fn rename(
        &mut self,
        req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        newparent: u64,
        newname: &OsStr,
        _flags: u32,
        reply: ReplyEmpty,
    ) {
        let caller = Caller::new(req.pid());
        let res = self.child_path(parent, name).and_then(|old| {
            let new = self.child_path(newparent, newname)?;
            self.fs.rename(&caller, &old, &new)
        });
        Self::reply_empty(res, reply);
    }

    fn link(
        &mut self,
        req: &Request<'_>,
        ino: u64,
        newparent: u64,
        newname: &OsStr,
        reply: ReplyEntry,
    ) {
        let caller = Caller::new(req.pid());
        let res = self.path(ino).and_then(|target| {
            let link = self.child_path(newparent, newname)?;
            self.fs.link(&caller, &target, &link)
        });
        reply.error(Self::errno(res));
    }

    fn open(&mut self, req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
        let caller = Caller::new(req.pid());
        match self.open_file(&caller, ino, flags) {
            // Handles are keyed by path, the kernel file handle is unused.
            Ok(()) => reply.opened(0, FOPEN_DIRECT_IO),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn read(
        &mut self,
        req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        let caller = Caller::new(req.pid());
        match self.read_file(&caller, ino, offset, size) {
            Ok(data) => reply.data(&data),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn release(
        &mut self,
        req: &Request<'_>,
        ino: u64,
        _fh: u64,
        _flags: i32,
        _lock_owner: Option<u64>,
        _flush: bool,
        reply: ReplyEmpty,
    ) {
        let caller = Caller::new(req.pid());
        Self::reply_empty(self.release_file(&caller, ino), reply);
    }

    fn fsync(&mut self, req: &Request<'_>, ino: u64, _fh: u64, datasync: bool, reply: ReplyEmpty) {
        let caller = Caller::new(req.pid());
        let res = self
            .path(ino)
            .and_then(|path| self.fs.fsync(&caller, &path, datasync));
        Self::reply_empty(res, reply);
    }

    fn opendir(&mut self, _req: &Request<'_>, _ino: u64, _flags: i32, reply: ReplyOpen) {
        reply.opened(0, 0);
    }

    fn readdir(
        &mut self,
        req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        let caller = Caller::new(req.pid());
        match self.readdir_entries(&caller, ino, offset) {
            Ok(entries) => {
                for (entry_ino, next_offset, kind, name) in entries {
                    if reply.add(entry_ino, next_offset, kind, name) {
                        break;
                    }
                }
                reply.ok();
            }
            Err(e) => reply.error(e.errno()),
        }
    }

    fn releasedir(&mut self, _req: &Request<'_>, _ino: u64, _fh: u64, _flags: i32, reply: ReplyEmpty) {
        reply.ok();
    }

    fn statfs(&mut self, req: &Request<'_>, _ino: u64, reply: ReplyStatfs) {
        let caller = Caller::new(req.pid());
        reply.error(Self::errno(self.fs.statfs(&caller)));
    }
}
