//! Getting a dbt project onto disk: `git clone` or a zip download.
//!
//! Both paths treat an existing target directory as a cache hit and leave it
//! alone; delete the directory to force a fresh copy.

pub mod archive;
pub mod git;

pub use archive::{download_project, ArchiveError};
pub use git::clone_repository;
