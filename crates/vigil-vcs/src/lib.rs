//! # vigil-vcs
//!
//! Change detection over a versioned source.
//!
//! A [`VersionedSource`] exposes an opaque revision marker and the paths that
//! changed since an earlier marker. [`GitSource`] implements it with gix;
//! [`MemorySource`] is an in-process double. [`ChangeDetector`] polls a source
//! against a stored watermark ([`RevisionState`]) and reports a
//! [`ChangeDelta`] per poll.

pub mod detector;
pub mod error;
pub mod source;

pub use detector::{ChangeDelta, ChangeDetector, RevisionState};
pub use error::VcsError;
pub use source::{GitSource, MemorySource, VersionedSource};
