//! Per-sample transformation stages.
//!
//! Each submodule implements exactly one pure-ish step between "sample
//! fetched" and "upload request built". Keeping them separate makes each
//! independently testable without any network access.
//!
//! 1. [`normalize`] — composite away any alpha channel and encode the image
//!    as a JPEG file the upload endpoint will accept
//! 2. [`title`]     — derive a deterministic, length-bounded document title
//!    from the sample's transcription (or a synthetic fallback)

pub mod normalize;
pub mod title;
