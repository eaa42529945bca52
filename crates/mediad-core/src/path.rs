//! Absolute, `/`-separated, URL-decoded path resolution (§4.3).
//!
//! Resolution walks from the Session root, consuming one segment at a time.
//! Empty segments (double slashes, a leading or trailing slash) are
//! ignored, so `/pipelines/p0/`, `/pipelines//p0` and `pipelines/p0` all
//! resolve identically.

use percent_encoding::percent_decode_str;

use crate::error::{CoreError, CoreResult};
use crate::tree::NodeRef;

/// Splits a path into its non-empty, percent-decoded segments.
#[must_use]
pub fn split_segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned())
        .collect()
}

/// Walks `root` through each segment of `path`, returning the resolved
/// Node. A missing segment yields `NO_RESOURCE` (§4.3).
pub async fn resolve(root: &NodeRef, path: &str) -> CoreResult<NodeRef> {
    let mut current = root.clone();
    for segment in split_segments(path) {
        current = current.child(&segment).await.map_err(|_| CoreError::NoResource(path.to_string()))?;
    }
    Ok(current)
}
