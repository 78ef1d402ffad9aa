//! Named fixed-kernel filters for one-shot use outside the preset pipeline.

use super::kernel::{self, Kernel3};
use crate::error::EnhanceError;
use crate::raster::Raster;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterKind {
    Sharpen,
    Blur,
    Smooth,
    Detail,
    EdgeEnhance,
    FindEdges,
}

impl FilterKind {
    pub const ALL: [FilterKind; 6] = [
        FilterKind::Sharpen,
        FilterKind::Blur,
        FilterKind::Smooth,
        FilterKind::Detail,
        FilterKind::EdgeEnhance,
        FilterKind::FindEdges,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FilterKind::Sharpen => "sharpen",
            FilterKind::Blur => "blur",
            FilterKind::Smooth => "smooth",
            FilterKind::Detail => "detail",
            FilterKind::EdgeEnhance => "edge-enhance",
            FilterKind::FindEdges => "find-edges",
        }
    }

    /// The 3x3 kernel behind this filter; `None` for the 5x5 ring blur.
    fn kernel(self) -> Option<&'static Kernel3> {
        match self {
            FilterKind::Sharpen => Some(&kernel::SHARPEN),
            FilterKind::Blur => None,
            FilterKind::Smooth => Some(&kernel::SMOOTH),
            FilterKind::Detail => Some(&kernel::DETAIL),
            FilterKind::EdgeEnhance => Some(&kernel::EDGE_ENHANCE),
            FilterKind::FindEdges => Some(&kernel::FIND_EDGES),
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterKind {
    type Err = EnhanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        FilterKind::ALL
            .into_iter()
            .find(|k| k.name() == normalized)
            .ok_or_else(|| EnhanceError::InvalidParameter(format!("unknown filter: {s}")))
    }
}

/// Apply a named filter.
pub fn apply_filter(raster: &Raster, kind: FilterKind) -> Raster {
    match kind.kernel() {
        Some(k) => kernel::filter3x3(raster, k),
        None => kernel::ring_blur(raster),
    }
}
