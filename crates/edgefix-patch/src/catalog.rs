//! Built-in fix catalog for a cloned `yolact_edge` checkout.
//!
//! Every rule here is distilled from a known breakage when running the
//! upstream project in a fresh environment: a package-relative import that
//! only works when the repo root is on the path, a Cython source predating
//! the `language_level` directive, NumPy typedefs removed in NumPy 1.24, an
//! unconditional CUDA call, and a config attribute dropped between
//! releases. Rule payloads are data; [`crate::apply_targets`] does the
//! work.

use crate::error::{PatchError, Result};
use crate::rule::{FileTarget, PatchRule};
use std::path::Path;

/// Top-level directory the checkout root must contain.
pub const WORKSPACE_DIR: &str = "yolact_edge";

/// Fail early when `root` does not look like a yolact_edge checkout.
pub fn ensure_workspace(root: &Path) -> Result<()> {
    if root.join(WORKSPACE_DIR).is_dir() {
        Ok(())
    } else {
        Err(PatchError::WorkspaceMissing {
            root: root.display().to_string(),
            expected: WORKSPACE_DIR,
        })
    }
}

/// The full catalog.
///
/// With `rewrite_nms` set, the incremental Cython fixes are swapped for a
/// wholesale rewrite of `cython_nms.pyx` to a known-good kernel source —
/// the recovery path for checkouts where the file has drifted too far for
/// the targeted rules to land.
pub fn targets(rewrite_nms: bool) -> Vec<FileTarget> {
    vec![
        config_target(),
        if rewrite_nms {
            nms_rewrite_target()
        } else {
            cython_target()
        },
        yolact_target(),
        augmentations_target(),
        output_utils_target(),
    ]
}

/// `data/config.py` imports the backbone module top-level; after packaging
/// it must be imported through the `yolact_edge` package. Upstream shipped
/// two variants of the line, tried most-specific first.
fn config_target() -> FileTarget {
    const MARKER: &str = "from yolact_edge.backbone import";
    FileTarget::new(
        "yolact_edge/data/config.py",
        vec![
            PatchRule::replace(
                "backbone-import-mobilenet",
                "from backbone import ResNetBackbone, VGGBackbone, ResNetBackboneGN, DarkNetBackbone, MobileNetV2Backbone",
                "from yolact_edge.backbone import ResNetBackbone, VGGBackbone, ResNetBackboneGN, DarkNetBackbone, MobileNetV2Backbone",
            )
            .with_marker(MARKER),
            PatchRule::replace(
                "backbone-import",
                "from backbone import ResNetBackbone, VGGBackbone, ResNetBackboneGN, DarkNetBackbone",
                "from yolact_edge.backbone import ResNetBackbone, VGGBackbone, ResNetBackboneGN, DarkNetBackbone",
            )
            .with_marker(MARKER),
        ],
    )
}

/// `utils/cython_nms.pyx` predates Cython 3 and NumPy 1.24: it lacks a
/// `language_level` directive and still uses the removed `np.int` aliases.
/// The dtype triggers keep their closing parenthesis so that an already
/// converted `dtype=np.int32)` can never re-match.
fn cython_target() -> FileTarget {
    FileTarget::new(
        "yolact_edge/utils/cython_nms.pyx",
        vec![
            PatchRule::prepend("cython-language-level", "# cython: language_level=3"),
            PatchRule::replace_all("numpy-int-typedef", "np.int_t", "np.int32_t"),
            PatchRule::replace_all("numpy-int-dtype", "dtype=np.int)", "dtype=np.int32)"),
            PatchRule::replace_all("numpy-int64-dtype", "dtype=np.int64)", "dtype=np.int32)"),
        ],
    )
}

/// `yolact.py` touches the CUDA runtime at import time, which aborts on
/// CPU-only machines. The replacement text doubles as the applied marker
/// because the trigger survives inside the comment.
fn yolact_target() -> FileTarget {
    const REPLACEMENT: &str =
        "# torch.cuda.current_device()  # Commented out for CPU-only environments";
    FileTarget::new(
        "yolact_edge/yolact.py",
        vec![PatchRule::replace_all(
            "cuda-current-device",
            "torch.cuda.current_device()",
            REPLACEMENT,
        )
        .with_marker(REPLACEMENT)],
    )
}

/// `utils/augmentations.py` reads `cfg.min_size`, an attribute newer
/// configs no longer define. Falls back to `max_size` via `getattr`.
fn augmentations_target() -> FileTarget {
    FileTarget::new(
        "yolact_edge/utils/augmentations.py",
        vec![PatchRule::replace(
            "augmentations-min-size",
            "        self.min_size = cfg.min_size",
            "        # Use max_size as min_size if min_size is not defined (for backward compatibility)\n        self.min_size = getattr(cfg, 'min_size', cfg.max_size)",
        )
        .with_marker("self.min_size = getattr(cfg, 'min_size', cfg.max_size)")],
    )
}

/// `layers/output_utils.py` has the same `cfg.min_size` lookup at two
/// identical call sites, hence the replace-all policy.
fn output_utils_target() -> FileTarget {
    FileTarget::new(
        "yolact_edge/layers/output_utils.py",
        vec![PatchRule::replace_all(
            "output-utils-min-size",
            "        r_w, r_h = Resize.faster_rcnn_scale(w, h, cfg.min_size, cfg.max_size)",
            "        # Use max_size as min_size if min_size is not defined (for backward compatibility)\n        min_size = getattr(cfg, 'min_size', cfg.max_size)\n        r_w, r_h = Resize.faster_rcnn_scale(w, h, min_size, cfg.max_size)",
        )
        .with_marker("min_size = getattr(cfg, 'min_size', cfg.max_size)")],
    )
}

/// Wholesale replacement of `cython_nms.pyx` with the canonical kernel
/// source (directive, typedefs and all).
pub fn nms_rewrite_target() -> FileTarget {
    FileTarget::new(
        "yolact_edge/utils/cython_nms.pyx",
        vec![PatchRule::rewrite("nms-kernel-rewrite", NMS_KERNEL_PYX)],
    )
}

/// Known-good `cython_nms.pyx` body, shipped as data. The NMS routine is
/// upstream's own kernel, carried verbatim so the rewrite target converges
/// on a file the incremental rules would also accept.
pub const NMS_KERNEL_PYX: &str = r#"# cython: language_level=3
## Note: Figure out the license details later.
#
# Based on:
# --------------------------------------------------------
# Fast R-CNN
# Copyright (c) 2015 Microsoft
# Licensed under The MIT License [see LICENSE for details]
# Written by Ross Girshick
# --------------------------------------------------------

cimport cython
import numpy as np
cimport numpy as np

cdef inline np.float32_t max(np.float32_t a, np.float32_t b) nogil:
    return a if a >= b else b

cdef inline np.float32_t min(np.float32_t a, np.float32_t b) nogil:
    return a if a <= b else b

@cython.boundscheck(False)
@cython.cdivision(True)
@cython.wraparound(False)
def nms(np.ndarray[np.float32_t, ndim=2] dets, np.float32_t thresh):
    cdef np.ndarray[np.float32_t, ndim=1] x1 = dets[:, 0]
    cdef np.ndarray[np.float32_t, ndim=1] y1 = dets[:, 1]
    cdef np.ndarray[np.float32_t, ndim=1] x2 = dets[:, 2]
    cdef np.ndarray[np.float32_t, ndim=1] y2 = dets[:, 3]
    cdef np.ndarray[np.float32_t, ndim=1] scores = dets[:, 4]

    cdef np.ndarray[np.float32_t, ndim=1] areas = (x2 - x1 + 1) * (y2 - y1 + 1)
    cdef np.ndarray[np.int64_t, ndim=1] order = scores.argsort()[::-1]

    cdef int ndets = dets.shape[0]
    cdef np.ndarray[np.int32_t, ndim=1] suppressed = \
            np.zeros((ndets), dtype=np.int32)

    # nominal indices
    cdef int _i, _j
    # sorted indices
    cdef int i, j
    # temp variables for box i's (the box currently under consideration)
    cdef np.float32_t ix1, iy1, ix2, iy2, iarea
    # variables for computing overlap with box j (lower scoring box)
    cdef np.float32_t xx1, yy1, xx2, yy2
    cdef np.float32_t w, h
    cdef np.float32_t inter, ovr

    with nogil:
      for _i in range(ndets):
          i = order[_i]
          if suppressed[i] == 1:
              continue
          ix1 = x1[i]
          iy1 = y1[i]
          ix2 = x2[i]
          iy2 = y2[i]
          iarea = areas[i]
          for _j in range(_i + 1, ndets):
              j = order[_j]
              if suppressed[j] == 1:
                  continue
              xx1 = max(ix1, x1[j])
              yy1 = max(iy1, y1[j])
              xx2 = min(ix2, x2[j])
              yy2 = min(iy2, y2[j])
              w = max(0.0, xx2 - xx1 + 1)
              h = max(0.0, yy2 - yy1 + 1)
              inter = w * h
              ovr = inter / (iarea + areas[j] - inter)
              if ovr >= thresh:
                  suppressed[j] = 1

    return np.where(suppressed == 0)[0]
"#;
