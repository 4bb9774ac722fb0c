// Re-export parry for the appropriate float size
#[cfg(feature = "f64")]
pub use parry3d_f64 as parry3d;

#[cfg(feature = "f32")]
pub use parry3d;

// Our Real scalar type:
#[cfg(feature = "f32")]
pub type Real = f32;
#[cfg(feature = "f64")]
pub type Real = f64;

use core::str::FromStr;
use std::sync::OnceLock;

/// Lazily-initialized weld tolerance used when joining meshes.
/// Defaults to `1e-4` world units, but can be overridden:
///  1) **Build-time**: set env var `TRICELL_TOLERANCE` (e.g. `TRICELL_TOLERANCE=1e-5 cargo build`)
///  2) **Runtime**: call [`set_tolerance`] once before using the library
static TOLERANCE_CELL: OnceLock<Real> = OnceLock::new();

#[inline]
const fn default_tolerance() -> Real {
    1e-4
}

/// Returns the current weld tolerance.
/// If not set yet, it tries `TRICELL_TOLERANCE` (parsed as the active `Real`) and
/// falls back to the default.
pub fn tolerance() -> Real {
    *TOLERANCE_CELL.get_or_init(|| {
        // Compile-time env if provided
        if let Some(environment_variable) = option_env!("TRICELL_TOLERANCE") {
            if let Ok(value) = Real::from_str(environment_variable) {
                return value.max(Real::EPSILON);
            }
        }
        default_tolerance()
    })
}

/// Set the weld tolerance programmatically once (subsequent calls are ignored).
/// Call near program start: `tricell::float_types::set_tolerance(1e-5);`
pub fn set_tolerance(value: Real) {
    let _ = TOLERANCE_CELL.set(value.max(Real::EPSILON));
}

/// Distance below which two vertices of the same mesh are considered duplicates.
pub const DUPLICATE_EPSILON: Real = 1e-5;

/// Cell size of the region-local hash grid used when joining two meshes.
pub const JOIN_CELL_SIZE: Real = 0.0625;

/// Length below which a vector is treated as zero when normalizing.
pub const NORMAL_EPSILON: Real = 1e-12;
