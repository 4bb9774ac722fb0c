//! Analysis, repair and grid indexing of **watertight triangle meshes**.
//!
//! A [`TriangleMesh`] stores indexed triangles with optional per-vertex
//! normals and colors. On top of it the crate provides
//!
//! - [inside/outside classification](mesh::classify) of the cells of a
//!   regular [`CellGrid`] by ray parity and flood fill,
//! - [connected components](mesh::topology), their enclosed volume and
//!   pruning of small or inverted shells,
//! - [welding](mesh::weld) of two meshes along a seam and removal of
//!   duplicate vertices,
//! - Laplacian [smoothing](mesh::smoothing),
//! - [readers and writers](io) for OBJ, binary PLY and binary STL.
//!
//! # Features
//! #### Default
//! - **f64**: use f64 as Real
//! - [**stl-io**](https://en.wikipedia.org/wiki/STL_(file_format)): binary `.stl` export
//!
//! #### Optional
//! - **f32**: use f32 as Real, this conflicts with f64

#![forbid(unsafe_code)]
#![warn(clippy::missing_const_for_fn, clippy::approx_constant, clippy::all)]

pub mod aabb;
pub mod collision;
pub mod errors;
pub mod float_types;
pub mod grid;
pub mod io;
pub mod mesh;
pub mod traits;

#[cfg(any(all(feature = "f64", feature = "f32"), not(any(feature = "f64", feature = "f32"))))]
compile_error!("Either 'f64' or 'f32' feature must be specified, but not both");

pub use grid::{CellGrid, GridIndex};
pub use mesh::{Triangle, TriangleMesh};
pub use traits::CellVolume;
