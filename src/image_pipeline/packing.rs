//! Host-side packing and unpacking
//!
//! Moves pixels between the caller's strided images and the contiguous tiled
//! staging buffers exchanged with the accelerator.

pub mod layout;
mod pack;
mod unpack;


pub use pack::{alloc_zeroed, encode_le, pack_input};
pub use unpack::unpack_output;
