//! strconcat: concatenation of null-terminated byte strings into owned or
//! heap-reclaimed buffers.

pub mod concat;
pub mod error;
pub mod ffi;
pub mod gc;
pub mod str;

pub use concat::{concat, try_concat};
pub use error::{ConcatError, Operand};
pub use gc::{GcBytes, GcConfig, GcHeap};
