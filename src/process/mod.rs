//! Running external tools.
//!
//! Every toolchain step (cmake, ninja, objcopy, codesign, tar, ...) is an
//! [`Invocation`] executed by a [`ProcessRunner`]. Calls are strictly
//! sequential; build tools parallelize internally via their own `-j` flags.

mod invocation;
mod runner;

pub use invocation::Invocation;
pub use runner::{FailurePolicy, ProcessRunner, RunOutcome};
