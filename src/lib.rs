//! Single-core selection of the next real-time task to run.
//!
//! A [`Strategy`](`sched::Strategy`) looks at a ready set, borrowed through a
//! [`System`](`rsrc::System`) for the duration of one decision, and picks the
//! task the dispatcher should handle next. The value-density and failure
//! computations it depends on are supplied through the traits in [`oracle`].

pub mod depend;
pub mod error;
pub mod feasible;
pub mod gen;
pub mod oracle;
pub mod rsrc;
pub mod scenario;
pub mod sched;
pub mod sim;
pub mod task;

pub use error::{Error, Result};
