//! Shared types for the emissions assistant pipeline.
//!
//! Holds the two string contracts that cross stage boundaries: the call
//! expression the intent generator is asked to emit (`call`), and the
//! uniform key/value result every dispatched operation is normalized
//! into (`result`).

pub mod call;
pub mod error;
pub mod result;

pub use call::{CallArg, MARKER, ParsedCall, extract_call, parse_call, strip_reasoning};
pub use error::{CallError, CallResult};
pub use result::{NO_DATA_MESSAGE, NormalizedResult};
