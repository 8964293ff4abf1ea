//! Motion sensor sampling.
//!
//! Hardware pushes measurements whenever it likes; a fixed-period timer pulls
//! the latest one, fixes up its timestamp and emits a delta-timed, portrait
//! relative sample through the task dispatcher.

pub mod hardware;
pub mod kind;
pub mod manager;
pub mod measurement;
pub mod sampler;
pub mod simulated;
pub mod timer;
pub mod timestamp;
