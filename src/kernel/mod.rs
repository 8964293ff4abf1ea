//! Consumer-side kernel: the task queue, the tick driver that drains it, and
//! the request-code registry shared with the host activity layer.

pub mod dispatcher;
pub mod event;
pub mod reactor;
pub mod registry;
pub mod runtime;
pub mod time;
