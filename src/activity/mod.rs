//! Routing of host-OS asynchronous results (child activity results, permission
//! prompts) back to the handlers that started them.

pub mod results;
