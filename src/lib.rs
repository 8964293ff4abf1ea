pub mod activity;
pub mod config;
pub mod error;
pub mod kernel;
pub mod sensor;

// Re-export specific items if needed for convenient access
pub use kernel::dispatcher::TaskDispatcher;
pub use kernel::reactor::Reactor;
pub use kernel::registry::ResultHandlerRegistry;
pub use sensor::manager::SensorManager;
pub use sensor::sampler::SensorSampler;
