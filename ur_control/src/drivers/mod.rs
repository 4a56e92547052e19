#[cfg(feature="driver")]
mod backend;
#[cfg(feature="driver")]
pub use backend::*;

#[cfg(feature="driver")]
mod dashboard;
#[cfg(feature="driver")]
pub use dashboard::*;

#[cfg(feature="driver")]
mod motion;
#[cfg(feature="driver")]
pub use motion::*;

mod models;
pub use models::*;

mod driver_config;
pub use driver_config::*;
