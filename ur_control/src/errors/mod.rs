mod robot_error;
pub use robot_error::*;
