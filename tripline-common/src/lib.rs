pub mod derived;
pub mod model;
pub mod util;
