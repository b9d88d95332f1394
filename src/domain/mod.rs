pub mod forecast;
pub mod reading;
pub mod sensor;

pub use forecast::*;
pub use reading::*;
pub use sensor::*;
