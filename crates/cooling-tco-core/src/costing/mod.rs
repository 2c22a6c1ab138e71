pub mod equipment;
pub mod opex;
pub mod pue;
