pub mod assumptions;
pub mod compare;
pub mod pue;
pub mod sensitivity;
