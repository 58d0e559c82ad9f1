pub mod assemble;
pub mod digest;
pub mod inspect;
