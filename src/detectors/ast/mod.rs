pub mod ast;
pub mod catalog;
pub mod unitdelta;
