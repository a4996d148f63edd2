pub mod access;
pub mod email;
pub mod sql;
