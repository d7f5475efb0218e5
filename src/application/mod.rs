//! Use cases coordinating domain entities, repositories and outbound
//! ports

pub mod ports;
pub mod services;
