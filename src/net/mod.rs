//! Backend access: the gateway, its payload and wire types, and the
//! endpoint catalog built on top of it.

pub mod api;
pub mod gateway;
pub mod payload;
pub mod types;
