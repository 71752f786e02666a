//! Client-side state.
//!
//! DESIGN
//! ======
//! `session` is the state container (memory plus persisted keys) and owns no
//! network code. `store` layers the async actions on top of it through the
//! gateway, which keeps the gateway → session dependency one-directional.

pub mod session;
pub mod store;
