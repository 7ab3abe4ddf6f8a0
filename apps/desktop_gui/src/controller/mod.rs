//! Controller layer: UI events and command orchestration. Form transitions
//! themselves live in `client_core::form`.

pub mod events;
pub mod orchestration;
