//! Client-side state for the asset map.
//!
//! Everything here is host-agnostic: the map widget reports viewport and
//! pointer events, the host supplies clock readings, and the controller
//! answers with the queries to send. Responses are fed back in with the
//! sequence they were issued under, so late arrivals cannot overwrite newer
//! state.

pub mod api;
pub mod controller;
pub mod detail;
pub mod highlight;
pub mod session;
pub mod state;
pub mod view;

pub use api::*;
pub use controller::*;
pub use detail::*;
pub use highlight::*;
pub use session::*;
pub use state::*;
pub use view::*;
