//! Archive retrieval.
//!
//! [`HttpClient`] is the transport seam; [`BasicClient`] is the reqwest
//! implementation and [`Wayback`] builds snapshot URLs on top of it.

mod basic;
mod client;
mod wayback;

pub use basic::BasicClient;
pub use client::{HttpClient, HttpResponse};
pub use wayback::Wayback;
