pub mod api;
pub mod config;
pub mod constants;
pub mod emitter;
pub mod errors;
pub mod identity;
pub mod logging;

pub mod prelude {
    pub use crate::api::{
        ApiObject,
        Event,
        EventType,
    };
    pub use crate::config::Config;
    pub use crate::constants::*;
    pub use crate::emitter::{
        Emit,
        Record,
        SharedEmitter,
    };
    pub use crate::errors::EmptyResult;
    pub use crate::identity::Identity;
}
