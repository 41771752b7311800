mod constants;
mod events;
mod fake;
mod recording;
mod stream_server;

pub use constants::*;
pub use events::*;
pub use fake::*;
pub use recording::*;
pub use stream_server::*;
