pub use huddle_core::model::{Participant, PeerId};

pub mod model {
    pub use huddle_core::model::*;
}

#[cfg(feature = "call")]
pub mod call {
    pub use huddle_call::*;
}
