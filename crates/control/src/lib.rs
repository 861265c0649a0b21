pub mod backoff;
pub mod controller;
pub mod metrics;
pub mod plugins;
pub mod policy;
pub mod reconciler;
pub mod safety;
pub mod state;
pub mod store;
pub mod target;

pub use backoff::*;
pub use controller::*;
pub use metrics::*;
pub use plugins::*;
pub use policy::*;
pub use reconciler::*;
pub use safety::*;
pub use state::*;
pub use store::*;
pub use target::*;
