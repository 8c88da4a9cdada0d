pub mod api;
pub mod calc;
pub mod catalog;
pub mod circuits;
pub mod feature;
pub mod key_features;
pub mod locator;
pub mod model;
pub mod normalize;
pub mod settings;
pub mod snapshot;

pub use api::Error;
