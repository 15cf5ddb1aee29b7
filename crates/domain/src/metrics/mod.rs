pub mod greeks;
pub mod impermanent_loss;

pub use greeks::{CurveSensitivities, LpPosition, PositionGreeks};
