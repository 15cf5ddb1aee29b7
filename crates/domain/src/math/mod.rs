pub mod black_scholes;
pub mod constant_product;
