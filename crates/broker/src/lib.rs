pub mod oanda;
mod wire;
