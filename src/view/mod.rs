pub mod crash;
pub mod group;
pub mod observable;
