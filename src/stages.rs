pub mod extract;
pub mod geocode;
pub mod restructure;
pub mod upload;
