pub mod aladhan;
pub mod common;
pub mod forecast;
pub mod geo_time;
pub mod ip_location;
pub mod nominatim;
