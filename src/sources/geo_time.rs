use super::common::Coordinates;
pub use chrono_tz::Tz;
use lazy_static::lazy_static;
use tzf_rs::DefaultFinder;

lazy_static! {
    static ref FINDER: DefaultFinder = DefaultFinder::new();
}

pub fn init() {
    lazy_static::initialize(&FINDER); // the polygon data takes a moment to load, do it before the first tick
}

pub fn get_timezone_name(coordinates: &Coordinates) -> String {
    FINDER.get_tz_name(coordinates.longitude, coordinates.latitude).to_string()
}

pub fn get_timezone(coordinates: &Coordinates) -> Option<Tz> {
    get_timezone_name(coordinates).parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jakarta_is_western_indonesia_time() {
        let jakarta = Coordinates::new(-6.2088, 106.8456);
        assert_eq!(get_timezone(&jakarta), Some(chrono_tz::Asia::Jakarta));
    }

    #[test]
    fn mecca() {
        let mecca = Coordinates::new(21.4225, 39.8262);
        assert_eq!(get_timezone_name(&mecca), "Asia/Riyadh");
    }
}
