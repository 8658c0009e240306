use crate::localization::localize;
use crate::sources::geo_time::Tz;
use crate::widget::countdown::CountdownValue;
use crate::widget::location::LocationError;
use crate::widget::ramadan::ResolvedRamadanDate;
use crate::widget::weather::WeatherSnapshot;

pub fn header(resolved: &ResolvedRamadanDate, local_zone: Option<Tz>) -> Vec<String> {
    let title = match &resolved.hijri_year {
        Some(year) => localize!("title", year: year),
        None => localize!("title-no-year"),
    };
    let date = resolved.date.format("%A, %-d %B %Y");
    let mut lines = vec![title, localize!("begins-on", date: date)];

    // the start is pinned to UTC+7, tell people elsewhere when that is for them
    if let Some(zone) = local_zone {
        let local = resolved.date.with_timezone(&zone);
        if local.naive_local() != resolved.date.naive_local() {
            lines.push(localize!("begins-local", time: local.format("%A %H:%M"), zone: zone.name()));
        }
    }
    lines
}

pub fn countdown(left: &CountdownValue) -> String {
    if *left == CountdownValue::ZERO {
        return localize!("countdown-arrived");
    }
    let time = format!("{:02}:{:02}:{:02}", left.hours, left.minutes, left.seconds);
    localize!("countdown-remaining", days: left.days, time: time)
}

pub fn weather(snapshot: &WeatherSnapshot) -> String {
    if snapshot.loading {
        return localize!("weather-loading");
    }

    let line = localize!("weather-line",
        place: snapshot.place_name,
        temperature: snapshot.temperature_c,
        condition: snapshot.condition(),
        wind: snapshot.wind_speed_kmh,
        humidity: snapshot.humidity_pct,
        visibility: snapshot.visibility_km,
    );
    match &snapshot.error {
        Some(error) => format!("{line} ({error})"),
        None => line,
    }
}

pub fn location_error(error: &LocationError) -> String {
    localize!("location-error", reason: error)
}
