use super::common::{self, ApiError, Coordinates};
use crate::widget::ramadan::{HijriCalendar, HijriCalendarEntry};
use async_trait::async_trait;
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://api.aladhan.com/v1";
/// Islamic Society of North America
pub const DEFAULT_METHOD: u8 = 2;

#[derive(Deserialize, Debug)]
struct CalendarResult {
    data: Vec<CalendarDay>,
}
impl From<CalendarResult> for Vec<HijriCalendarEntry> {
    fn from(result: CalendarResult) -> Self {
        result.data.into_iter().map(HijriCalendarEntry::from).collect()
    }
}

#[derive(Deserialize, Debug)]
struct CalendarDay {
    hijri: HijriDate,
    gregorian: GregorianDate,
}
impl From<CalendarDay> for HijriCalendarEntry {
    fn from(day: CalendarDay) -> Self {
        HijriCalendarEntry {
            hijri_month: day.hijri.month.number,
            hijri_day: day.hijri.day,
            hijri_year: day.hijri.year,
            gregorian_date: day.gregorian.date,
        }
    }
}

#[derive(Deserialize, Debug)]
struct HijriDate {
    month: HijriMonth,
    day: String,
    year: String,
}

#[derive(Deserialize, Debug)]
struct HijriMonth {
    number: u32,
}

#[derive(Deserialize, Debug)]
struct GregorianDate {
    /// formatted as DD-MM-YYYY
    date: String,
}

/// Failure body, e.g. `{"code": 400, "status": "BAD_REQUEST", "data": "Please specify a valid month"}`
#[derive(Deserialize, Debug, Clone)]
pub struct AladhanError {
    pub code: u16,
    pub data: String,
}
impl From<AladhanError> for ApiError {
    fn from(error: AladhanError) -> Self {
        ApiError::BadRequest { reason: format!("{} ({})", error.data, error.code) }
    }
}


/// Gregorian to Hijri month calendar of the Aladhan API
#[derive(Debug, Clone)]
pub struct AladhanCalendar {
    client: reqwest::Client,
    base_url: String,
    method: u8,
}
impl AladhanCalendar {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, method: u8) -> Self {
        AladhanCalendar { client, base_url: base_url.into(), method }
    }
}

#[async_trait]
impl HijriCalendar for AladhanCalendar {
    async fn month_calendar(&self, month: u32, year: i32, point: Coordinates)
        -> Result<Vec<HijriCalendarEntry>, ApiError>
    {
        let url = common::endpoint(&self.base_url, &format!("gToHCalendar/{month}/{year}"));
        let params = [
            ("latitude", point.latitude.to_string()),
            ("longitude", point.longitude.to_string()),
            ("method", self.method.to_string()),
        ];

        common::query_api::<Vec<HijriCalendarEntry>, CalendarResult, AladhanError>
            (&self.client, &url, params).await
    }
}
