use crate::error::{Error, Result};
use chrono::Datelike;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, info};

pub const NOAA_ENDPOINT: &str =
    "https://www.ngdc.noaa.gov/geomag-web/calculators/calculateDeclination";

/// Source of magnetic declination (degrees, positive east of true north).
pub trait DeclinationProvider {
    fn declination(&self, center: geo::Point, month: u32) -> Result<f64>;
}

/// Always reports the same declination. Backs the command line override.
#[derive(Clone, Copy, Debug)]
pub struct FixedDeclination(pub f64);

impl DeclinationProvider for FixedDeclination {
    fn declination(&self, _center: geo::Point, _month: u32) -> Result<f64> {
        Ok(self.0)
    }
}

/// Client for the NOAA NCEI magnetic declination calculator.
pub struct NoaaDeclination {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
}

impl NoaaDeclination {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key,
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl Default for NoaaDeclination {
    fn default() -> Self {
        Self::new(NOAA_ENDPOINT, None)
    }
}

impl DeclinationProvider for NoaaDeclination {
    fn declination(&self, center: geo::Point, month: u32) -> Result<f64> {
        let mut query = vec![
            ("lat1", center.y().to_string()),
            ("lon1", center.x().to_string()),
            ("resultFormat", "xml".to_string()),
            ("startMonth", month.to_string()),
        ];
        if let Some(key) = &self.api_key {
            query.push(("key", key.clone()));
        }

        debug!("requesting declination from {}", self.endpoint);
        let response = self
            .client
            .get(&self.endpoint)
            .query(&query)
            .send()?
            .error_for_status()?;
        debug!("declination response status: {}", response.status());

        let body = response.text()?;
        let declination = parse_declination_xml(&body)?;
        info!(
            "declination at ({}, {}) for month {month}: {declination}°",
            center.y(),
            center.x()
        );
        Ok(declination)
    }
}

/// Extracts the `<declination>` value of the first `<result>` block.
pub fn parse_declination_xml(xml: &str) -> Result<f64> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut in_result = false;
    let mut in_declination = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"result" => in_result = true,
                b"declination" if in_result => in_declination = true,
                _ => {}
            },
            Ok(Event::Text(text)) if in_declination => {
                let text = text
                    .unescape()
                    .map_err(|e| Error::response(format!("bad declination text: {e}")))?;
                let text = text.trim();
                return text
                    .parse::<f64>()
                    .map_err(|_| Error::response(format!("declination '{text}' is not a number")));
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"declination" if in_declination => {
                    return Err(Error::response("declination element is empty"))
                }
                b"result" => in_result = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::response(format!(
                    "malformed XML at position {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
    }

    Err(Error::response("no declination element in result"))
}

pub fn current_month() -> u32 {
    chrono::Local::now().month()
}
