use std::{fmt::Display, str::FromStr};

use geo::{point, Point};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordinateError {
    #[error("no coordinate found in `{0}`")]
    NotFound(String),
    #[error("invalid hemisphere `{0}`")]
    Hemisphere(String),
    #[error("expected {expected} ascii digits for {field}, found `{found}`")]
    DigitGroup {
        field: &'static str,
        expected: usize,
        found: String,
    },
    #[error("{axis} component expected, found `{found}`")]
    WrongAxis { axis: Axis, found: String },
    #[error("{axis} {value} out of range")]
    OutOfRange { axis: Axis, value: f64 },
}

static COMPONENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{6,7})(?:\.(\d{1,2}))?([NSEW])").unwrap());

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    fn degree_digits(self) -> usize {
        match self {
            Self::Latitude => 2,
            Self::Longitude => 3,
        }
    }

    fn limit(self) -> f64 {
        match self {
            Self::Latitude => 90.0,
            Self::Longitude => 180.0,
        }
    }
}

impl Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Latitude => f.write_str("latitude"),
            Self::Longitude => f.write_str("longitude"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hemisphere {
    North,
    South,
    East,
    West,
}

impl Hemisphere {
    pub fn letter(self) -> char {
        match self {
            Self::North => 'N',
            Self::South => 'S',
            Self::East => 'E',
            Self::West => 'W',
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            Self::North | Self::South => Axis::Latitude,
            Self::East | Self::West => Axis::Longitude,
        }
    }

    pub fn sign(self) -> f64 {
        match self {
            Self::North | Self::East => 1.0,
            Self::South | Self::West => -1.0,
        }
    }

    /// Hemisphere for a signed decimal value, zero counts as positive.
    pub fn of(value: f64, axis: Axis) -> Self {
        match (axis, value < 0.0) {
            (Axis::Latitude, false) => Self::North,
            (Axis::Latitude, true) => Self::South,
            (Axis::Longitude, false) => Self::East,
            (Axis::Longitude, true) => Self::West,
        }
    }
}

impl FromStr for Hemisphere {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "N" => Ok(Self::North),
            "S" => Ok(Self::South),
            "E" => Ok(Self::East),
            "W" => Ok(Self::West),
            other => Err(CoordinateError::Hemisphere(other.to_string())),
        }
    }
}

/// One half of a scraped position: a packed digit group with its
/// hemisphere letter, `DDMMSS` for latitude and `DDDMMSS` for longitude,
/// optionally followed by hundredths of a second.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CoordinateComponent {
    pub digits: String,
    pub hundredths: Option<String>,
    pub hemisphere: Hemisphere,
}

impl CoordinateComponent {
    pub fn find_in(text: &str) -> Option<Self> {
        let captures = COMPONENT_RE.captures(text)?;
        Some(Self {
            digits: captures[1].to_string(),
            hundredths: captures.get(2).map(|m| m.as_str().to_string()),
            hemisphere: captures[3].parse().ok()?,
        })
    }

    pub fn parse(text: &str) -> Result<Self, CoordinateError> {
        Self::find_in(text).ok_or_else(|| CoordinateError::NotFound(text.to_string()))
    }

    pub fn axis(&self) -> Axis {
        self.hemisphere.axis()
    }

    fn split(&self) -> Result<(&str, &str, &str), CoordinateError> {
        let degree_digits = self.axis().degree_digits();
        let expected = degree_digits + 4;
        if self.digits.len() != expected || !self.digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoordinateError::DigitGroup {
                field: "packed coordinate",
                expected,
                found: self.digits.clone(),
            });
        }
        Ok((
            &self.digits[..degree_digits],
            &self.digits[degree_digits..degree_digits + 2],
            &self.digits[degree_digits + 2..],
        ))
    }

    /// Hundredths padded to two digits, `.5` reads as 50.
    fn hundredths_digits(&self) -> String {
        self.hundredths
            .as_deref()
            .map_or_else(|| "00".to_string(), |h| format!("{h:0<2}"))
    }

    pub fn to_decimal(&self) -> Result<f64, CoordinateError> {
        let (degrees, minutes, seconds) = self.split()?;
        let whole = dms_to_decimal(degrees, minutes, seconds, self.hemisphere)?;
        let hundredths = parse_digits(&self.hundredths_digits(), "hundredths", 2)?;
        Ok(whole + self.hemisphere.sign() * hundredths / 360_000.0)
    }

    /// Sector-file rendering of the raw digits, no decimal round trip:
    /// `520517N` becomes `N52.05.17.00`.
    pub fn sct_fmt(&self) -> Result<String, CoordinateError> {
        let (degrees, minutes, seconds) = self.split()?;
        Ok(format!(
            "{}{degrees}.{minutes}.{seconds}.{}",
            self.hemisphere.letter(),
            self.hundredths_digits()
        ))
    }
}

fn parse_digits(digits: &str, field: &'static str, expected: usize) -> Result<f64, CoordinateError> {
    if digits.len() != expected || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoordinateError::DigitGroup {
            field,
            expected,
            found: digits.to_string(),
        });
    }
    // only ascii digits left
    Ok(digits.bytes().fold(0.0, |acc, b| acc * 10.0 + f64::from(b - b'0')))
}

/// Fixed-width digit groups to signed decimal degrees. Degrees take two
/// digits for latitude hemispheres and three for longitude ones.
pub fn dms_to_decimal(
    degrees: &str,
    minutes: &str,
    seconds: &str,
    hemisphere: Hemisphere,
) -> Result<f64, CoordinateError> {
    let axis = hemisphere.axis();
    let deg = parse_digits(degrees, "degrees", axis.degree_digits())?;
    let min = parse_digits(minutes, "minutes", 2)?;
    let sec = parse_digits(seconds, "seconds", 2)?;

    let value = deg + min / 60.0 + sec / 3600.0;
    if value > axis.limit() {
        return Err(CoordinateError::OutOfRange { axis, value });
    }
    Ok(hemisphere.sign() * value)
}

/// Degrees and minutes truncated toward zero, seconds rounded half away
/// from zero to hundredths. 59.995 seconds print as `60.00` and are not
/// carried into the minutes.
fn dms_parts(value: f64) -> (u16, u8, f64) {
    let abs = value.abs();
    let degrees = abs.trunc();
    let minutes = abs.fract() * 60.0;
    let seconds = (minutes.fract() * 60.0 * 100.0).round() / 100.0;

    (degrees as u16, minutes.trunc() as u8, seconds)
}

pub fn format_dms_component(value: f64, axis: Axis) -> String {
    let (deg, min, sec) = dms_parts(value);
    format!(
        "{}{deg:03}.{min:02}.{sec:05.2}",
        Hemisphere::of(value, axis).letter()
    )
}

pub fn decimal_to_dms(latitude: f64, longitude: f64) -> String {
    format!(
        "{} {}",
        format_dms_component(latitude, Axis::Latitude),
        format_dms_component(longitude, Axis::Longitude)
    )
}

pub fn component_pair_to_point(
    lat: &CoordinateComponent,
    lng: &CoordinateComponent,
) -> Result<Point, CoordinateError> {
    expect_axis(lat, Axis::Latitude)?;
    expect_axis(lng, Axis::Longitude)?;
    Ok(point! { x: lng.to_decimal()?, y: lat.to_decimal()? })
}

pub fn sct_location(
    lat: &CoordinateComponent,
    lng: &CoordinateComponent,
) -> Result<String, CoordinateError> {
    expect_axis(lat, Axis::Latitude)?;
    expect_axis(lng, Axis::Longitude)?;
    Ok(format!("{} {}", lat.sct_fmt()?, lng.sct_fmt()?))
}

fn expect_axis(component: &CoordinateComponent, axis: Axis) -> Result<(), CoordinateError> {
    if component.axis() == axis {
        Ok(())
    } else {
        Err(CoordinateError::WrongAxis {
            axis,
            found: format!("{}{}", component.digits, component.hemisphere.letter()),
        })
    }
}

#[cfg(test)]
mod test {
    use super::{
        component_pair_to_point, decimal_to_dms, dms_to_decimal, sct_location, Axis,
        CoordinateComponent, CoordinateError, Hemisphere,
    };

    fn component(text: &str) -> CoordinateComponent {
        CoordinateComponent::parse(text).unwrap()
    }

    #[test]
    fn test_dms_to_decimal() {
        let lat = dms_to_decimal("52", "05", "17", Hemisphere::North).unwrap();
        let expected = 52.0 + 5.0 / 60.0 + 17.0 / 3600.0;
        assert!(
            (lat - expected).abs() < 1e-12,
            "left: {lat:?} not equal right: {expected:?}"
        );

        let lng = dms_to_decimal("000", "21", "24", Hemisphere::West).unwrap();
        let expected = -(21.0 / 60.0 + 24.0 / 3600.0);
        assert!(
            (lng - expected).abs() < 1e-12,
            "left: {lng:?} not equal right: {expected:?}"
        );
    }

    #[test]
    fn test_dms_to_decimal_rejects_bad_digits() {
        assert!(matches!(
            dms_to_decimal("5a", "05", "17", Hemisphere::North),
            Err(CoordinateError::DigitGroup {
                field: "degrees",
                ..
            })
        ));
        // longitude degrees need three digits
        assert!(matches!(
            dms_to_decimal("02", "21", "24", Hemisphere::East),
            Err(CoordinateError::DigitGroup {
                field: "degrees",
                expected: 3,
                ..
            })
        ));
        assert!(matches!(
            dms_to_decimal("95", "00", "00", Hemisphere::South),
            Err(CoordinateError::OutOfRange {
                axis: Axis::Latitude,
                ..
            })
        ));
    }

    #[test]
    fn test_hemisphere() {
        assert_eq!("W".parse::<Hemisphere>().unwrap().sign(), -1.0);
        assert_eq!("N".parse::<Hemisphere>().unwrap().sign(), 1.0);
        assert!("X".parse::<Hemisphere>().is_err());
        assert_eq!(Hemisphere::of(0.0, Axis::Latitude), Hemisphere::North);
        assert_eq!(Hemisphere::of(-0.1, Axis::Longitude), Hemisphere::West);
    }

    #[test]
    fn test_component_find_in() {
        let c = CoordinateComponent::find_in("  514739N ").unwrap();
        assert_eq!(c.digits, "514739");
        assert_eq!(c.hemisphere, Hemisphere::North);
        assert_eq!(c.hundredths, None);

        let c = CoordinateComponent::find_in("0012345.5W").unwrap();
        assert_eq!(c.digits, "0012345");
        assert_eq!(c.hundredths.as_deref(), Some("5"));
        assert_eq!(c.sct_fmt().unwrap(), "W001.23.45.50");

        assert!(CoordinateComponent::find_in("FL 195").is_none());
        assert!(CoordinateComponent::parse("2.5").is_err());
    }

    #[test]
    fn test_wrong_digit_count_for_axis() {
        // seven digits with a latitude hemisphere
        let c = component("0520517N");
        assert!(matches!(
            c.to_decimal(),
            Err(CoordinateError::DigitGroup { expected: 6, .. })
        ));
    }

    #[test]
    fn test_sct_location() {
        assert_eq!(
            sct_location(&component("520517N"), &component("0002124E")).unwrap(),
            "N52.05.17.00 E000.21.24.00"
        );
        assert_eq!(
            sct_location(&component("520517N"), &component("0022124E")).unwrap(),
            "N52.05.17.00 E002.21.24.00"
        );
        assert_eq!(
            sct_location(&component("520517.25N"), &component("0002124.07W")).unwrap(),
            "N52.05.17.25 W000.21.24.07"
        );
        assert!(matches!(
            sct_location(&component("0002124E"), &component("520517N")),
            Err(CoordinateError::WrongAxis {
                axis: Axis::Latitude,
                ..
            })
        ));
    }

    #[test]
    fn test_decimal_to_dms() {
        assert_eq!(
            decimal_to_dms(-33.946_111, 151.177_222),
            "S033.56.46.00 E151.10.38.00"
        );
    }

    #[test]
    fn test_seconds_not_renormalised() {
        // 10' 59.996" rounds to 60.00 seconds and stays in minute 10
        let value = 1.0 + 10.0 / 60.0 + 59.996 / 3600.0;
        assert_eq!(decimal_to_dms(value, 0.0), "N001.10.60.00 E000.00.00.00");
    }

    #[test]
    fn test_dms_roundtrip() {
        for lat_deg in (-89..=89).step_by(7) {
            for lng_deg in (-179..=179).step_by(13) {
                for (min, sec) in [(0, 0), (5, 17), (21, 24), (59, 59), (30, 1)] {
                    let lat = make_value(lat_deg, min, sec);
                    let lng = make_value(lng_deg, min, sec);
                    let printed = decimal_to_dms(lat, lng);
                    let (lat_str, lng_str) = printed.split_once(' ').unwrap();
                    let lat_back = reparse(lat_str);
                    let lng_back = reparse(lng_str);
                    // allow the 0.01 second rounding step
                    assert!(
                        (lat_back - lat).abs() <= 0.01 / 3600.0 + 1e-9,
                        "{printed}: {lat_back} != {lat}"
                    );
                    assert!(
                        (lng_back - lng).abs() <= 0.01 / 3600.0 + 1e-9,
                        "{printed}: {lng_back} != {lng}"
                    );
                }
            }
        }
    }

    fn make_value(deg: i32, min: i32, sec: i32) -> f64 {
        let abs = f64::from(deg.abs()) + f64::from(min) / 60.0 + f64::from(sec) / 3600.0;
        if deg < 0 {
            -abs
        } else {
            abs
        }
    }

    fn reparse(field: &str) -> f64 {
        let hemisphere: Hemisphere = field[..1].parse().unwrap();
        let mut parts = field[1..].splitn(3, '.');
        let deg: f64 = parts.next().unwrap().parse().unwrap();
        let min: f64 = parts.next().unwrap().parse().unwrap();
        let sec: f64 = parts.next().unwrap().parse().unwrap();
        hemisphere.sign() * (deg + min / 60.0 + sec / 3600.0)
    }

    #[test]
    fn test_component_pair_to_point() {
        let point = component_pair_to_point(&component("514739N"), &component("0000450W")).unwrap();
        assert!((point.y() - (51.0 + 47.0 / 60.0 + 39.0 / 3600.0)).abs() < 1e-12);
        assert!((point.x() + (4.0 / 60.0 + 50.0 / 3600.0)).abs() < 1e-12);
    }
}
