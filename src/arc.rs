use std::{fmt::Display, str::FromStr};

use geo::{Bearing as _, Destination as _, Distance as _, Geodesic, Point};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;
use uom::si::f64::Length;
use uom::si::length::{meter, nautical_mile};

use crate::DmsExt as _;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArcError {
    #[error("invalid direction of turn {0}, expected 1 (clockwise), 2 (anti-clockwise) or 3 (circle)")]
    InvalidDirection(u8),
    #[error("unknown direction of turn `{0}`")]
    UnknownDirection(String),
    #[error("invalid geodesic input: {what} {value}")]
    Geodesy { what: &'static str, value: f64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, FromPrimitive, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TurnDirection {
    Clockwise = 1,
    AntiClockwise = 2,
    Circle = 3,
}

impl TurnDirection {
    pub fn from_code(code: u8) -> Result<Self, ArcError> {
        Self::from_u8(code).ok_or(ArcError::InvalidDirection(code))
    }

    /// Picks the direction named in an arc description such as
    /// `then clockwise by the arc of a circle radius 2.5 NM centred on`.
    pub fn from_description(text: &str) -> Option<Self> {
        let lowercase = text.to_lowercase();
        if lowercase.contains("anti-clockwise") || lowercase.contains("anticlockwise") {
            Some(Self::AntiClockwise)
        } else if lowercase.starts_with("a circle,") || lowercase.starts_with("a radius, centred at")
        {
            Some(Self::Circle)
        } else if lowercase.contains(" clockwise ") {
            Some(Self::Clockwise)
        } else {
            None
        }
    }

    fn step(self) -> f64 {
        match self {
            Self::AntiClockwise => -1.0,
            Self::Clockwise | Self::Circle => 1.0,
        }
    }
}

impl Display for TurnDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Clockwise => f.write_str("clockwise"),
            Self::AntiClockwise => f.write_str("anti-clockwise"),
            Self::Circle => f.write_str("circle"),
        }
    }
}

impl FromStr for TurnDirection {
    type Err = ArcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "clockwise" | "cw" | "1" => Ok(Self::Clockwise),
            "anti-clockwise" | "anticlockwise" | "acw" | "2" => Ok(Self::AntiClockwise),
            "circle" | "3" => Ok(Self::Circle),
            other => Err(ArcError::UnknownDirection(other.to_string())),
        }
    }
}

pub const DEFAULT_CIRCLE_RADIUS_NM: f64 = 2.5;

#[derive(Clone, Debug, PartialEq)]
pub enum ArcSpec {
    Arc {
        centre: Point,
        start: Point,
        end: Point,
        direction: TurnDirection,
    },
    Circle {
        centre: Point,
        radius: Length,
    },
}

impl ArcSpec {
    /// Builds the arc the way arcs are described in the detail tables:
    /// a direction with start, centre and end, where circles only use the
    /// centre and radius.
    pub fn new(
        direction: TurnDirection,
        centre: Point,
        start: Point,
        end: Point,
        radius: Length,
    ) -> Self {
        match direction {
            TurnDirection::Circle => Self::Circle { centre, radius },
            direction => Self::Arc {
                centre,
                start,
                end,
                direction,
            },
        }
    }

    pub fn direction(&self) -> TurnDirection {
        match self {
            Self::Arc { direction, .. } => *direction,
            Self::Circle { .. } => TurnDirection::Circle,
        }
    }

    pub fn tessellate(&self) -> Result<Vec<Point>, ArcError> {
        match *self {
            Self::Arc {
                centre,
                start,
                end,
                direction,
            } => {
                check_point("centre", centre)?;
                check_point("start", start)?;
                check_point("end", end)?;

                let start_bearing = compass_bearing(Geodesic::bearing(centre, start));
                let end_bearing = compass_bearing(Geodesic::bearing(centre, end));
                let distance = Geodesic::distance(centre, start);
                check_finite("start bearing", start_bearing)?;
                check_finite("end bearing", end_bearing)?;
                check_finite("distance", distance)?;

                sweep(centre, start_bearing, end_bearing, distance, direction.step())
            }
            Self::Circle { centre, radius } => {
                check_point("centre", centre)?;
                let distance = radius.get::<meter>();
                if !distance.is_finite() || distance <= 0.0 {
                    return Err(ArcError::Geodesy {
                        what: "radius",
                        value: radius.get::<nautical_mile>(),
                    });
                }

                sweep(centre, 0.0, 359.0, distance, TurnDirection::Circle.step())
            }
        }
    }

    pub fn generate(&self) -> Result<Vec<String>, ArcError> {
        Ok(self.tessellate()?.iter().map(|p| p.dms_fmt()).collect())
    }
}

pub fn generate_arc(
    centre: Point,
    start: Point,
    end: Point,
    direction: TurnDirection,
    radius_nm: Option<f64>,
) -> Result<Vec<String>, ArcError> {
    let radius =
        Length::new::<nautical_mile>(radius_nm.unwrap_or(DEFAULT_CIRCLE_RADIUS_NM));
    ArcSpec::new(direction, centre, start, end, radius).generate()
}

fn compass_bearing(bearing: f64) -> f64 {
    bearing.rem_euclid(360.0)
}

fn rounded_bearing(bearing: f64) -> i64 {
    (bearing.round() as i64).rem_euclid(360)
}

/// Steps from `bearing` towards `target` until both round to the same
/// whole degree. The step is exactly one degree, so the rounded bearing
/// visits every whole degree and the loop ends within 360 steps.
fn sweep(
    centre: Point,
    mut bearing: f64,
    target: f64,
    distance: f64,
    step: f64,
) -> Result<Vec<Point>, ArcError> {
    let target = rounded_bearing(target);
    let mut points = vec![];
    while rounded_bearing(bearing) != target {
        let point = Geodesic::destination(centre, bearing, distance);
        check_point("destination", point)?;
        trace!("arc bearing {bearing:.3}: {point:?}");
        points.push(point);
        bearing = compass_bearing(bearing + step);
    }

    Ok(points)
}

fn check_finite(what: &'static str, value: f64) -> Result<(), ArcError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ArcError::Geodesy { what, value })
    }
}

fn check_point(what: &'static str, point: Point) -> Result<(), ArcError> {
    check_finite(what, point.y())?;
    check_finite(what, point.x())?;
    if point.y().abs() > 90.0 {
        return Err(ArcError::Geodesy {
            what,
            value: point.y(),
        });
    }
    if point.x().abs() > 180.0 {
        return Err(ArcError::Geodesy {
            what,
            value: point.x(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use geo::{point, Destination as _, Distance as _, Geodesic, Point};
    use uom::si::{f64::Length, length::nautical_mile};

    use super::{generate_arc, ArcError, ArcSpec, TurnDirection};

    fn heathrow() -> Point {
        point! { x: -0.461_389, y: 51.4775 }
    }

    #[test]
    fn test_direction_codes() {
        assert_eq!(TurnDirection::from_code(1), Ok(TurnDirection::Clockwise));
        assert_eq!(TurnDirection::from_code(2), Ok(TurnDirection::AntiClockwise));
        assert_eq!(TurnDirection::from_code(3), Ok(TurnDirection::Circle));
        assert_eq!(TurnDirection::from_code(0), Err(ArcError::InvalidDirection(0)));
        assert_eq!(TurnDirection::from_code(4), Err(ArcError::InvalidDirection(4)));
        assert_eq!(
            "anti-clockwise".parse::<TurnDirection>(),
            Ok(TurnDirection::AntiClockwise)
        );
        assert!("widdershins".parse::<TurnDirection>().is_err());
    }

    #[test]
    fn test_direction_from_description() {
        assert_eq!(
            TurnDirection::from_description(
                "then clockwise by the arc of a circle radius 2 NM centred on"
            ),
            Some(TurnDirection::Clockwise)
        );
        assert_eq!(
            TurnDirection::from_description(
                "then anti-clockwise by the arc of a circle radius 10 NM centred on"
            ),
            Some(TurnDirection::AntiClockwise)
        );
        assert_eq!(
            TurnDirection::from_description("A circle, 2 NM radius, centred at"),
            Some(TurnDirection::Circle)
        );
        assert_eq!(TurnDirection::from_description("along the coastline"), None);
    }

    #[test]
    fn test_full_circle() {
        let centre = heathrow();
        let points = ArcSpec::Circle {
            centre,
            radius: Length::new::<nautical_mile>(2.5),
        }
        .tessellate()
        .unwrap();

        // bearings 0..=358, the loop stops when it reaches 359
        assert_eq!(points.len(), 359);
        for p in &points {
            let distance = Geodesic::distance(centre, *p);
            assert!(
                (distance - 2.5 * 1852.0).abs() < 0.01,
                "{p:?} is {distance} m from the centre"
            );
        }
        // bearing 0 is due north
        assert!(points[0].y() > centre.y());
        assert!((points[0].x() - centre.x()).abs() < 1e-9);
    }

    #[test]
    fn test_circle_ignores_start_and_end() {
        let centre = heathrow();
        let far = point! { x: 10.0, y: 10.0 };
        let strings = generate_arc(centre, far, far, TurnDirection::Circle, None).unwrap();
        assert_eq!(strings.len(), 359);
        assert!(strings[0].starts_with("N051.") && strings[0].contains(" W000."));
    }

    #[test]
    fn test_zero_length_arc() {
        let centre = heathrow();
        let start = Geodesic::destination(centre, 90.2, 5000.0);
        let end = Geodesic::destination(centre, 89.9, 5000.0);
        for direction in [TurnDirection::Clockwise, TurnDirection::AntiClockwise] {
            let points = ArcSpec::Arc {
                centre,
                start,
                end,
                direction,
            }
            .tessellate()
            .unwrap();
            assert!(points.is_empty(), "{direction}: {points:?}");
        }
    }

    #[test]
    fn test_quarter_arcs() {
        let centre = heathrow();
        let start = Geodesic::destination(centre, 0.0, 10_000.0);
        let end = Geodesic::destination(centre, 90.0, 10_000.0);

        let clockwise = ArcSpec::Arc {
            centre,
            start,
            end,
            direction: TurnDirection::Clockwise,
        }
        .tessellate()
        .unwrap();
        // 0..=89
        assert_eq!(clockwise.len(), 90);
        assert!(clockwise.iter().all(|p| p.x() >= centre.x() - 1e-9));

        let anti_clockwise = ArcSpec::Arc {
            centre,
            start,
            end,
            direction: TurnDirection::AntiClockwise,
        }
        .tessellate()
        .unwrap();
        // 0, 359, ..., 91
        assert_eq!(anti_clockwise.len(), 270);
        assert!(anti_clockwise[1].x() < centre.x());
        for p in anti_clockwise {
            let distance = Geodesic::distance(centre, p);
            assert!((distance - 10_000.0).abs() < 0.01);
        }
    }

    #[test]
    fn test_arc_crossing_north() {
        let centre = point! { x: 1.0, y: 50.0 };
        let start = Geodesic::destination(centre, 350.0, 4000.0);
        let end = Geodesic::destination(centre, 10.0, 4000.0);
        let points = ArcSpec::Arc {
            centre,
            start,
            end,
            direction: TurnDirection::Clockwise,
        }
        .tessellate()
        .unwrap();
        assert_eq!(points.len(), 20);
    }

    #[test]
    fn test_invalid_geodesic_input() {
        let centre = heathrow();
        let bad = point! { x: f64::NAN, y: 51.0 };
        assert!(matches!(
            generate_arc(centre, bad, centre, TurnDirection::Clockwise, None),
            Err(ArcError::Geodesy { what: "start", .. })
        ));
        let out_of_range = point! { x: 0.0, y: 91.0 };
        assert!(matches!(
            generate_arc(out_of_range, centre, centre, TurnDirection::Circle, None),
            Err(ArcError::Geodesy { what: "centre", .. })
        ));
        assert!(matches!(
            generate_arc(centre, centre, centre, TurnDirection::Circle, Some(0.0)),
            Err(ArcError::Geodesy { what: "radius", .. })
        ));
    }
}
