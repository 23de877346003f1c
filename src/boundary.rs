use geo::{point, Point};
use itertools::Itertools as _;
use pest::{iterators::Pair, Parser};
use pest_derive::Parser;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::coordinate::{sct_location, CoordinateComponent, CoordinateError, Hemisphere};

#[derive(Parser)]
#[grammar = "pest/boundary.pest"]
pub struct BoundaryParser;

#[derive(Error, Debug)]
pub enum BoundaryError {
    #[error("failed to parse boundary: {0}")]
    Parse(#[from] pest::error::Error<Rule>),
    #[error("invalid boundary point: {0}")]
    Coordinate(#[from] CoordinateError),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum BoundaryItem {
    Component(CoordinateComponent),
    Formatted(String),
}

impl From<CoordinateComponent> for BoundaryItem {
    fn from(component: CoordinateComponent) -> Self {
        Self::Component(component)
    }
}

/// Joins the point buffer into a `/` separated boundary string.
///
/// Scraped components pair up latitude first. A trailing half pair is
/// dropped.
pub fn assemble_boundary(items: &[BoundaryItem]) -> Result<String, CoordinateError> {
    let mut pending: Vec<&CoordinateComponent> = Vec::with_capacity(2);
    let mut points = vec![];

    for item in items {
        match item {
            BoundaryItem::Formatted(point) => {
                debug_assert!(
                    pending.is_empty(),
                    "arc point {point} interleaved with half a vertex"
                );
                points.push(point.clone());
            }
            BoundaryItem::Component(component) => {
                pending.push(component);
                if let [lat, lng] = pending[..] {
                    points.push(sct_location(lat, lng)?);
                    pending.clear();
                }
            }
        }
    }

    if let [dropped] = pending[..] {
        warn!(
            "dropping unpaired coordinate {}{} at end of boundary",
            dropped.digits,
            dropped.hemisphere.letter()
        );
    }

    Ok(points.iter().join("/"))
}

fn parse_coordinate_part(pair: Pair<Rule>) -> f64 {
    let mut coordinate_part = pair.into_inner();
    let hemisphere: Hemisphere = coordinate_part.next().unwrap().as_str().parse().unwrap();
    let degrees: f64 = coordinate_part.next().unwrap().as_str().parse().unwrap();
    let minutes: f64 = coordinate_part.next().unwrap().as_str().parse().unwrap();
    let seconds: f64 = coordinate_part.next().unwrap().as_str().parse().unwrap();

    hemisphere.sign() * (degrees + minutes / 60.0 + seconds / 3600.0)
}

fn parse_point(pair: Pair<Rule>) -> Point {
    let mut point = pair.into_inner();
    let lat = parse_coordinate_part(point.next().unwrap());
    let lng = parse_coordinate_part(point.next().unwrap());
    point! { x: lng, y: lat }
}

pub fn parse_boundary(boundary: &str) -> Result<Vec<Point>, BoundaryError> {
    let mut pairs = BoundaryParser::parse(Rule::boundary, boundary.trim())?;

    Ok(pairs
        .next()
        .unwrap()
        .into_inner()
        .filter(|pair| matches!(pair.as_rule(), Rule::point))
        .map(parse_point)
        .collect())
}
