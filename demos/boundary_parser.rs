use std::{env::args_os, fs, io};

use eaip_airspace::boundary::parse_boundary;
use geo::{LineString, Polygon};
use geojson::{Feature, FeatureCollection};

fn main() {
    tracing_subscriber::fmt().with_writer(io::stderr).init();
    let path = args_os()
        .nth(1)
        .expect("missing argument: path to boundary file");
    let content = String::from_utf8(fs::read(path).unwrap()).unwrap();

    let feature_collection = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let points = parse_boundary(line).expect("unsuccessful parse");
            let polygon = Polygon::new(LineString::from(points), vec![]);
            Feature {
                geometry: Some((&polygon).into()),
                ..Default::default()
            }
        })
        .collect::<FeatureCollection>();

    println!("{feature_collection}");
}
