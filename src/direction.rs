use bevy_derive::{Deref, DerefMut};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::{arc::TurnDirection, TwoKeyMap};

static AREA_TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z]*)\s(FIR|CTA|TMA|CTR)\s?([0-9]{0,2})$").unwrap());
static ATZ_TITLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([A-Z]*)\s(ATZ)$").unwrap());
static TURN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\s)(anti-clockwise|clockwise)(?:\s|$)").unwrap());
static CIRCLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\scircle(?:,|\s)").unwrap());

/// `(area name, arc index) -> direction`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deref, DerefMut)]
pub struct DirectionLookup(pub TwoKeyMap<String, usize, TurnDirection>);

impl DirectionLookup {
    pub fn direction(&self, area: &str, index: usize) -> Option<TurnDirection> {
        self.0.get(&(area.to_string(), index)).copied()
    }

    pub fn insert_direction(&mut self, area: &str, index: usize, direction: TurnDirection) {
        self.0.insert((area.to_string(), index), direction);
    }

    /// Scans the `<p>` texts of a document section. An area title
    /// paragraph is followed by its description; every `clockwise` or
    /// `anti-clockwise` in the description becomes the next arc index of
    /// that area. ATZ descriptions mentioning a circle get index 0.
    pub fn from_paragraphs<S: AsRef<str>>(paragraphs: &[S]) -> Self {
        let mut lookup = Self::default();
        let mut row = 0;

        while row < paragraphs.len() {
            let paragraph = paragraphs[row].as_ref().trim();
            let description = paragraphs.get(row + 1).map(AsRef::as_ref);

            if let (Some(captures), Some(description)) =
                (AREA_TITLE_RE.captures(paragraph), description)
            {
                let area = format!("{} {} {}", &captures[1], &captures[2], &captures[3]);
                let area = area.trim_end();
                let directions = TURN_RE
                    .captures_iter(description)
                    .filter_map(|turn| turn[1].parse::<TurnDirection>().ok())
                    .collect::<Vec<_>>();
                if !directions.is_empty() {
                    debug!("{area}: {} arc directions", directions.len());
                    for (index, direction) in directions.into_iter().enumerate() {
                        lookup.insert_direction(area, index, direction);
                    }
                    row += 1;
                }
            } else if let (Some(captures), Some(description)) =
                (ATZ_TITLE_RE.captures(paragraph), description)
            {
                if CIRCLE_RE.is_match(description) {
                    let area = format!("{} {}", &captures[1], &captures[2]);
                    debug!("{area}: circle");
                    lookup.insert_direction(&area, 0, TurnDirection::Circle);
                    row += 1;
                }
            }
            row += 1;
        }

        lookup
    }
}

#[cfg(test)]
mod test {
    use crate::arc::TurnDirection;

    use super::DirectionLookup;

    #[test]
    fn test_from_paragraphs() {
        let paragraphs = [
            "ENR 2.1 FIR, UIR, TMA AND CTA",
            "BIRMINGHAM CTA 1",
            "520300N 0014000W - then clockwise by the arc of a circle radius 10 NM centred on 522716N 0014452W to 520608N 0013000W - then anti-clockwise by the arc of a circle radius 3 NM centred on 520700N 0012800W to 520300N 0014000W",
            "LONDON CTA",
            "A straight line boundary with no arcs",
            "BRISTOL CTR",
            "512000N 0023000W - then anti-clockwise by the arc of a circle radius 12 NM centred on 512258N 0024309W to 512000N 0023000W",
            "BARTON ATZ",
            "A circle, 2 NM radius, centred at 532814N 0022320W on longest notified runway",
        ];
        let lookup = DirectionLookup::from_paragraphs(&paragraphs);

        assert_eq!(lookup.len(), 4);
        assert_eq!(
            lookup.direction("BIRMINGHAM CTA 1", 0),
            Some(TurnDirection::Clockwise)
        );
        assert_eq!(
            lookup.direction("BIRMINGHAM CTA 1", 1),
            Some(TurnDirection::AntiClockwise)
        );
        assert_eq!(
            lookup.direction("BRISTOL CTR", 0),
            Some(TurnDirection::AntiClockwise)
        );
        assert_eq!(lookup.direction("BARTON ATZ", 0), Some(TurnDirection::Circle));
        assert_eq!(lookup.direction("LONDON CTA", 0), None);
    }

    #[test]
    fn test_title_without_description() {
        let lookup = DirectionLookup::from_paragraphs(&["BRISTOL CTR"]);
        assert!(lookup.is_empty());
    }

    #[test]
    fn test_serialize() {
        let mut lookup = DirectionLookup::default();
        lookup.insert_direction("BARTON ATZ", 0, TurnDirection::Circle);
        assert_eq!(
            serde_json::to_string(&lookup).unwrap(),
            r#"{"BARTON ATZ:0":"circle"}"#
        );
    }
}
