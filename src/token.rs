use std::io;

use once_cell::sync::Lazy;
use phf::phf_map;
use regex::Regex;
use serde::Serialize;
use tracing::trace;

use crate::{coordinate::CoordinateComponent, read_to_string};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Title,
    DangerId,
    Coordinate,
    ArcCentre,
    Callsign,
    Frequency,
    Arc,
    UpperLimit,
    LowerLimit,
    Class,
    Other,
}

static MARKERS: phf::Map<&'static str, TokenKind> = phf_map! {
    "TAIRSPACE;TXT_NAME" => TokenKind::Title,
    "TAIRSPACE;CODE_ID" => TokenKind::DangerId,
    "TAIRSPACE_VERTEX;GEO_LAT" => TokenKind::Coordinate,
    "TAIRSPACE_VERTEX;GEO_LONG" => TokenKind::Coordinate,
    "TAIRSPACE_VERTEX;GEO_LAT_ARC" => TokenKind::ArcCentre,
    "TAIRSPACE_VERTEX;GEO_LONG_ARC" => TokenKind::ArcCentre,
    "TAIRSPACE_VERTEX;VAL_RADIUS_ARC" => TokenKind::Arc,
    "TUNIT;TXT_NAME" => TokenKind::Callsign,
    "TFREQUENCY;VAL_FREQ_TRANS" => TokenKind::Frequency,
    "TAIRSPACE_LAYER_CLASS;CODE_CLASS" => TokenKind::Class,
    "TAIRSPACE_VOLUME;VAL_DIST_VER_UPPER" => TokenKind::UpperLimit,
    "TAIRSPACE_VOLUME;VAL_DIST_VER_LOWER" => TokenKind::LowerLimit,
};

static MARKER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"T[A-Z_]+;[A-Z_]+").unwrap());

impl TokenKind {
    pub fn classify(text: &str) -> Self {
        MARKER_RE
            .find_iter(text)
            .find_map(|marker| MARKERS.get(marker.as_str()).copied())
            .unwrap_or(Self::Other)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Token<'a> {
    pub text: &'a str,
    pub kind: TokenKind,
}

impl Token<'_> {
    pub fn coordinate(&self) -> Option<CoordinateComponent> {
        if self.kind == TokenKind::Other {
            CoordinateComponent::find_in(self.text)
        } else {
            None
        }
    }
}

pub fn classify<S: AsRef<str>>(tokens: &[S]) -> Vec<Token<'_>> {
    tokens
        .iter()
        .map(|text| {
            let text = text.as_ref();
            let kind = TokenKind::classify(text);
            trace!("{kind:?}: {text}");
            Token { text, kind }
        })
        .collect()
}

/// Token file as handed over by the scraper: one token per line, blank
/// lines skipped.
pub fn read_tokens(content: &[u8]) -> Result<Vec<String>, io::Error> {
    Ok(read_to_string(content)?
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanDirection {
    Backward,
    Forward,
}

/// Index of the nearest token matching `predicate`, looking at most
/// `max_distance` tokens away from `from` (exclusive) in `direction`.
pub fn find_nearest_matching<'a, P>(
    tokens: &[Token<'a>],
    from: usize,
    direction: ScanDirection,
    max_distance: usize,
    predicate: P,
) -> Option<usize>
where
    P: Fn(&Token<'a>) -> bool,
{
    (1..=max_distance)
        .map_while(|distance| match direction {
            ScanDirection::Backward => from.checked_sub(distance),
            ScanDirection::Forward => Some(from + distance).filter(|&i| i < tokens.len()),
        })
        .find(|&i| predicate(&tokens[i]))
}
