use std::{collections::HashSet, fmt::Display, mem};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace, warn};
use uom::si::f64::Length;
use uom::si::length::{meter, nautical_mile};

use crate::{
    arc::{ArcError, ArcSpec, TurnDirection},
    boundary::{assemble_boundary, BoundaryItem},
    config::{ArcIndexing, ParseMode, ParserConfig},
    coordinate::{component_pair_to_point, Axis, CoordinateComponent, CoordinateError},
    direction::DirectionLookup,
    token::{classify, find_nearest_matching, ScanDirection, Token, TokenKind},
};

pub const DEFAULT_FREQUENCY: &str = "000.000";
pub const DEFAULT_LIMIT: &str = "000";
pub const DEFAULT_CLASS: &str = "E";

#[derive(Error, Debug)]
pub enum AirspaceError {
    #[error(transparent)]
    Coordinate(#[from] CoordinateError),
    #[error(transparent)]
    Arc(#[from] ArcError),
    #[error("no {anchor} within {max_distance} tokens of token {index}")]
    MissingAnchor {
        anchor: &'static str,
        index: usize,
        max_distance: usize,
    },
    #[error("no direction of turn for arc {index} of {area}")]
    UnknownDirection { area: String, index: usize },
    #[error("missing {what} for marker at token {index}")]
    MissingValue { what: &'static str, index: usize },
    #[error("invalid country prefix: {0}")]
    Pattern(#[from] regex::Error),
    #[error("{name}: {source}")]
    InAirspace {
        name: String,
        source: Box<AirspaceError>,
    },
}

impl AirspaceError {
    fn in_airspace(name: &str, source: Self) -> Self {
        match source {
            Self::InAirspace { .. } => source,
            source => Self::InAirspace {
                name: name.to_string(),
                source: Box::new(source),
            },
        }
    }
}

static KIND_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(FIR|UIR|CTA|TMA|CTR|ATZ|RMZ)").unwrap());

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AirspaceKind {
    Fir,
    Uir,
    Cta,
    Tma,
    Ctr,
    Atz,
    Rmz,
    Danger,
}

impl AirspaceKind {
    pub fn from_title(title: &str) -> Option<Self> {
        KIND_RE.find(title).and_then(|kind| match kind.as_str() {
            "FIR" => Some(Self::Fir),
            "UIR" => Some(Self::Uir),
            "CTA" => Some(Self::Cta),
            "TMA" => Some(Self::Tma),
            "CTR" => Some(Self::Ctr),
            "ATZ" => Some(Self::Atz),
            "RMZ" => Some(Self::Rmz),
            _ => None,
        })
    }
}

impl Display for AirspaceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Fir => "FIR",
            Self::Uir => "UIR",
            Self::Cta => "CTA",
            Self::Tma => "TMA",
            Self::Ctr => "CTR",
            Self::Atz => "ATZ",
            Self::Rmz => "RMZ",
            Self::Danger => "danger area",
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AirspaceRecord {
    pub name: String,
    pub callsign: String,
    pub frequency: String,
    pub boundary: String,
    pub upper_limit: String,
    pub lower_limit: String,
    pub class: String,
}

/// One table per output kind. UIRs share the FIR extent, every FIR is
/// stored in both. The ATZ table collects everything drawn around
/// aerodromes: ATZs, RMZs and CTRs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AirspaceTables {
    pub fir: Vec<AirspaceRecord>,
    pub uir: Vec<AirspaceRecord>,
    pub cta: Vec<AirspaceRecord>,
    pub tma: Vec<AirspaceRecord>,
    pub ctr: Vec<AirspaceRecord>,
    pub atz: Vec<AirspaceRecord>,
    pub danger: Vec<AirspaceRecord>,
}

impl AirspaceTables {
    fn insert(&mut self, kind: AirspaceKind, record: AirspaceRecord) {
        match kind {
            AirspaceKind::Fir => {
                self.uir.push(record.clone());
                self.fir.push(record);
            }
            AirspaceKind::Uir => {
                warn!("{}: UIRs are copied from the FIR, skipping", record.name);
            }
            AirspaceKind::Cta => self.cta.push(record),
            AirspaceKind::Tma => self.tma.push(record),
            AirspaceKind::Ctr => {
                self.atz.push(record.clone());
                self.ctr.push(record);
            }
            AirspaceKind::Atz | AirspaceKind::Rmz => self.atz.push(record),
            AirspaceKind::Danger => self.danger.push(record),
        }
    }

    pub fn table(&self, kind: AirspaceKind) -> &[AirspaceRecord] {
        match kind {
            AirspaceKind::Fir => &self.fir,
            AirspaceKind::Uir => &self.uir,
            AirspaceKind::Cta => &self.cta,
            AirspaceKind::Tma => &self.tma,
            AirspaceKind::Ctr => &self.ctr,
            AirspaceKind::Atz | AirspaceKind::Rmz => &self.atz,
            AirspaceKind::Danger => &self.danger,
        }
    }

    pub fn is_empty(&self) -> bool {
        [
            &self.fir,
            &self.uir,
            &self.cta,
            &self.tma,
            &self.ctr,
            &self.atz,
            &self.danger,
        ]
        .iter()
        .all(|table| table.is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Termination {
    EndOfStream,
    Sentinel { identifier: String, index: usize },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParsedAirspaces {
    pub tables: AirspaceTables,
    pub termination: Termination,
}

pub type AirspaceResult = Result<ParsedAirspaces, AirspaceError>;

#[derive(Debug)]
struct OpenAirspace {
    name: String,
    kind: AirspaceKind,
    callsign: Option<String>,
    items: Vec<BoundaryItem>,
    arcs_seen: usize,
    seen: HashSet<TokenKind>,
}

impl OpenAirspace {
    fn new(name: String, kind: AirspaceKind) -> Self {
        Self {
            name,
            kind,
            callsign: None,
            items: vec![],
            arcs_seen: 0,
            seen: HashSet::new(),
        }
    }
}

/// Values that are not reset between records. A record without its own
/// frequency, limits or class reports those of the record before it.
#[derive(Debug)]
struct LayerValues {
    frequency: String,
    upper_limit: String,
    lower_limit: String,
    class: String,
}

impl Default for LayerValues {
    fn default() -> Self {
        Self {
            frequency: DEFAULT_FREQUENCY.to_string(),
            upper_limit: DEFAULT_LIMIT.to_string(),
            lower_limit: DEFAULT_LIMIT.to_string(),
            class: DEFAULT_CLASS.to_string(),
        }
    }
}

#[derive(Debug)]
enum State {
    SeekingTitle,
    Accumulating(OpenAirspace),
}

struct AirspaceParser<'a> {
    tokens: Vec<Token<'a>>,
    lookup: &'a DirectionLookup,
    config: &'a ParserConfig,
    danger_re: Regex,
    sentinel_re: Regex,
    layer: LayerValues,
    state: State,
    tables: AirspaceTables,
}

impl<'a> AirspaceParser<'a> {
    fn new<S: AsRef<str>>(
        tokens: &'a [S],
        lookup: &'a DirectionLookup,
        config: &'a ParserConfig,
    ) -> Result<Self, AirspaceError> {
        let country = regex::escape(&config.country);
        Ok(Self {
            tokens: classify(tokens),
            lookup,
            config,
            danger_re: Regex::new(&format!(r"{country}\s[DPR]\d{{3}}[A-Z]*"))?,
            sentinel_re: Regex::new(&format!(r"{country}\sRU\d{{3}}[A-Z]*"))?,
            layer: LayerValues::default(),
            state: State::SeekingTitle,
            tables: AirspaceTables::default(),
        })
    }

    fn run(mut self) -> AirspaceResult {
        for index in 0..self.tokens.len() {
            let step = self.step(index).map_err(|e| self.with_context(e))?;
            if let Some(termination) = step {
                return Ok(ParsedAirspaces {
                    tables: self.tables,
                    termination,
                });
            }
        }
        self.close()?;

        Ok(ParsedAirspaces {
            tables: self.tables,
            termination: Termination::EndOfStream,
        })
    }

    fn with_context(&self, error: AirspaceError) -> AirspaceError {
        match &self.state {
            State::Accumulating(open) => AirspaceError::in_airspace(&open.name, error),
            State::SeekingTitle => error,
        }
    }

    fn step(&mut self, index: usize) -> Result<Option<Termination>, AirspaceError> {
        match self.tokens[index].kind {
            TokenKind::Title => self.title(index)?,
            TokenKind::DangerId => return self.danger_id(index),
            TokenKind::Callsign => {
                let callsign = self.value_before(index, "callsign")?;
                if let State::Accumulating(open) = &mut self.state {
                    if open.callsign.is_none() {
                        open.callsign = Some(callsign.to_string());
                    }
                }
            }
            TokenKind::Frequency => {
                let value = self.value_before(index, "frequency")?;
                if self.first_in_airspace(TokenKind::Frequency) {
                    self.layer.frequency = value.to_string();
                }
            }
            TokenKind::UpperLimit => {
                let value = self.value_before(index, "upper limit")?;
                if self.first_in_airspace(TokenKind::UpperLimit) {
                    self.layer.upper_limit = value.to_string();
                }
            }
            TokenKind::LowerLimit => {
                let value = self.value_before(index, "lower limit")?;
                if self.first_in_airspace(TokenKind::LowerLimit) {
                    self.layer.lower_limit = value.to_string();
                }
            }
            TokenKind::Class => {
                let value = self.value_before(index, "airspace class")?;
                if self.first_in_airspace(TokenKind::Class) {
                    self.layer.class = value.to_string();
                }
            }
            TokenKind::Coordinate => self.vertex(index)?,
            TokenKind::Arc => self.arc(index)?,
            TokenKind::ArcCentre | TokenKind::Other => {}
        }

        Ok(None)
    }

    fn value_before(&self, index: usize, what: &'static str) -> Result<&'a str, AirspaceError> {
        index
            .checked_sub(1)
            .map(|i| self.tokens[i].text.trim())
            .ok_or(AirspaceError::MissingValue { what, index })
    }

    /// True for the first token of `kind` since the current airspace was
    /// opened. Outside of an airspace every occurrence counts.
    fn first_in_airspace(&mut self, kind: TokenKind) -> bool {
        match &mut self.state {
            State::Accumulating(open) => open.seen.insert(kind),
            State::SeekingTitle => true,
        }
    }

    fn title(&mut self, index: usize) -> Result<(), AirspaceError> {
        let title = self.value_before(index, "airspace name")?;
        if self.config.mode == ParseMode::DangerAreas {
            trace!("{title}: names do not open danger areas");
            return Ok(());
        }
        match AirspaceKind::from_title(title) {
            Some(kind) => self.open(title.to_string(), kind),
            None => {
                warn!("{title}: no airspace kind in name, ignoring");
                Ok(())
            }
        }
    }

    fn danger_id(&mut self, index: usize) -> Result<Option<Termination>, AirspaceError> {
        let identifier = self.value_before(index, "danger area identifier")?;

        if self.sentinel_re.is_match(identifier) {
            if let State::Accumulating(open) = &self.state {
                warn!(
                    "{}: discarded, table ends at {identifier}",
                    open.name
                );
            }
            debug!("{identifier}: stop scanning at token {index}");
            return Ok(Some(Termination::Sentinel {
                identifier: identifier.to_string(),
                index,
            }));
        }

        if self.danger_re.is_match(identifier) {
            let name = self
                .tokens
                .get(index + 1)
                .map(|token| token.text.trim())
                .ok_or(AirspaceError::MissingValue {
                    what: "danger area name",
                    index,
                })?;
            self.open(name.to_string(), AirspaceKind::Danger)?;
        }

        Ok(None)
    }

    fn open(&mut self, name: String, kind: AirspaceKind) -> Result<(), AirspaceError> {
        self.close()?;
        debug!("opening {kind} {name}");
        self.state = State::Accumulating(OpenAirspace::new(name, kind));
        Ok(())
    }

    fn close(&mut self) -> Result<(), AirspaceError> {
        let State::Accumulating(open) = mem::replace(&mut self.state, State::SeekingTitle) else {
            return Ok(());
        };
        if open.items.is_empty() {
            warn!("{}: no vertices, dropping", open.name);
            return Ok(());
        }

        let boundary = assemble_boundary(&open.items)
            .map_err(|e| AirspaceError::in_airspace(&open.name, e.into()))?;
        let (callsign, frequency, class) = match (open.kind, self.config.mode) {
            (AirspaceKind::Danger, _) => (String::new(), DEFAULT_FREQUENCY.to_string(), String::new()),
            (_, ParseMode::Aerodrome) => (
                open.name.clone(),
                self.layer.frequency.clone(),
                self.layer.class.clone(),
            ),
            _ => (
                open.callsign.unwrap_or_default(),
                self.layer.frequency.clone(),
                self.layer.class.clone(),
            ),
        };
        let record = AirspaceRecord {
            name: open.name,
            callsign,
            frequency,
            boundary,
            upper_limit: self.layer.upper_limit.clone(),
            lower_limit: self.layer.lower_limit.clone(),
            class,
        };
        debug!("closing {} {}", open.kind, record.name);
        self.tables.insert(open.kind, record);

        Ok(())
    }

    fn vertex(&mut self, index: usize) -> Result<(), AirspaceError> {
        let value = self.value_before(index, "vertex coordinate")?;
        let component = CoordinateComponent::parse(value)?;
        match &mut self.state {
            State::Accumulating(open) => open.items.push(component.into()),
            State::SeekingTitle => trace!("vertex {value} outside of an airspace"),
        }
        Ok(())
    }

    fn anchor(
        &self,
        from: usize,
        direction: ScanDirection,
        axis: Axis,
        anchor: &'static str,
    ) -> Result<(usize, CoordinateComponent), AirspaceError> {
        let max_distance = self.config.max_anchor_distance;
        find_nearest_matching(&self.tokens, from, direction, max_distance, |token| {
            token
                .coordinate()
                .is_some_and(|component| component.axis() == axis)
        })
        .and_then(|i| Some((i, self.tokens[i].coordinate()?)))
        .ok_or(AirspaceError::MissingAnchor {
            anchor,
            index: from,
            max_distance,
        })
    }

    /// Radius cell right before the arc marker. Large values are metres.
    fn radius(&self, index: usize) -> Length {
        let value = index
            .checked_sub(1)
            .and_then(|i| self.tokens[i].text.split_whitespace().next())
            .and_then(|value| value.parse::<f64>().ok());
        match value {
            Some(value) if value > self.config.metre_radius_threshold => {
                Length::new::<meter>(value)
            }
            Some(value) => Length::new::<nautical_mile>(value),
            None => {
                debug!("no radius before token {index}, using the default");
                Length::new::<nautical_mile>(self.config.default_circle_radius_nm)
            }
        }
    }

    fn arc(&mut self, index: usize) -> Result<(), AirspaceError> {
        let (area, arc_index) = match &mut self.state {
            State::Accumulating(open) => {
                let arc_index = match self.config.arc_indexing {
                    ArcIndexing::Frozen => 0,
                    ArcIndexing::Sequential => open.arcs_seen,
                };
                open.arcs_seen += 1;
                (open.name.clone(), arc_index)
            }
            State::SeekingTitle => {
                warn!("arc at token {index} outside of an airspace");
                return Ok(());
            }
        };

        let described = index
            .checked_sub(2)
            .and_then(|i| TurnDirection::from_description(self.tokens[i].text));
        let Some(direction) = self.lookup.direction(&area, arc_index) else {
            if let Some(described) = described {
                debug!("{area}: no direction for arc {arc_index}, table text says {described}");
            }
            return Err(AirspaceError::UnknownDirection {
                area,
                index: arc_index,
            });
        };
        if described.is_some_and(|described| described != direction) {
            debug!("{area}: arc {arc_index} is {direction} by lookup, table text disagrees");
        }

        let (centre_lat_index, centre_lat) =
            self.anchor(index, ScanDirection::Forward, Axis::Latitude, "centre latitude")?;
        let (centre_lng_index, centre_lng) = self.anchor(
            centre_lat_index,
            ScanDirection::Forward,
            Axis::Longitude,
            "centre longitude",
        )?;
        let centre = component_pair_to_point(&centre_lat, &centre_lng)?;

        let arc = if direction == TurnDirection::Circle {
            ArcSpec::Circle {
                centre,
                radius: self.radius(index),
            }
        } else {
            let (start_lng_index, start_lng) =
                self.anchor(index, ScanDirection::Backward, Axis::Longitude, "start longitude")?;
            let (_, start_lat) = self.anchor(
                start_lng_index,
                ScanDirection::Backward,
                Axis::Latitude,
                "start latitude",
            )?;
            let (end_lat_index, end_lat) = self.anchor(
                centre_lng_index,
                ScanDirection::Forward,
                Axis::Latitude,
                "end latitude",
            )?;
            let (_, end_lng) = self.anchor(
                end_lat_index,
                ScanDirection::Forward,
                Axis::Longitude,
                "end longitude",
            )?;
            ArcSpec::Arc {
                centre,
                start: component_pair_to_point(&start_lat, &start_lng)?,
                end: component_pair_to_point(&end_lat, &end_lng)?,
                direction,
            }
        };

        let points = arc.generate()?;
        debug!("{area}: {direction} arc expanded into {} points", points.len());
        if let State::Accumulating(open) = &mut self.state {
            open.items
                .extend(points.into_iter().map(BoundaryItem::Formatted));
        }

        Ok(())
    }
}

pub fn parse_airspaces<'a, S: AsRef<str>>(
    tokens: &'a [S],
    lookup: &'a DirectionLookup,
    config: &'a ParserConfig,
) -> AirspaceResult {
    AirspaceParser::new(tokens, lookup, config)?.run()
}
