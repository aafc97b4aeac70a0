use std::str::FromStr;

use log::debug;

use crate::catalog::field;
use crate::catalog::r#type::FieldType;
use crate::error::Error;
use crate::error::Result;
use crate::parse_err;
use crate::sql::compiler::fields::smart_split;
use crate::sql::compiler::Context;
use crate::sql::parser::lexer::{Keyword, Span, Token};
use crate::sql::parser::{Clause, Rewriter};
use crate::value_err;

/// Kilometers per degree of latitude.
const KM_PER_LAT_DEGREE: f64 = 111.0;
/// Kilometers per degree of longitude at the equator.
const KM_PER_LON_DEGREE: f64 = 111.321;
const KM_PER_MILE: f64 = 1.60934;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DistanceUnit {
    Kilometers,
    Miles,
}

impl FromStr for DistanceUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "kilometers" | "kilometres" | "km" => Ok(DistanceUnit::Kilometers),
            "miles" | "mi" => Ok(DistanceUnit::Miles),
            _ => Err(parse_err!("Unknown distance unit '{}'", s)),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Distance {
    pub value: f64,
    pub unit: DistanceUnit,
}

impl Distance {
    pub fn km(&self) -> f64 {
        match self.unit {
            DistanceUnit::Kilometers => self.value,
            DistanceUnit::Miles => self.value * KM_PER_MILE,
        }
    }
}

impl FromStr for Distance {
    type Err = Error;

    /// Parses `<number> <unit>`, e.g. `50 km`.
    fn from_str(s: &str) -> Result<Self> {
        let parts = s.split_whitespace().collect::<Vec<_>>();
        let [value, unit] = &parts[..] else {
            return Err(parse_err!("Distance '{}' must be a number followed by a unit", s.trim()));
        };
        let value = parse_number(value, "Distance")?;
        if value < 0.0 {
            return Err(parse_err!("Distance '{}' can't be negative", s.trim()));
        }
        Ok(Distance { value, unit: unit.parse()? })
    }
}

/// The arguments of `NEAR (latitude, longitude, distance)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Near {
    pub latitude: f64,
    pub longitude: f64,
    pub distance: Distance,
}

impl FromStr for Near {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let args = smart_split(',', s);
        let [latitude, longitude, distance] = &args[..] else {
            return Err(parse_err!(
                "NEAR takes a latitude, a longitude and a distance, got '({})'",
                s.trim()
            ));
        };
        let latitude = parse_number(latitude, "Latitude")?;
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(parse_err!("Latitude '{}' must be between -90 and 90", latitude));
        }
        let longitude = parse_number(longitude, "Longitude")?;
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(parse_err!("Longitude '{}' must be between -180 and 180", longitude));
        }
        Ok(Near { latitude, longitude, distance: distance.parse()? })
    }
}

impl Near {
    /// The rectangle enclosing the circle of the given distance around
    /// the point. Not a great-circle filter: corners match too.
    pub fn bounding_box(&self) -> BoundingBox {
        let km = self.distance.km();
        let lat_delta = km / KM_PER_LAT_DEGREE;
        let lon_delta = km / (self.latitude.to_radians().cos() * KM_PER_LON_DEGREE);
        BoundingBox {
            min_lat: (self.latitude - lat_delta).clamp(-90.0, 90.0),
            max_lat: (self.latitude + lat_delta).clamp(-90.0, 90.0),
            min_lon: (self.longitude - lon_delta).clamp(-180.0, 180.0),
            max_lon: (self.longitude + lon_delta).clamp(-180.0, 180.0),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn lat_delta(&self) -> f64 {
        (self.max_lat - self.min_lat) / 2.0
    }

    pub fn lon_delta(&self) -> f64 {
        (self.max_lon - self.min_lon) / 2.0
    }

    /// Renders the box as a predicate over the given columns.
    pub fn to_sql(&self, lat_column: &str, lon_column: &str) -> String {
        format!(
            "({lat} >= {} AND {lat} <= {} AND {lon} >= {} AND {lon} <= {})",
            self.min_lat,
            self.max_lat,
            self.min_lon,
            self.max_lon,
            lat = lat_column,
            lon = lon_column
        )
    }
}

/// Parses a finite number; `NaN` and infinities are rejected.
fn parse_number(s: &str, what: &str) -> Result<f64> {
    match s.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(parse_err!("{} '{}' is not a number", what, s.trim())),
    }
}

/// Replaces every `field NEAR (lat, lon, distance)` predicate of the where
/// clause by a range check on the coordinate columns of the field.
pub fn rewrite_where(ctx: &mut Context) -> Result<()> {
    if ctx.where_clause.trim().is_empty() {
        return Ok(());
    }
    let source = ctx.where_clause.clone();
    let clause = Clause::new(&source)?;
    let mut rewriter = Rewriter::new();
    for column in clause.column_refs() {
        let Some(vf) = ctx.virtual_field(&column) else {
            continue;
        };
        if vf.description.ty != FieldType::Coordinates {
            continue;
        }
        let name = clause.slice(column.span);
        if !clause.token(column.next).is_some_and(|t| t.is_keyword(Keyword::Near)) {
            return Err(value_err!("Operator for the virtual field '{}' must be 'NEAR'", name));
        }

        let open = column.next + 1;
        if !clause.token(open).is_some_and(|t| t.token == Token::LParen) {
            return Err(parse_err!("Missing '(' after '{} NEAR'", name));
        }
        let close =
            clause.closing_paren(open).ok_or_else(|| parse_err!("Missing ')' after '{} NEAR'", name))?;
        let (open, close) = (clause.tokens()[open].span, clause.tokens()[close].span);
        let near: Near = clause.slice(Span::new(open.end, close.start)).parse()?;

        let (lat_column, lon_column) = if vf.description.is_list {
            let field_table = ctx.join_field_table(&vf);
            (format!("{}.{}", field_table, field::LAT), format!("{}.{}", field_table, field::LON))
        } else {
            (
                format!("{}.{}", vf.table, field::lat_column(&vf.field)),
                format!("{}.{}", vf.table, field::lon_column(&vf.field)),
            )
        };
        let predicate = near.bounding_box().to_sql(&lat_column, &lon_column);
        debug!("rewrote {} as {}", clause.slice(column.span.union(&close)), predicate);
        rewriter.replace(column.span.union(&close), predicate);
    }
    ctx.where_clause = rewriter.apply(&source)?;
    Ok(())
}
