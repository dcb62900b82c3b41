//! Connection handle identifiers.
//!
//! Fixed handles sit at the midpoints of a node's sides. Dynamic handles
//! (`in-N`, `out-N`, `out-else`) belong to nodes whose row count depends on
//! their data; `N` is the zero-based row index.

use crate::error::GraphError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use winnow::ascii::dec_uint;
use winnow::combinator::{alt, preceded};
use winnow::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HandleId {
    Top,
    Bottom,
    Left,
    Right,
    /// Input row `N` (left edge).
    In(usize),
    /// Output row `N` (right edge).
    Out(usize),
    /// The trailing "else" output row.
    OutElse,
}

/// Which side of the node a handle sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

impl HandleId {
    pub const FIXED: [HandleId; 4] = [
        HandleId::Top,
        HandleId::Right,
        HandleId::Bottom,
        HandleId::Left,
    ];

    /// Parse a handle label such as `right`, `in-2`, or `out-else`.
    pub fn parse(label: &str) -> Result<Self, GraphError> {
        parse_handle
            .parse(label)
            .map_err(|_| GraphError::InvalidHandle(label.to_string()))
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::In(_) | Self::Out(_) | Self::OutElse)
    }

    /// Row handle that only accepts incoming edges.
    pub fn is_input(&self) -> bool {
        matches!(self, Self::In(_))
    }

    /// Row handle that only starts outgoing edges.
    pub fn is_output(&self) -> bool {
        matches!(self, Self::Out(_) | Self::OutElse)
    }

    pub fn side(&self) -> Side {
        match self {
            Self::Top => Side::Top,
            Self::Bottom => Side::Bottom,
            Self::Left | Self::In(_) => Side::Left,
            Self::Right | Self::Out(_) | Self::OutElse => Side::Right,
        }
    }
}

fn parse_handle(input: &mut &str) -> ModalResult<HandleId> {
    alt((
        "top".value(HandleId::Top),
        "bottom".value(HandleId::Bottom),
        "left".value(HandleId::Left),
        "right".value(HandleId::Right),
        "out-else".value(HandleId::OutElse),
        preceded("in-", dec_uint).map(HandleId::In),
        preceded("out-", dec_uint).map(HandleId::Out),
    ))
    .parse_next(input)
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Top => f.write_str("top"),
            Self::Bottom => f.write_str("bottom"),
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
            Self::In(n) => write!(f, "in-{n}"),
            Self::Out(n) => write!(f, "out-{n}"),
            Self::OutElse => f.write_str("out-else"),
        }
    }
}

impl FromStr for HandleId {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for HandleId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HandleId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        HandleId::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fixed_and_dynamic_labels() {
        assert_eq!(HandleId::parse("top").unwrap(), HandleId::Top);
        assert_eq!(HandleId::parse("right").unwrap(), HandleId::Right);
        assert_eq!(HandleId::parse("in-0").unwrap(), HandleId::In(0));
        assert_eq!(HandleId::parse("out-12").unwrap(), HandleId::Out(12));
        assert_eq!(HandleId::parse("out-else").unwrap(), HandleId::OutElse);
    }

    #[test]
    fn rejects_malformed_labels() {
        for bad in ["", "middle", "out-", "in-x", "out-elsewhere", "topp", "in--1"] {
            assert!(HandleId::parse(bad).is_err(), "`{bad}` should not parse");
        }
    }

    #[test]
    fn display_matches_wire_label() {
        for label in ["bottom", "left", "in-3", "out-1", "out-else"] {
            assert_eq!(HandleId::parse(label).unwrap().to_string(), label);
        }
    }

    #[test]
    fn dynamic_handles_sit_on_left_or_right() {
        assert_eq!(HandleId::In(4).side(), Side::Left);
        assert_eq!(HandleId::OutElse.side(), Side::Right);
        assert!(!HandleId::Top.is_dynamic());
    }
}
