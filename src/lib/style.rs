use crate::*;
use nom::branch::alt;
use nom::bytes::complete::{tag, take_while, take_while_m_n};
use nom::character::complete::{char, multispace0};
use nom::combinator::map_res;
use nom::error::{convert_error, VerboseError};
use nom::multi::many0;
use nom::number::complete::float;
use nom::sequence::{delimited, separated_pair, terminated, tuple};
use nom::{Err, IResult};

/// A struct to represent any RGB color.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const RED: Color = Color { r: 255, g: 0, b: 0, a: 1.0 };
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if (self.a - 1.0).abs() < f32::EPSILON {
            write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
        }
    }
}

/// How a path is stroked on the map.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PathStyle {
    pub color: Color,
    /// Stroke width in pixels.
    pub weight: f32,
    pub opacity: f32,
}

impl Default for PathStyle {
    /// A thick, bright red line.
    fn default() -> Self {
        Self {
            color: Color::RED,
            weight: 6.0,
            opacity: 0.8,
        }
    }
}

impl PathStyle {
    /// Parses a declaration block like `color: #FF0000; weight: 6px; opacity: 0.8;`.
    ///
    /// Properties that are not mentioned keep their default value.
    pub fn parse(style: &str) -> Result<Self, Error> {
        let declarations = match declarations(style) {
            Ok((remaining, declarations)) if remaining.trim().is_empty() => declarations,
            Ok((remaining, _)) => {
                return Err(Error::Style(format!("unexpected input {:?}", remaining)));
            }
            Err(Err::Error(e)) | Err(Err::Failure(e)) => {
                return Err(Error::Style(convert_error(style, e)));
            }
            Err(Err::Incomplete(_)) => {
                return Err(Error::Style("unexpected end of input".into()));
            }
        };

        let mut path_style = PathStyle::default();
        for (name, value) in declarations {
            match (name, value) {
                ("color", StyleValue::Color(color)) => path_style.color = color,
                ("weight", StyleValue::Px(weight)) | ("weight", StyleValue::Unitless(weight)) => {
                    path_style.weight = weight
                }
                ("opacity", StyleValue::Unitless(opacity)) if (0.0..=1.0).contains(&opacity) => {
                    path_style.opacity = opacity
                }
                (name, value) => {
                    return Err(Error::Style(format!(
                        "{:?} is not a valid value for {}",
                        value, name
                    )));
                }
            }
        }
        Ok(path_style)
    }
}

type Res<'a, O> = IResult<&'a str, O, VerboseError<&'a str>>;

#[derive(Debug, Copy, Clone, PartialEq)]
enum StyleValue {
    Color(Color),
    Px(f32),
    Unitless(f32),
}

/// Munch all whitespace before and after `f`.
fn whitespace<'a, O, F>(f: F) -> impl FnMut(&'a str) -> Res<'a, O>
where
    F: FnMut(&'a str) -> Res<'a, O>,
{
    delimited(multispace0, f, multispace0)
}

/// Parses all declarations of a block.
fn declarations(input: &str) -> Res<'_, Vec<(&str, StyleValue)>> {
    many0(declaration)(input)
}

/// Parses a single k/v pair.
/// E.g. `color: #FF0000;`.
fn declaration(input: &str) -> Res<'_, (&str, StyleValue)> {
    terminated(
        separated_pair(name, char(':'), value),
        whitespace(char(';')),
    )(input)
}

/// Can contain alphanumeric characters and '-'.
fn name<'a>(input: &'a str) -> Res<'a, &'a str> {
    whitespace(take_while(|c: char| c.is_ascii_alphanumeric() || c == '-'))(input)
}

fn value<'a>(input: &'a str) -> Res<'a, StyleValue> {
    alt((
        whitespace(hex_color),
        whitespace(rgba_color),
        whitespace(rgb_color),
        whitespace(px_value),
        whitespace(unitless_value),
    ))(input)
}

fn px_value<'a>(input: &'a str) -> Res<'a, StyleValue> {
    let (input, (value, _)) = tuple((float, tag("px")))(input)?;
    Ok((input, StyleValue::Px(value)))
}

fn unitless_value<'a>(input: &'a str) -> Res<'a, StyleValue> {
    let (input, value) = float(input)?;
    Ok((input, StyleValue::Unitless(value)))
}

/// Converts a hex string into an `u8`.
fn from_hex(input: &str) -> Result<u8, std::num::ParseIntError> {
    u8::from_str_radix(input, 16)
}

fn is_hex_digit(c: char) -> bool {
    c.is_digit(16)
}

/// Parse an actual hex code.
fn hex_primary<'a>(input: &'a str) -> Res<'a, u8> {
    map_res(take_while_m_n(2, 2, is_hex_digit), from_hex)(input)
}

/// Parse a single hex color code including the `#`.
fn hex_color<'a>(input: &'a str) -> Res<'a, StyleValue> {
    let (input, _) = tag("#")(input)?;
    let (input, (r, g, b)) = tuple((hex_primary, hex_primary, hex_primary))(input)?;
    Ok((input, StyleValue::Color(Color { r, g, b, a: 1.0 })))
}

fn u8<'a>(input: &'a str) -> Res<'a, u8> {
    use std::str::FromStr;
    map_res(take_while(|c: char| c.is_digit(10)), u8::from_str)(input)
}

/// Parse `rgba(r, g, b, a)`.
fn rgba_color<'a>(input: &'a str) -> Res<'a, StyleValue> {
    let (input, _) = tag("rgba(")(input)?;
    let (input, (r, _, g, _, b, _, a)) = tuple((
        whitespace(u8),
        char(','),
        whitespace(u8),
        char(','),
        whitespace(u8),
        char(','),
        whitespace(float),
    ))(input)?;
    let (input, _) = tag(")")(input)?;
    Ok((input, StyleValue::Color(Color { r, g, b, a })))
}

/// Parse `rgb(r, g, b)`.
fn rgb_color<'a>(input: &'a str) -> Res<'a, StyleValue> {
    let (input, _) = tag("rgb(")(input)?;
    let (input, (r, _, g, _, b)) = tuple((
        whitespace(u8),
        char(','),
        whitespace(u8),
        char(','),
        whitespace(u8),
    ))(input)?;
    let (input, _) = tag(")")(input)?;
    Ok((input, StyleValue::Color(Color { r, g, b, a: 1.0 })))
}

#[test]
fn parse_route_style() {
    let style = PathStyle::parse("color: #FF0000; weight: 6px; opacity: 0.8;").unwrap();
    assert_eq!(style, PathStyle::default());

    let style = PathStyle::parse("  color: rgba(0, 128, 255, 0.5);\n  weight: 3;\n").unwrap();
    assert_eq!(
        style.color,
        Color {
            r: 0,
            g: 128,
            b: 255,
            a: 0.5
        }
    );
    assert_eq!(style.weight, 3.0);
    assert_eq!(style.opacity, 0.8);
}

#[test]
fn empty_style_is_default() {
    assert_eq!(PathStyle::parse("").unwrap(), PathStyle::default());
}

#[test]
fn reject_bad_styles() {
    assert!(matches!(
        PathStyle::parse("color: 6px;"),
        Err(Error::Style(_))
    ));
    assert!(matches!(
        PathStyle::parse("opacity: 1.5;"),
        Err(Error::Style(_))
    ));
    assert!(matches!(
        PathStyle::parse("color: #FF0000"),
        Err(Error::Style(_))
    ));
    assert!(matches!(
        PathStyle::parse("dash: 4px;"),
        Err(Error::Style(_))
    ));
}

#[test]
fn color_display() {
    assert_eq!(Color::RED.to_string(), "#FF0000");
    assert_eq!(
        Color {
            r: 1,
            g: 2,
            b: 3,
            a: 0.5
        }
        .to_string(),
        "rgba(1, 2, 3, 0.5)"
    );
}
