use winnow::ascii::{digit0, digit1};
use winnow::combinator::{alt, opt};
use winnow::token::literal;
use winnow::{Parser, Result};

/// Parses an optional decimal value.
///
/// This permits only decimal notation, NOT scientific notation. Both the
/// integer and the fractional part may be left out, but not both; a bare
/// sign or period parses as `None`, as does an empty input.
///
/// Examples of valid input:
///
/// - `"123.456"`
/// - `"+123.45"`
/// - `"-.5"`
/// - `"10."`
pub fn parse_decimal<'s>(input: &mut &'s str) -> Result<Option<f64>> {
    (opt(parse_sign), digit0, opt((parse_period, digit0)))
        .take()
        .map(|s: &str| s.parse::<f64>().ok())
        .parse_next(input)
}

/// Parse digits (0-9) as a u16.
///
/// Leading zeros are accepted, so `"03"` and `"3"` give the same value.
pub fn parse_digits_u16<'s>(input: &mut &'s str) -> Result<u16> {
    digit1.try_map(str::parse).parse_next(input)
}

/// Represents a sign when parsing numbers.
#[derive(Debug, PartialEq, Copy, Clone)]
enum Sign {
    Plus,
    Minus,
}

/// Parse a sign indicator ("+" or "-").
fn parse_sign<'s>(input: &mut &'s str) -> Result<Sign> {
    alt((
        literal("+").map(|_| Sign::Plus),
        literal("-").map(|_| Sign::Minus),
    ))
    .parse_next(input)
}

/// Parse and discard a period (`.`)
fn parse_period<'s>(input: &mut &'s str) -> Result<()> {
    literal(".").map(|_| ()).parse_next(input)
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_sign() {
        let mut input_plus = "+";
        let mut input_minus = "-";
        let mut input_other = "foo";
        assert_eq!(Ok(Sign::Plus), parse_sign(&mut input_plus));
        assert_eq!(Ok(Sign::Minus), parse_sign(&mut input_minus));
        assert!(parse_sign(&mut input_other).is_err());
    }

    #[test]
    fn test_parse_digits_u16() {
        let mut input1 = "03";
        let mut input2 = "-456";
        let mut input3 = "99999";
        assert_eq!(Ok(3u16), parse_digits_u16(&mut input1));
        assert!(parse_digits_u16(&mut input2).is_err());
        assert!(parse_digits_u16(&mut input3).is_err());
    }

    #[test]
    fn test_parse_period() {
        let mut input1 = ".";
        let mut input2 = ",";
        assert_eq!(Ok(()), parse_period(&mut input1));
        assert!(parse_period(&mut input2).is_err());
    }

    #[test]
    fn test_parse_decimal_examples() {
        let cases = [
            ("123", Some(123.0)),
            ("123.456", Some(123.456)),
            ("+123.45", Some(123.45)),
            ("-123.0", Some(-123.0)),
            ("-.5", Some(-0.5)),
            ("10.", Some(10.0)),
            ("", None),
            ("-", None),
            (".", None),
        ];
        for (text, expected) in cases {
            let mut input = text;
            assert_eq!(Ok(expected), parse_decimal(&mut input), "{}", text);
            assert!(input.is_empty());
        }
    }

    #[test]
    fn test_parse_decimal_stops_at_word() {
        let mut input = "-5.5Y10";
        assert_eq!(Ok(Some(-5.5)), parse_decimal(&mut input));
        assert_eq!("Y10", input);

        let mut input = "1e5";
        assert_eq!(Ok(Some(1.0)), parse_decimal(&mut input));
        assert_eq!("e5", input);
    }

    proptest! {
        #[test]
        fn test_parse_decimal(
            negative: bool,
            include_sign: bool,
            int_part in 0u32..100_000,
            frac_part in 0u32..1000,
        ) {
            let sign_str = match (negative, include_sign) {
                (true, _) => "-",
                (false, true) => "+",
                (false, false) => "",
            };
            let input = format!("{}{}.{:03}", sign_str, int_part, frac_part);
            let magnitude = int_part as f64 + frac_part as f64 / 1000.0;
            let expected = if negative { -magnitude } else { magnitude };

            let mut input_ref: &str = &input;
            let value = parse_decimal(&mut input_ref).unwrap().unwrap();
            assert!((expected - value).abs() < 1e-9);
            assert!(input_ref.is_empty());
        }
    }
}
