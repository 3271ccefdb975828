use winnow::combinator::alt;
use winnow::token::{one_of, take_while};
use winnow::{Parser, Result};

use super::parse_numbers::{parse_decimal, parse_digits_u16};

/// GCode words.
#[derive(Debug, PartialEq, Copy, Clone)]
pub enum Word {
    /// G command, like `G1` or `G01`.
    G(u16),
    /// M command, like `M3` or `M03`.
    M(u16),
    /// Parameter, like `X42.3`. The value may be missing, as in `X`.
    Param(Param),
    /// Any other letter with a numeric value, like `S1000`.
    Unknown(char),
}

/// Parameter word.
#[derive(Debug, PartialEq, Copy, Clone)]
pub struct Param {
    pub letter: ParamLetter,
    pub value: Option<f64>,
}

/// Letters of the parameter words that are understood.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum ParamLetter {
    X,
    Y,
    Z,
    F,
    E,
    I,
    J,
}

/// Parse multiple GCode words, storing them in a buffer.
///
/// This function tries to parse as many [Word]s as will fit in the `buffer`
/// before returning. It will return when either the input is empty, or when
/// the buffer is full. The function does not empty the buffer before
/// accumulating into it.
///
/// If the buffer fills up before the input has been read, the input will be
/// set to the next word.
///
/// If parsing fails, the buffer will still contain any words that were
/// parsed until the failure.
///
/// # Parameters
///
/// - `input`: The input to parse.
/// - `buffer`: Buffer in which to accumulate values.
///
/// # Returns
///
/// - `Ok(completed)` if parsing was successful. `completed` is a boolean
///   which indicates whether the complete string was parsed without filling
///   up the buffer.
/// - `Err(_)` if the parsing failed.
pub fn parse_words<'s, const N: usize>(
    input: &mut &'s str,
    buffer: &mut heapless::Vec<Word, N>,
) -> Result<bool> {
    skip_ws.parse_next(input)?;
    while !input.is_empty() {
        let prev_input = *input;
        let word = parse_trim_word.parse_next(input)?;
        if buffer.push(word).is_err() {
            *input = prev_input;
            break;
        }
    }
    Ok(input.is_empty())
}

/// Parse a word, trimming whitespace on either side.
fn parse_trim_word<'s>(input: &mut &'s str) -> Result<Word> {
    skip_ws.parse_next(input)?;
    let result = parse_word.parse_next(input)?;
    skip_ws.parse_next(input)?;
    Ok(result)
}

/// Parse a word.
fn parse_word<'s>(input: &mut &'s str) -> Result<Word> {
    alt((
        parse_g.map(Word::G),
        parse_m.map(Word::M),
        parse_param.map(Word::Param),
        parse_unknown.map(Word::Unknown),
    ))
    .parse_next(input)
}

/// Parse a "G" command.
fn parse_g<'s>(input: &mut &'s str) -> Result<u16> {
    let _ = one_of(['G', 'g']).parse_next(input)?;
    skip_ws.parse_next(input)?;
    parse_digits_u16.parse_next(input)
}

/// Parse an "M" command.
fn parse_m<'s>(input: &mut &'s str) -> Result<u16> {
    let _ = one_of(['M', 'm']).parse_next(input)?;
    skip_ws.parse_next(input)?;
    parse_digits_u16.parse_next(input)
}

/// Parse a parameter.
fn parse_param<'s>(input: &mut &'s str) -> Result<Param> {
    let letter = parse_param_letter.parse_next(input)?;
    let value = parse_decimal.parse_next(input)?;
    Ok(Param { letter, value })
}

/// Parse an unrecognised word, discarding its value.
fn parse_unknown<'s>(input: &mut &'s str) -> Result<char> {
    let letter = one_of(|c: char| c.is_ascii_alphabetic()).parse_next(input)?;
    let _ = parse_decimal.parse_next(input)?;
    Ok(letter.to_ascii_uppercase())
}

/// Skip whitespace when parsing.
fn skip_ws<'s>(input: &mut &'s str) -> Result<()> {
    take_while(0.., char::is_whitespace)
        .parse_next(input)
        .map(|_| ())
}

/// Parse a ParamLetter.
fn parse_param_letter<'s>(input: &mut &'s str) -> Result<ParamLetter> {
    alt((
        one_of(['X', 'x']).map(|_| ParamLetter::X),
        one_of(['Y', 'y']).map(|_| ParamLetter::Y),
        one_of(['Z', 'z']).map(|_| ParamLetter::Z),
        one_of(['F', 'f']).map(|_| ParamLetter::F),
        one_of(['E', 'e']).map(|_| ParamLetter::E),
        one_of(['I', 'i']).map(|_| ParamLetter::I),
        one_of(['J', 'j']).map(|_| ParamLetter::J),
    ))
    .parse_next(input)
}
