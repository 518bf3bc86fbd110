use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_until, take_while1},
    character::complete::{char, digit1, multispace0, multispace1},
    combinator::{map, map_res, opt},
    sequence::{delimited, preceded, tuple},
    IResult,
};

use crate::model::Address;

#[derive(Debug, PartialEq, Clone)]
pub enum Command {
    List { limit: Option<usize> },
    Find { term: String, category: Option<String>, limit: Option<usize> },
    Category { name: String, limit: Option<usize> },
    Show { address: Address },
    Categories,
    Reload,
    Errors,
    Help,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid syntax near: '{0}'")]
    Syntax(String),
    #[error("unexpected tokens at end: '{0}'")]
    Trailing(String),
    #[error("incomplete command")]
    Incomplete,
}

// --- BASIC PARSERS ---

fn parse_usize(input: &str) -> IResult<&str, usize> {
    map_res(digit1, |s: &str| s.parse::<usize>())(input)
}

fn parse_quoted_string(input: &str) -> IResult<&str, String> {
    let (input, _) = char('"')(input)?;
    let (input, content) = take_until("\"")(input)?;
    let (input, _) = char('"')(input)?;
    Ok((input, content.to_string()))
}

fn parse_word(input: &str) -> IResult<&str, String> {
    map(take_while1(|c: char| !c.is_whitespace()), str::to_owned)(input)
}

/// Quoted text, or a single bare word.
fn parse_text(input: &str) -> IResult<&str, String> {
    alt((parse_quoted_string, parse_word))(input)
}

fn parse_address(input: &str) -> IResult<&str, Address> {
    map_res(take_while1(|c: char| c.is_ascii_alphanumeric()), str::parse::<Address>)(input)
}

// --- HELPERS ---
fn ws<'a, F, O, E: nom::error::ParseError<&'a str>>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O, E>
where F: FnMut(&'a str) -> IResult<&'a str, O, E> {
    delimited(multispace0, inner, multispace0)
}

fn tag_ci(t: &'static str) -> impl FnMut(&str) -> IResult<&str, &str> {
    move |input| tag_no_case(t)(input)
}

fn parse_limit(input: &str) -> IResult<&str, Option<usize>> {
    opt(preceded(ws(tag_ci("LIMIT")), parse_usize))(input)
}

// --- COMMAND PARSERS ---

fn parse_list(input: &str) -> IResult<&str, Command> {
    let (input, _) = alt((tag_ci("LIST"), tag_ci("ALL")))(input)?;
    let (input, limit) = parse_limit(input)?;
    Ok((input, Command::List { limit }))
}

fn parse_find(input: &str) -> IResult<&str, Command> {
    let (input, _) = alt((tag_ci("FIND"), tag_ci("SEARCH")))(input)?;
    let (input, _) = multispace1(input)?;
    let (input, term) = parse_text(input)?;

    let (input, category) = opt(preceded(
        tuple((multispace1, tag_ci("IN"), multispace1)),
        parse_text,
    ))(input)?;

    let (input, limit) = parse_limit(input)?;
    Ok((input, Command::Find { term, category, limit }))
}

fn parse_categories(input: &str) -> IResult<&str, Command> {
    let (input, _) = tag_ci("CATEGORIES")(input)?;
    Ok((input, Command::Categories))
}

fn parse_category(input: &str) -> IResult<&str, Command> {
    let (input, _) = tag_ci("CATEGORY")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, name) = parse_text(input)?;
    let (input, limit) = parse_limit(input)?;
    Ok((input, Command::Category { name, limit }))
}

fn parse_show(input: &str) -> IResult<&str, Command> {
    let (input, _) = alt((tag_ci("SHOW"), tag_ci("GET")))(input)?;
    let (input, _) = multispace1(input)?;
    let (input, _) = opt(char('\''))(input)?;
    let (input, address) = parse_address(input)?;
    let (input, _) = opt(char('\''))(input)?;
    Ok((input, Command::Show { address }))
}

fn parse_reload(input: &str) -> IResult<&str, Command> {
    let (input, _) = alt((tag_ci("RELOAD"), tag_ci("REFRESH")))(input)?;
    Ok((input, Command::Reload))
}

fn parse_errors(input: &str) -> IResult<&str, Command> {
    let (input, _) = alt((tag_ci("ERRORS"), tag_ci("REPORT")))(input)?;
    Ok((input, Command::Errors))
}

fn parse_help(input: &str) -> IResult<&str, Command> {
    let (input, _) = tag_ci("HELP")(input)?;
    Ok((input, Command::Help))
}

fn parse_exit(input: &str) -> IResult<&str, Command> {
    let (input, _) = alt((tag_ci("EXIT"), tag_ci("QUIT")))(input)?;
    Ok((input, Command::Exit))
}

pub fn parse_command(input: &str) -> Result<Command, ParseError> {
    let input = input.trim();
    let result = alt((
        parse_list,
        parse_find,
        parse_categories,
        parse_category,
        parse_show,
        parse_reload,
        parse_errors,
        parse_help,
        parse_exit,
    ))(input);

    match result {
        Ok((remainder, cmd)) => {
            if !remainder.trim().is_empty() {
                return Err(ParseError::Trailing(remainder.trim().to_string()));
            }
            Ok(cmd)
        },
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            // e.input is the slice where parsing failed
            let context = if e.input.chars().count() > 20 {
                format!("{}...", e.input.chars().take(20).collect::<String>())
            } else {
                e.input.to_string()
            };
            Err(ParseError::Syntax(context))
        },
        Err(nom::Err::Incomplete(_)) => Err(ParseError::Incomplete),
    }
}
