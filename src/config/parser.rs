//! Parser for configuration files.

use pest::error::Error;
use pest_consume::{match_nodes, Parser};

use super::ast;

#[derive(Parser)]
#[grammar = "config/syntax.pest"]
pub struct ConfigParser;

impl ConfigParser {
    pub fn parse_file(src: &str) -> Result<ast::File, Box<Error<Rule>>> {
        let nodes = ConfigParser::parse(Rule::file, src)?;

        ConfigParser::file(nodes.single()?).map_err(Box::new)
    }
}

type ParseResult<T> = Result<T, Error<Rule>>;
type Node<'i> = pest_consume::Node<'i, Rule, ()>;

/// Strips surrounding whitespace from a node's text, adjusting its span.
fn trimmed(input: &Node) -> ast::Spanned {
    let raw = input.as_str();
    let text = raw.trim();
    let start = input.as_span().start() + (raw.len() - raw.trim_start().len());

    ast::Spanned {
        text: text.to_owned(),
        span: ast::Span {
            start,
            end: start + text.len(),
        },
    }
}

#[pest_consume::parser]
impl ConfigParser {
    fn EOI(_input: Node) -> ParseResult<()> {
        Ok(())
    }

    fn file(input: Node) -> ParseResult<ast::File> {
        Ok(match_nodes!(input.into_children();
            [section(sections).., EOI(_)] => ast::File {
                sections: sections.collect(),
            },
        ))
    }

    fn section(input: Node) -> ParseResult<ast::Section> {
        Ok(match_nodes!(input.into_children();
            [header(name), entry(entries)..] => ast::Section {
                name,
                entries: entries.collect(),
            },
        ))
    }

    fn header(input: Node) -> ParseResult<ast::Spanned> {
        Ok(match_nodes!(input.into_children();
            [name(name)] => name,
        ))
    }

    fn name(input: Node) -> ParseResult<ast::Spanned> {
        let name = trimmed(&input);

        if name.text.is_empty() {
            return Err(input.error("empty section name"));
        }

        Ok(name)
    }

    fn entry(input: Node) -> ParseResult<ast::Entry> {
        Ok(match_nodes!(input.into_children();
            [key(key), value(value)] => ast::Entry { key, value },
        ))
    }

    fn key(input: Node) -> ParseResult<ast::Spanned> {
        Ok(trimmed(&input))
    }

    fn value(input: Node) -> ParseResult<ast::Spanned> {
        Ok(trimmed(&input))
    }
}
