//! Builds an [`Intercon`] from a parsed configuration file.

use std::collections::HashMap;
use std::str::FromStr;

use strum_macros::{EnumString, IntoStaticStr};

use super::ast;
use crate::model::{
    Component, DataFlow, Endianness, Granularity, Intercon, Signal,
};
use crate::utils::{Diagnostic, Reporter, WbResult};

/// Kinds of sections, recognized by a case-insensitive substring of the
/// section name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SectionKind {
    General,
    Master,
    Slave,
}

impl SectionKind {
    fn classify(name: &str) -> Option<SectionKind> {
        let name = name.to_lowercase();

        if name.contains("master") {
            Some(SectionKind::Master)
        } else if name.contains("slave") {
            Some(SectionKind::Slave)
        } else if name.contains("general") {
            Some(SectionKind::General)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
enum Key {
    Name,
    TgaBits,
    TgcBits,
    TgdBits,
    DataBusWidth,
    AddressBusWidth,
    Endianess,
    DataFlow,
    Err,
    Rty,
    Tga,
    Tgc,
    Tgd,
    BaseAddress,
    AddressSize,
    AddressingGranularity,
    WordSize,
    AddressBusHigh,
    AddressBusLow,
}

impl Key {
    fn allowed_in(self, kind: SectionKind) -> bool {
        match self {
            Key::Name | Key::DataBusWidth => true,
            Key::AddressBusWidth => kind != SectionKind::Slave,
            Key::TgaBits | Key::TgcBits | Key::TgdBits => {
                kind == SectionKind::General
            }
            Key::Endianess
            | Key::DataFlow
            | Key::Err
            | Key::Rty
            | Key::Tga
            | Key::Tgc
            | Key::Tgd => kind != SectionKind::General,
            Key::BaseAddress
            | Key::AddressSize
            | Key::AddressingGranularity
            | Key::WordSize
            | Key::AddressBusHigh
            | Key::AddressBusLow => kind == SectionKind::Slave,
        }
    }

    fn signal(self) -> Option<Signal> {
        match self {
            Key::Err => Some(Signal::Err),
            Key::Rty => Some(Signal::Rty),
            Key::Tga => Some(Signal::Tga),
            Key::Tgc => Some(Signal::Tgc),
            Key::Tgd => Some(Signal::Tgd),
            _ => None,
        }
    }
}

/// Lowers a configuration file into an interconnect, reporting every
/// problem found. Returns `None` if any error was reported.
pub fn load(file: &ast::File, reporter: &mut Reporter) -> Option<Intercon> {
    let errors = reporter.error_count();

    let mut builder = Builder {
        reporter,
        intercon: Intercon::new(),
        sections: HashMap::new(),
        master: None,
    };

    for section in &file.sections {
        builder.load_section(section);
    }

    (builder.reporter.error_count() == errors).then_some(builder.intercon)
}

struct Builder<'a, 'src> {
    reporter: &'a mut Reporter<'src>,
    intercon: Intercon,
    sections: HashMap<String, ast::Span>,
    master: Option<ast::Span>,
}

#[derive(Debug)]
struct InvalidValue(String);

fn parse_decimal(value: &str) -> Result<i64, InvalidValue> {
    value
        .parse()
        .map_err(|_| InvalidValue(format!("expected an integer, got `{value}`")))
}

fn parse_hexadecimal(value: &str) -> Result<i64, InvalidValue> {
    let (negative, digits) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };

    let digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(digits);

    let invalid = || {
        InvalidValue(format!("expected a hexadecimal integer, got `{value}`"))
    };

    // `from_str_radix` accepts a sign of its own.
    if digits.starts_with(&['+', '-'][..]) {
        return Err(invalid());
    }

    let magnitude = i64::from_str_radix(digits, 16).map_err(|_| invalid())?;

    if negative {
        magnitude.checked_neg().ok_or_else(invalid)
    } else {
        Ok(magnitude)
    }
}

fn parse_bool(value: &str) -> Result<bool, InvalidValue> {
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(InvalidValue(format!(
            "expected `true` or `false`, got `{value}`"
        )))
    }
}

fn parse_choice<T: FromStr>(
    value: &str,
    choices: &str,
) -> Result<T, InvalidValue> {
    value.parse().map_err(|_| {
        InvalidValue(format!("expected one of {choices}, got `{value}`"))
    })
}

impl Builder<'_, '_> {
    fn load_section(&mut self, section: &ast::Section) {
        let name = &section.name;

        if let Some(&previous) = self.sections.get(&name.text) {
            self.reporter.emit(
                &Diagnostic::error()
                    .with_message(format!("duplicate section `{}`", name.text))
                    .with_primary(name.span, "section defined again")
                    .with_secondary(previous, "first defined here"),
            );

            return;
        }

        self.sections.insert(name.text.clone(), name.span);

        let Some(kind) = SectionKind::classify(&name.text) else {
            self.reporter.emit(
                &Diagnostic::error()
                    .with_message(format!("unknown section `{}`", name.text))
                    .with_primary(name.span, "unknown section")
                    .with_note(
                        "section names must contain `general`, `master` or \
                         `slave`",
                    ),
            );

            return;
        };

        let mut component = match kind {
            SectionKind::General => None,
            SectionKind::Master => Some(Component::master()),
            SectionKind::Slave => Some(Component::slave()),
        };

        let mut seen: HashMap<String, ast::Span> = HashMap::new();

        for entry in &section.entries {
            let lowered = entry.key.text.to_lowercase();

            if let Some(&previous) = seen.get(&lowered) {
                self.reporter.emit(
                    &Diagnostic::error()
                        .with_message(format!(
                            "duplicate key `{}` in section `{}`",
                            entry.key.text, name.text
                        ))
                        .with_primary(entry.key.span, "key set again")
                        .with_secondary(previous, "first set here"),
                );

                continue;
            }

            seen.insert(lowered, entry.key.span);

            let key = match Key::from_str(&entry.key.text) {
                Ok(key) if key.allowed_in(kind) => key,
                _ => {
                    self.reporter.emit(
                        &Diagnostic::error()
                            .with_message(format!(
                                "unknown key `{}` in section `{}`",
                                entry.key.text, name.text
                            ))
                            .with_primary(entry.key.span, "unknown key"),
                    );

                    continue;
                }
            };

            let result = match &mut component {
                None => self.apply_general(key, &entry.value.text),
                Some(component) => {
                    Self::apply_component(component, key, &entry.value.text)
                }
            };

            self.check(result, entry);
        }

        match (kind, component) {
            (SectionKind::Master, Some(master)) => self.add_master(name, master),
            (SectionKind::Slave, Some(slave)) => self.add_slave(name, slave),
            _ => {}
        }
    }

    /// Reports a rejected value at the entry it came from.
    fn check(
        &mut self,
        result: Result<WbResult<()>, InvalidValue>,
        entry: &ast::Entry,
    ) {
        let message = match result {
            Ok(Ok(())) => return,
            Ok(Err(err)) => err.to_string(),
            Err(InvalidValue(message)) => message,
        };

        self.reporter.emit(
            &Diagnostic::error()
                .with_message(format!(
                    "invalid value for `{}`",
                    entry.key.text
                ))
                .with_primary(entry.value.span, message),
        );
    }

    fn apply_general(
        &mut self,
        key: Key,
        value: &str,
    ) -> Result<WbResult<()>, InvalidValue> {
        let intercon = &mut self.intercon;

        Ok(match key {
            Key::Name => intercon.set_name(value),
            Key::TgaBits => {
                intercon.set_tag_bits(Signal::Tga, parse_decimal(value)?)
            }
            Key::TgcBits => {
                intercon.set_tag_bits(Signal::Tgc, parse_decimal(value)?)
            }
            Key::TgdBits => {
                intercon.set_tag_bits(Signal::Tgd, parse_decimal(value)?)
            }
            Key::DataBusWidth => {
                intercon.set_data_bus_width(parse_decimal(value)?)
            }
            Key::AddressBusWidth => {
                intercon.set_address_bus_width(parse_decimal(value)?)
            }
            _ => unreachable!("key `{}` is not allowed here", <&str>::from(key)),
        })
    }

    fn apply_component(
        component: &mut Component,
        key: Key,
        value: &str,
    ) -> Result<WbResult<()>, InvalidValue> {
        Ok(match key {
            Key::Name => component.set_name(value),
            Key::DataBusWidth => {
                component.set_data_bus_width(parse_decimal(value)?)
            }
            Key::AddressBusWidth => {
                component.set_address_bus_width(parse_decimal(value)?)
            }
            Key::Endianess => {
                let endianness: Endianness =
                    parse_choice(value, "`big` or `little`")?;

                component.set_endianness(endianness);

                Ok(())
            }
            Key::DataFlow => {
                let data_flow: DataFlow =
                    parse_choice(value, "`r`, `w` or `rw`")?;

                component.set_data_flow(data_flow);

                Ok(())
            }
            Key::Err | Key::Rty | Key::Tga | Key::Tgc | Key::Tgd => {
                let enabled = parse_bool(value)?;

                if let Some(signal) = key.signal() {
                    component.set_signal(signal, enabled);
                }

                Ok(())
            }
            Key::BaseAddress => {
                component.set_base_address(parse_hexadecimal(value)?)
            }
            Key::AddressSize => {
                component.set_address_size(parse_hexadecimal(value)?)
            }
            Key::AddressingGranularity => {
                let granularity: Granularity =
                    parse_choice(value, "`byte` or `word`")?;

                component.set_granularity(granularity)
            }
            Key::WordSize => component.set_word_size(parse_decimal(value)?),
            Key::AddressBusHigh => {
                component.set_address_high(parse_decimal(value)?)
            }
            Key::AddressBusLow => {
                component.set_address_low(parse_decimal(value)?)
            }
            Key::TgaBits | Key::TgcBits | Key::TgdBits => {
                unreachable!("key `{}` is not allowed here", <&str>::from(key))
            }
        })
    }

    fn add_master(&mut self, name: &ast::Spanned, master: Component) {
        if let Some(previous) = self.master {
            self.reporter.emit(
                &Diagnostic::error()
                    .with_message("only one master is supported")
                    .with_primary(name.span, "second master")
                    .with_secondary(previous, "first master"),
            );

            return;
        }

        self.master = Some(name.span);

        if let Err(err) = self.intercon.set_master(master) {
            self.reporter.emit(
                &Diagnostic::error()
                    .with_message(err.to_string())
                    .with_primary(name.span, "in this section"),
            );
        }
    }

    fn add_slave(&mut self, name: &ast::Spanned, slave: Component) {
        if let Err(err) = self.intercon.add_slave(slave) {
            self.reporter.emit(
                &Diagnostic::error()
                    .with_message(err.to_string())
                    .with_primary(name.span, "in this section"),
            );
        }
    }
}
