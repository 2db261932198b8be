//! Template resolution and placeholder substitution.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use strum_macros::{Display, EnumString, IntoStaticStr};

use crate::utils::{Error, WbResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum TemplateId {
    /// The interconnect entity and architecture.
    #[strum(to_string = "template_intercon.tmpl")]
    Intercon,
    /// The port block instantiated once per slave.
    #[strum(to_string = "template_slave.tmpl")]
    Slave,
}

/// A named substitution point, written `%name%` in a template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumString, IntoStaticStr)]
pub enum Placeholder {
    #[strum(serialize = "date")]
    Date,
    #[strum(serialize = "iname")]
    InterconName,
    #[strum(serialize = "mname")]
    MasterName,
    #[strum(serialize = "mdbwidth")]
    MasterDataWidth,
    #[strum(serialize = "madwidth")]
    MasterAddressWidth,
    #[strum(serialize = "mselwidth")]
    MasterSelectWidth,
    #[strum(serialize = "madditional")]
    MasterPorts,
    #[strum(serialize = "additionalsignals")]
    Signals,
    #[strum(serialize = "additional_assignments")]
    Assignments,
    #[strum(serialize = "slaves")]
    Slaves,
    #[strum(serialize = "interconnection")]
    Interconnection,
    #[strum(serialize = "antilatch")]
    AntiLatch,
    #[strum(serialize = "antilatch2")]
    IdleDefaults,
    #[strum(serialize = "intabwidth")]
    BusAddressWidth,
    #[strum(serialize = "intdbwidth")]
    BusDataWidth,
    #[strum(serialize = "selwidth")]
    BusSelectWidth,
    #[strum(serialize = "sname")]
    SlaveName,
    #[strum(serialize = "sdbwidth")]
    SlaveDataWidth,
    #[strum(serialize = "sadhi")]
    SlaveAddressHigh,
    #[strum(serialize = "sadlo")]
    SlaveAddressLow,
    #[strum(serialize = "sselwidth")]
    SlaveSelectWidth,
    #[strum(serialize = "sadditional")]
    SlavePorts,
}

/// Values for the placeholders of one template.
#[derive(Default)]
pub struct Bindings(HashMap<Placeholder, String>);

impl Bindings {
    pub fn new() -> Bindings {
        Bindings::default()
    }

    pub fn bind<V: ToString>(&mut self, key: Placeholder, value: V) -> &mut Self {
        self.0.insert(key, value.to_string());
        self
    }

    pub fn get(&self, key: Placeholder) -> Option<&str> {
        self.0.get(&key).map(String::as_str)
    }
}

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

/// Substitutes every bound `%name%` in a single pass. Substituted text is
/// never scanned again. Unknown or unbound placeholders are kept verbatim.
pub fn render(template: &str, bindings: &Bindings) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('%') {
        out.push_str(&rest[..open]);
        rest = &rest[open + 1..];

        let Some(close) = rest.find('%') else {
            out.push('%');
            break;
        };

        let name = &rest[..close];

        if !is_placeholder_name(name) {
            out.push('%');
            continue;
        }

        match Placeholder::from_str(name) {
            Ok(key) => match bindings.get(key) {
                Some(value) => out.push_str(value),
                None => {
                    log::warn!("No value for placeholder `%{name}%`");

                    out.push('%');
                    out.push_str(name);
                    out.push('%');
                }
            },
            Err(_) => {
                log::warn!("Unknown placeholder `%{name}%` left in place");

                out.push('%');
                out.push_str(name);
                out.push('%');
            }
        }

        rest = &rest[close + 1..];
    }

    out.push_str(rest);
    out
}

/// The text of both templates.
#[derive(Clone, Debug)]
pub struct Templates {
    pub intercon: String,
    pub slave: String,
}

impl Templates {
    pub fn get(&self, id: TemplateId) -> &str {
        match id {
            TemplateId::Intercon => &self.intercon,
            TemplateId::Slave => &self.slave,
        }
    }
}

fn read_template(search_paths: &[&Path], id: TemplateId) -> WbResult<String> {
    let file = id.to_string();

    let path = search_paths
        .iter()
        .map(|dir| dir.join(&file))
        .find(|path| path.is_file())
        .ok_or_else(|| Error::resource(format!("template `{file}` not found")))?;

    log::debug!("Using template `{}`", path.display());

    fs::read_to_string(&path).map_err(|err| {
        Error::resource(format!("cannot read `{}`: {err}", path.display()))
    })
}

/// Reads each template from the first search directory that contains it.
pub fn load_templates(search_paths: &[&Path]) -> WbResult<Templates> {
    Ok(Templates {
        intercon: read_template(search_paths, TemplateId::Intercon)?,
        slave: read_template(search_paths, TemplateId::Slave)?,
    })
}
