//! systemd unit generation for running `tagit run` as a system service.

use std::borrow::Cow;
use std::fmt::Write;


/// Where the generated unit expects the binary to be installed.
pub const BINARY_PATH: &str = "/usr/bin/tagit";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UnitError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("field {field} cannot be quoted for ExecStart: {value:?}")]
    Unquotable { field: &'static str, value: String },
}

/// Values substituted into the unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    pub service_id: String,
    pub script: String,
    pub tag_prefix: String,
    pub interval: String,
    pub token: Option<String>,
    pub consul_addr: Option<String>,
    pub user: String,
    pub group: String,
}

impl Fields {
    /// Reports every missing required field at once, in declaration order.
    pub fn validate(&self) -> Result<(), UnitError> {
        let required: [(&'static str, &str); 6] = [
            ("ServiceID", &self.service_id),
            ("Script", &self.script),
            ("TagPrefix", &self.tag_prefix),
            ("Interval", &self.interval),
            ("User", &self.user),
            ("Group", &self.group),
        ];
        let missing: Vec<&'static str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(UnitError::MissingFields(missing))
        }
    }

    /// Renders the unit file.
    pub fn render(&self) -> Result<String, UnitError> {
        self.validate()?;

        let mut exec = format!(
            "{} run -s {} -x {} -p {} -i {}",
            BINARY_PATH,
            quote("ServiceID", &self.service_id)?,
            quote("Script", &self.script)?,
            quote("TagPrefix", &self.tag_prefix)?,
            quote("Interval", &self.interval)?,
        );
        if let Some(token) = non_empty(&self.token) {
            let _ = write!(exec, " -t {}", quote("Token", token)?);
        }
        if let Some(addr) = non_empty(&self.consul_addr) {
            let _ = write!(exec, " -c {}", quote("ConsulAddr", addr)?);
        }

        Ok(format!(
            "[Unit]
Description=Tagit {id}
After=network.target
After=network-online.target
Wants=network-online.target

[Service]
Type=simple
ExecStart={exec}
Environment=HOME=/var/run/tagit/{id}
Restart=always
User={user}
Group={group}

[Install]
WantedBy=multi-user.target
",
            id = self.service_id,
            exec = exec,
            user = self.user,
            group = self.group,
        ))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn quote<'a>(field: &'static str, value: &'a str) -> Result<Cow<'a, str>, UnitError> {
    shlex::try_quote(value).map_err(|_| UnitError::Unquotable {
        field,
        value: value.to_string(),
    })
}
