// 🧾 Command layer - raw caller input in, JSON-shaped responses out
//
// Interface layers (CLI, HTTP, TUI) hand over strings exactly as entered.
// Required-field checks and number parsing happen here, before the registry.
//
// Response shapes:
//   {"status": "ok"}
//   {"error": "<message>"}
//   {"contestants": ["name", ...]}
//   {"name", "date_of_birth", "age", "starting_weight", "current_weight"}
//   {"rankings": "<report text>"}

use crate::contestant::{parse_weight, ContestantView};
use crate::error::{RegistryError, RegistryResult};
use crate::registry::{ContestantEdit, ContestantRegistry};
use crate::store::FlatStore;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Add {
        name: String,
        weight: String,
        dob: String,
    },
    Update {
        name: String,
        weight: String,
    },
    Edit {
        name: String,
        dob: Option<String>,
        starting_weight: Option<String>,
        current_weight: Option<String>,
    },
    Delete {
        name: String,
    },
    List,
    Info {
        name: String,
    },
    Rankings,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Add { .. } => "add",
            Command::Update { .. } => "update",
            Command::Edit { .. } => "edit",
            Command::Delete { .. } => "delete",
            Command::List => "list",
            Command::Info { .. } => "info",
            Command::Rankings => "rankings",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Status { status: &'static str },
    Error { error: String },
    Contestants { contestants: Vec<String> },
    Info(ContestantView),
    Rankings { rankings: String },
}

impl Response {
    pub fn ok() -> Self {
        Response::Status { status: "ok" }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error { .. })
    }
}

impl From<RegistryError> for Response {
    fn from(err: RegistryError) -> Self {
        Response::Error {
            error: err.to_string(),
        }
    }
}

/// Run one command against the registry; failures come back as `Response::Error`
pub fn execute<S: FlatStore>(registry: &ContestantRegistry<S>, command: Command) -> Response {
    let name = command.name();
    match dispatch(registry, command) {
        Ok(response) => response,
        Err(err) => {
            debug!(command = name, kind = err.kind(), error = %err, "command failed");
            err.into()
        }
    }
}

/// Same as [`execute`] but keeps the typed error
pub fn dispatch<S: FlatStore>(
    registry: &ContestantRegistry<S>,
    command: Command,
) -> RegistryResult<Response> {
    match command {
        Command::Add { name, weight, dob } => {
            if name.is_empty() || dob.is_empty() || weight.is_empty() {
                return Err(RegistryError::MissingInput(
                    "Name, date of birth, and starting weight are required",
                ));
            }
            let weight = parse_weight("Weight", &weight)?;
            registry.add(&name, weight, &dob)?;
            Ok(Response::ok())
        }

        Command::Update { name, weight } => {
            if name.is_empty() || weight.is_empty() {
                return Err(RegistryError::MissingInput(
                    "Name and current weight are required",
                ));
            }
            let weight = parse_weight("Weight", &weight)?;
            registry.update_weight(&name, weight)?;
            Ok(Response::ok())
        }

        Command::Edit {
            name,
            dob,
            starting_weight,
            current_weight,
        } => {
            require_name(&name)?;
            if matches!(dob.as_deref(), Some("")) {
                return Err(RegistryError::MissingInput("Date of birth cannot be empty"));
            }

            let changes = ContestantEdit {
                date_of_birth: dob,
                starting_weight: optional_weight("Starting weight", starting_weight)?,
                current_weight: optional_weight("Current weight", current_weight)?,
            };
            if changes.is_empty() {
                return Err(RegistryError::MissingInput("Nothing to edit"));
            }

            registry.edit(&name, &changes)?;
            Ok(Response::ok())
        }

        Command::Delete { name } => {
            require_name(&name)?;
            registry.delete(&name)?;
            Ok(Response::ok())
        }

        Command::List => Ok(Response::Contestants {
            contestants: registry.list_names(),
        }),

        Command::Info { name } => {
            require_name(&name)?;
            Ok(Response::Info(registry.get(&name)?))
        }

        Command::Rankings => Ok(Response::Rankings {
            rankings: registry.rankings().to_string(),
        }),
    }
}

fn require_name(name: &str) -> RegistryResult<()> {
    if name.is_empty() {
        Err(RegistryError::MissingInput("Contestant name is required"))
    } else {
        Ok(())
    }
}

/// Blank form fields count as "not supplied"
fn optional_weight(field: &'static str, input: Option<String>) -> RegistryResult<Option<f64>> {
    match input.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_weight(field, raw).map(Some),
    }
}
