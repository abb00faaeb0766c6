//! Command-line grammar of the interactive shell.
//!
//! Commands are whitespace-tokenised; verbs are case-insensitive. Numeric
//! arguments accept engineering suffixes (1k, 100n, 10MEG, ...).

use voltaic::{parse_value, AcSweepType};

use crate::error::{Error, Result};

/// What `.print` should project out of the last analysis result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintItem {
    /// `V(node)`
    Voltage(String),
    /// `I(element)`
    Current(String),
}

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `add <R|C|L> <name> <n1> <n2> <value>`
    Add {
        kind: String,
        name: String,
        node_pos: String,
        node_neg: String,
        value: f64,
    },
    /// `addsource <V|I> <name> <n1> <n2> <dc>` or
    /// `addsource <V|I> <name> <n1> <n2> AC <mag> <phase> <freq>`
    AddSource {
        kind: String,
        name: String,
        node_pos: String,
        node_neg: String,
        ac: Option<(f64, f64, f64)>,
        dc: f64,
    },
    /// `delete <name>`
    Delete { name: String },
    /// `.rename node <old> <new>`
    RenameNode { old: String, new: String },
    /// `.nodes`
    Nodes,
    /// `.list [type]`
    List { kind: Option<String> },
    /// `.mna`
    Mna,
    /// `.dc`
    DcOperatingPoint,
    /// `.dc <source> <start> <end> <points>`
    DcSweep {
        source: String,
        start: f64,
        stop: f64,
        points: usize,
    },
    /// `.ac <LIN|DEC|OCT> <f0> <f1> <points>`
    Ac {
        sweep_type: AcSweepType,
        fstart: f64,
        fstop: f64,
        points: usize,
    },
    /// `.tran <tstep> <tstop> [<tstart>] [<tmaxstep>]`
    Tran {
        tstep: f64,
        tstop: f64,
        tstart: f64,
        tmaxstep: f64,
    },
    /// `.print <V(node)|I(element)> ...`
    Print { items: Vec<PrintItem> },
    /// `save <path>`
    Save { path: String },
    /// `open <path>`
    Open { path: String },
    /// `help`
    Help,
    /// `exit`
    Exit,
}

fn syntax(usage: &str) -> Error {
    Error::Syntax(usage.to_string())
}

fn count(points: f64) -> Result<usize> {
    if points < 1.0 {
        return Err(Error::Core(voltaic::CoreError::InvalidValue(
            "point count must be at least 1".to_string(),
        )));
    }
    Ok(points as usize)
}

/// Parse one `.print` item of the form `V(node)` or `I(element)`.
fn parse_print_item(item: &str) -> Result<PrintItem> {
    let upper = item.to_uppercase();
    let inner = upper
        .get(1..)
        .and_then(|rest| rest.strip_prefix('('))
        .and_then(|rest| rest.strip_suffix(')'))
        .filter(|inner| !inner.is_empty());
    match (upper.chars().next(), inner) {
        (Some('V'), Some(node)) => Ok(PrintItem::Voltage(node.to_string())),
        (Some('I'), Some(element)) => Ok(PrintItem::Current(element.to_string())),
        _ => Err(syntax(
            ".print expects items of the form V(node) or I(element)",
        )),
    }
}

impl Command {
    /// Parse a command line. Empty lines are the caller's concern.
    pub fn parse(line: &str) -> Result<Command> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let verb = parts
            .first()
            .ok_or_else(|| syntax("empty command"))?
            .to_uppercase();

        match verb.as_str() {
            "ADD" => {
                if parts.len() != 6 {
                    return Err(syntax("add <R|C|L> <name> <node1> <node2> <value>"));
                }
                Ok(Command::Add {
                    kind: parts[1].to_string(),
                    name: parts[2].to_string(),
                    node_pos: parts[3].to_string(),
                    node_neg: parts[4].to_string(),
                    value: parse_value(parts[5])?,
                })
            }
            "ADDSOURCE" => {
                if parts.len() == 6 {
                    Ok(Command::AddSource {
                        kind: parts[1].to_string(),
                        name: parts[2].to_string(),
                        node_pos: parts[3].to_string(),
                        node_neg: parts[4].to_string(),
                        ac: None,
                        dc: parse_value(parts[5])?,
                    })
                } else if parts.len() == 9 && parts[5].eq_ignore_ascii_case("AC") {
                    Ok(Command::AddSource {
                        kind: parts[1].to_string(),
                        name: parts[2].to_string(),
                        node_pos: parts[3].to_string(),
                        node_neg: parts[4].to_string(),
                        ac: Some((
                            parse_value(parts[6])?,
                            parse_value(parts[7])?,
                            parse_value(parts[8])?,
                        )),
                        dc: 0.0,
                    })
                } else {
                    Err(syntax(
                        "addsource <V|I> <name> <n1> <n2> <dc> OR addsource <V|I> <name> <n1> <n2> AC <mag> <phase> <freq>",
                    ))
                }
            }
            "DELETE" => {
                if parts.len() != 2 {
                    return Err(syntax("delete <name>"));
                }
                Ok(Command::Delete {
                    name: parts[1].to_string(),
                })
            }
            ".RENAME" => {
                if parts.len() != 4 || !parts[1].eq_ignore_ascii_case("node") {
                    return Err(syntax(".rename node <old_name> <new_name>"));
                }
                Ok(Command::RenameNode {
                    old: parts[2].to_string(),
                    new: parts[3].to_string(),
                })
            }
            ".NODES" => {
                if parts.len() != 1 {
                    return Err(syntax(".nodes (no arguments)"));
                }
                Ok(Command::Nodes)
            }
            ".LIST" => match parts.len() {
                1 => Ok(Command::List { kind: None }),
                2 => Ok(Command::List {
                    kind: Some(parts[1].to_string()),
                }),
                _ => Err(syntax(".list [component_type]")),
            },
            ".MNA" => {
                if parts.len() != 1 {
                    return Err(syntax(".mna (no arguments)"));
                }
                Ok(Command::Mna)
            }
            ".DC" => match parts.len() {
                1 => Ok(Command::DcOperatingPoint),
                5 => Ok(Command::DcSweep {
                    source: parts[1].to_string(),
                    start: parse_value(parts[2])?,
                    stop: parse_value(parts[3])?,
                    points: count(parse_value(parts[4])?)?,
                }),
                _ => Err(syntax(".dc OR .dc <source> <start> <end> <points>")),
            },
            ".AC" => {
                if parts.len() != 5 {
                    return Err(syntax(".ac <LIN|DEC|OCT> <fstart> <fstop> <points>"));
                }
                Ok(Command::Ac {
                    sweep_type: parts[1].parse()?,
                    fstart: parse_value(parts[2])?,
                    fstop: parse_value(parts[3])?,
                    points: count(parse_value(parts[4])?)?,
                })
            }
            ".TRAN" => {
                if parts.len() < 3 || parts.len() > 5 {
                    return Err(syntax(".tran <tstep> <tstop> [<tstart>] [<tmaxstep>]"));
                }
                let tstart = if parts.len() >= 4 {
                    parse_value(parts[3])?
                } else {
                    0.0
                };
                let tmaxstep = if parts.len() == 5 {
                    parse_value(parts[4])?
                } else {
                    0.0
                };
                Ok(Command::Tran {
                    tstep: parse_value(parts[1])?,
                    tstop: parse_value(parts[2])?,
                    tstart,
                    tmaxstep,
                })
            }
            ".PRINT" => {
                if parts.len() < 2 {
                    return Err(syntax(".print <V(node)> <I(element)> ..."));
                }
                let items = parts[1..]
                    .iter()
                    .map(|item| parse_print_item(item))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Command::Print { items })
            }
            "SAVE" => {
                if parts.len() != 2 {
                    return Err(syntax("save <path>"));
                }
                Ok(Command::Save {
                    path: parts[1].to_string(),
                })
            }
            "OPEN" => {
                if parts.len() != 2 {
                    return Err(syntax("open <path>"));
                }
                Ok(Command::Open {
                    path: parts[1].to_string(),
                })
            }
            "HELP" => Ok(Command::Help),
            "EXIT" => Ok(Command::Exit),
            other => Err(syntax(&format!(
                "unknown command '{other}', type 'help' for usage"
            ))),
        }
    }

    /// Whether a successful run of this command mutates the circuit (and so
    /// belongs in the replayable history).
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Command::Add { .. }
                | Command::AddSource { .. }
                | Command::Delete { .. }
                | Command::RenameNode { .. }
        )
    }
}
