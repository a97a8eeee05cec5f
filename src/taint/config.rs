//! Taint configuration: sources, sinks, and transfers.
//!
//! Configurations are immutable records resolved against the program
//! under analysis. They can be built programmatically or loaded from a
//! YAML file of the shape:
//!
//! ```yaml
//! sources:
//!   - { class: SourceSink, method: "source()", type: String }
//! sinks:
//!   - { class: SourceSink, method: "sink(String)", index: 0 }
//! transfers:
//!   - { class: String, method: "concat(String)", from: "0", to: result, type: String }
//! ```
//!
//! Any name that does not resolve (class, method, type, slot) aborts
//! loading with [`Error::Config`].

use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::ir::{MethodId, Program, Type};
use crate::{Error, Result};

/// A value slot of an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferSlot {
    /// The receiver.
    Base,
    /// The bound result of the call.
    Result,
    /// The i-th argument.
    Arg(usize),
}

impl FromStr for TransferSlot {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        match text {
            "base" => Ok(Self::Base),
            "result" => Ok(Self::Result),
            _ => text
                .parse::<usize>()
                .map(Self::Arg)
                .map_err(|_| Error::Config(format!("unknown transfer slot `{text}`"))),
        }
    }
}

/// A taint source: calls of `method` return a tainted value of `ty`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// The source method.
    pub method: MethodId,
    /// Type of the minted taint objects.
    pub ty: Type,
}

/// A taint sink: passing a tainted value as argument `index` of
/// `method` is a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sink {
    /// The sink method.
    pub method: MethodId,
    /// The sensitive argument position.
    pub index: usize,
}

/// A taint transfer: calls of `method` propagate taint from one slot
/// to another, retyping it to `ty`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    /// The transferring method.
    pub method: MethodId,
    /// Slot the taint is read from.
    pub from: TransferSlot,
    /// Slot the taint is written to.
    pub to: TransferSlot,
    /// Type of the re-minted taint objects.
    pub ty: Type,
}

/// The resolved taint configuration.
#[derive(Debug, Clone, Default)]
pub struct TaintConfig {
    /// Source records.
    pub sources: Vec<Source>,
    /// Sink records.
    pub sinks: Vec<Sink>,
    /// Transfer records.
    pub transfers: Vec<Transfer>,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    sources: Vec<RawSource>,
    #[serde(default)]
    sinks: Vec<RawSink>,
    #[serde(default)]
    transfers: Vec<RawTransfer>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    class: String,
    method: String,
    #[serde(rename = "type")]
    ty: String,
}

#[derive(Debug, Deserialize)]
struct RawSink {
    class: String,
    method: String,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct RawTransfer {
    class: String,
    method: String,
    from: String,
    to: String,
    #[serde(rename = "type")]
    ty: String,
}

impl TaintConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a source record.
    pub fn add_source(&mut self, method: MethodId, ty: Type) -> &mut Self {
        self.sources.push(Source { method, ty });
        self
    }

    /// Adds a sink record.
    pub fn add_sink(&mut self, method: MethodId, index: usize) -> &mut Self {
        self.sinks.push(Sink { method, index });
        self
    }

    /// Adds a transfer record.
    pub fn add_transfer(
        &mut self,
        method: MethodId,
        from: TransferSlot,
        to: TransferSlot,
        ty: Type,
    ) -> &mut Self {
        self.transfers.push(Transfer {
            method,
            from,
            to,
            ty,
        });
        self
    }

    /// Loads and resolves a YAML configuration file.
    ///
    /// # Errors
    ///
    /// I/O and YAML errors are passed through; names that do not
    /// resolve against `program` become [`Error::Config`].
    pub fn from_yaml_path(path: &Path, program: &Program) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text, program)
    }

    /// Parses and resolves a YAML configuration from a string.
    ///
    /// # Errors
    ///
    /// Same conditions as [`TaintConfig::from_yaml_path`].
    pub fn from_yaml_str(text: &str, program: &Program) -> Result<Self> {
        let raw: RawConfig = serde_yaml::from_str(text)?;
        let mut config = Self::new();
        for source in raw.sources {
            config.sources.push(Source {
                method: resolve_method(program, &source.class, &source.method)?,
                ty: resolve_type(program, &source.ty)?,
            });
        }
        for sink in raw.sinks {
            config.sinks.push(Sink {
                method: resolve_method(program, &sink.class, &sink.method)?,
                index: sink.index,
            });
        }
        for transfer in raw.transfers {
            config.transfers.push(Transfer {
                method: resolve_method(program, &transfer.class, &transfer.method)?,
                from: transfer.from.parse()?,
                to: transfer.to.parse()?,
                ty: resolve_type(program, &transfer.ty)?,
            });
        }
        Ok(config)
    }
}

fn resolve_method(program: &Program, class: &str, subsig: &str) -> Result<MethodId> {
    let class_id = program
        .lookup_class(class)
        .ok_or_else(|| Error::Config(format!("unknown class `{class}`")))?;
    let subsig_id = program
        .lookup_subsig(subsig)
        .ok_or_else(|| Error::Config(format!("unknown method `{class}.{subsig}`")))?;
    program
        .dispatch(class_id, subsig_id)
        .ok_or_else(|| Error::Config(format!("unknown method `{class}.{subsig}`")))
}

fn resolve_type(program: &Program, name: &str) -> Result<Type> {
    match name {
        "int" => Ok(Type::Int),
        "boolean" => Ok(Type::Boolean),
        "byte" => Ok(Type::Byte),
        "short" => Ok(Type::Short),
        "char" => Ok(Type::Char),
        "long" => Ok(Type::Long),
        _ => program
            .lookup_class(name)
            .map(Type::Reference)
            .ok_or_else(|| Error::Config(format!("unknown type `{name}`"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ClassFlags, MethodFlags, ProgramBuilder};

    fn sample_program() -> Program {
        let mut pb = ProgramBuilder::new();
        let object = pb.add_class("Object", None, &[], ClassFlags::empty());
        let string = pb.add_class("String", Some(object), &[], ClassFlags::empty());
        let ss = pb.add_class("SourceSink", Some(object), &[], ClassFlags::empty());
        pb.add_method(
            ss,
            "source",
            "source()",
            MethodFlags::STATIC,
            Type::Reference(string),
        );
        pb.add_method(ss, "sink", "sink(String)", MethodFlags::STATIC, Type::Void);
        pb.finish().unwrap()
    }

    #[test]
    fn test_yaml_roundtrip() {
        let program = sample_program();
        let config = TaintConfig::from_yaml_str(
            r#"
sources:
  - { class: SourceSink, method: "source()", type: String }
sinks:
  - { class: SourceSink, method: "sink(String)", index: 0 }
"#,
            &program,
        )
        .unwrap();

        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sinks.len(), 1);
        assert_eq!(config.sinks[0].index, 0);
        assert!(config.transfers.is_empty());
    }

    #[test]
    fn test_unknown_names_abort() {
        let program = sample_program();
        assert!(matches!(
            TaintConfig::from_yaml_str(
                "sources:\n  - { class: Nope, method: \"source()\", type: String }\n",
                &program,
            ),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            TaintConfig::from_yaml_str(
                "sources:\n  - { class: SourceSink, method: \"source()\", type: Nope }\n",
                &program,
            ),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_slot_parsing() {
        assert_eq!("base".parse::<TransferSlot>().unwrap(), TransferSlot::Base);
        assert_eq!(
            "result".parse::<TransferSlot>().unwrap(),
            TransferSlot::Result
        );
        assert_eq!("2".parse::<TransferSlot>().unwrap(), TransferSlot::Arg(2));
        assert!("arg-two".parse::<TransferSlot>().is_err());
    }

    #[test]
    fn test_malformed_yaml_aborts() {
        let program = sample_program();
        assert!(TaintConfig::from_yaml_str("sources: {not a list}", &program).is_err());
    }
}
