//! Flag library: turns a message shape into clap arguments and decodes parsed
//! arguments back into a `DynamicMessage`.
//!
//! Every field becomes `--field-name` (kebab-case) unless it is listed as a
//! positional argument. Arg ids are always the field name, so renamed flags
//! and positionals decode the same way.

use base64::Engine as _;
use clap::{Arg, ArgAction, ArgMatches};
use std::sync::Arc;
use thiserror::Error;

use crate::address::{AddressCodecs, AddressError, CodecKind};
use crate::autocli::options::{FlagOptions, RpcCommandOptions};
use crate::message::{DynamicMessage, MessageError, Value};
use crate::proto::Coin;
use crate::schema::{FieldDescriptor, FieldKind, MessageDescriptor, SchemaRegistry};

pub const COIN_TYPE: &str = "cosmos.base.v1beta1.Coin";

#[derive(Debug, Error)]
pub enum FlagError {
    #[error("positional argument {field} is not a field of {message}")]
    UnknownPositional { message: String, field: String },
    #[error("flag option {field} is not a field of {message}")]
    UnknownFlagOption { message: String, field: String },
    #[error("repeated positional argument {field} must be the last positional argument")]
    VariadicNotLast { field: String },
    #[error("invalid value {value:?} for {flag}: {reason}")]
    InvalidValue {
        flag: String,
        value: String,
        reason: String,
    },
    #[error("invalid address {value:?} for {flag}: {source}")]
    InvalidAddress {
        flag: String,
        value: String,
        #[source]
        source: AddressError,
    },
    #[error(transparent)]
    Message(#[from] MessageError),
}

/// Long flag name of a field, honouring a rename in its flag options.
pub fn flag_name(field: &FieldDescriptor, opts: Option<&FlagOptions>) -> String {
    opts.map(|o| o.name.trim())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| field.name.replace('_', "-"))
}

/// Build the clap arguments for a message's fields.
pub fn message_args(
    desc: &MessageDescriptor,
    options: &RpcCommandOptions,
) -> Result<Vec<Arg>, FlagError> {
    for name in options.flag_options.keys() {
        if desc.field(name).is_none() {
            return Err(FlagError::UnknownFlagOption {
                message: desc.name.clone(),
                field: name.clone(),
            });
        }
    }

    let mut args = Vec::with_capacity(desc.fields.len());
    let count = options.positional_args.len();
    for (idx, name) in options.positional_args.iter().enumerate() {
        let field = desc
            .field(name)
            .ok_or_else(|| FlagError::UnknownPositional {
                message: desc.name.clone(),
                field: name.clone(),
            })?;
        if field.repeated && idx + 1 != count {
            return Err(FlagError::VariadicNotLast {
                field: name.clone(),
            });
        }
        let mut arg = Arg::new(field.name.clone())
            .index(idx + 1)
            .required(true)
            .value_name(field.name.to_uppercase())
            .help(help_text(field, None));
        if field.repeated {
            arg = arg.num_args(1..).action(ArgAction::Append);
        }
        args.push(arg);
    }

    for field in &desc.fields {
        if options.positional_args.contains(&field.name) {
            continue;
        }
        args.push(field_flag(field, options.flag_options.get(&field.name)));
    }
    Ok(args)
}

fn help_text(field: &FieldDescriptor, opts: Option<&FlagOptions>) -> String {
    if let Some(usage) = opts.map(|o| o.usage.as_str()).filter(|u| !u.is_empty()) {
        return usage.to_string();
    }
    if field.description.is_empty() {
        field.type_label()
    } else {
        format!("{} ({})", field.description, field.type_label())
    }
}

fn field_flag(field: &FieldDescriptor, opts: Option<&FlagOptions>) -> Arg {
    let mut arg = Arg::new(field.name.clone())
        .long(flag_name(field, opts))
        .help(help_text(field, opts));

    arg = match (field.kind, field.repeated) {
        (FieldKind::Bool, false) => arg
            .num_args(0..=1)
            .require_equals(true)
            .default_missing_value("true"),
        (FieldKind::Message, true) => arg.action(ArgAction::Append).value_name("JSON"),
        (_, true) => arg.action(ArgAction::Append).value_delimiter(','),
        (FieldKind::Message, false) => arg.value_name("JSON"),
        _ => arg,
    };

    if let Some(o) = opts {
        if let Some(short) = o.shorthand {
            arg = arg.short(short);
        }
        if let Some(default) = &o.default_value {
            arg = arg.default_value(default.clone());
        }
        if o.hidden {
            arg = arg.hide(true);
        }
    }
    arg
}

/// Decode parsed arguments into a fresh message of shape `desc`.
pub fn decode_message(
    desc: &Arc<MessageDescriptor>,
    matches: &ArgMatches,
    options: &RpcCommandOptions,
    registry: &SchemaRegistry,
    codecs: &AddressCodecs,
) -> Result<DynamicMessage, FlagError> {
    let mut msg = DynamicMessage::new(desc.clone());
    for field in &desc.fields {
        let raws: Vec<&String> = match matches.try_get_many::<String>(&field.name) {
            Ok(Some(values)) => values.collect(),
            _ => continue,
        };
        let flag = if options.positional_args.contains(&field.name) {
            field.name.to_uppercase()
        } else {
            format!("--{}", flag_name(field, options.flag_options.get(&field.name)))
        };
        let decoder = FieldDecoder {
            field,
            flag: &flag,
            registry,
            codecs,
        };

        let value = if field.repeated {
            let mut items = Vec::new();
            for raw in raws {
                items.extend(decoder.repeated_item(raw)?);
            }
            Value::List(items)
        } else {
            match raws.last() {
                Some(raw) => decoder.scalar(raw)?,
                None => continue,
            }
        };
        msg.set(&field.name, value)?;
    }
    Ok(msg)
}

struct FieldDecoder<'a> {
    field: &'a FieldDescriptor,
    flag: &'a str,
    registry: &'a SchemaRegistry,
    codecs: &'a AddressCodecs,
}

impl FieldDecoder<'_> {
    fn invalid(&self, raw: &str, reason: impl Into<String>) -> FlagError {
        FlagError::InvalidValue {
            flag: self.flag.to_string(),
            value: raw.to_string(),
            reason: reason.into(),
        }
    }

    /// One occurrence of a repeated flag may expand to several items.
    fn repeated_item(&self, raw: &str) -> Result<Vec<Value>, FlagError> {
        if self.field.kind != FieldKind::Message {
            return Ok(vec![self.scalar(raw)?]);
        }
        let trimmed = raw.trim();
        if trimmed.starts_with('[') {
            let items: Vec<serde_json::Value> =
                serde_json::from_str(trimmed).map_err(|e| self.invalid(raw, e.to_string()))?;
            return items.iter().map(|item| self.message_from_json(raw, item)).collect();
        }
        if self.is_coin() && !trimmed.starts_with('{') {
            return trimmed
                .split(',')
                .filter(|p| !p.trim().is_empty())
                .map(|p| self.scalar(p))
                .collect();
        }
        Ok(vec![self.scalar(raw)?])
    }

    fn is_coin(&self) -> bool {
        self.field.message.as_deref() == Some(COIN_TYPE)
    }

    fn scalar(&self, raw: &str) -> Result<Value, FlagError> {
        let trimmed = raw.trim();
        let value = match self.field.kind {
            FieldKind::String => {
                if let Some(scalar) = self.field.scalar.filter(|s| s.is_address())
                    && !trimmed.is_empty()
                {
                    self.codecs
                        .select(CodecKind::for_scalar(Some(scalar)))
                        .string_to_bytes(trimmed)
                        .map_err(|source| FlagError::InvalidAddress {
                            flag: self.flag.to_string(),
                            value: trimmed.to_string(),
                            source,
                        })?;
                }
                Value::String(trimmed.to_string())
            }
            FieldKind::Bytes => Value::Bytes(self.bytes(trimmed)?),
            FieldKind::Bool => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "y" => Value::Bool(true),
                "false" | "0" | "no" | "n" => Value::Bool(false),
                _ => return Err(self.invalid(raw, "expected a boolean")),
            },
            FieldKind::Int32 => Value::I64(i64::from(
                trimmed
                    .parse::<i32>()
                    .map_err(|e| self.invalid(raw, e.to_string()))?,
            )),
            FieldKind::Int64 => Value::I64(
                trimmed
                    .parse::<i64>()
                    .map_err(|e| self.invalid(raw, e.to_string()))?,
            ),
            FieldKind::Uint32 => Value::U64(u64::from(
                trimmed
                    .parse::<u32>()
                    .map_err(|e| self.invalid(raw, e.to_string()))?,
            )),
            FieldKind::Uint64 => Value::U64(
                trimmed
                    .parse::<u64>()
                    .map_err(|e| self.invalid(raw, e.to_string()))?,
            ),
            FieldKind::Enum => match self.field.enum_number(trimmed) {
                Some(n) => Value::Enum(n),
                None => {
                    let names: Vec<&str> = self.field.enum_values.keys().map(String::as_str).collect();
                    return Err(self.invalid(raw, format!("expected one of {}", names.join(", "))));
                }
            },
            FieldKind::Message if self.is_coin() && !trimmed.starts_with('{') => {
                let coin = Coin::parse(trimmed).map_err(|e| self.invalid(raw, e.to_string()))?;
                self.coin_message(coin)?
            }
            FieldKind::Message => {
                let json: serde_json::Value =
                    serde_json::from_str(trimmed).map_err(|e| self.invalid(raw, e.to_string()))?;
                self.message_from_json(raw, &json)?
            }
        };
        Ok(value)
    }

    fn bytes(&self, raw: &str) -> Result<Vec<u8>, FlagError> {
        if let Some(hex_str) = raw.strip_prefix("0x") {
            return hex::decode(hex_str).map_err(|e| self.invalid(raw, e.to_string()));
        }
        base64::engine::general_purpose::STANDARD
            .decode(raw)
            .map_err(|e| self.invalid(raw, e.to_string()))
    }

    fn target(&self) -> Result<Arc<MessageDescriptor>, FlagError> {
        let name = self.field.message.as_deref().unwrap_or_default();
        self.registry
            .find_message(name)
            .map_err(|_| FlagError::Message(MessageError::MessageNotFound(name.to_string())))
    }

    fn message_from_json(&self, raw: &str, json: &serde_json::Value) -> Result<Value, FlagError> {
        if !json.is_object() {
            return Err(self.invalid(raw, "expected a JSON object"));
        }
        Ok(Value::Message(DynamicMessage::from_json(
            self.target()?,
            json,
            self.registry,
        )?))
    }

    fn coin_message(&self, coin: Coin) -> Result<Value, FlagError> {
        let mut msg = DynamicMessage::new(self.target()?);
        msg.set("denom", Value::String(coin.denom))?;
        msg.set("amount", Value::String(coin.amount))?;
        Ok(Value::Message(msg))
    }
}
