//! Command-line driver for the SQL/JSON functions
//!
//! Loads a path IR tree, an input document and `PASSING` parameters from JSON,
//! runs one of `JSON_EXISTS`, `JSON_VALUE` or `JSON_QUERY`, and returns the
//! result as JSON (`null` for SQL null).

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use serde_json::Value as JsonValue;
use sqljson::{
    ExistsBehavior, Item, JsonPath, JsonQueryOptions, JsonValueOptions, ParameterRow, PathMode,
    PathNode, QueryBehavior, SessionContext, SqlType, SqlValue, StandardCoercion, TypeCoercion,
    ValueBehavior, WrapperBehavior, json_exists, json_query, json_value,
};

#[derive(Parser, Debug)]
#[command(name = "sqljson")]
#[command(about = "Evaluate SQL/JSON path expressions")]
#[command(after_help = "\
EXAMPLES:
    # Does the document have a third element in $.a?
    sqljson --path a2.json --input doc.json

    # Extract a value as bigint, reading the document from stdin
    cat doc.json | sqljson --path total.json --function value --returning bigint

    # Bind $min and wrap all matches into an array
    sqljson --path over.json --input doc.json --param min=10 \\
        --function query --wrapper unconditional
")]
pub struct Args {
    /// JSON file holding the path IR tree
    #[arg(long)]
    pub path: PathBuf,

    /// JSON document to query. Reads stdin when omitted.
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Path mode
    #[arg(long, value_enum, default_value_t = Mode::Lax)]
    pub mode: Mode,

    /// Path parameter as name=<json>. Repeatable.
    #[arg(long = "param", value_parser = parse_param)]
    pub params: Vec<(String, String)>,

    /// SQL/JSON function to run
    #[arg(long, value_enum, default_value_t = Function::Exists)]
    pub function: Function,

    /// ON ERROR behavior. Defaults to the function's SQL default.
    #[arg(long, value_enum)]
    pub on_error: Option<OnBehavior>,

    /// ON EMPTY behavior (value and query only)
    #[arg(long, value_enum)]
    pub on_empty: Option<OnBehavior>,

    /// Array wrapper (query only)
    #[arg(long, value_enum, default_value_t = Wrapper::Without)]
    pub wrapper: Wrapper,

    /// RETURNING type (value only), e.g. bigint or varchar(20)
    #[arg(long)]
    pub returning: Option<SqlType>,

    /// JSON value used by the `default` behavior
    #[arg(long)]
    pub default: Option<String>,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Lax,
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Function {
    Exists,
    Value,
    Query,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OnBehavior {
    Null,
    Error,
    True,
    False,
    Unknown,
    EmptyArray,
    EmptyObject,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Wrapper {
    Without,
    Conditional,
    Unconditional,
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=<json>, got '{s}'"))?;
    if name.is_empty() {
        return Err(format!("missing parameter name in '{s}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

/// Run the selected function. `stdin` is read only when `--input` is absent.
pub fn run(args: &Args, stdin: &mut dyn Read) -> anyhow::Result<JsonValue> {
    let path = load_path(&args.path, args.mode)?;
    let input = match &args.input {
        Some(file) => {
            let text = fs::read_to_string(file)
                .with_context(|| format!("failed to read input {}", file.display()))?;
            parse_document("input", &text)
        }
        None => {
            let mut text = String::new();
            stdin
                .read_to_string(&mut text)
                .context("failed to read input from stdin")?;
            parse_document("input", &text)
        }
    };
    let parameters: ParameterRow = args
        .params
        .iter()
        .map(|(name, text)| (name.clone(), parse_document(name, text)))
        .collect();

    log::debug!("running {:?} with path {}", args.function, path);

    let output = match args.function {
        Function::Exists => {
            reject_on_empty(args)?;
            let on_error = exists_behavior(args.on_error)?;
            json_exists(&input, &path, parameters, on_error)?.map(JsonValue::Bool)
        }
        Function::Value => {
            let returning = args.returning.or(path.root().declared_type);
            let options = JsonValueOptions {
                returning,
                on_empty: value_behavior(args.on_empty, args, returning)?,
                on_error: value_behavior(args.on_error, args, returning)?,
            };
            json_value(&input, &path, parameters, &options, &SessionContext::default())?
                .map(|value| value.to_json())
        }
        Function::Query => {
            let options = JsonQueryOptions {
                wrapper: match args.wrapper {
                    Wrapper::Without => WrapperBehavior::Without,
                    Wrapper::Conditional => WrapperBehavior::Conditional,
                    Wrapper::Unconditional => WrapperBehavior::Unconditional,
                },
                on_empty: query_behavior(args.on_empty)?,
                on_error: query_behavior(args.on_error)?,
            };
            json_query(&input, &path, parameters, &options)?
        }
    };
    Ok(output.unwrap_or(JsonValue::Null))
}

fn load_path(file: &Path, mode: Mode) -> anyhow::Result<JsonPath> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("failed to read path IR {}", file.display()))?;
    let root: PathNode = serde_json::from_str(&text)
        .with_context(|| format!("invalid path IR in {}", file.display()))?;
    let mode = match mode {
        Mode::Lax => PathMode::Lax,
        Mode::Strict => PathMode::Strict,
    };
    Ok(JsonPath::new(mode, root)?)
}

/// Unparsable JSON becomes the input-error sentinel
fn parse_document(what: &str, text: &str) -> Item {
    match serde_json::from_str::<JsonValue>(text) {
        Ok(value) => Item::from(value),
        Err(e) => {
            log::warn!("{what} is not valid JSON ({e}); passing it on as a conversion error");
            Item::InputError
        }
    }
}

fn reject_on_empty(args: &Args) -> anyhow::Result<()> {
    if args.on_empty.is_some() {
        bail!("--on-empty is not supported by JSON_EXISTS");
    }
    Ok(())
}

fn exists_behavior(behavior: Option<OnBehavior>) -> anyhow::Result<ExistsBehavior> {
    Ok(match behavior {
        None | Some(OnBehavior::False) => ExistsBehavior::False,
        Some(OnBehavior::True) => ExistsBehavior::True,
        Some(OnBehavior::Unknown) => ExistsBehavior::Unknown,
        Some(OnBehavior::Error) => ExistsBehavior::Error,
        Some(other) => bail!("{other:?} is not a JSON_EXISTS ON ERROR behavior"),
    })
}

fn value_behavior(
    behavior: Option<OnBehavior>,
    args: &Args,
    returning: Option<SqlType>,
) -> anyhow::Result<ValueBehavior> {
    Ok(match behavior {
        None | Some(OnBehavior::Null) => ValueBehavior::Null,
        Some(OnBehavior::Error) => ValueBehavior::Error,
        Some(OnBehavior::Default) => ValueBehavior::Default(default_value(args, returning)?),
        Some(other) => bail!("{other:?} is not a JSON_VALUE behavior"),
    })
}

fn query_behavior(behavior: Option<OnBehavior>) -> anyhow::Result<QueryBehavior> {
    Ok(match behavior {
        None | Some(OnBehavior::Null) => QueryBehavior::Null,
        Some(OnBehavior::Error) => QueryBehavior::Error,
        Some(OnBehavior::EmptyArray) => QueryBehavior::EmptyArray,
        Some(OnBehavior::EmptyObject) => QueryBehavior::EmptyObject,
        Some(other) => bail!("{other:?} is not a JSON_QUERY behavior"),
    })
}

/// The `--default` value, cast to the same type as a successful result
fn default_value(args: &Args, returning: Option<SqlType>) -> anyhow::Result<SqlValue> {
    let text = args
        .default
        .as_deref()
        .context("the default behavior needs --default <json>")?;
    let value: JsonValue =
        serde_json::from_str(text).with_context(|| format!("invalid --default value '{text}'"))?;
    let target = returning.unwrap_or(SqlType::Varchar(None));
    Ok(StandardCoercion.coerce(&Item::from(value), &target)?)
}
