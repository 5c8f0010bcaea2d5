use argmarshal::logging;
use argmarshal::{
    ArgError, Config, FormatSpec, Heap, ObjRef, Slot, SpecCache, Tracker, Value, Variant,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info};

#[derive(Debug)]
enum Command {
    Describe { fmt: String, variant: Variant, json: bool },
    Call { fmt: String, names: Option<Vec<String>>, values: Vec<String> },
}

#[derive(Debug)]
struct Cli {
    command: Command,
    config: Option<PathBuf>,
}

impl Cli {
    fn from_args() -> Result<Self, String> {
        Self::parse(std::env::args().collect())
    }

    fn parse(args: Vec<String>) -> Result<Self, String> {
        let prog = args.first().map(String::as_str).unwrap_or("argmarshal");

        let mut rest = args.iter().skip(1);
        let mut config = None;
        let mut keywords = false;
        let mut json = false;
        let mut names = None;
        let mut positional = Vec::new();

        let subcommand = match rest.next() {
            Some(cmd) if cmd == "--help" || cmd == "-h" => return Err(Self::usage(prog)),
            Some(cmd) => cmd.clone(),
            None => return Err(Self::usage(prog)),
        };

        while let Some(arg) = rest.next() {
            match arg.as_str() {
                "--help" | "-h" => return Err(Self::usage(prog)),
                "--keywords" => keywords = true,
                "--json" => json = true,
                "--config" => {
                    let path = rest.next().ok_or("--config needs a path")?;
                    config = Some(PathBuf::from(path));
                }
                "--names" => {
                    let list = rest.next().ok_or("--names needs a comma-separated list")?;
                    names = Some(list.split(',').map(str::to_string).collect());
                }
                "--" => positional.extend(rest.by_ref().cloned()),
                opt if opt.starts_with("--") => {
                    return Err(format!("Unknown option: {}\n\n{}", opt, Self::usage(prog)))
                }
                value => positional.push(value.to_string()),
            }
        }

        if positional.is_empty() {
            return Err("No format string specified".to_string());
        }
        let fmt = positional.remove(0);

        // Options only mean something to one subcommand
        let stray = match subcommand.as_str() {
            "describe" if names.is_some() => Some("--names"),
            "call" if keywords => Some("--keywords"),
            "call" if json => Some("--json"),
            _ => None,
        };
        if let Some(opt) = stray {
            return Err(format!("{} does not apply to {}\n\n{}", opt, subcommand, Self::usage(prog)));
        }

        let command = match subcommand.as_str() {
            "describe" => Command::Describe {
                fmt,
                variant: if keywords { Variant::Keywords } else { Variant::Positional },
                json,
            },
            "call" => Command::Call { fmt, names, values: positional },
            other => return Err(format!("Unknown command: {}\n\n{}", other, Self::usage(prog))),
        };

        Ok(Self { command, config })
    }

    fn usage(prog: &str) -> String {
        format!(
            "argmarshal - format-string argument parsing\n\n\
            USAGE:\n    \
            {prog} describe [--keywords] [--json] <fmt>\n    \
            {prog} call [--names a,b,...] <fmt> [values...]\n\n\
            OPTIONS:\n    \
            -h, --help         Print help information\n    \
            --config <path>    Use this config file instead of discovering one\n    \
            --keywords         describe: parse the format for the keyword variant\n    \
            --json             describe: print the parsed format as JSON\n    \
            --names <list>     call: declared parameter names; enables keyword parsing\n\n\
            VALUES:\n    \
            1, -2, 2.5, true, none, text, or name=value for keywords\n\n\
            EXAMPLES:\n    \
            {prog} describe --keywords 'O+|O+:add'\n    \
            {prog} call 'O|O:two_add' 3 4\n    \
            {prog} call --names a,b 'O+$O+' 1 b=2"
        )
    }
}

fn literal(text: &str) -> Value {
    match text {
        "none" | "None" => Value::None,
        "true" | "True" => Value::Bool(true),
        "false" | "False" => Value::Bool(false),
        _ => {
            if let Ok(v) = text.parse::<i128>() {
                Value::Int(v)
            } else if let Ok(v) = text.parse::<f64>() {
                Value::Float(v)
            } else {
                Value::Str(text.trim_matches(|c: char| c == '"' || c == '\'').to_string())
            }
        }
    }
}

/// Split `name=value` when the left side looks like an identifier
fn keyword(text: &str) -> Option<(&str, &str)> {
    let (name, value) = text.split_once('=')?;
    let ident = !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_');
    ident.then_some((name, value))
}

fn describe(spec: &FormatSpec, json: bool) -> Result<(), String> {
    if json {
        let out = serde_json::to_string_pretty(spec).map_err(|e| e.to_string())?;
        println!("{}", out);
        return Ok(());
    }

    println!("variant:  {:?}", spec.variant());
    println!("function: {}", spec.name().unwrap_or("-"));
    if let Some(message) = spec.message() {
        println!("message:  {}", message);
    }
    println!("arity:    {}..={}", spec.min_required(), spec.max_total());
    for (i, arg) in spec.args().iter().enumerate() {
        let mut flags = Vec::new();
        if arg.optional {
            flags.push("optional");
        }
        if arg.keyword_only {
            flags.push("keyword-only");
        }
        if arg.code.transfers_ownership() {
            flags.push("owned");
        }
        println!("  [{}] {:?} ({}) {}", i, arg.code, arg.code, flags.join(", "));
    }
    Ok(())
}

fn render(heap: &Heap, slot: &Slot<'_, Heap>) -> String {
    let show = |h: &ObjRef| heap.get(*h).map_or_else(|| "<freed>".to_string(), |v| v.to_string());
    match slot {
        Slot::Unset => "unset".to_string(),
        Slot::Int(v) => format!("int {}", v),
        Slot::Long(v) => format!("long {}", v),
        Slot::Double(v) => format!("double {:?}", v),
        Slot::Borrowed(h) => format!("borrowed {}", show(h)),
        Slot::Owned(owned) => format!("owned {}", show(owned.get())),
    }
}

fn call(
    spec: &FormatSpec,
    names: Option<&[String]>,
    values: &[String],
) -> Result<Vec<String>, ArgError> {
    let heap = Heap::new();
    let mut tracker = Tracker::with_capacity(&heap, values.len());

    let mut args = Vec::new();
    let mut kwargs = Vec::new();
    for text in values {
        match keyword(text).filter(|_| names.is_some()) {
            Some((name, value)) => {
                let handle = *tracker.add(heap.alloc(literal(value)));
                kwargs.push((name.to_string(), handle));
            }
            None => args.push(*tracker.add(heap.alloc(literal(text)))),
        }
    }

    let parsed = match names {
        Some(names) => {
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            spec.parse_keywords(&heap, &args, &kwargs, &names)?
        }
        None => spec.parse_positional(&heap, &args)?,
    };

    let lines = parsed.iter().map(|slot| render(&heap, slot)).collect();
    drop(parsed);
    tracker.close();

    debug!(live_objects = heap.live_objects(), "call finished");
    Ok(lines)
}

fn main() {
    let cli = match Cli::from_args() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let config = match &cli.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        },
        None => Config::discover(),
    }
    .with_env();

    let _guard = logging::init(&config.logging);
    info!(command = ?cli.command, "argmarshal starting");

    let cache = config.cache.enabled.then(|| SpecCache::new(config.cache.capacity));
    let load = |fmt: &str, variant: Variant| -> Result<Arc<FormatSpec>, ArgError> {
        match &cache {
            Some(cache) => cache.get_or_parse(fmt, variant),
            None => FormatSpec::parse(fmt, variant).map(Arc::new),
        }
    };

    let result = match &cli.command {
        Command::Describe { fmt, variant, json } => load(fmt, *variant)
            .map_err(|e| (e.kind(), e.to_string()))
            .and_then(|spec| {
                describe(&spec, *json).map_err(|e| (argmarshal::ErrorKind::Usage, e))
            }),
        Command::Call { fmt, names, values } => {
            let variant = if names.is_some() { Variant::Keywords } else { Variant::Positional };
            load(fmt, variant)
                .and_then(|spec| call(&spec, names.as_deref(), values))
                .map(|lines| {
                    for (i, line) in lines.iter().enumerate() {
                        println!("[{}] {}", i, line);
                    }
                })
                .map_err(|e| (e.kind(), e.to_string()))
        }
    };

    if let Err((kind, message)) = result {
        error!(%kind, error = %message, "argmarshal failed");
        eprintln!("{}: {}", kind, message);
        let code = match kind {
            argmarshal::ErrorKind::Usage => 2,
            argmarshal::ErrorKind::Call => 1,
        };
        std::process::exit(code);
    }
}
