//! Quill command line driver.
//!
//! Reads one expression, resolves it against the standard builtins and
//! prints its result type, and for `eval` its value.

use std::io::Read as _;

use quill_eval::{Builtins, Config, EnvId, EvalError, Program};
use quill_types::{Sys, Type};

fn main() {
    init_tracing();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let command = args[1].as_str();
    match command {
        "eval" | "check" => run_command(command, &args[2..]),
        "-e" => run_command("eval", &args[1..]),
        "type" => {
            let Some(src) = args.get(2) else {
                eprintln!("Usage: quill type <type>");
                eprintln!("Example: quill type '<func ?@1 list|?@1 ?@1>'");
                std::process::exit(1);
            };
            match canonical_type(src) {
                Ok(text) => println!("{text}"),
                Err(err) => {
                    eprintln!("{}", render_error("<type>", src, &err));
                    std::process::exit(1);
                }
            }
        }
        "help" | "--help" | "-h" => print_usage(),
        "version" | "--version" | "-v" => {
            println!("Quill {}", env!("CARGO_PKG_VERSION"));
        }
        _ => {
            if std::path::Path::new(command)
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("ql"))
            {
                run_command("eval", &args[1..]);
            } else {
                eprintln!("Unknown command: {command}");
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        }
    }
}

/// Install a subscriber when `RUST_LOG` is set. `QUILL_LOG_TREE` switches
/// to indented span trees.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var("RUST_LOG").is_err() {
        return;
    }
    let filter = EnvFilter::from_default_env();
    if std::env::var_os("QUILL_LOG_TREE").is_some() {
        tracing_subscriber::registry()
            .with(tracing_tree::HierarchicalLayer::new(2).with_targets(true))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .init();
    }
}

/// Where the program text comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Source {
    File(String),
    Stdin,
    Inline(String),
}

#[derive(Debug, PartialEq, Eq)]
struct Options {
    source: Source,
    config: Config,
}

fn set_source(slot: &mut Option<Source>, src: Source) -> Result<(), String> {
    if slot.replace(src).is_some() {
        return Err("only one input may be given".to_string());
    }
    Ok(())
}

fn parse_options(args: &[String]) -> Result<Options, String> {
    let mut source = None;
    let mut config = Config::default();

    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        if arg == "-e" {
            let Some(src) = args.get(i + 1) else {
                return Err("-e needs an expression".to_string());
            };
            set_source(&mut source, Source::Inline(src.clone()))?;
            i += 2;
            continue;
        }
        if let Some(n) = arg.strip_prefix("--max-depth=") {
            let n = n
                .parse()
                .map_err(|_| format!("invalid --max-depth value '{n}'"))?;
            config = config.with_max_depth(n);
        } else if arg == "-" {
            set_source(&mut source, Source::Stdin)?;
        } else if arg.starts_with('-') {
            return Err(format!("unknown option '{arg}'"));
        } else {
            set_source(&mut source, Source::File(arg.to_string()))?;
        }
        i += 1;
    }

    let source = source.ok_or_else(|| "missing input".to_string())?;
    Ok(Options { source, config })
}

/// The display name and text of `source`.
fn read_source(source: &Source) -> Result<(String, String), String> {
    match source {
        Source::File(path) => std::fs::read_to_string(path)
            .map(|text| (path.clone(), text))
            .map_err(|e| format!("cannot read '{path}': {e}")),
        Source::Stdin => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|e| format!("cannot read stdin: {e}"))?;
            Ok(("<stdin>".to_string(), text))
        }
        Source::Inline(text) => Ok(("<inline>".to_string(), text.clone())),
    }
}

fn run_command(command: &str, args: &[String]) {
    let opts = match parse_options(args) {
        Ok(opts) => opts,
        Err(msg) => {
            eprintln!("error: {msg}");
            eprintln!("Usage: quill {command} <file|-> [-e <src>] [--max-depth=<n>]");
            std::process::exit(1);
        }
    };
    let (name, src) = match read_source(&opts.source) {
        Ok(read) => read,
        Err(msg) => {
            eprintln!("error: {msg}");
            std::process::exit(1);
        }
    };

    let result = if command == "check" {
        check_source(&src, opts.config)
    } else {
        eval_source(&src, opts.config)
    };
    match result {
        Ok(out) => println!("{out}"),
        Err(err) => {
            eprintln!("{}", render_error(&name, &src, &err));
            std::process::exit(1);
        }
    }
}

/// Resolve and evaluate `src`; prints as `<type> value`.
fn eval_source(src: &str, config: Config) -> Result<String, EvalError> {
    let mut prog = Program::with_config(Builtins::std(), config);
    let mut exp = prog.read(src)?;
    let val = prog.run(&mut exp)?;
    let pool = &prog.sys.pool;
    Ok(format!(
        "{} {}",
        pool.format_type(&exp.ty(pool)),
        val.to_text(pool)
    ))
}

/// Resolve `src` without evaluating it; prints the result type.
fn check_source(src: &str, config: Config) -> Result<String, EvalError> {
    let mut prog = Program::with_config(Builtins::std(), config);
    let mut exp = prog.read(src)?;
    prog.resolve(EnvId::ROOT, &mut exp, &Type::VOID)?;
    let pool = &prog.sys.pool;
    Ok(pool.format_type(&exp.ty(pool)))
}

/// Parse type syntax and print it canonically.
fn canonical_type(src: &str) -> Result<String, EvalError> {
    let mut sys = Sys::new();
    let ty = sys.parse(src)?;
    Ok(sys.pool.format_type(&ty))
}

/// `error[CODE]: message` with the source position when known.
fn render_error(name: &str, src: &str, err: &EvalError) -> String {
    let head = format!("error[{}]: {}", err.code(), err.kind);
    match err.span {
        Some(span) => {
            let (line, col) = span.line_col(src);
            format!("{head}\n  --> {name}:{line}:{col}")
        }
        None => head,
    }
}

fn print_usage() {
    println!("Quill expression evaluator");
    println!();
    println!("Usage: quill <command> [options]");
    println!();
    println!("Commands:");
    println!("  eval <file|->        Resolve and evaluate, print `<type> value`");
    println!("  check <file|->       Resolve only, print the result type");
    println!("  type <type>          Parse a type and print it canonically");
    println!("  help                 Show this help message");
    println!("  version              Show version information");
    println!();
    println!("Options:");
    println!("  -e <src>             Use <src> as the program text");
    println!("  --max-depth=<n>      Nesting limit for resolve and eval (default: 512)");
    println!();
    println!("Logging:");
    println!("  RUST_LOG=quill_eval=debug     Flat log on stderr");
    println!("  QUILL_LOG_TREE=1              Indented span tree instead");
    println!();
    println!("Examples:");
    println!("  quill eval main.ql");
    println!("  quill -e '(add 1 2 3)'               # <num> 6");
    println!("  quill check -e '(if true 1 2)'       # <num>");
    println!("  quill type '<list|int>'");
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap to panic on unexpected state")]
mod tests;
