use indexmap::IndexMap;
use serde::Serialize;
use std::io::Read;
use std::rc::Rc;
use std::str::FromStr;
use tagfit::render::{HeadlessError, Padding, RenderOptions, RenderSnapshot, render_headless};
use tagfit::{
    DataSource, Environment, HostEvent, RecordingHost, StageOptions, TagSource, TagTree,
    host::params_from_query,
};

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Tags(tagfit::Error),
    Render(HeadlessError),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Tags(err) => write!(f, "{err}"),
            CliError::Render(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<tagfit::Error> for CliError {
    fn from(value: tagfit::Error) -> Self {
        Self::Tags(value)
    }
}

impl From<HeadlessError> for CliError {
    fn from(value: HeadlessError) -> Self {
        Self::Render(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Parse,
    Render,
    Url,
}

#[derive(Debug, Clone, Copy, Default)]
enum RenderFormat {
    #[default]
    Json,
    Html,
}

impl FromStr for RenderFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "html" => Ok(Self::Html),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    pretty: bool,
    render_format: RenderFormat,
    params: Vec<(String, String)>,
    query: Option<String>,
    options: Option<String>,
    width: f64,
    height: f64,
    fit: Option<Padding>,
    classify_images: bool,
    key: Option<String>,
    hostname: Option<String>,
}

#[derive(Serialize)]
struct ParseOut {
    top_level: usize,
    total: usize,
    tags: Vec<TagSource>,
}

#[derive(Serialize)]
struct RenderOut {
    #[serde(flatten)]
    snapshot: RenderSnapshot,
    events: Vec<HostEvent>,
}

fn usage() -> &'static str {
    "tagfit-cli\n\
\n\
USAGE:\n\
  tagfit-cli [parse] [--pretty] [<path>|-]\n\
  tagfit-cli render [--pretty] [--format json|html] [--param <k=v>]... [--query <qs>] [--options <path>] [--width <w>] [--height <h>] [--fit [<top,right,bottom,left>]] [--classify-images] [<path>|-]\n\
  tagfit-cli url --key <key> [--host <hostname>] [--param <k=v>]... [--query <qs>]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', the tag array JSON is read from stdin.\n\
  - parse prints the normalized tag array; malformed input is an error.\n\
  - render stages the tags in a headless container and runs one render pass. JSON output\n\
    reports every tag plus the host events (logs, fatal errors, awaited assets).\n\
  - --param values win over --query values with the same key.\n\
  - --fit without a value fits the container tightly around the tags.\n\
"
}

fn parse_param(raw: &str) -> Option<(String, String)> {
    let (k, v) = raw.split_once('=')?;
    if k.is_empty() {
        return None;
    }
    Some((k.to_string(), v.to_string()))
}

/// `top,right,bottom,left`, all required.
fn parse_padding(raw: &str) -> Option<Padding> {
    let parts = raw
        .split(',')
        .map(|p| p.trim().parse::<f64>().ok())
        .collect::<Option<Vec<_>>>()?;
    match parts.as_slice() {
        [top, right, bottom, left] => Some(Padding::new(*top, *right, *bottom, *left)),
        _ => None,
    }
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args {
        command: Command::Parse,
        render_format: RenderFormat::Json,
        width: 300.0,
        height: 250.0,
        ..Default::default()
    };

    let mut it = argv.iter().skip(1).peekable();
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "parse" => args.command = Command::Parse,
            "render" => args.command = Command::Render,
            "url" => args.command = Command::Url,
            "--pretty" => args.pretty = true,
            "--classify-images" => args.classify_images = true,
            "--format" => {
                let Some(fmt) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.render_format = fmt
                    .parse::<RenderFormat>()
                    .map_err(|_| CliError::Usage(usage()))?;
            }
            "--param" => {
                let Some(raw) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.params
                    .push(parse_param(raw).ok_or(CliError::Usage(usage()))?);
            }
            "--query" => {
                let Some(qs) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.query = Some(qs.clone());
            }
            "--options" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.options = Some(path.clone());
            }
            "--width" => {
                let Some(w) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.width = w.parse::<f64>().map_err(|_| CliError::Usage(usage()))?;
            }
            "--height" => {
                let Some(h) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.height = h.parse::<f64>().map_err(|_| CliError::Usage(usage()))?;
            }
            "--fit" => {
                let padding = it.peek().and_then(|next| parse_padding(next));
                if padding.is_some() {
                    it.next();
                }
                args.fit = Some(padding.unwrap_or_default());
            }
            "--key" => {
                let Some(key) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.key = Some(key.clone());
            }
            "--host" => {
                let Some(host) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.hostname = Some(host.clone());
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    if !(args.width.is_finite() && args.height.is_finite()) {
        return Err(CliError::Usage(usage()));
    }
    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    println!();
    Ok(())
}

fn collect_params(args: &Args) -> IndexMap<String, String> {
    let mut params = args
        .query
        .as_deref()
        .map(params_from_query)
        .unwrap_or_default();
    for (k, v) in &args.params {
        params.insert(k.clone(), v.clone());
    }
    params
}

fn run(args: Args) -> Result<(), CliError> {
    match args.command {
        Command::Parse => {
            let text = read_input(args.input.as_deref())?;
            let tree = TagTree::try_parse(&text)?;
            write_json(
                &ParseOut {
                    top_level: tree.tags().len(),
                    total: tree.all_tags().len(),
                    tags: tree.to_sources(),
                },
                args.pretty,
            )
        }
        Command::Url => {
            let Some(key) = args.key.as_deref() else {
                return Err(CliError::Usage(usage()));
            };
            let environment = args
                .hostname
                .as_deref()
                .map(Environment::from_hostname)
                .unwrap_or_default();
            let params = collect_params(&args);
            println!("{}", DataSource::new(key, environment).url(&params));
            Ok(())
        }
        Command::Render => {
            let text = read_input(args.input.as_deref())?;
            let options = args
                .options
                .as_deref()
                .map(std::fs::read_to_string)
                .transpose()?;
            let host = Rc::new(RecordingHost::with_params(collect_params(&args)));
            let stage = StageOptions {
                width: args.width,
                height: args.height,
                ..Default::default()
            };
            let (mut doc, session) = render_headless(
                &text,
                options.as_deref(),
                host.clone(),
                &stage,
                RenderOptions::default(),
            )?;
            if args.classify_images {
                session.classify_images(&mut doc);
            }
            if let Some(padding) = args.fit {
                session.fit_to_tags(&mut doc, padding);
            }

            match args.render_format {
                RenderFormat::Json => write_json(
                    &RenderOut {
                        snapshot: session.snapshot(&doc),
                        events: host.events(),
                    },
                    args.pretty,
                ),
                RenderFormat::Html => {
                    for line in host.logs() {
                        eprintln!("{line}");
                    }
                    println!("{}", doc.to_html(session.container()));
                    Ok(())
                }
            }
        }
    }
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
