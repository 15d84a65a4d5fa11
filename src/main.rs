mod cli;

use std::{
    fs,
    io::{self, Read, Write},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pyexec::{
    config::Config,
    node::{self, Executor, InputValue, NodeContext, NodeData, NodeInputs, INPUT_ARGUMENTS, INPUT_CODE},
    process::TokioLauncher,
};

#[tokio::main]
async fn main() {
    let args = cli::Cli::parse();
    let cfg = Config::load();
    init_tracing(&cfg);

    if let Err(e) = run(args, &cfg).await {
        eprintln!("{}: {:#}", "error".red(), e);
        std::process::exit(1);
    }
}

fn init_tracing(cfg: &Config) {
    // Logs go to stderr; stdout belongs to the script.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.log_filter()));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .try_init();
}

async fn run(args: cli::Cli, cfg: &Config) -> Result<()> {
    let mut data = match &args.node {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading node file: {}", path.display()))?;
            NodeData::from_json(&text, &cfg.python_path())
                .with_context(|| format!("parsing node file: {}", path.display()))?
        }
        None => NodeData { python_path: cfg.python_path(), ..Default::default() },
    };

    // Resolve code: node file, positional, --file, then piped stdin
    let code = if args.node.is_some() {
        data.code.clone()
    } else if let Some(code) = args.code.clone() {
        code
    } else if let Some(path) = &args.file {
        fs::read_to_string(path).with_context(|| format!("reading script: {}", path.display()))?
    } else if !io::stdin().is_terminal() {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        bail!("Provide code as an argument, with --file, with --node, or via stdin");
    };

    let mut inputs = NodeInputs::new();
    inputs.insert(INPUT_CODE.to_string(), InputValue::String(code));

    match args.args.len() {
        0 => {}
        1 => data.arguments = args.args[0].clone(),
        _ => {
            data.use_arguments_input = true;
            inputs.insert(INPUT_ARGUMENTS.to_string(), InputValue::StringArray(args.args.clone()));
        }
    }
    if let Some(p) = args.python {
        data.python_path = p;
    }
    if let Some(p) = args.mod_path {
        data.mod_path = p;
    }
    if let Some(env) = args.conda_env {
        data.conda_env = env;
    }

    let mut run_opts = cfg.run_options();
    if let Some(secs) = args.timeout {
        run_opts.timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }
    if args.strip_final_newline {
        run_opts.strip_final_newline = true;
    }
    let ctx = NodeContext {
        run: run_opts,
        env_launcher: Some(args.conda_path.unwrap_or_else(|| cfg.conda_path())),
    };

    let out = node::process(&data, &inputs, Executor::Native, &ctx, &TokioLauncher).await?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(out.output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
