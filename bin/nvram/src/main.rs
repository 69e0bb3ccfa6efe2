use std::io::{self, Write};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::debug;

use nv_core::{Format, Scope};
use nv_linux::{FileDevice, FlockLock};
use nv_store::{NvramConfig, NvramStore, ScopePaths};

#[derive(Parser)]
#[command(name = "nvram", version, about = "Crash-safe key-value storage for system configuration")]
struct Cli {
    /// Operate on the system scope instead of the user scope
    #[arg(long, global = true)]
    sys: bool,

    /// Force debug logging (RUST_LOG otherwise applies)
    #[arg(long, global = true)]
    debug: bool,

    #[arg(long, value_enum, env = "NVRAM_FORMAT", default_value = "dual")]
    format: FormatArg,

    #[command(flatten)]
    paths: PathArgs,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args)]
struct PathArgs {
    #[arg(long, env = "NVRAM_USER_A", default_value = "/var/lib/nvram/user_a")]
    user_a: String,
    #[arg(long, env = "NVRAM_USER_B", default_value = "/var/lib/nvram/user_b")]
    user_b: String,
    #[arg(long, env = "NVRAM_SYSTEM_A", default_value = "/var/lib/nvram/system_a")]
    system_a: String,
    #[arg(long, env = "NVRAM_SYSTEM_B", default_value = "/var/lib/nvram/system_b")]
    system_b: String,

    /// How long `set` waits for a concurrent writer
    #[arg(long, env = "NVRAM_LOCK_TIMEOUT_MS", default_value_t = 5000)]
    lock_timeout_ms: u64,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Dual,
    Legacy,
}

#[derive(Subcommand)]
enum Command {
    /// Store one or more KEY VALUE pairs in a single commit
    Set {
        #[arg(required = true, num_args = 2.., value_names = ["KEY", "VALUE"])]
        pairs: Vec<String>,
    },
    /// Print the value of KEY; fails if KEY is not set
    Get { key: String },
    /// Print every entry as KEY=VALUE
    List,
}

fn init_logging(debug: bool) {
    let env = env_logger::Env::default().default_filter_or("warn");
    let mut builder = env_logger::Builder::from_env(env);
    if debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let scope = if cli.sys { Scope::System } else { Scope::User };
    let format = match cli.format {
        FormatArg::Dual => Format::Dual,
        FormatArg::Legacy => Format::Legacy,
    };
    let p = cli.paths;
    let config = NvramConfig::new(
        ScopePaths::new(p.user_a, p.user_b),
        ScopePaths::new(p.system_a, p.system_b),
    )
    .context("invalid section configuration")?;
    debug!("scope {} ({:?}): {:?}", scope, format, config);

    let lock = FlockLock::new(Duration::from_millis(p.lock_timeout_ms));
    let mut store = NvramStore::new(FileDevice::new(), lock, config).with_format(format);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.cmd {
        Command::Set { pairs } => {
            if pairs.len() % 2 != 0 {
                bail!("set expects KEY VALUE pairs, got {} arguments", pairs.len());
            }
            let pairs = pairs.chunks(2).map(|kv| (kv[0].as_str(), kv[1].as_str()));
            store
                .set_all(scope, pairs)
                .with_context(|| format!("set failed in scope {}", scope))?;
        }
        Command::Get { key } => {
            let value = store
                .get(scope, &key)
                .with_context(|| format!("get failed in scope {}", scope))?;
            writeln!(out, "{}", value)?;
        }
        Command::List => {
            let entries = store
                .list(scope)
                .with_context(|| format!("list failed in scope {}", scope))?;
            for (key, value) in entries {
                writeln!(out, "{}={}", key, value)?;
            }
        }
    }
    out.flush()?;
    Ok(())
}
