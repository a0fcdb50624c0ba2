//! `connect`: load the config, optionally stand up an SSH tunnel, then drive
//! the raw-mode editor loop against a live database connection.
//!
//! Ported from `cmd/connect/main.go`'s `main`, with the hand-rolled
//! `os.Args` dispatch translated to a `clap` derive enum.

use std::io::{BufReader, Write};

use clap::Parser;
use connect::config::{self, Config, Connection};
use connect::editor::{Editor, RawGuard, ReadOutcome};
use connect::history::History;
use connect::query::{self, MysqlExecutor, QueryExecutor};
use connect::tunnel::TunnelInfo;

#[derive(Parser)]
#[command(name = "connect", about = "Interactive SQL client")]
struct Cli {
    /// Alias of the database entry to connect to, from config.yaml.
    alias: Option<String>,

    /// Print the configured database aliases, space-separated, and exit.
    #[arg(long)]
    completions: bool,

    /// Print the version and exit.
    #[arg(short = 'v', long)]
    version: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if cli.version {
        println!("connect version {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let config_path = match config::config_path("config.yaml") {
        Ok(path) => path,
        Err(e) => {
            log::error!("could not determine home directory: {e}");
            std::process::exit(1);
        }
    };
    let config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            log::error!("failed to read config file: {e}");
            std::process::exit(1);
        }
    };

    if cli.completions {
        let aliases: Vec<&str> = config.databases.keys().map(String::as_str).collect();
        print!("{}", aliases.join(" "));
        return;
    }

    let Some(alias) = cli.alias else {
        log::error!("alias required to connect to a database");
        std::process::exit(1);
    };

    let Some(entry) = config.databases.get(&alias) else {
        log::error!("alias not found in config file: {alias}");
        std::process::exit(1);
    };
    log::info!("starting connection to {} ({})", entry.host, entry.database);

    let mut host = entry.host.clone();
    let mut port = entry.port;

    if !entry.tunnel.is_empty() {
        let local_port = 9000 + (std::process::id() % 1000) as u16;
        let Some((ssh_user, ssh_host)) = entry.tunnel.split_once('@') else {
            log::error!("malformed tunnel spec: {}", entry.tunnel);
            std::process::exit(1);
        };
        log::info!("starting tunnel to {ssh_host} on local port {local_port}");

        let info = TunnelInfo {
            ssh_user: ssh_user.to_string(),
            ssh_addr: format!("{ssh_host}:22"),
            remote_addr: format!("{}:{}", entry.host, entry.port),
            local_addr: format!("127.0.0.1:{local_port}"),
        };

        if let Err(e) = info.probe_agent() {
            log::error!("unable to connect to ssh agent: {e}");
            std::process::exit(1);
        }

        std::thread::spawn(move || {
            if let Err(e) = info.start() {
                log::error!("tunnel failed: {e}");
            }
        });

        host = "127.0.0.1".to_string();
        port = local_port;
    }

    let Some(credential) = config.credentials.get(&entry.alias) else {
        log::error!("credential alias not configured: {}", entry.alias);
        std::process::exit(1);
    };

    let connection = Connection {
        username: credential.username.clone(),
        password: credential.password.clone(),
        host,
        port,
        database: entry.database.clone(),
    };

    let mut executor = match MysqlExecutor::connect(&connection) {
        Ok(e) => e,
        Err(e) => {
            log::error!("unable to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    let history_path = config_path.with_file_name("history.txt");
    let mut history = History::new(config.options.histsize);
    if let Ok(file) = std::fs::File::open(&history_path) {
        let _ = history.load(BufReader::new(file));
    }

    let _raw_guard = match RawGuard::enter() {
        Ok(guard) => guard,
        Err(e) => {
            log::error!("terminal setup failed: {e}");
            std::process::exit(1);
        }
    };

    let stdin = BufReader::new(std::io::stdin());
    let stdout = std::io::stdout();
    let tab_size = config.options.tabsize;
    let mut editor = Editor::new(stdin, stdout, "> ", history).with_tab_size(tab_size);

    let exit_code = run_loop(&mut editor, &mut executor);

    if let Ok(file) = std::fs::File::create(&history_path) {
        let _ = editor.history().save(file);
    }
    std::process::exit(exit_code);
}

fn run_loop<R, W, E>(editor: &mut Editor<R, W>, executor: &mut E) -> i32
where
    R: std::io::BufRead,
    W: Write,
    E: QueryExecutor,
{
    loop {
        match editor.read_command() {
            Ok(ReadOutcome::Command(command)) => {
                let start = std::time::Instant::now();
                match executor.execute(&command) {
                    Ok(result) => {
                        if !result.headers.is_empty() {
                            let mut out = String::new();
                            if query::display(&mut out, &result).is_ok() {
                                print!("{out}");
                            }
                        }
                        log::info!("execution completed in {:?}, {} rows", start.elapsed(), result.rows.len());
                    }
                    Err(e) => log::error!("error while running query: {e}"),
                }
            }
            Ok(ReadOutcome::Interrupted) => continue,
            Ok(ReadOutcome::Eof) => return 0,
            Err(e) => {
                log::error!("an error has occurred: {e}");
                return 1;
            }
        }
    }
}
