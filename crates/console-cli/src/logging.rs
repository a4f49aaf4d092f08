use std::io::Write;

/// Initialize env_logger. An explicit `level` (from `--log-level` or
/// `RUST_LOG`) wins; otherwise `debug` selects the default level.
pub fn init_logging(debug: bool, level: Option<&str>) {
    logger_builder(debug, level).init();
}

fn logger_builder(debug: bool, level: Option<&str>) -> env_logger::Builder {
    let mut builder = match level {
        Some(level) => {
            let mut builder = env_logger::Builder::new();
            builder.parse_filters(level);
            builder
        }
        None => {
            let filter = if debug { "debug" } else { "info" };
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        }
    };

    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {} [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Stderr);
    builder
}
