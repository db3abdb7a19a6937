use std::io;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// 標準エラーへのログ出力を初期化
///
/// `RUST_LOG` があればそれを使う。無ければ `warn`、`--verbose` 指定時は `debug`。
pub fn init_tracing(verbose: bool) {
    let default_level = default_level(verbose);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false);

    // テストなどで二重初期化されても無視する
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init();
}

fn default_level(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}
